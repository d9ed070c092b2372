pub mod config;
pub mod indicators;
pub mod signal;

pub use config::StrategyFileConfig;
pub use indicators::{compute_frames, IndicatorParams};
pub use signal::{detect_signals, price_precision, round_to, SignalParams};

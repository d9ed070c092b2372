pub mod ema;
pub mod frame;

pub use ema::{ema, sma};
pub use frame::{compute_frames, IndicatorParams};

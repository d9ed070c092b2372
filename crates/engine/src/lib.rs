pub mod binance;
pub mod ledger;
pub mod matcher;
pub mod pipeline;
pub mod resumption;

pub use binance::BinanceFeed;
pub use ledger::TradeLedger;
pub use matcher::{match_trades, resolve_forward, TradeClose};
pub use pipeline::Pipeline;
pub use resumption::resume_instrument;

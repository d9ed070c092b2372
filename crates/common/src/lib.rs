pub mod config;
pub mod error;
pub mod feed;
pub mod time;
pub mod types;

pub use config::Config;
pub use error::{Error, Result};
pub use feed::PriceFeed;
pub use types::*;

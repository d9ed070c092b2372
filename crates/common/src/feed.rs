use async_trait::async_trait;

use crate::{Bar, Result};

/// Abstraction over the price feed.
///
/// `BinanceFeed` in `crates/engine` implements this for the live klines
/// endpoint; tests substitute a canned feed. Feed failures skip the
/// instrument for the cycle and never crash the pipeline.
#[async_trait]
pub trait PriceFeed: Send + Sync {
    /// Fetch up to `limit` most recent bars for an instrument, ordered by
    /// time ascending.
    async fn fetch_bars(&self, instrument: &str, interval: &str, limit: u32) -> Result<Vec<Bar>>;
}

use std::sync::Arc;

use tracing::{error, info, warn};

use common::{Error, PriceFeed, Result, Trade};
use strategy::{compute_frames, detect_signals, StrategyFileConfig};

use crate::ledger::TradeLedger;
use crate::resumption::resume_instrument;

/// Per-instrument evaluation pipeline: fetch → indicators → signals →
/// resume/match → persist. Instruments are independent; one failure never
/// blocks the rest of a cycle.
pub struct Pipeline {
    feed: Arc<dyn PriceFeed>,
    ledger: Arc<TradeLedger>,
    strategy: StrategyFileConfig,
    interval: String,
    bar_limit: u32,
}

impl Pipeline {
    pub fn new(
        feed: Arc<dyn PriceFeed>,
        ledger: Arc<TradeLedger>,
        strategy: StrategyFileConfig,
        interval: impl Into<String>,
        bar_limit: u32,
    ) -> Self {
        Self {
            feed,
            ledger,
            strategy,
            interval: interval.into(),
            bar_limit,
        }
    }

    /// Evaluate one instrument to completion and persist discovered trades.
    pub async fn process_instrument(&self, instrument: &str) -> Result<Vec<Trade>> {
        let bars = self
            .feed
            .fetch_bars(instrument, &self.interval, self.bar_limit)
            .await?;

        let frames = compute_frames(&bars, &self.strategy.indicators)?;
        let signals = detect_signals(&frames, &self.strategy.signal);

        resume_instrument(
            &self.ledger,
            instrument,
            &bars,
            &signals,
            self.strategy.indicators.warmup(),
        )
        .await
    }

    /// Evaluate all instruments concurrently, isolating failures per
    /// instrument.
    pub async fn run_cycle(self: &Arc<Self>, instruments: &[String]) {
        let mut handles = Vec::with_capacity(instruments.len());
        for instrument in instruments {
            let pipeline = Arc::clone(self);
            let instrument = instrument.clone();
            handles.push(tokio::spawn(async move {
                match pipeline.process_instrument(&instrument).await {
                    Ok(created) => {
                        info!(instrument, new_trades = created.len(), "Instrument evaluated");
                    }
                    Err(Error::Feed(e)) | Err(Error::Http(e)) => {
                        warn!(instrument, error = %e, "Feed unavailable — instrument skipped this cycle");
                    }
                    Err(Error::InsufficientHistory { required, got }) => {
                        warn!(instrument, required, got, "Not enough history — no signals this cycle");
                    }
                    Err(e) => {
                        error!(instrument, error = %e, "Instrument evaluation failed");
                    }
                }
            }));
        }
        for handle in handles {
            let _ = handle.await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::NaiveDateTime;
    use common::Bar;
    use sqlx::SqlitePool;

    struct CannedFeed {
        bars: Vec<Bar>,
    }

    #[async_trait]
    impl PriceFeed for CannedFeed {
        async fn fetch_bars(&self, _: &str, _: &str, _: u32) -> Result<Vec<Bar>> {
            Ok(self.bars.clone())
        }
    }

    struct FailingFeed;

    #[async_trait]
    impl PriceFeed for FailingFeed {
        async fn fetch_bars(&self, _: &str, _: &str, _: u32) -> Result<Vec<Bar>> {
            Err(Error::Feed("rate limited".into()))
        }
    }

    async fn memory_ledger() -> Arc<TradeLedger> {
        let pool = SqlitePool::connect("sqlite::memory:").await.unwrap();
        sqlx::migrate!("../../migrations").run(&pool).await.unwrap();
        Arc::new(TradeLedger::new(pool))
    }

    fn bar(minute: u32, close: f64) -> Bar {
        let time = NaiveDateTime::parse_from_str(
            &format!("2024-01-01 00:{minute:02}:00"),
            "%Y-%m-%d %H:%M:%S",
        )
        .unwrap();
        Bar {
            time,
            open: close,
            high: close + 0.5,
            low: close - 0.5,
            close,
            volume: 10.0,
        }
    }

    #[tokio::test]
    async fn feed_failure_skips_instrument_without_state_change() {
        let ledger = memory_ledger().await;
        let pipeline = Arc::new(Pipeline::new(
            Arc::new(FailingFeed),
            ledger.clone(),
            StrategyFileConfig::default(),
            "1m",
            1000,
        ));

        pipeline.run_cycle(&["BTCUSDT".to_string()]).await;
        assert!(ledger.list("BTCUSDT").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn short_history_is_not_fatal() {
        let ledger = memory_ledger().await;
        let feed = CannedFeed {
            bars: (0..5).map(|i| bar(i, 100.0)).collect(),
        };
        let pipeline = Pipeline::new(
            Arc::new(feed),
            ledger.clone(),
            StrategyFileConfig::default(),
            "1m",
            1000,
        );

        let err = pipeline.process_instrument("BTCUSDT").await.unwrap_err();
        assert!(matches!(err, Error::InsufficientHistory { .. }));
        assert!(ledger.list("BTCUSDT").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn one_failing_instrument_does_not_block_others() {
        let ledger = memory_ledger().await;
        // Flat series: enough history, no entry conditions, no trades —
        // but the cycle completes for both instruments.
        let feed = CannedFeed {
            bars: (0..40).map(|i| bar(i, 100.0)).collect(),
        };
        let pipeline = Arc::new(Pipeline::new(
            Arc::new(feed),
            ledger.clone(),
            StrategyFileConfig::default(),
            "1m",
            1000,
        ));

        pipeline
            .run_cycle(&["BTCUSDT".to_string(), "ETHUSDT".to_string()])
            .await;
        assert!(ledger.list("BTCUSDT").await.unwrap().is_empty());
        assert!(ledger.list("ETHUSDT").await.unwrap().is_empty());
    }
}

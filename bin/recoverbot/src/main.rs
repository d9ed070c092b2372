use std::sync::Arc;
use std::time::Duration;

use sqlx::SqlitePool;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use common::Config;
use engine::{BinanceFeed, Pipeline, TradeLedger};
use risk::SizingParams;
use strategy::StrategyFileConfig;

#[tokio::main]
async fn main() {
    // ── Logging ──────────────────────────────────────────────────────────────
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse().unwrap()))
        .init();

    // ── Config ────────────────────────────────────────────────────────────────
    let cfg = Config::from_env();
    info!(instruments = ?cfg.instruments, interval = %cfg.interval, "RecoverBot starting");

    // ── Database ──────────────────────────────────────────────────────────────
    let db = SqlitePool::connect(&cfg.database_url)
        .await
        .unwrap_or_else(|e| panic!("Failed to connect to database: {e}"));
    sqlx::migrate!("../../migrations")
        .run(&db)
        .await
        .unwrap_or_else(|e| panic!("Database migration failed: {e}"));
    info!("Database ready");

    // ── Strategy config ───────────────────────────────────────────────────────
    let strategy_file = StrategyFileConfig::load(&cfg.strategy_config_path);
    let sizing = SizingParams::default(); // TODO: add a [sizing] section to strategy.toml
    info!(
        ema_fast = strategy_file.indicators.ema_fast,
        ema_slow = strategy_file.indicators.ema_slow,
        volume_period = strategy_file.indicators.volume_period,
        "Strategy configured"
    );

    // ── Pipeline ──────────────────────────────────────────────────────────────
    let feed = Arc::new(BinanceFeed::new(&cfg.binance_base_url));
    let ledger = Arc::new(TradeLedger::new(db));
    let pipeline = Arc::new(Pipeline::new(
        feed,
        Arc::clone(&ledger),
        strategy_file,
        cfg.interval.clone(),
        cfg.bar_limit,
    ));

    // ── Poll loop ─────────────────────────────────────────────────────────────
    let mut ticker = tokio::time::interval(Duration::from_secs(cfg.poll_secs));
    info!(poll_secs = cfg.poll_secs, "Entering evaluation loop");
    loop {
        tokio::select! {
            _ = ticker.tick() => {
                pipeline.run_cycle(&cfg.instruments).await;
                report(&ledger, &cfg.instruments, &sizing).await;
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Shutdown signal received. Exiting.");
                break;
            }
        }
    }
}

/// After each cycle, log the sizing decision and summary per instrument.
/// The order-placement collaborator consumes the same assessment out of
/// band; here it is reporting only.
async fn report(ledger: &TradeLedger, instruments: &[String], sizing: &SizingParams) {
    for instrument in instruments {
        let trades = match ledger.list(instrument).await {
            Ok(trades) => trades,
            Err(e) => {
                error!(instrument, error = %e, "Failed to read trade history");
                continue;
            }
        };

        if let Some(assessment) = risk::evaluate(&trades, sizing) {
            info!(
                instrument,
                multiplier = assessment.decision.multiplier,
                recovery_trades = assessment.decision.recovery_trades,
                base_capital = assessment.decision.base_capital,
                side = %assessment.intent.side,
                entry = assessment.intent.entry_price,
                place_order = assessment.latest_real_closed,
                "Sizing decision"
            );
        }

        let summary = analytics::summarize(&trades, analytics::DEFAULT_BROKERAGE_RATE);
        info!(
            instrument,
            total = summary.total_trades,
            real = summary.real_trades,
            win_pct = summary.overall_win_pct,
            net_profit_pct = summary.net_profit_pct,
            "History summary"
        );
    }
}

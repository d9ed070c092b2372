use chrono::NaiveDateTime;
use tracing::{debug, info};

use common::{Bar, EntrySignal, Result, Trade};

use crate::ledger::TradeLedger;
use crate::matcher::{match_trades, resolve_forward};

/// Reconcile the current bar batch against the persisted trade history for
/// an instrument, then persist whatever the matcher discovers.
///
/// - No history: cold start — the warmup prefix is skipped and the rest of
///   the batch is matched.
/// - Latest trade closed: only signals strictly after its close time can
///   open new trades.
/// - Latest trade pending: it is first continued bar-by-bar from strictly
///   after its start; if it resolves, the ledger row is updated in place
///   and discovery restarts strictly after the resolution time; if not,
///   nothing else happens this cycle.
///
/// Feeding the same batch twice is idempotent: every filter strictly
/// excludes already-covered intervals.
pub async fn resume_instrument(
    ledger: &TradeLedger,
    instrument: &str,
    bars: &[Bar],
    signals: &[EntrySignal],
    warmup: usize,
) -> Result<Vec<Trade>> {
    let lock = ledger.instrument_lock(instrument).await;
    let _guard = lock.lock().await;

    match ledger.latest(instrument).await? {
        None => {
            // Cold start: indicators before the warmup boundary are
            // undefined and must not produce trades.
            if bars.len() <= warmup {
                return Ok(Vec::new());
            }
            let boundary = bars[warmup].time;
            info!(instrument, %boundary, "No trade history — starting fresh past warmup");
            discover(ledger, instrument, bars, signals, |t| t >= boundary).await
        }

        Some(last) => match last.close_time {
            Some(closed_at) => {
                debug!(instrument, %closed_at, "Latest trade closed — scanning for new entries");
                discover(ledger, instrument, bars, signals, |t| t > closed_at).await
            }
            None => {
                debug!(instrument, start = %last.start_time, "Continuing pending trade");
                let first_after = bars.partition_point(|b| b.time <= last.start_time);
                match resolve_forward(
                    last.side,
                    last.entry_price,
                    last.stop_loss,
                    last.take_profit,
                    &bars[first_after..],
                ) {
                    Some(close) => {
                        ledger
                            .resolve(&last.id, close.time, close.result, close.gain_pct)
                            .await?;
                        info!(
                            instrument,
                            result = %close.result,
                            gain_pct = close.gain_pct,
                            close_time = %close.time,
                            "Pending trade resolved"
                        );
                        discover(ledger, instrument, bars, signals, |t| t > close.time).await
                    }
                    None => {
                        debug!(instrument, "Pending trade still unresolved");
                        Ok(Vec::new())
                    }
                }
            }
        },
    }
}

/// Match eligible signals into trades and persist each one.
async fn discover(
    ledger: &TradeLedger,
    instrument: &str,
    bars: &[Bar],
    signals: &[EntrySignal],
    eligible: impl Fn(NaiveDateTime) -> bool,
) -> Result<Vec<Trade>> {
    let eligible_signals: Vec<EntrySignal> = signals
        .iter()
        .filter(|s| eligible(s.time))
        .cloned()
        .collect();

    let trades = match_trades(instrument, bars, &eligible_signals);
    for trade in &trades {
        ledger.create(trade).await?;
    }
    if !trades.is_empty() {
        info!(instrument, count = trades.len(), "New trades persisted");
    }
    Ok(trades)
}

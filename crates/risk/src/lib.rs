pub mod classify;
pub mod sizing;
pub mod streak;

pub use classify::{classify, classify_with_mode, real_trades};
pub use sizing::{size, SizingParams};
pub use streak::{pending_losses, streak_segments};

use common::{OrderIntent, SizingDecision, Trade};

/// Full risk evaluation of a ledger history: the capital-allocation
/// decision plus the bracket levels of the most recent real trade, which
/// together form the order-placement input.
#[derive(Debug, Clone)]
pub struct RiskAssessment {
    pub decision: SizingDecision,
    pub intent: OrderIntent,
    /// An order is only placed when the latest real trade is closed.
    pub latest_real_closed: bool,
}

/// Run classification, streak analysis and sizing over an ordered trade
/// history. Returns `None` when no real trade exists yet.
///
/// A newest trade that is still pending while the machine is in Real mode
/// is the latest real trade: its brackets form the intent and the gate
/// reads false until it closes. It never feeds streak or sizing input.
pub fn evaluate(trades: &[Trade], params: &SizingParams) -> Option<RiskAssessment> {
    let (classes, virtual_mode) = classify_with_mode(trades, params.max_consecutive_losses);
    let real: Vec<&Trade> = classes
        .iter()
        .zip(trades)
        .filter(|(class, _)| **class == Some(false))
        .map(|(_, trade)| trade)
        .collect();

    let segments = streak_segments(&real);
    let pending = pending_losses(&segments);
    let decision = size(pending, params);

    let latest = match trades.last() {
        Some(open) if open.is_pending() && !virtual_mode => open,
        _ => *real.last()?,
    };

    Some(RiskAssessment {
        decision,
        intent: OrderIntent {
            side: latest.side,
            entry_price: latest.entry_price,
            stop_loss: latest.stop_loss,
            take_profit: latest.take_profit,
        },
        latest_real_closed: latest.close_time.is_some(),
    })
}

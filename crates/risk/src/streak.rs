use common::{StreakKind, StreakSegment, Trade, TradeResult};

/// Partition an ordered real-trade sequence into maximal runs of
/// consecutive same-result trades. Pending trades must already be
/// filtered out by the caller.
pub fn streak_segments(real: &[&Trade]) -> Vec<StreakSegment> {
    let mut segments: Vec<StreakSegment> = Vec::new();
    for trade in real {
        let kind = match trade.result {
            Some(TradeResult::Win) => StreakKind::WinRun,
            Some(TradeResult::Lose) => StreakKind::LossRun,
            None => continue,
        };
        match segments.last_mut() {
            Some(last) if last.kind == kind => last.count += 1,
            _ => segments.push(StreakSegment { kind, count: 1 }),
        }
    }
    segments
}

/// Fold the streak segments into the number of losses still awaiting
/// recovery, with threshold `T = 2`.
///
/// A loss run adds its full count. A win run either clears the debt
/// outright (when it is below the threshold) or pays it down one win at a
/// time until it drops below the threshold (then clears to zero) or the
/// run is exhausted.
pub fn pending_losses(segments: &[StreakSegment]) -> u32 {
    const THRESHOLD: u32 = 2;

    let mut pending: u32 = 0;
    for segment in segments {
        match segment.kind {
            StreakKind::LossRun => pending += segment.count as u32,
            StreakKind::WinRun => {
                if pending < THRESHOLD {
                    pending = 0;
                    continue;
                }
                for _ in 0..segment.count {
                    if pending < THRESHOLD {
                        pending = 0;
                        break;
                    }
                    pending -= 1;
                }
            }
        }
    }
    pending
}

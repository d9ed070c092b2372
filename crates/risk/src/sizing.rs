use serde::{Deserialize, Serialize};

use common::SizingDecision;

/// User-configurable sizing parameters.
#[derive(Debug, Clone, Copy, Deserialize, Serialize)]
pub struct SizingParams {
    /// Capital committed to a single unleveraged entry.
    #[serde(default = "default_base_capital")]
    pub base_capital: f64,
    /// Consecutive real losses before trades turn virtual.
    #[serde(default = "default_max_consecutive_losses")]
    pub max_consecutive_losses: u32,
    /// Loss depth beyond which the multiplier stops growing.
    #[serde(default = "default_multiplier_cap")]
    pub multiplier_cap: u32,
}

fn default_base_capital() -> f64 {
    5.1
}
fn default_max_consecutive_losses() -> u32 {
    2
}
fn default_multiplier_cap() -> u32 {
    12
}

impl Default for SizingParams {
    fn default() -> Self {
        Self {
            base_capital: default_base_capital(),
            max_consecutive_losses: default_max_consecutive_losses(),
            multiplier_cap: default_multiplier_cap(),
        }
    }
}

/// Capital multiplier keyed by pending-loss depth.
///
/// Key 11 is intentionally absent from the historical table; a lookup for
/// it falls back to 1. The gap is preserved as-is because the original
/// intent is unconfirmed.
fn multiplier_lookup(pending_losses: u32) -> u32 {
    match pending_losses {
        1 => 1,
        2 => 1,
        3 => 1,
        4 => 2,
        5 => 2,
        6 => 3,
        7 => 4,
        8 => 6,
        9 => 8,
        10 => 11,
        12 => 21,
        _ => 1,
    }
}

/// Derive the capital multiplier and recovery-trade count from the final
/// pending-loss depth.
pub fn size(pending_losses: u32, params: &SizingParams) -> SizingDecision {
    let cap = params.multiplier_cap;

    let recovery_trades = if pending_losses == 0 {
        0
    } else if pending_losses >= cap - 1 {
        pending_losses - (cap - 2)
    } else {
        1
    };

    let multiplier = if pending_losses == 0 {
        1
    } else if pending_losses > cap {
        21
    } else {
        multiplier_lookup(pending_losses)
    };

    SizingDecision {
        base_capital: params.base_capital,
        multiplier,
        recovery_trades,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decide(pending: u32) -> SizingDecision {
        size(pending, &SizingParams::default())
    }

    #[test]
    fn no_pending_losses_is_flat() {
        let d = decide(0);
        assert_eq!(d.multiplier, 1);
        assert_eq!(d.recovery_trades, 0);
        assert!((d.base_capital - 5.1).abs() < 1e-12);
    }

    #[test]
    fn shallow_debt_needs_one_recovery_trade() {
        let d = decide(2);
        assert_eq!(d.multiplier, 1);
        assert_eq!(d.recovery_trades, 1);
    }

    #[test]
    fn table_values_match_the_ladder() {
        let expected = [
            (1, 1),
            (2, 1),
            (3, 1),
            (4, 2),
            (5, 2),
            (6, 3),
            (7, 4),
            (8, 6),
            (9, 8),
            (10, 11),
            (12, 21),
        ];
        for (pending, multiplier) in expected {
            assert_eq!(decide(pending).multiplier, multiplier, "pending={pending}");
        }
    }

    #[test]
    fn key_eleven_gap_falls_back_to_one() {
        assert_eq!(decide(11).multiplier, 1);
    }

    #[test]
    fn beyond_the_cap_multiplier_is_fixed() {
        assert_eq!(decide(13).multiplier, 21);
        assert_eq!(decide(40).multiplier, 21);
    }

    #[test]
    fn deep_debt_grows_recovery_trades() {
        // pending >= cap-1 ⇒ recovery = pending - (cap - 2)
        assert_eq!(decide(11).recovery_trades, 1);
        assert_eq!(decide(12).recovery_trades, 2);
        assert_eq!(decide(15).recovery_trades, 5);
    }
}

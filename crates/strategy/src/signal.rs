use serde::{Deserialize, Serialize};

use common::{Bar, EntrySignal, IndicatorFrame, Side};

/// Risk-agnostic thresholds gating entry conditions, plus the bracket
/// geometry applied to each entry.
#[derive(Debug, Clone, Copy, Deserialize, Serialize)]
pub struct SignalParams {
    /// Volume must exceed its baseline by this factor.
    #[serde(default = "default_volume_threshold")]
    pub volume_threshold: f64,
    /// Minimum |close-to-close change|, in percent.
    #[serde(default = "default_momentum_threshold")]
    pub momentum_threshold: f64,
    /// Minimum |fast/slow EMA distance|, in percent.
    #[serde(default = "default_trend_strength_threshold")]
    pub trend_strength_threshold: f64,
    /// Stop-loss distance as a fraction of entry (0.01 = 1%).
    #[serde(default = "default_risk_pct")]
    pub risk_pct: f64,
    /// Take-profit distance = risk_pct * reward_ratio.
    #[serde(default = "default_reward_ratio")]
    pub reward_ratio: f64,
}

fn default_volume_threshold() -> f64 {
    1.5
}
fn default_momentum_threshold() -> f64 {
    0.1
}
fn default_trend_strength_threshold() -> f64 {
    0.05
}
fn default_risk_pct() -> f64 {
    0.01
}
fn default_reward_ratio() -> f64 {
    3.0
}

impl Default for SignalParams {
    fn default() -> Self {
        Self {
            volume_threshold: default_volume_threshold(),
            momentum_threshold: default_momentum_threshold(),
            trend_strength_threshold: default_trend_strength_threshold(),
            risk_pct: default_risk_pct(),
            reward_ratio: default_reward_ratio(),
        }
    }
}

/// Max fractional digits seen across open/high/low/close in the batch,
/// capped at 8. Bracket levels are rounded to this precision.
pub fn price_precision(bars: &[Bar]) -> u32 {
    bars.iter()
        .flat_map(|b| [b.open, b.high, b.low, b.close])
        .map(fraction_digits)
        .max()
        .unwrap_or(0)
        .min(8)
}

fn fraction_digits(value: f64) -> u32 {
    let text = format!("{value}");
    match text.split_once('.') {
        Some((_, frac)) => frac.len() as u32,
        None => 0,
    }
}

pub fn round_to(value: f64, digits: u32) -> f64 {
    let scale = 10f64.powi(digits as i32);
    (value * scale).round() / scale
}

fn long_condition(frame: &IndicatorFrame, params: &SignalParams) -> bool {
    match (
        frame.ema_fast,
        frame.ema_slow,
        frame.avg_volume,
        frame.momentum_pct,
        frame.trend_strength_pct,
    ) {
        (Some(fast), Some(slow), Some(avg_volume), Some(momentum), Some(trend)) => {
            let close = frame.bar.close;
            fast > slow
                && close > fast
                && close > slow
                && frame.bar.volume > avg_volume * params.volume_threshold
                && momentum.abs() > params.momentum_threshold
                && trend.abs() > params.trend_strength_threshold
        }
        _ => false,
    }
}

fn short_condition(frame: &IndicatorFrame, params: &SignalParams) -> bool {
    match (
        frame.ema_fast,
        frame.ema_slow,
        frame.avg_volume,
        frame.momentum_pct,
        frame.trend_strength_pct,
    ) {
        (Some(fast), Some(slow), Some(avg_volume), Some(momentum), Some(trend)) => {
            let close = frame.bar.close;
            fast < slow
                && close < fast
                && close < slow
                && frame.bar.volume > avg_volume * params.volume_threshold
                && momentum.abs() > params.momentum_threshold
                && trend.abs() > params.trend_strength_threshold
        }
        _ => false,
    }
}

/// Convert indicator frames into edge-triggered entry signals.
///
/// A signal fires only on a rising edge (`cond[i] && !cond[i-1]`; the first
/// frame never fires), and is suppressed when the immediately preceding bar
/// itself produced a signal. The cooldown is exactly one bar; suppression
/// while a trade is open belongs to the matcher, not here.
pub fn detect_signals(frames: &[IndicatorFrame], params: &SignalParams) -> Vec<EntrySignal> {
    let bars: Vec<Bar> = frames.iter().map(|f| f.bar.clone()).collect();
    let precision = price_precision(&bars);

    let mut signals = Vec::new();
    let mut fired_prev = false;

    for i in 1..frames.len() {
        let long_edge =
            long_condition(&frames[i], params) && !long_condition(&frames[i - 1], params);
        let short_edge =
            short_condition(&frames[i], params) && !short_condition(&frames[i - 1], params);

        let mut fired_here = false;
        if !fired_prev {
            let entry = frames[i].bar.close;
            if long_edge {
                signals.push(EntrySignal {
                    time: frames[i].bar.time,
                    side: Side::Long,
                    entry_price: entry,
                    stop_loss: round_to(entry * (1.0 - params.risk_pct), precision),
                    take_profit: round_to(
                        entry * (1.0 + params.risk_pct * params.reward_ratio),
                        precision,
                    ),
                });
                fired_here = true;
            } else if short_edge {
                signals.push(EntrySignal {
                    time: frames[i].bar.time,
                    side: Side::Short,
                    entry_price: entry,
                    stop_loss: round_to(entry * (1.0 + params.risk_pct), precision),
                    take_profit: round_to(
                        entry * (1.0 - params.risk_pct * params.reward_ratio),
                        precision,
                    ),
                });
                fired_here = true;
            }
        }
        fired_prev = fired_here;
    }

    signals
}

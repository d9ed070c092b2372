use serde::{Deserialize, Serialize};

use common::{Bar, Error, IndicatorFrame, Result};

use super::ema::{ema, sma};

/// Lookback periods for the derived series.
#[derive(Debug, Clone, Copy, Deserialize, Serialize)]
pub struct IndicatorParams {
    #[serde(default = "default_ema_fast")]
    pub ema_fast: usize,
    #[serde(default = "default_ema_slow")]
    pub ema_slow: usize,
    #[serde(default = "default_volume_period")]
    pub volume_period: usize,
}

fn default_ema_fast() -> usize {
    9
}
fn default_ema_slow() -> usize {
    21
}
fn default_volume_period() -> usize {
    20
}

impl Default for IndicatorParams {
    fn default() -> Self {
        Self {
            ema_fast: default_ema_fast(),
            ema_slow: default_ema_slow(),
            volume_period: default_volume_period(),
        }
    }
}

impl IndicatorParams {
    /// Longest lookback across all series; a batch shorter than this has
    /// no fully-defined frame.
    pub fn longest_lookback(&self) -> usize {
        self.ema_fast.max(self.ema_slow).max(self.volume_period)
    }

    /// Number of leading frames excluded from signal evaluation on a cold
    /// start.
    pub fn warmup(&self) -> usize {
        self.longest_lookback() - 1
    }

    pub fn validate(&self) -> Result<()> {
        if self.ema_fast < 2 || self.ema_slow < 2 || self.volume_period < 1 {
            return Err(Error::Config(format!(
                "indicator periods out of range: fast={} slow={} volume={}",
                self.ema_fast, self.ema_slow, self.volume_period
            )));
        }
        if self.ema_fast >= self.ema_slow {
            return Err(Error::Config(format!(
                "ema_fast ({}) must be shorter than ema_slow ({})",
                self.ema_fast, self.ema_slow
            )));
        }
        Ok(())
    }
}

/// Compute one `IndicatorFrame` per bar over the ordered series.
///
/// Errors with `InsufficientHistory` when the batch is shorter than the
/// longest lookback; callers treat that as "no signals this cycle".
pub fn compute_frames(bars: &[Bar], params: &IndicatorParams) -> Result<Vec<IndicatorFrame>> {
    let required = params.longest_lookback();
    if bars.len() < required {
        return Err(Error::InsufficientHistory {
            required,
            got: bars.len(),
        });
    }

    let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
    let volumes: Vec<f64> = bars.iter().map(|b| b.volume).collect();

    let fast = ema(&closes, params.ema_fast);
    let slow = ema(&closes, params.ema_slow);
    let avg_volume = sma(&volumes, params.volume_period);

    let frames = bars
        .iter()
        .enumerate()
        .map(|(i, bar)| {
            let momentum_pct = (i > 0)
                .then(|| (bar.close - closes[i - 1]) / closes[i - 1] * 100.0);
            let trend_strength_pct = match (fast[i], slow[i]) {
                (Some(f), Some(s)) => Some((f - s) / s * 100.0),
                _ => None,
            };
            IndicatorFrame {
                bar: bar.clone(),
                ema_fast: fast[i],
                ema_slow: slow[i],
                avg_volume: avg_volume[i],
                momentum_pct,
                trend_strength_pct,
            }
        })
        .collect();

    Ok(frames)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDateTime;

    fn bar(minute: u32, close: f64, volume: f64) -> Bar {
        let time = NaiveDateTime::parse_from_str(
            &format!("2024-01-01 00:{minute:02}:00"),
            "%Y-%m-%d %H:%M:%S",
        )
        .unwrap();
        Bar {
            time,
            open: close,
            high: close,
            low: close,
            close,
            volume,
        }
    }

    fn bars(n: usize) -> Vec<Bar> {
        (0..n)
            .map(|i| bar(i as u32, 100.0 + i as f64, 10.0))
            .collect()
    }

    #[test]
    fn warmup_prefix_equals_longest_lookback_minus_one() {
        let params = IndicatorParams {
            ema_fast: 3,
            ema_slow: 5,
            volume_period: 4,
        };
        assert_eq!(params.warmup(), 4);

        let frames = compute_frames(&bars(10), &params).unwrap();
        for frame in &frames[..params.warmup()] {
            assert!(
                frame.ema_fast.is_none()
                    || frame.ema_slow.is_none()
                    || frame.avg_volume.is_none(),
                "frame inside warmup must have an undefined series"
            );
        }
        for frame in &frames[params.warmup()..] {
            assert!(frame.ema_fast.is_some());
            assert!(frame.ema_slow.is_some());
            assert!(frame.avg_volume.is_some());
            assert!(frame.trend_strength_pct.is_some());
        }
    }

    #[test]
    fn short_batch_is_insufficient_history() {
        let params = IndicatorParams::default();
        let err = compute_frames(&bars(5), &params).unwrap_err();
        assert!(matches!(
            err,
            Error::InsufficientHistory { required: 21, got: 5 }
        ));
    }

    #[test]
    fn momentum_is_close_to_close_change() {
        let params = IndicatorParams {
            ema_fast: 2,
            ema_slow: 3,
            volume_period: 2,
        };
        let series = vec![bar(0, 100.0, 1.0), bar(1, 102.0, 1.0), bar(2, 51.0, 1.0)];
        let frames = compute_frames(&series, &params).unwrap();
        assert_eq!(frames[0].momentum_pct, None);
        assert!((frames[1].momentum_pct.unwrap() - 2.0).abs() < 1e-9);
        assert!((frames[2].momentum_pct.unwrap() + 50.0).abs() < 1e-9);
    }

    #[test]
    fn fast_slower_than_slow_is_rejected() {
        let params = IndicatorParams {
            ema_fast: 21,
            ema_slow: 9,
            volume_period: 20,
        };
        assert!(params.validate().is_err());
    }
}

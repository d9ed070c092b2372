use chrono::{Duration, NaiveDateTime};
use proptest::prelude::*;

use common::Bar;
use strategy::{compute_frames, detect_signals, IndicatorParams, SignalParams};

fn time(minute: usize) -> NaiveDateTime {
    NaiveDateTime::parse_from_str(
        &format!("2024-01-01 {:02}:{:02}:00", minute / 60, minute % 60),
        "%Y-%m-%d %H:%M:%S",
    )
    .unwrap()
}

fn build_bars(steps: &[(f64, f64)]) -> Vec<Bar> {
    let mut price = 100.0f64;
    steps
        .iter()
        .enumerate()
        .map(|(i, (step, volume))| {
            price = (price + step).max(10.0);
            Bar {
                time: time(i),
                open: price,
                high: price + step.abs() * 0.5 + 0.1,
                low: price - step.abs() * 0.5 - 0.1,
                close: price,
                volume: *volume,
            }
        })
        .collect()
}

fn params() -> IndicatorParams {
    IndicatorParams {
        ema_fast: 3,
        ema_slow: 5,
        volume_period: 4,
    }
}

proptest! {
    /// The one-bar cooldown holds on arbitrary series: no two signals on
    /// adjacent bars, and signal times are strictly increasing.
    #[test]
    fn signals_never_fire_on_adjacent_bars(
        steps in proptest::collection::vec((-3.0f64..3.0, 1.0f64..30.0), 10..40)
    ) {
        let bars = build_bars(&steps);
        let frames = compute_frames(&bars, &params()).unwrap();
        let signals = detect_signals(&frames, &SignalParams::default());

        for pair in signals.windows(2) {
            prop_assert!(pair[1].time - pair[0].time >= Duration::minutes(2));
        }
    }

    /// Signals can only come from frames whose indicators are all defined,
    /// so nothing fires inside the warmup prefix.
    #[test]
    fn no_signal_inside_warmup_prefix(
        steps in proptest::collection::vec((-3.0f64..3.0, 1.0f64..30.0), 10..40)
    ) {
        let bars = build_bars(&steps);
        let p = params();
        let frames = compute_frames(&bars, &p).unwrap();
        let signals = detect_signals(&frames, &SignalParams::default());

        let boundary = bars[p.warmup()].time;
        for signal in &signals {
            prop_assert!(signal.time >= boundary);
        }
    }
}

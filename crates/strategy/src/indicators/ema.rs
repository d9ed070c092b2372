/// Simple moving average over a fixed window.
/// The first `period - 1` slots are `None`.
pub fn sma(values: &[f64], period: usize) -> Vec<Option<f64>> {
    assert!(period >= 1, "SMA period must be >= 1");
    let mut out = vec![None; values.len()];
    let mut window_sum = 0.0;
    for (i, &v) in values.iter().enumerate() {
        window_sum += v;
        if i >= period {
            window_sum -= values[i - period];
        }
        if i + 1 >= period {
            out[i] = Some(window_sum / period as f64);
        }
    }
    out
}

/// Exponential moving average, SMA-seeded, `alpha = 2 / (period + 1)`.
/// The first `period - 1` slots are `None`.
pub fn ema(values: &[f64], period: usize) -> Vec<Option<f64>> {
    assert!(period >= 1, "EMA period must be >= 1");
    let mut out = vec![None; values.len()];
    if values.len() < period {
        return out;
    }

    let alpha = 2.0 / (period as f64 + 1.0);
    let seed = values[..period].iter().sum::<f64>() / period as f64;
    out[period - 1] = Some(seed);

    let mut prev = seed;
    for i in period..values.len() {
        prev = values[i] * alpha + prev * (1.0 - alpha);
        out[i] = Some(prev);
    }
    out
}

//! Descriptive statistics over plain slices.

/// Arithmetic mean; NaN for an empty slice.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Sample variance (n - 1 denominator); NaN below two values.
pub fn variance(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return f64::NAN;
    }
    let m = mean(values);
    values.iter().map(|x| (x - m).powi(2)).sum::<f64>() / (values.len() - 1) as f64
}

pub fn std_dev(values: &[f64]) -> f64 {
    variance(values).sqrt()
}

/// Median; NaN for an empty slice.
pub fn median(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let n = sorted.len();
    if n % 2 == 0 {
        (sorted[n / 2 - 1] + sorted[n / 2]) / 2.0
    } else {
        sorted[n / 2]
    }
}

/// Sample autocorrelation at `lag`. Zero for a constant series.
pub fn autocorrelation(values: &[f64], lag: usize) -> f64 {
    let n = values.len();
    if n <= lag {
        return f64::NAN;
    }
    let m = mean(values);
    let denominator: f64 = values.iter().map(|x| (x - m).powi(2)).sum();
    if denominator == 0.0 {
        return 0.0;
    }
    let numerator: f64 = values[lag..]
        .iter()
        .zip(values)
        .map(|(a, b)| (a - m) * (b - m))
        .sum();
    numerator / denominator
}

/// Autocorrelations for lags `1..=max_lag` (truncated to the series length).
pub fn acf(values: &[f64], max_lag: usize) -> Vec<f64> {
    let max_lag = max_lag.min(values.len().saturating_sub(1));
    (1..=max_lag).map(|k| autocorrelation(values, k)).collect()
}

/// True when the values vary by less than a relative tolerance.
pub fn is_constant(values: &[f64]) -> bool {
    let (lo, hi) = values
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &x| {
            (lo.min(x), hi.max(x))
        });
    hi - lo <= 1e-10 * hi.abs().max(lo.abs()).max(1.0)
}

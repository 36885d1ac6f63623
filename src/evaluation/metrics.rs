//! Point-forecast accuracy metrics.

use crate::error::{ForecastError, Result};
use tracing::warn;

/// How MAPE treats actual values of zero.
///
/// Ridership drops to zero in quiet intervals, where a relative error has no
/// meaning. MAPE never evaluates to infinity under any policy.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum MapePolicy {
    /// Leave zero actuals out of the average; NaN if every actual is zero.
    #[default]
    SkipZeros,
    /// Divide by `max(|actual|, floor)`.
    Floor(f64),
    /// NaN as soon as any actual is zero.
    Strict,
}

/// Accuracy of predictions against actuals.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AccuracyMetrics {
    /// Mean Absolute Error
    pub mae: f64,
    /// Mean Absolute Percentage Error, in percent
    pub mape: f64,
    /// Root Mean Squared Error
    pub rmse: f64,
    /// Points left out of the MAPE average.
    pub mape_excluded: usize,
    /// Number of compared points.
    pub n: usize,
}

/// Compare `predicted` against `actual`.
///
/// # Example
/// ```
/// use ridership_forecast::evaluation::{evaluate, MapePolicy};
///
/// let m = evaluate(&[10.0, 20.0, 0.0], &[12.0, 18.0, 1.0], MapePolicy::SkipZeros).unwrap();
/// assert!((m.mae - 5.0 / 3.0).abs() < 1e-12);
/// assert!((m.mape - 15.0).abs() < 1e-12);
/// assert_eq!(m.mape_excluded, 1);
/// ```
pub fn evaluate(actual: &[f64], predicted: &[f64], policy: MapePolicy) -> Result<AccuracyMetrics> {
    if actual.is_empty() || predicted.is_empty() {
        return Err(ForecastError::EmptyData);
    }
    if actual.len() != predicted.len() {
        return Err(ForecastError::DimensionMismatch {
            expected: actual.len(),
            got: predicted.len(),
        });
    }
    if actual.iter().chain(predicted).any(|v| !v.is_finite()) {
        return Err(ForecastError::MissingValues);
    }
    if let MapePolicy::Floor(f) = policy {
        if f.is_nan() || f <= 0.0 {
            return Err(ForecastError::InvalidParameter(format!(
                "MAPE floor must be positive, got {f}"
            )));
        }
    }

    let n = actual.len();
    let (abs_sum, sq_sum) = actual
        .iter()
        .zip(predicted)
        .fold((0.0, 0.0), |(abs, sq), (a, p)| {
            let e = p - a;
            (abs + e.abs(), sq + e * e)
        });

    let (mape, mape_excluded) = mape(actual, predicted, policy);
    if mape_excluded > 0 {
        warn!(excluded = mape_excluded, total = n, "zero actuals left out of MAPE");
    }

    Ok(AccuracyMetrics {
        mae: abs_sum / n as f64,
        mape,
        rmse: (sq_sum / n as f64).sqrt(),
        mape_excluded,
        n,
    })
}

fn mape(actual: &[f64], predicted: &[f64], policy: MapePolicy) -> (f64, usize) {
    let pairs = actual.iter().zip(predicted);
    match policy {
        MapePolicy::SkipZeros => {
            let (sum, used) = pairs
                .filter(|(a, _)| **a != 0.0)
                .fold((0.0, 0usize), |(s, k), (a, p)| (s + ((p - a) / a).abs(), k + 1));
            let excluded = actual.len() - used;
            if used == 0 {
                (f64::NAN, excluded)
            } else {
                (100.0 * sum / used as f64, excluded)
            }
        }
        MapePolicy::Floor(f) => {
            let sum: f64 = pairs.map(|(a, p)| (p - a).abs() / a.abs().max(f)).sum();
            (100.0 * sum / actual.len() as f64, 0)
        }
        MapePolicy::Strict => {
            if actual.contains(&0.0) {
                (f64::NAN, 0)
            } else {
                let sum: f64 = pairs.map(|(a, p)| ((p - a) / a).abs()).sum();
                (100.0 * sum / actual.len() as f64, 0)
            }
        }
    }
}

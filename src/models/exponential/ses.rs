//! Simple exponential smoothing, the ETS(A,N,N) model.

use crate::core::{Forecast, TimeSeries};
use crate::error::{ForecastError, Result};
use crate::models::traits::{check_trainable, residuals_of, FittedModel, Forecaster};
use crate::utils::optimization::{nelder_mead, NelderMeadConfig};

const ALPHA_BOUNDS: (f64, f64) = (0.0001, 0.9999);

/// Smoothed state of a series under `level_t = alpha * y_t + (1 - alpha) * level_{t-1}`.
///
/// The initial level is the first observation, so the first fitted value
/// equals the first actual.
#[derive(Debug, Clone)]
pub struct SmoothedLevel {
    pub alpha: f64,
    /// Level after the last observation; the flat forecast.
    pub level: f64,
    /// One-step predictions, `fitted[t] = level_{t-1}`.
    pub fitted: Vec<f64>,
    pub sse: f64,
}

impl SmoothedLevel {
    /// Smooth `values` with `alpha`, or with the SSE-minimising alpha when `None`.
    ///
    /// A constant input is accepted here and yields a flat level.
    pub fn estimate(values: &[f64], alpha: Option<f64>) -> Result<Self> {
        if values.is_empty() {
            return Err(ForecastError::EmptyData);
        }
        if values.iter().any(|v| !v.is_finite()) {
            return Err(ForecastError::MissingValues);
        }
        if values.len() < 2 {
            return Err(ForecastError::InsufficientData {
                needed: 2,
                got: values.len(),
            });
        }
        let alpha = match alpha {
            Some(a) => a.clamp(ALPHA_BOUNDS.0, ALPHA_BOUNDS.1),
            None => optimize_alpha(values),
        };
        Ok(Self::smooth(values, alpha))
    }

    fn smooth(values: &[f64], alpha: f64) -> Self {
        let mut level = values[0];
        let mut fitted = Vec::with_capacity(values.len());
        let mut sse = 0.0;

        for &y in values {
            fitted.push(level);
            sse += (y - level).powi(2);
            level = alpha * y + (1.0 - alpha) * level;
        }

        Self {
            alpha,
            level,
            fitted,
            sse,
        }
    }
}

fn sse(values: &[f64], alpha: f64) -> f64 {
    let mut level = values[0];
    let mut sse = 0.0;
    for &y in &values[1..] {
        sse += (y - level).powi(2);
        level = alpha * y + (1.0 - alpha) * level;
    }
    sse
}

fn optimize_alpha(values: &[f64]) -> f64 {
    let result = nelder_mead(
        |params| sse(values, params[0]),
        &[0.5],
        Some(&[ALPHA_BOUNDS]),
        NelderMeadConfig::default().with_max_iter(500),
    );
    result.optimal_point[0].clamp(ALPHA_BOUNDS.0, ALPHA_BOUNDS.1)
}

/// Simple exponential smoothing estimator.
///
/// # Example
/// ```
/// use ridership_forecast::core::TimeSeries;
/// use ridership_forecast::models::{Forecaster, SimpleExponentialSmoothing};
/// use chrono::{Duration, TimeZone, Utc};
///
/// let base = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
/// let timestamps: Vec<_> = (0..10).map(|i| base + Duration::hours(i)).collect();
/// let values = vec![10.0, 12.0, 11.0, 13.0, 12.0, 14.0, 13.0, 15.0, 14.0, 16.0];
/// let ts = TimeSeries::univariate(timestamps, values).unwrap();
///
/// let fitted = SimpleExponentialSmoothing::new().fit(&ts).unwrap();
/// let forecast = fitted.forecast(3).unwrap();
/// assert_eq!(forecast.horizon(), 3);
/// ```
#[derive(Debug, Clone, Default)]
pub struct SimpleExponentialSmoothing {
    alpha: Option<f64>,
}

impl SimpleExponentialSmoothing {
    /// Estimator that optimises alpha.
    pub fn new() -> Self {
        Self { alpha: None }
    }

    /// Estimator with a fixed smoothing parameter.
    pub fn with_alpha(alpha: f64) -> Self {
        Self { alpha: Some(alpha) }
    }
}

impl Forecaster for SimpleExponentialSmoothing {
    fn fit(&self, series: &TimeSeries) -> Result<Box<dyn FittedModel>> {
        check_trainable(series.values(), 2)?;
        let state = SmoothedLevel::estimate(series.values(), self.alpha)?;
        let residuals = residuals_of(series.values(), &state.fitted);
        Ok(Box::new(FittedSES { state, residuals }))
    }

    fn name(&self) -> &str {
        "SES"
    }
}

/// SES fitted to a series.
#[derive(Debug, Clone)]
pub struct FittedSES {
    state: SmoothedLevel,
    residuals: Vec<f64>,
}

impl FittedSES {
    pub fn alpha(&self) -> f64 {
        self.state.alpha
    }

    pub fn level(&self) -> f64 {
        self.state.level
    }
}

impl FittedModel for FittedSES {
    fn fitted_values(&self) -> &[f64] {
        &self.state.fitted
    }

    fn residuals(&self) -> &[f64] {
        &self.residuals
    }

    fn forecast(&self, horizon: usize) -> Result<Forecast> {
        Ok(Forecast::from_values(vec![self.state.level; horizon]))
    }

    fn warmup(&self) -> usize {
        1
    }

    fn num_params(&self) -> usize {
        1
    }

    fn description(&self) -> String {
        format!("ETS(A,N,N) alpha={:.4}", self.state.alpha)
    }
}

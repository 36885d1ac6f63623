//! STL decomposition followed by exponential smoothing of the adjusted series.
//!
//! The seasonal component is removed with [`STL`], the remaining
//! trend + remainder is forecast with ETS(A,N,N), and the last estimated
//! seasonal cycle is added back, repeated over the horizon.

use crate::core::{Forecast, TimeSeries};
use crate::error::Result;
use crate::models::exponential::SmoothedLevel;
use crate::models::traits::{check_trainable, residuals_of, FittedModel, Forecaster};
use crate::seasonality::{STLResult, SeasonalWindow, STL};
use tracing::debug;

/// STL + ETS(A,N,N) estimator.
///
/// # Example
/// ```
/// use ridership_forecast::core::TimeSeries;
/// use ridership_forecast::models::{Forecaster, STLETSForecaster};
/// use chrono::{Duration, TimeZone, Utc};
///
/// let base = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
/// let timestamps: Vec<_> = (0..48).map(|i| base + Duration::hours(i)).collect();
/// let values: Vec<f64> = (0..48).map(|i| 10.0 + [0.0, 5.0, 9.0, 5.0][i % 4]).collect();
/// let ts = TimeSeries::univariate(timestamps, values).unwrap();
///
/// let fitted = STLETSForecaster::new(4).fit(&ts).unwrap();
/// let forecast = fitted.forecast(4).unwrap();
/// assert!((forecast.values()[2] - forecast.values()[0] - 9.0).abs() < 0.5);
/// ```
#[derive(Debug, Clone)]
pub struct STLETSForecaster {
    period: usize,
    window: SeasonalWindow,
    alpha: Option<f64>,
}

impl STLETSForecaster {
    /// Estimator for the given seasonal period, periodic window, optimised alpha.
    pub fn new(period: usize) -> Self {
        Self {
            period,
            window: SeasonalWindow::Periodic,
            alpha: None,
        }
    }

    pub fn with_window(mut self, window: SeasonalWindow) -> Self {
        self.window = window;
        self
    }

    /// Fix the smoothing parameter instead of optimising it.
    pub fn with_alpha(mut self, alpha: f64) -> Self {
        self.alpha = Some(alpha);
        self
    }

    pub fn period(&self) -> usize {
        self.period
    }
}

impl Forecaster for STLETSForecaster {
    fn fit(&self, series: &TimeSeries) -> Result<Box<dyn FittedModel>> {
        let values = series.values();
        check_trainable(values, 2 * self.period)?;

        let decomposition = STL::new(self.period)
            .with_window(self.window)
            .decompose(values)?;
        let adjusted = decomposition.seasonally_adjusted();
        let level = SmoothedLevel::estimate(&adjusted, self.alpha)?;

        let fitted: Vec<f64> = level
            .fitted
            .iter()
            .zip(&decomposition.seasonal)
            .map(|(l, s)| l + s)
            .collect();
        let residuals = residuals_of(values, &fitted);

        debug!(
            period = self.period,
            alpha = level.alpha,
            seasonal_strength = decomposition.seasonal_strength(),
            "fitted STL+ETS"
        );

        Ok(Box::new(FittedSTLETS {
            decomposition,
            level,
            fitted,
            residuals,
            window: self.window,
        }))
    }

    fn name(&self) -> &str {
        "STL+ETS"
    }
}

/// STL + ETS fitted to a series.
#[derive(Debug, Clone)]
pub struct FittedSTLETS {
    decomposition: STLResult,
    level: SmoothedLevel,
    fitted: Vec<f64>,
    residuals: Vec<f64>,
    window: SeasonalWindow,
}

impl FittedSTLETS {
    pub fn decomposition(&self) -> &STLResult {
        &self.decomposition
    }

    pub fn alpha(&self) -> f64 {
        self.level.alpha
    }
}

impl FittedModel for FittedSTLETS {
    fn fitted_values(&self) -> &[f64] {
        &self.fitted
    }

    fn residuals(&self) -> &[f64] {
        &self.residuals
    }

    fn forecast(&self, horizon: usize) -> Result<Forecast> {
        let cycle = self.decomposition.last_cycle();
        let values = (0..horizon)
            .map(|h| self.level.level + cycle[h % cycle.len()])
            .collect();
        Ok(Forecast::from_values(values))
    }

    fn warmup(&self) -> usize {
        1
    }

    fn num_params(&self) -> usize {
        // alpha plus one seasonal value per position (one is pinned by centring)
        self.decomposition.period
    }

    fn description(&self) -> String {
        let window = match self.window {
            SeasonalWindow::Periodic => "periodic".to_string(),
            SeasonalWindow::Span(s) => format!("span={s}"),
        };
        format!(
            "STL({window}, period={}) + ETS(A,N,N) alpha={:.4}",
            self.decomposition.period, self.level.alpha
        )
    }
}

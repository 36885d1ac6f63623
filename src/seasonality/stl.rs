//! STL (Seasonal-Trend decomposition using LOESS).
//!
//! Splits a series into trend, seasonal and remainder components so that
//! `trend + seasonal + remainder` reproduces the input at every index.

use crate::error::{ForecastError, Result};
use crate::utils::stats::variance;

/// How the cycle-subseries are smoothed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SeasonalWindow {
    /// Every cycle-subseries collapses to its mean: the seasonal pattern is
    /// identical in every period.
    #[default]
    Periodic,
    /// LOESS over each cycle-subseries with this span (forced odd), letting
    /// the pattern drift slowly.
    Span(usize),
}

/// Trend, seasonal and remainder components of equal length.
#[derive(Debug, Clone)]
pub struct STLResult {
    pub trend: Vec<f64>,
    pub seasonal: Vec<f64>,
    pub remainder: Vec<f64>,
    pub period: usize,
}

impl STLResult {
    /// Strength of seasonality in `[0, 1]`: `1 - Var(R) / Var(S + R)`.
    pub fn seasonal_strength(&self) -> f64 {
        strength(&self.seasonal, &self.remainder)
    }

    /// Strength of trend in `[0, 1]`: `1 - Var(R) / Var(T + R)`.
    pub fn trend_strength(&self) -> f64 {
        strength(&self.trend, &self.remainder)
    }

    /// Series with the seasonal component removed.
    pub fn seasonally_adjusted(&self) -> Vec<f64> {
        self.trend
            .iter()
            .zip(&self.remainder)
            .map(|(t, r)| t + r)
            .collect()
    }

    /// The final `period` seasonal values, in time order.
    pub fn last_cycle(&self) -> &[f64] {
        &self.seasonal[self.seasonal.len() - self.period..]
    }

    pub fn len(&self) -> usize {
        self.trend.len()
    }

    pub fn is_empty(&self) -> bool {
        self.trend.is_empty()
    }
}

fn strength(component: &[f64], remainder: &[f64]) -> f64 {
    let combined: Vec<f64> = component.iter().zip(remainder).map(|(c, r)| c + r).collect();
    let var_combined = variance(&combined);
    if var_combined.is_nan() || var_combined <= 1e-10 {
        return 0.0;
    }
    (1.0 - variance(remainder) / var_combined).clamp(0.0, 1.0)
}

/// STL decomposer.
///
/// # Example
/// ```
/// use ridership_forecast::seasonality::{SeasonalWindow, STL};
///
/// let series: Vec<f64> = (0..84).map(|i| (i % 7) as f64 + 0.1 * i as f64).collect();
/// let stl = STL::new(7).with_window(SeasonalWindow::Periodic);
/// let parts = stl.decompose(&series).unwrap();
///
/// assert_eq!(parts.seasonal[0], parts.seasonal[7]);
/// for i in 0..series.len() {
///     let sum = parts.trend[i] + parts.seasonal[i] + parts.remainder[i];
///     assert!((sum - series[i]).abs() < 1e-9);
/// }
/// ```
#[derive(Debug, Clone)]
pub struct STL {
    period: usize,
    window: SeasonalWindow,
    trend_span: usize,
    low_pass_span: usize,
    inner_iterations: usize,
    outer_iterations: usize,
}

impl STL {
    /// Decomposer for `period` with a periodic seasonal window and the usual
    /// Cleveland et al. spans for trend and low-pass smoothing.
    pub fn new(period: usize) -> Self {
        let p = period.max(2) as f64;
        // Seasonal span of a periodic fit is effectively infinite (10p + 1).
        let trend_span = (1.5 * p / (1.0 - 1.5 / (10.0 * p + 1.0))).ceil() as usize;

        Self {
            period,
            window: SeasonalWindow::Periodic,
            trend_span: trend_span | 1,
            low_pass_span: period | 1,
            inner_iterations: 2,
            outer_iterations: 0,
        }
    }

    pub fn with_window(mut self, window: SeasonalWindow) -> Self {
        self.window = match window {
            SeasonalWindow::Span(s) => SeasonalWindow::Span(s.max(3) | 1),
            w => w,
        };
        self
    }

    /// Override the trend LOESS span (forced odd).
    pub fn with_trend_span(mut self, span: usize) -> Self {
        self.trend_span = span.max(3) | 1;
        self
    }

    pub fn with_inner_iterations(mut self, n: usize) -> Self {
        self.inner_iterations = n.max(1);
        self
    }

    /// Robustness iterations with bisquare weights; 0 disables them.
    pub fn robust(mut self, outer_iterations: usize) -> Self {
        self.outer_iterations = outer_iterations;
        self
    }

    pub fn period(&self) -> usize {
        self.period
    }

    pub fn window(&self) -> SeasonalWindow {
        self.window
    }

    /// Decompose `series`; needs at least two full periods of finite values.
    pub fn decompose(&self, series: &[f64]) -> Result<STLResult> {
        let n = series.len();
        if self.period < 2 {
            return Err(ForecastError::InvalidParameter(format!(
                "seasonal period must be at least 2, got {}",
                self.period
            )));
        }
        if n < 2 * self.period {
            return Err(ForecastError::InsufficientData {
                needed: 2 * self.period,
                got: n,
            });
        }
        if series.iter().any(|v| !v.is_finite()) {
            return Err(ForecastError::MissingValues);
        }

        let mut weights = vec![1.0; n];
        let mut seasonal = vec![0.0; n];
        let mut trend = loess(series, self.trend_span, &weights);

        for outer in 0..=self.outer_iterations {
            for _ in 0..self.inner_iterations {
                let detrended: Vec<f64> = series.iter().zip(&trend).map(|(y, t)| y - t).collect();
                seasonal = self.seasonal_component(&detrended, &weights);

                let adjusted: Vec<f64> = series.iter().zip(&seasonal).map(|(y, s)| y - s).collect();
                trend = loess(&adjusted, self.trend_span, &weights);
            }

            if outer < self.outer_iterations {
                let remainder: Vec<f64> = (0..n).map(|i| series[i] - seasonal[i] - trend[i]).collect();
                weights = bisquare_weights(&remainder);
            }
        }

        let remainder = (0..n).map(|i| series[i] - seasonal[i] - trend[i]).collect();

        Ok(STLResult {
            trend,
            seasonal,
            remainder,
            period: self.period,
        })
    }

    fn seasonal_component(&self, detrended: &[f64], weights: &[f64]) -> Vec<f64> {
        match self.window {
            SeasonalWindow::Periodic => self.periodic_component(detrended, weights),
            SeasonalWindow::Span(span) => {
                let cycles = self.smooth_subseries(detrended, weights, span);
                let low_pass = self.low_pass(&cycles);
                cycles.iter().zip(&low_pass).map(|(c, l)| c - l).collect()
            }
        }
    }

    /// Weighted mean per cycle position, centred so one cycle sums to zero.
    fn periodic_component(&self, detrended: &[f64], weights: &[f64]) -> Vec<f64> {
        let p = self.period;
        let mut sums = vec![0.0; p];
        let mut totals = vec![0.0; p];
        for (i, (&v, &w)) in detrended.iter().zip(weights).enumerate() {
            sums[i % p] += w * v;
            totals[i % p] += w;
        }

        let mut cycle: Vec<f64> = sums
            .iter()
            .zip(&totals)
            .map(|(s, t)| if *t > 0.0 { s / t } else { 0.0 })
            .collect();
        let level = cycle.iter().sum::<f64>() / p as f64;
        cycle.iter_mut().for_each(|c| *c -= level);

        (0..detrended.len()).map(|i| cycle[i % p]).collect()
    }

    fn smooth_subseries(&self, detrended: &[f64], weights: &[f64], span: usize) -> Vec<f64> {
        let p = self.period;
        let mut out = vec![0.0; detrended.len()];
        for pos in 0..p {
            let idx: Vec<usize> = (pos..detrended.len()).step_by(p).collect();
            let values: Vec<f64> = idx.iter().map(|&i| detrended[i]).collect();
            let w: Vec<f64> = idx.iter().map(|&i| weights[i]).collect();
            for (&i, s) in idx.iter().zip(loess(&values, span, &w)) {
                out[i] = s;
            }
        }
        out
    }

    /// MA(p), MA(p), MA(3), then LOESS: removes the level that leaked into the cycles.
    fn low_pass(&self, cycles: &[f64]) -> Vec<f64> {
        let smoothed = moving_average(&moving_average(&moving_average(cycles, self.period), self.period), 3);
        loess(&smoothed, self.low_pass_span, &vec![1.0; cycles.len()])
    }
}

impl Default for STL {
    fn default() -> Self {
        Self::new(crate::data::INTERVALS_PER_DAY)
    }
}

fn moving_average(values: &[f64], window: usize) -> Vec<f64> {
    let n = values.len();
    let half = window / 2;
    (0..n)
        .map(|i| {
            let lo = i.saturating_sub(half);
            let hi = (i + half + 1).min(n);
            values[lo..hi].iter().sum::<f64>() / (hi - lo) as f64
        })
        .collect()
}

/// Local linear LOESS with tricube kernel and external robustness weights.
///
/// Falls back to the weighted mean when the local design is singular.
fn loess(values: &[f64], span: usize, weights: &[f64]) -> Vec<f64> {
    let n = values.len();
    let half = span / 2;
    let mut out = vec![0.0; n];

    for i in 0..n {
        let lo = i.saturating_sub(half);
        let hi = (i + half + 1).min(n);
        let radius = (half + 1) as f64;

        let (mut sw, mut sx, mut sy, mut sxx, mut sxy) = (0.0, 0.0, 0.0, 0.0, 0.0);
        for j in lo..hi {
            let x = j as f64 - i as f64;
            let u = x.abs() / radius;
            let w = (1.0 - u.powi(3)).powi(3) * weights[j];
            sw += w;
            sx += w * x;
            sy += w * values[j];
            sxx += w * x * x;
            sxy += w * x * values[j];
        }

        out[i] = if sw <= 0.0 {
            values[i]
        } else {
            let mean_x = sx / sw;
            let mean_y = sy / sw;
            let sxx_c = sxx - sw * mean_x * mean_x;
            if sxx_c.abs() < 1e-12 {
                mean_y
            } else {
                let slope = (sxy - sw * mean_x * mean_y) / sxx_c;
                // Evaluated at x = 0, the target point.
                mean_y - slope * mean_x
            }
        };
    }

    out
}

fn bisquare_weights(remainder: &[f64]) -> Vec<f64> {
    let abs: Vec<f64> = remainder.iter().map(|r| r.abs()).collect();
    let h = 6.0 * crate::utils::stats::median(&abs);
    if h.is_nan() || h <= 1e-10 {
        return vec![1.0; remainder.len()];
    }
    abs.iter()
        .map(|a| {
            let u = a / h;
            if u < 1.0 {
                (1.0 - u * u).powi(2)
            } else {
                0.0
            }
        })
        .collect()
}

//! Fixed-frequency time series used throughout the pipeline.

use crate::error::{ForecastError, Result};
use chrono::{DateTime, Datelike, Duration, Utc, Weekday};
use std::collections::HashMap;

/// Policy for handling missing values (NaN/Inf).
///
/// Dropping observations is deliberately not offered: it would break the
/// fixed number of intervals per period that seasonal routines rely on.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum MissingValuePolicy {
    /// Return an error if missing values are found.
    #[default]
    Error,
    /// Fill with a specific value.
    Fill(f64),
    /// Forward fill (use previous valid value).
    ForwardFill,
    /// Linear interpolation between neighbouring valid values, edges held flat.
    Interpolate,
}

/// A univariate time series with an associated seasonal period.
///
/// `period` is the number of consecutive observations that make up one
/// seasonal cycle (63 fifteen-minute intervals per service day for the
/// ridership data).
#[derive(Debug, Clone)]
pub struct TimeSeries {
    timestamps: Vec<DateTime<Utc>>,
    values: Vec<f64>,
    period: usize,
    frequency: Option<Duration>,
    label: Option<String>,
}

/// Builder for constructing TimeSeries.
#[derive(Debug, Clone, Default)]
pub struct TimeSeriesBuilder {
    timestamps: Vec<DateTime<Utc>>,
    values: Vec<f64>,
    period: Option<usize>,
    frequency: Option<Duration>,
    label: Option<String>,
}

impl TimeSeriesBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn timestamps(mut self, timestamps: Vec<DateTime<Utc>>) -> Self {
        self.timestamps = timestamps;
        self
    }

    pub fn values(mut self, values: Vec<f64>) -> Self {
        self.values = values;
        self
    }

    /// Set the number of observations per seasonal cycle.
    pub fn period(mut self, period: usize) -> Self {
        self.period = Some(period);
        self
    }

    pub fn frequency(mut self, freq: Duration) -> Self {
        self.frequency = Some(freq);
        self
    }

    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn build(self) -> Result<TimeSeries> {
        let mut series = TimeSeries::univariate(self.timestamps, self.values)?;
        if let Some(period) = self.period {
            series = series.with_period(period)?;
        }
        series.frequency = self.frequency;
        series.label = self.label;
        Ok(series)
    }
}

impl TimeSeries {
    /// Create a univariate series with a period of 1 (no seasonality).
    pub fn univariate(timestamps: Vec<DateTime<Utc>>, values: Vec<f64>) -> Result<Self> {
        if values.len() != timestamps.len() {
            return Err(ForecastError::DimensionMismatch {
                expected: timestamps.len(),
                got: values.len(),
            });
        }

        // Validate timestamps are strictly increasing
        for i in 1..timestamps.len() {
            if timestamps[i] <= timestamps[i - 1] {
                return Err(ForecastError::TimestampError(format!(
                    "timestamps must be strictly increasing (index {})",
                    i
                )));
            }
        }

        Ok(Self {
            timestamps,
            values,
            period: 1,
            frequency: None,
            label: None,
        })
    }

    /// Attach the seasonal period.
    pub fn with_period(mut self, period: usize) -> Result<Self> {
        if period == 0 {
            return Err(ForecastError::InvalidParameter(
                "period must be positive".to_string(),
            ));
        }
        self.period = period;
        Ok(self)
    }

    /// Attach a human-readable label (used in reports).
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Get the number of observations.
    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    /// Check if the series is empty.
    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }

    pub fn timestamps(&self) -> &[DateTime<Utc>] {
        &self.timestamps
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Observations per seasonal cycle.
    pub fn period(&self) -> usize {
        self.period
    }

    pub fn frequency(&self) -> Option<Duration> {
        self.frequency
    }

    pub fn set_frequency(&mut self, freq: Duration) {
        self.frequency = Some(freq);
    }

    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    pub fn last_timestamp(&self) -> Option<DateTime<Utc>> {
        self.timestamps.last().copied()
    }

    /// Number of complete seasonal cycles contained in the series.
    pub fn complete_periods(&self) -> usize {
        self.len() / self.period
    }

    /// True when the length is a whole number of seasonal cycles.
    pub fn is_period_aligned(&self) -> bool {
        self.len() % self.period == 0
    }

    /// Extract the half-open range `[start, end)` as a new series.
    pub fn slice(&self, start: usize, end: usize) -> Result<TimeSeries> {
        if start > end {
            return Err(ForecastError::InvalidParameter(
                "start must be <= end".to_string(),
            ));
        }
        if end > self.len() {
            return Err(ForecastError::InsufficientData {
                needed: end,
                got: self.len(),
            });
        }

        Ok(TimeSeries {
            timestamps: self.timestamps[start..end].to_vec(),
            values: self.values[start..end].to_vec(),
            period: self.period,
            frequency: self.frequency,
            label: self.label.clone(),
        })
    }

    /// Check if series has missing values (NaN or Inf).
    pub fn has_missing_values(&self) -> bool {
        self.values.iter().any(|v| !v.is_finite())
    }

    /// Return a sanitized copy with missing values handled.
    pub fn sanitized(&self, policy: MissingValuePolicy) -> Result<TimeSeries> {
        if !self.has_missing_values() {
            return Ok(self.clone());
        }

        let values = match policy {
            MissingValuePolicy::Error => return Err(ForecastError::MissingValues),
            MissingValuePolicy::Fill(fill_value) => self
                .values
                .iter()
                .map(|&v| if v.is_finite() { v } else { fill_value })
                .collect(),
            MissingValuePolicy::ForwardFill => {
                let mut last_valid = None;
                self.values
                    .iter()
                    .map(|&v| {
                        if v.is_finite() {
                            last_valid = Some(v);
                            v
                        } else {
                            last_valid.unwrap_or(v)
                        }
                    })
                    .collect()
            }
            MissingValuePolicy::Interpolate => interpolate_series(&self.values),
        };

        let sanitized = TimeSeries {
            values,
            ..self.clone()
        };
        // Leading gaps under ForwardFill have nothing to copy from.
        if sanitized.has_missing_values() {
            return Err(ForecastError::MissingValues);
        }
        Ok(sanitized)
    }

    /// Infer the sampling interval as the modal spacing between timestamps.
    ///
    /// `tolerance` is the minimum share of spacings that must agree with the
    /// mode. Overnight or weekend gaps are tolerated as long as the regular
    /// interval dominates.
    pub fn infer_frequency(&self, tolerance: f64) -> Result<Duration> {
        if self.len() < 2 {
            return Err(ForecastError::InsufficientData {
                needed: 2,
                got: self.len(),
            });
        }

        let mut counts: HashMap<i64, usize> = HashMap::new();
        for w in self.timestamps.windows(2) {
            *counts.entry((w[1] - w[0]).num_seconds()).or_insert(0) += 1;
        }

        // Ties resolve to the shorter spacing so the result is deterministic.
        let (modal_diff, modal_count) = counts
            .iter()
            .max_by(|a, b| a.1.cmp(b.1).then(b.0.cmp(a.0)))
            .map(|(&diff, &count)| (diff, count))
            .ok_or_else(|| ForecastError::TimestampError("empty spacing data".to_string()))?;

        let total_count = self.len() - 1;
        if (modal_count as f64 / total_count as f64) < tolerance {
            return Err(ForecastError::TimestampError(
                "no dominant spacing between timestamps".to_string(),
            ));
        }

        Ok(Duration::seconds(modal_diff))
    }

    /// Set frequency from timestamps (auto-infer).
    pub fn set_frequency_from_timestamps(&mut self) -> Result<()> {
        let freq = self.infer_frequency(0.5)?;
        self.frequency = Some(freq);
        Ok(())
    }
}

/// Monday through Friday.
pub fn is_weekday(timestamp: &DateTime<Utc>) -> bool {
    !matches!(timestamp.weekday(), Weekday::Sat | Weekday::Sun)
}

/// Linear interpolation for a series with non-finite values.
fn interpolate_series(values: &[f64]) -> Vec<f64> {
    let mut result = values.to_vec();
    let valid: Vec<usize> = (0..values.len())
        .filter(|&i| values[i].is_finite())
        .collect();

    let (first, last) = match (valid.first(), valid.last()) {
        (Some(&f), Some(&l)) => (f, l),
        _ => return result,
    };

    for v in result.iter_mut().take(first) {
        *v = values[first];
    }
    for v in result.iter_mut().skip(last + 1) {
        *v = values[last];
    }
    for pair in valid.windows(2) {
        let (a, b) = (pair[0], pair[1]);
        let span = (b - a) as f64;
        for i in a + 1..b {
            let w = (i - a) as f64 / span;
            result[i] = values[a] * (1.0 - w) + values[b] * w;
        }
    }

    result
}

//! Turning observation tables into fixed-frequency series.

use crate::core::{is_weekday, MissingValuePolicy, TimeSeries, TimeSeriesBuilder};
use crate::data::Observation;
use crate::error::{ForecastError, Result};
use chrono::Duration;
use tracing::{info, warn};

/// Intervals per service day in the ridership data.
pub const INTERVALS_PER_DAY: usize = 63;

/// Label of the whole-dataset series.
pub const ALL_DAYS: &str = "all days";
/// Label of the Monday-Friday series.
pub const WEEKDAYS: &str = "weekdays";

/// Builds [`TimeSeries`] values from the demand column of an observation table.
///
/// # Example
/// ```
/// use ridership_forecast::data::{Observation, SeriesBuilder};
///
/// let rows: Vec<_> = (0..8)
///     .map(|i| Observation::new("21-Mar-05", format!("{}:00", 6 + i), i as f64).unwrap())
///     .collect();
/// let series = SeriesBuilder::new(4).build(&rows).unwrap();
/// assert_eq!(series.len(), 8);
/// assert_eq!(series.period(), 4);
/// ```
#[derive(Debug, Clone)]
pub struct SeriesBuilder {
    period: usize,
    missing_policy: MissingValuePolicy,
    frequency: Option<Duration>,
}

impl Default for SeriesBuilder {
    fn default() -> Self {
        Self::new(INTERVALS_PER_DAY)
    }
}

impl SeriesBuilder {
    /// Create a builder for the given number of intervals per period.
    pub fn new(period: usize) -> Self {
        Self {
            period,
            missing_policy: MissingValuePolicy::Error,
            frequency: None,
        }
    }

    /// Set how non-finite demand values are handled.
    pub fn with_missing_policy(mut self, policy: MissingValuePolicy) -> Self {
        self.missing_policy = policy;
        self
    }

    /// Set the sampling interval explicitly instead of inferring it.
    pub fn with_frequency(mut self, freq: Duration) -> Self {
        self.frequency = Some(freq);
        self
    }

    pub fn period(&self) -> usize {
        self.period
    }

    /// Whole-dataset series, demand values in row order.
    pub fn build(&self, observations: &[Observation]) -> Result<TimeSeries> {
        self.build_filtered(observations, ALL_DAYS, |_| true)
    }

    /// Series restricted to Monday-Friday rows.
    pub fn build_weekdays(&self, observations: &[Observation]) -> Result<TimeSeries> {
        self.build_filtered(observations, WEEKDAYS, |o| is_weekday(&o.timestamp))
    }

    fn build_filtered<F>(&self, observations: &[Observation], label: &str, keep: F) -> Result<TimeSeries>
    where
        F: Fn(&Observation) -> bool,
    {
        let (timestamps, values): (Vec<_>, Vec<_>) = observations
            .iter()
            .filter(|o| keep(o))
            .map(|o| (o.timestamp, o.demand))
            .unzip();

        if values.is_empty() {
            return Err(ForecastError::EmptyData);
        }

        let mut series = TimeSeriesBuilder::new()
            .timestamps(timestamps)
            .values(values)
            .period(self.period)
            .label(label)
            .build()?
            .sanitized(self.missing_policy)?;

        match self.frequency {
            Some(freq) => series.set_frequency(freq),
            None => {
                if series.len() >= 2 {
                    series.set_frequency_from_timestamps()?;
                }
            }
        }

        if !series.is_period_aligned() {
            warn!(
                series = label,
                len = series.len(),
                period = self.period,
                remainder = series.len() % self.period,
                "series length is not a whole number of periods; seasonal estimates may degrade"
            );
        }
        info!(
            series = label,
            len = series.len(),
            periods = series.complete_periods(),
            "built series"
        );

        Ok(series)
    }
}

//! Final forecast assembly: clamping, future timestamps and the combined series.

use crate::core::TimeSeries;
use crate::error::{ForecastError, Result};
use crate::models::FittedModel;
use chrono::{DateTime, Duration, Utc};
use tracing::info;

/// Origin of a point in a [`CombinedSeries`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointKind {
    Historical,
    Forecast,
}

impl PointKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            PointKind::Historical => "historical",
            PointKind::Forecast => "forecast",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CombinedPoint {
    pub timestamp: DateTime<Utc>,
    pub value: f64,
    pub kind: PointKind,
}

/// Historical observations followed by forecast points.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CombinedSeries {
    points: Vec<CombinedPoint>,
}

impl CombinedSeries {
    /// Concatenate `history` with the forecast. Historical values are kept as is.
    pub fn new(history: &TimeSeries, timestamps: &[DateTime<Utc>], values: &[f64]) -> Result<Self> {
        if timestamps.len() != values.len() {
            return Err(ForecastError::DimensionMismatch {
                expected: timestamps.len(),
                got: values.len(),
            });
        }
        if let (Some(last), Some(first)) = (history.last_timestamp(), timestamps.first()) {
            if *first <= last {
                return Err(ForecastError::TimestampError(format!(
                    "forecast starts at {first}, not after the last observation {last}"
                )));
            }
        }

        let historical = history
            .timestamps()
            .iter()
            .zip(history.values())
            .map(|(&timestamp, &value)| CombinedPoint {
                timestamp,
                value,
                kind: PointKind::Historical,
            });
        let forecast = timestamps.iter().zip(values).map(|(&timestamp, &value)| CombinedPoint {
            timestamp,
            value,
            kind: PointKind::Forecast,
        });

        Ok(Self {
            points: historical.chain(forecast).collect(),
        })
    }

    pub fn points(&self) -> &[CombinedPoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn historical(&self) -> impl Iterator<Item = &CombinedPoint> {
        self.points.iter().filter(|p| p.kind == PointKind::Historical)
    }

    pub fn forecast(&self) -> impl Iterator<Item = &CombinedPoint> {
        self.points.iter().filter(|p| p.kind == PointKind::Forecast)
    }
}

/// `n` timestamps `start, start + step, ...`.
///
/// # Example
/// ```
/// use ridership_forecast::pipeline::synthesize_timestamps;
/// use chrono::{Duration, TimeZone, Utc};
///
/// let start = Utc.with_ymd_and_hms(2005, 4, 11, 6, 0, 0).unwrap();
/// let ts = synthesize_timestamps(start, Duration::minutes(15), 3).unwrap();
/// assert_eq!(ts[2], Utc.with_ymd_and_hms(2005, 4, 11, 6, 30, 0).unwrap());
/// ```
pub fn synthesize_timestamps(
    start: DateTime<Utc>,
    step: Duration,
    n: usize,
) -> Result<Vec<DateTime<Utc>>> {
    if step <= Duration::zero() {
        return Err(ForecastError::InvalidParameter(format!(
            "forecast step must be positive, got {step}"
        )));
    }
    (0..n)
        .map(|i| {
            i32::try_from(i)
                .ok()
                .and_then(|i| start.checked_add_signed(step * i))
                .ok_or_else(|| ForecastError::TimestampError("forecast timestamp overflow".to_string()))
        })
        .collect()
}

/// The forecast handed to reporting.
#[derive(Debug, Clone)]
pub struct FinalForecast {
    pub model: String,
    pub description: String,
    pub timestamps: Vec<DateTime<Utc>>,
    /// Clamped to be non-negative.
    pub values: Vec<f64>,
    /// How many raw predictions were below zero.
    pub clamped: usize,
    pub combined: CombinedSeries,
}

/// Where forecast timestamps start and how far apart they are.
#[derive(Debug, Clone, Copy, Default)]
pub struct TimestampPlan {
    pub anchor: Option<DateTime<Utc>>,
    pub step: Option<Duration>,
}

/// Forecast `horizon` steps from `fitted`, clamp and attach timestamps.
///
/// The step falls back to the series frequency, then to the modal spacing of
/// its timestamps. Timestamps continue contiguously from the anchor; service
/// gaps such as nights are not skipped.
pub fn assemble(
    model: &str,
    fitted: &dyn FittedModel,
    history: &TimeSeries,
    horizon: usize,
    plan: TimestampPlan,
) -> Result<FinalForecast> {
    let mut forecast = fitted.forecast(horizon)?;
    if forecast.values().iter().any(|v| !v.is_finite()) {
        return Err(ForecastError::ComputationError(format!(
            "{model} produced a non-finite forecast"
        )));
    }
    let clamped = forecast.clamp_non_negative();

    let step = match plan.step.or(history.frequency()) {
        Some(step) => step,
        None => history.infer_frequency(0.5)?,
    };
    let start = match plan.anchor {
        Some(anchor) => anchor,
        None => history
            .last_timestamp()
            .ok_or(ForecastError::EmptyData)?
            .checked_add_signed(step)
            .ok_or_else(|| ForecastError::TimestampError("forecast timestamp overflow".to_string()))?,
    };
    let timestamps = synthesize_timestamps(start, step, horizon)?;
    let values = forecast.into_values();
    let combined = CombinedSeries::new(history, &timestamps, &values)?;

    info!(model, horizon, clamped, first = %start, "assembled final forecast");

    Ok(FinalForecast {
        model: model.to_string(),
        description: fitted.description(),
        timestamps,
        values,
        clamped,
        combined,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Forecast;
    use chrono::TimeZone;

    #[derive(Debug)]
    struct Fixed(Vec<f64>);

    impl FittedModel for Fixed {
        fn fitted_values(&self) -> &[f64] {
            &self.0
        }
        fn residuals(&self) -> &[f64] {
            &self.0
        }
        fn forecast(&self, horizon: usize) -> Result<Forecast> {
            Ok(Forecast::from_values(self.0.iter().copied().cycle().take(horizon).collect()))
        }
        fn num_params(&self) -> usize {
            0
        }
        fn description(&self) -> String {
            "fixed".to_string()
        }
    }

    fn history(n: usize) -> TimeSeries {
        let base = Utc.with_ymd_and_hms(2005, 3, 21, 6, 0, 0).unwrap();
        let timestamps = (0..n).map(|i| base + Duration::minutes(15 * i as i64)).collect();
        TimeSeries::univariate(timestamps, (0..n).map(|i| i as f64).collect()).unwrap()
    }

    #[test]
    fn clamps_negative_forecasts() {
        let h = history(8);
        let out = assemble("fixed", &Fixed(vec![-5.0, 10.0, 20.0]), &h, 3, TimestampPlan::default()).unwrap();
        assert_eq!(out.values, vec![0.0, 10.0, 20.0]);
        assert_eq!(out.clamped, 1);
        assert_eq!(out.description, "fixed");
    }

    #[test]
    fn timestamps_continue_every_fifteen_minutes() {
        let h = history(8);
        let out = assemble("fixed", &Fixed(vec![1.0]), &h, 5, TimestampPlan::default()).unwrap();

        let last = h.last_timestamp().unwrap();
        assert_eq!(out.timestamps[0], last + Duration::minutes(15));
        assert!(out
            .timestamps
            .windows(2)
            .all(|w| w[1] - w[0] == Duration::minutes(15)));
    }

    #[test]
    fn combined_series_keeps_history_untouched() {
        let h = history(6);
        let out = assemble("fixed", &Fixed(vec![-1.0, 2.0]), &h, 4, TimestampPlan::default()).unwrap();

        assert_eq!(out.combined.len(), 10);
        let hist: Vec<f64> = out.combined.historical().map(|p| p.value).collect();
        assert_eq!(hist, h.values());
        let fc: Vec<f64> = out.combined.forecast().map(|p| p.value).collect();
        assert_eq!(fc, vec![0.0, 2.0, 0.0, 2.0]);
        assert!(out
            .combined
            .points()
            .windows(2)
            .all(|w| w[0].timestamp < w[1].timestamp));
    }

    #[test]
    fn explicit_anchor_and_step() {
        let h = history(4);
        let anchor = Utc.with_ymd_and_hms(2005, 3, 22, 6, 0, 0).unwrap();
        let plan = TimestampPlan {
            anchor: Some(anchor),
            step: Some(Duration::minutes(30)),
        };
        let out = assemble("fixed", &Fixed(vec![1.0]), &h, 2, plan).unwrap();
        assert_eq!(out.timestamps, vec![anchor, anchor + Duration::minutes(30)]);
    }

    #[test]
    fn anchor_inside_history_is_rejected() {
        let h = history(4);
        let plan = TimestampPlan {
            anchor: h.timestamps().first().copied(),
            step: None,
        };
        let err = assemble("fixed", &Fixed(vec![1.0]), &h, 2, plan).unwrap_err();
        assert!(matches!(err, ForecastError::TimestampError(_)));
    }

    #[test]
    fn non_positive_step_is_rejected() {
        let start = Utc.with_ymd_and_hms(2005, 3, 21, 6, 0, 0).unwrap();
        assert!(synthesize_timestamps(start, Duration::zero(), 3).is_err());
        assert!(synthesize_timestamps(start, Duration::minutes(15), 0).unwrap().is_empty());
    }
}

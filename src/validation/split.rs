//! Train/validation partitioning by whole seasonal periods.

use crate::core::TimeSeries;
use crate::error::{ForecastError, Result};

/// A leading training segment and the contiguous validation segment after it.
#[derive(Debug, Clone)]
pub struct TrainValidSplit {
    /// Observations `[0, boundary)`.
    pub train: TimeSeries,
    /// Observations `[boundary, boundary + valid.len())`.
    pub valid: TimeSeries,
    /// Index of the first validation observation in the original series.
    pub boundary: usize,
}

impl TrainValidSplit {
    /// Observations of the original series not covered by either segment.
    pub fn discarded(&self, original_len: usize) -> usize {
        original_len - self.train.len() - self.valid.len()
    }
}

/// Split after `train_periods` whole periods; validation takes the remainder.
///
/// # Example
/// ```
/// use ridership_forecast::core::TimeSeries;
/// use ridership_forecast::validation::train_valid_split;
/// use chrono::{Duration, TimeZone, Utc};
///
/// let base = Utc.with_ymd_and_hms(2005, 3, 21, 6, 0, 0).unwrap();
/// let timestamps: Vec<_> = (0..12).map(|i| base + Duration::minutes(15 * i)).collect();
/// let ts = TimeSeries::univariate(timestamps, vec![1.0; 12]).unwrap().with_period(4).unwrap();
///
/// let split = train_valid_split(&ts, 2, None).unwrap();
/// assert_eq!(split.train.len(), 8);
/// assert_eq!(split.valid.len(), 4);
/// ```
pub fn train_valid_split(
    series: &TimeSeries,
    train_periods: usize,
    valid_periods: Option<usize>,
) -> Result<TrainValidSplit> {
    let period = series.period();
    let boundary = train_periods * period;

    if train_periods == 0 {
        return Err(ForecastError::InvalidParameter(
            "training window must contain at least one period".to_string(),
        ));
    }
    if boundary >= series.len() {
        return Err(ForecastError::InsufficientData {
            needed: boundary + 1,
            got: series.len(),
        });
    }

    let end = match valid_periods {
        Some(0) => {
            return Err(ForecastError::InvalidParameter(
                "validation window must contain at least one period".to_string(),
            ))
        }
        Some(k) => {
            let end = boundary + k * period;
            if end > series.len() {
                return Err(ForecastError::InsufficientData {
                    needed: end,
                    got: series.len(),
                });
            }
            end
        }
        None => series.len(),
    };

    Ok(TrainValidSplit {
        train: series.slice(0, boundary)?,
        valid: series.slice(boundary, end)?,
        boundary,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};

    fn series(n: usize, period: usize) -> TimeSeries {
        let base = Utc.with_ymd_and_hms(2005, 3, 21, 6, 0, 0).unwrap();
        let timestamps: Vec<_> = (0..n)
            .map(|i| base + Duration::minutes(15 * i as i64))
            .collect();
        TimeSeries::univariate(timestamps, (0..n).map(|i| i as f64).collect())
            .unwrap()
            .with_period(period)
            .unwrap()
    }

    #[test]
    fn segments_are_contiguous() {
        let ts = series(21 * 5, 5);
        let split = train_valid_split(&ts, 14, Some(7)).unwrap();

        assert_eq!(split.train.len(), 70);
        assert_eq!(split.valid.len(), 35);
        assert_eq!(split.discarded(ts.len()), 0);
        assert_eq!(split.train.values().last(), Some(&69.0));
        assert_eq!(split.valid.values().first(), Some(&70.0));
    }

    #[test]
    fn explicit_validation_window_discards_the_tail() {
        let ts = series(23, 5);
        let split = train_valid_split(&ts, 2, Some(2)).unwrap();
        assert_eq!(split.train.len(), 10);
        assert_eq!(split.valid.len(), 10);
        assert_eq!(split.discarded(ts.len()), 3);
    }

    #[test]
    fn remainder_validation_keeps_partial_period() {
        let ts = series(23, 5);
        let split = train_valid_split(&ts, 4, None).unwrap();
        assert_eq!(split.valid.len(), 3);
    }

    #[test]
    fn oversized_windows_fail() {
        let ts = series(20, 5);
        assert!(matches!(
            train_valid_split(&ts, 4, None),
            Err(ForecastError::InsufficientData { .. })
        ));
        assert!(matches!(
            train_valid_split(&ts, 3, Some(2)),
            Err(ForecastError::InsufficientData { needed: 25, got: 20 })
        ));
        assert!(train_valid_split(&ts, 0, None).is_err());
        assert!(train_valid_split(&ts, 1, Some(0)).is_err());
    }
}

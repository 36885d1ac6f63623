//! Seasonal naive baseline: repeat the last observed period.

use crate::core::{Forecast, TimeSeries};
use crate::error::{ForecastError, Result};
use crate::models::traits::{residuals_of, FittedModel, Forecaster};

/// Forecasts each step with the value one period earlier.
///
/// In-sample, `fitted[t] = y[t - period]`; the first period has no
/// predecessor and echoes the actuals (see [`FittedModel::warmup`]).
#[derive(Debug, Clone)]
pub struct SeasonalNaive {
    period: usize,
}

impl SeasonalNaive {
    pub fn new(period: usize) -> Self {
        Self { period }
    }

    pub fn period(&self) -> usize {
        self.period
    }
}

impl Forecaster for SeasonalNaive {
    fn fit(&self, series: &TimeSeries) -> Result<Box<dyn FittedModel>> {
        let values = series.values();
        if self.period == 0 {
            return Err(ForecastError::InvalidParameter(
                "seasonal period must be positive".to_string(),
            ));
        }
        if values.iter().any(|v| !v.is_finite()) {
            return Err(ForecastError::MissingValues);
        }
        if values.len() < self.period {
            return Err(ForecastError::InsufficientData {
                needed: self.period,
                got: values.len(),
            });
        }

        let fitted: Vec<f64> = (0..values.len())
            .map(|t| {
                if t < self.period {
                    values[t]
                } else {
                    values[t - self.period]
                }
            })
            .collect();
        let residuals = residuals_of(values, &fitted);

        Ok(Box::new(FittedSeasonalNaive {
            last_cycle: values[values.len() - self.period..].to_vec(),
            fitted,
            residuals,
        }))
    }

    fn name(&self) -> &str {
        "SeasonalNaive"
    }
}

#[derive(Debug, Clone)]
pub struct FittedSeasonalNaive {
    last_cycle: Vec<f64>,
    fitted: Vec<f64>,
    residuals: Vec<f64>,
}

impl FittedModel for FittedSeasonalNaive {
    fn fitted_values(&self) -> &[f64] {
        &self.fitted
    }

    fn residuals(&self) -> &[f64] {
        &self.residuals
    }

    fn forecast(&self, horizon: usize) -> Result<Forecast> {
        let p = self.last_cycle.len();
        Ok(Forecast::from_values(
            (0..horizon).map(|h| self.last_cycle[h % p]).collect(),
        ))
    }

    fn warmup(&self) -> usize {
        self.last_cycle.len()
    }

    fn num_params(&self) -> usize {
        0
    }

    fn description(&self) -> String {
        format!("repeat last period (period={})", self.last_cycle.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};

    fn make_series(values: Vec<f64>) -> TimeSeries {
        let base = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let timestamps = (0..values.len())
            .map(|i| base + Duration::hours(i as i64))
            .collect();
        TimeSeries::univariate(timestamps, values).unwrap()
    }

    #[test]
    fn repeats_last_period() {
        let ts = make_series(vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0]);
        let model = SeasonalNaive::new(3).fit(&ts).unwrap();

        let forecast = model.forecast(7).unwrap();
        assert_eq!(forecast.values(), &[5.0, 6.0, 7.0, 5.0, 6.0, 7.0, 5.0]);
    }

    #[test]
    fn fitted_values_lag_one_period() {
        let ts = make_series(vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0]);
        let model = SeasonalNaive::new(3).fit(&ts).unwrap();

        assert_eq!(model.fitted_values(), &[1.0, 2.0, 3.0, 1.0, 2.0, 3.0, 4.0]);
        assert_eq!(model.residuals()[3..], [3.0, 3.0, 3.0, 3.0]);
        assert_eq!(model.warmup(), 3);
    }

    #[test]
    fn constant_input_is_allowed() {
        let model = SeasonalNaive::new(2).fit(&make_series(vec![4.0; 6])).unwrap();
        assert_eq!(model.forecast(3).unwrap().values(), &[4.0, 4.0, 4.0]);
    }

    #[test]
    fn too_short_or_zero_period() {
        assert!(SeasonalNaive::new(5).fit(&make_series(vec![1.0; 3])).is_err());
        assert!(SeasonalNaive::new(0).fit(&make_series(vec![1.0; 3])).is_err());
    }
}

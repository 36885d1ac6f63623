//! Pipeline configuration.

use crate::core::MissingValuePolicy;
use crate::data::INTERVALS_PER_DAY;
use crate::evaluation::{MapePolicy, Metric};
use crate::models::SARIMASpec;
use crate::seasonality::SeasonalWindow;
use chrono::{DateTime, Duration, Utc};

/// Settings for one end-to-end run.
///
/// # Example
/// ```
/// use ridership_forecast::pipeline::PipelineConfig;
///
/// let config = PipelineConfig::default().with_period(8).with_train_days(5);
/// assert_eq!(config.period, 8);
/// assert_eq!(config.horizon(), 3 * 8);
/// ```
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Intervals per day.
    pub period: usize,
    /// Training days on the whole-dataset series.
    pub train_days: usize,
    /// Validation days on the whole-dataset series; `None` takes the rest.
    pub valid_days: Option<usize>,
    /// Training days on the weekday series.
    pub weekday_train_days: usize,
    /// Validation days on the weekday series; `None` takes the rest.
    pub weekday_valid_days: Option<usize>,
    /// Final forecast length in days.
    pub horizon_days: usize,
    /// Manually specified seasonal ARIMA orders, evaluated alongside AutoARIMA.
    pub manual_orders: Vec<SARIMASpec>,
    pub include_auto_arima: bool,
    pub seasonal_window: SeasonalWindow,
    pub mape_policy: MapePolicy,
    pub missing_policy: MissingValuePolicy,
    /// Metric minimised on weekday validation to pick the final model.
    pub selection_metric: Metric,
    /// Use this model for the final forecast instead of the selection rule.
    pub final_model: Option<String>,
    /// First forecast timestamp; defaults to one step after the last observation.
    pub forecast_anchor: Option<DateTime<Utc>>,
    /// Forecast step; defaults to the inferred series frequency.
    pub forecast_step: Option<Duration>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        let period = INTERVALS_PER_DAY;
        Self {
            period,
            train_days: 14,
            valid_days: Some(7),
            weekday_train_days: 10,
            weekday_valid_days: None,
            horizon_days: 3,
            manual_orders: default_manual_orders(period),
            include_auto_arima: true,
            seasonal_window: SeasonalWindow::Periodic,
            mape_policy: MapePolicy::SkipZeros,
            missing_policy: MissingValuePolicy::Error,
            selection_metric: Metric::RMSE,
            final_model: None,
            forecast_anchor: None,
            forecast_step: None,
        }
    }
}

fn default_manual_orders(period: usize) -> Vec<SARIMASpec> {
    vec![
        SARIMASpec::new((1, 1, 1), (1, 1, 1), period),
        SARIMASpec::new((2, 1, 2), (1, 1, 0), period),
        SARIMASpec::new((1, 1, 2), (1, 1, 1), period),
    ]
}

impl PipelineConfig {
    /// Change the period; manual orders follow the new seasonal lag.
    pub fn with_period(mut self, period: usize) -> Self {
        self.period = period;
        for spec in &mut self.manual_orders {
            spec.s = period;
        }
        self
    }

    pub fn with_train_days(mut self, days: usize) -> Self {
        self.train_days = days;
        self
    }

    pub fn with_valid_days(mut self, days: Option<usize>) -> Self {
        self.valid_days = days;
        self
    }

    pub fn with_weekday_train_days(mut self, days: usize) -> Self {
        self.weekday_train_days = days;
        self
    }

    pub fn with_weekday_valid_days(mut self, days: Option<usize>) -> Self {
        self.weekday_valid_days = days;
        self
    }

    pub fn with_horizon_days(mut self, days: usize) -> Self {
        self.horizon_days = days;
        self
    }

    pub fn with_manual_orders(mut self, orders: Vec<SARIMASpec>) -> Self {
        self.manual_orders = orders;
        self
    }

    pub fn with_auto_arima(mut self, enabled: bool) -> Self {
        self.include_auto_arima = enabled;
        self
    }

    pub fn with_seasonal_window(mut self, window: SeasonalWindow) -> Self {
        self.seasonal_window = window;
        self
    }

    pub fn with_mape_policy(mut self, policy: MapePolicy) -> Self {
        self.mape_policy = policy;
        self
    }

    pub fn with_missing_policy(mut self, policy: MissingValuePolicy) -> Self {
        self.missing_policy = policy;
        self
    }

    pub fn with_selection_metric(mut self, metric: Metric) -> Self {
        self.selection_metric = metric;
        self
    }

    pub fn with_final_model(mut self, name: impl Into<String>) -> Self {
        self.final_model = Some(name.into());
        self
    }

    pub fn with_forecast_anchor(mut self, anchor: DateTime<Utc>) -> Self {
        self.forecast_anchor = Some(anchor);
        self
    }

    pub fn with_forecast_step(mut self, step: Duration) -> Self {
        self.forecast_step = Some(step);
        self
    }

    /// Final forecast length in observations.
    pub fn horizon(&self) -> usize {
        self.horizon_days * self.period
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_ridership_study() {
        let c = PipelineConfig::default();
        assert_eq!(c.period, 63);
        assert_eq!((c.train_days, c.valid_days), (14, Some(7)));
        assert_eq!((c.weekday_train_days, c.weekday_valid_days), (10, None));
        assert_eq!(c.horizon(), 189);
        let orders: Vec<String> = c.manual_orders.iter().map(|s| s.to_string()).collect();
        assert_eq!(
            orders,
            [
                "SARIMA(1,1,1)(1,1,1)[63]",
                "SARIMA(2,1,2)(1,1,0)[63]",
                "SARIMA(1,1,2)(1,1,1)[63]"
            ]
        );
    }

    #[test]
    fn period_change_updates_manual_orders() {
        let c = PipelineConfig::default().with_period(7);
        assert!(c.manual_orders.iter().all(|s| s.s == 7));
        assert_eq!(c.horizon(), 21);
    }
}

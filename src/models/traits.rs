//! Common interface for estimators and the models they produce.

use crate::core::{Forecast, TimeSeries};
use crate::error::{ForecastError, Result};
use crate::utils::stats::is_constant;

/// An estimator: turns a training series into an immutable [`FittedModel`].
///
/// Estimators hold configuration only, so one instance can be fitted to
/// any number of series.
pub trait Forecaster {
    /// Fit to `series`.
    fn fit(&self, series: &TimeSeries) -> Result<Box<dyn FittedModel>>;

    /// Identifier used in comparison tables and for selecting the final model.
    fn name(&self) -> &str;
}

/// A fitted model. Estimator internals stay hidden behind this trait.
pub trait FittedModel: std::fmt::Debug {
    /// In-sample one-step predictions, aligned with the training series.
    fn fitted_values(&self) -> &[f64];

    /// `actual - fitted` over the training series.
    fn residuals(&self) -> &[f64];

    /// Point forecasts for the next `horizon` steps.
    fn forecast(&self, horizon: usize) -> Result<Forecast>;

    /// Leading observations whose fitted values only echo the actuals
    /// because the model has no history to predict them from.
    fn warmup(&self) -> usize {
        0
    }

    /// Number of estimated parameters.
    fn num_params(&self) -> usize;

    /// Human-readable summary of the fitted state.
    fn description(&self) -> String;
}

pub type BoxedForecaster = Box<dyn Forecaster>;
pub type BoxedFittedModel = Box<dyn FittedModel>;

/// Ordered collection of candidate estimators.
///
/// # Example
///
/// ```
/// use ridership_forecast::models::{ModelRegistry, SeasonalNaive, STLETSForecaster};
///
/// let mut registry = ModelRegistry::new();
/// registry.register(STLETSForecaster::new(63));
/// registry.register(SeasonalNaive::new(63));
///
/// assert_eq!(registry.names(), vec!["STL+ETS", "SeasonalNaive"]);
/// assert!(registry.get("SeasonalNaive").is_some());
/// ```
#[derive(Default)]
pub struct ModelRegistry {
    models: Vec<BoxedForecaster>,
}

impl ModelRegistry {
    pub fn new() -> Self {
        Self { models: Vec::new() }
    }

    /// Append an estimator; insertion order is evaluation order.
    pub fn register<F: Forecaster + 'static>(&mut self, model: F) {
        self.models.push(Box::new(model));
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &dyn Forecaster> {
        self.models.iter().map(|m| m.as_ref())
    }

    /// Estimator with the given name, if registered.
    pub fn get(&self, name: &str) -> Option<&dyn Forecaster> {
        self.iter().find(|m| m.name() == name)
    }

    pub fn names(&self) -> Vec<&str> {
        self.models.iter().map(|m| m.name()).collect()
    }
}

/// Reject training data no estimator can use: empty, non-finite, shorter
/// than `min_len`, or constant.
pub fn check_trainable(values: &[f64], min_len: usize) -> Result<()> {
    if values.is_empty() {
        return Err(ForecastError::EmptyData);
    }
    if values.iter().any(|v| !v.is_finite()) {
        return Err(ForecastError::MissingValues);
    }
    if values.len() < min_len {
        return Err(ForecastError::InsufficientData {
            needed: min_len,
            got: values.len(),
        });
    }
    if is_constant(values) {
        return Err(ForecastError::DegenerateSeries(
            "training series is constant".to_string(),
        ));
    }
    Ok(())
}

/// `actual - fitted`, element-wise.
pub(crate) fn residuals_of(actual: &[f64], fitted: &[f64]) -> Vec<f64> {
    actual.iter().zip(fitted).map(|(a, f)| a - f).collect()
}

//! Forecasting models.

mod traits;

pub mod arima;
pub mod baseline;
pub mod exponential;
pub mod stl_ets;

pub use arima::{AutoARIMA, AutoARIMAConfig, FittedAutoARIMA, FittedSARIMA, SARIMASpec, SARIMA};
pub use baseline::SeasonalNaive;
pub use exponential::SimpleExponentialSmoothing;
pub use stl_ets::{FittedSTLETS, STLETSForecaster};
pub use traits::{
    check_trainable, BoxedFittedModel, BoxedForecaster, FittedModel, Forecaster, ModelRegistry,
};

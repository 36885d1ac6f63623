//! Seasonal ARIMA models.
//!
//! This module provides:
//! - Differencing operators, including the combined `(1 - B)^d (1 - B^s)^D` polynomial
//! - SARIMA estimation by conditional sum of squares
//! - AutoARIMA for automatic order selection

mod auto_arima;
mod diff;
mod model;

pub use auto_arima::{AutoARIMA, AutoARIMAConfig, FittedAutoARIMA, InformationCriterion};
pub use diff::{
    difference, seasonal_difference, suggest_differencing, suggest_seasonal_differencing,
    DifferencingPolynomial,
};
pub use model::{is_stationary, Coefficients, FittedSARIMA, SARIMASpec, SARIMA};

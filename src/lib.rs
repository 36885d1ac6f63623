//! # ridership-forecast
//!
//! Decomposition, model comparison and multi-day forecasting for
//! fixed-interval ridership series.
//!
//! Provides STL decomposition, simple exponential smoothing on the
//! seasonally adjusted series, seasonal ARIMA with automatic order
//! selection, a seasonal naive baseline, accuracy metrics with an explicit
//! zero-actual policy, and an end-to-end pipeline that writes plots and a
//! forecast CSV.

// Allow some clippy warnings for cleaner code in specific cases
#![allow(clippy::upper_case_acronyms)]
#![allow(clippy::too_many_arguments)]
#![allow(clippy::needless_range_loop)]

pub mod core;
pub mod data;
pub mod error;
pub mod evaluation;
pub mod models;
pub mod pipeline;
pub mod report;
pub mod seasonality;
pub mod utils;
pub mod validation;

pub use error::{ForecastError, Result};

pub mod prelude {
    pub use crate::core::{Forecast, TimeSeries};
    pub use crate::data::{Observation, SeriesBuilder, SyntheticRidership};
    pub use crate::error::{ForecastError, Result};
    pub use crate::evaluation::{evaluate, AccuracyMetrics, ComparisonTable, MapePolicy};
    pub use crate::models::{FittedModel, Forecaster};
    pub use crate::pipeline::{run, PipelineConfig, PipelineReport};
}

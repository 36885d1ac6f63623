//! Core data structures for time series forecasting.

mod forecast;
mod time_series;

pub use forecast::Forecast;
pub use time_series::{is_weekday, MissingValuePolicy, TimeSeries, TimeSeriesBuilder};

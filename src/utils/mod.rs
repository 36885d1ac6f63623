//! Numerical helpers shared by the estimators.

pub mod optimization;
pub mod stats;

pub use optimization::{nelder_mead, NelderMeadConfig, NelderMeadResult};
pub use stats::{acf, autocorrelation, is_constant, mean, median, std_dev, variance};

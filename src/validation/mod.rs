//! Hold-out splitting and residual checks.
//!
//! # Example
//!
//! ```
//! use ridership_forecast::validation::{durbin_watson, ljung_box};
//!
//! let residuals = vec![0.1, -0.2, 0.15, -0.1, 0.05, -0.08, 0.12, -0.15, 0.1, -0.05];
//! let lb = ljung_box(&residuals, Some(3), 0);
//! assert!(lb.p_value >= 0.0 && lb.p_value <= 1.0);
//!
//! let dw = durbin_watson(&residuals);
//! assert!(dw.statistic > 2.0);
//! ```

pub mod residual_tests;
pub mod split;

pub use residual_tests::{
    box_pierce, default_lags, durbin_watson, ljung_box, AutocorrelationType, DurbinWatsonResult,
    LjungBoxResult, ResidualDiagnostics,
};
pub use split::{train_valid_split, TrainValidSplit};

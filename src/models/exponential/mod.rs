//! Exponential smoothing.

mod ses;

pub use ses::{FittedSES, SimpleExponentialSmoothing, SmoothedLevel};

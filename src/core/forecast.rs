//! Forecast result structure for holding point predictions.

/// Point predictions produced by a fitted model.
///
/// Prediction intervals are not carried; every consumer in this crate works
/// on the mean forecast.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Forecast {
    point: Vec<f64>,
}

impl Forecast {
    /// Create an empty forecast.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a forecast from point predictions.
    pub fn from_values(values: Vec<f64>) -> Self {
        Self { point: values }
    }

    /// Get the forecast horizon (number of steps).
    pub fn horizon(&self) -> usize {
        self.point.len()
    }

    pub fn is_empty(&self) -> bool {
        self.point.is_empty()
    }

    /// Point predictions.
    pub fn values(&self) -> &[f64] {
        &self.point
    }

    pub fn into_values(self) -> Vec<f64> {
        self.point
    }

    /// Replace every negative prediction with exactly zero.
    ///
    /// Returns the number of values that were clamped.
    pub fn clamp_non_negative(&mut self) -> usize {
        let mut clamped = 0;
        for v in self.point.iter_mut() {
            if *v < 0.0 {
                *v = 0.0;
                clamped += 1;
            }
        }
        clamped
    }
}

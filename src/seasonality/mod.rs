//! Seasonal decomposition.

mod stl;

pub use stl::{SeasonalWindow, STLResult, STL};

//! Input side of the pipeline: loading, series construction and synthetic data.

mod builder;
mod loader;
mod synthetic;

pub use builder::{SeriesBuilder, ALL_DAYS, INTERVALS_PER_DAY, WEEKDAYS};
pub use loader::{parse_timestamp, read_observations, read_observations_from, Observation};
pub use synthetic::SyntheticRidership;

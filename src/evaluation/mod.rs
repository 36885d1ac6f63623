//! Model evaluation: accuracy metrics and cross-model comparison.

mod comparison;
mod metrics;

pub use comparison::{ComparisonTable, EvaluationRecord, Metric, Segment};
pub use metrics::{evaluate, AccuracyMetrics, MapePolicy};

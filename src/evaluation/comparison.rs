//! Tabulating metrics across models and choosing among them.

use crate::evaluation::metrics::AccuracyMetrics;
use std::fmt;

/// Which part of a split a row was computed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Segment {
    /// Fitted values against training actuals.
    Training,
    /// Forecasts against held-out actuals.
    Validation,
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Segment::Training => write!(f, "training"),
            Segment::Validation => write!(f, "validation"),
        }
    }
}

/// A metric to rank models by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Metric {
    MAE,
    MAPE,
    #[default]
    RMSE,
}

impl Metric {
    pub fn of(&self, metrics: &AccuracyMetrics) -> f64 {
        match self {
            Metric::MAE => metrics.mae,
            Metric::MAPE => metrics.mape,
            Metric::RMSE => metrics.rmse,
        }
    }
}

/// One row of the comparison table.
#[derive(Debug, Clone, PartialEq)]
pub struct EvaluationRecord {
    pub model: String,
    pub series: String,
    pub segment: Segment,
    pub metrics: AccuracyMetrics,
}

/// Evaluation rows in insertion order.
///
/// # Example
/// ```
/// use ridership_forecast::evaluation::{
///     evaluate, ComparisonTable, MapePolicy, Metric, Segment,
/// };
///
/// let actual = [10.0, 12.0, 14.0];
/// let mut table = ComparisonTable::new();
/// for (model, pred) in [("A", [11.0, 12.0, 13.0]), ("B", [10.0, 12.0, 14.5])] {
///     let m = evaluate(&actual, &pred, MapePolicy::default()).unwrap();
///     table.push(model, "weekdays", Segment::Validation, m);
/// }
///
/// let best = table.best("weekdays", Segment::Validation, Metric::RMSE).unwrap();
/// assert_eq!(best.model, "B");
/// ```
#[derive(Debug, Clone, Default)]
pub struct ComparisonTable {
    records: Vec<EvaluationRecord>,
}

impl ComparisonTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(
        &mut self,
        model: impl Into<String>,
        series: impl Into<String>,
        segment: Segment,
        metrics: AccuracyMetrics,
    ) {
        self.records.push(EvaluationRecord {
            model: model.into(),
            series: series.into(),
            segment,
            metrics,
        });
    }

    pub fn records(&self) -> &[EvaluationRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Rows for one series and segment, in insertion order.
    pub fn filter<'a>(
        &'a self,
        series: &'a str,
        segment: Segment,
    ) -> impl Iterator<Item = &'a EvaluationRecord> + 'a {
        self.records
            .iter()
            .filter(move |r| r.series == series && r.segment == segment)
    }

    /// Row with the smallest `metric` for `series`/`segment`.
    ///
    /// NaN scores never win. Ties keep the earlier row.
    pub fn best(&self, series: &str, segment: Segment, metric: Metric) -> Option<&EvaluationRecord> {
        self.records
            .iter()
            .filter(|r| r.series == series && r.segment == segment)
            .filter(|r| !metric.of(&r.metrics).is_nan())
            .fold(None, |best: Option<&EvaluationRecord>, r| match best {
                Some(b) if metric.of(&b.metrics) <= metric.of(&r.metrics) => Some(b),
                _ => Some(r),
            })
    }
}

impl fmt::Display for ComparisonTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let width = self
            .records
            .iter()
            .map(|r| r.model.len())
            .chain(std::iter::once(5))
            .max()
            .unwrap_or(5);
        writeln!(
            f,
            "{:<width$}  {:<10}  {:<10}  {:>10}  {:>9}  {:>10}",
            "model", "series", "segment", "MAE", "MAPE %", "RMSE"
        )?;
        for r in &self.records {
            writeln!(
                f,
                "{:<width$}  {:<10}  {:<10}  {:>10.3}  {:>9.2}  {:>10.3}",
                r.model,
                r.series,
                r.segment.to_string(),
                r.metrics.mae,
                r.metrics.mape,
                r.metrics.rmse
            )?;
        }
        Ok(())
    }
}

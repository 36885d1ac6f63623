//! Error types for the ridership-forecast library.

use thiserror::Error;

/// Result type alias for forecast operations.
pub type Result<T> = std::result::Result<T, ForecastError>;

/// Errors that can occur while loading, fitting, evaluating or reporting.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ForecastError {
    /// Input data is empty.
    #[error("empty input data")]
    EmptyData,

    /// Insufficient data points for the operation.
    #[error("insufficient data: need at least {needed}, got {got}")]
    InsufficientData { needed: usize, got: usize },

    /// Invalid parameter value.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// Dimension mismatch between data structures.
    #[error("dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch { expected: usize, got: usize },

    /// Timestamp-related error.
    #[error("timestamp error: {0}")]
    TimestampError(String),

    /// Missing or non-finite values detected when not allowed.
    #[error("missing values detected in data")]
    MissingValues,

    /// The series carries no information a model can fit (e.g. constant).
    #[error("degenerate series: {0}")]
    DegenerateSeries(String),

    /// Computation error (e.g., numerical issues).
    #[error("computation error: {0}")]
    ComputationError(String),

    /// Filesystem error.
    #[error("io error: {0}")]
    Io(String),

    /// Malformed delimited input.
    #[error("csv error: {0}")]
    Csv(String),

    /// A field could not be parsed.
    #[error("parse error on line {line}: {message}")]
    Parse { line: u64, message: String },

    /// Plot rendering failed.
    #[error("render error: {0}")]
    Render(String),
}

impl From<std::io::Error> for ForecastError {
    fn from(err: std::io::Error) -> Self {
        ForecastError::Io(err.to_string())
    }
}

impl From<csv::Error> for ForecastError {
    fn from(err: csv::Error) -> Self {
        ForecastError::Csv(err.to_string())
    }
}

impl<E: std::error::Error + Send + Sync + 'static> From<plotters::drawing::DrawingAreaErrorKind<E>>
    for ForecastError
{
    fn from(err: plotters::drawing::DrawingAreaErrorKind<E>) -> Self {
        ForecastError::Render(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_messages_are_descriptive() {
        let err = ForecastError::InsufficientData {
            needed: 126,
            got: 63,
        };
        assert_eq!(
            err.to_string(),
            "insufficient data: need at least 126, got 63"
        );

        let err = ForecastError::DegenerateSeries("series is constant".to_string());
        assert_eq!(err.to_string(), "degenerate series: series is constant");

        let err = ForecastError::Parse {
            line: 4,
            message: "bad date '31-Foo-05'".to_string(),
        };
        assert_eq!(err.to_string(), "parse error on line 4: bad date '31-Foo-05'");
    }

    #[test]
    fn io_errors_convert() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing.csv");
        let err: ForecastError = io.into();
        assert!(matches!(err, ForecastError::Io(ref msg) if msg.contains("missing.csv")));
    }

    #[test]
    fn errors_are_clonable_and_comparable() {
        let err1 = ForecastError::MissingValues;
        let err2 = err1.clone();
        assert_eq!(err1, err2);
    }
}

//! Error types for the churn-model pipeline

use thiserror::Error;

/// Result type alias for churn-model operations
pub type Result<T> = std::result::Result<T, ChurnError>;

/// Main error type for the churn-model crate
///
/// The four run-aborting failure classes (schema mismatch, empty split,
/// single-class labels, exhausted search space) get their own variants so
/// callers can match on them instead of parsing messages.
#[derive(Error, Debug)]
pub enum ChurnError {
    #[error("Data error: {0}")]
    DataError(String),

    #[error("Schema error: {0}")]
    SchemaError(String),

    #[error("Empty split: '{split}' has zero rows ({detail})")]
    EmptySplit { split: String, detail: String },

    #[error("Degenerate labels: {0}")]
    DegenerateLabels(String),

    #[error("Search space exhausted: {available} distinct configurations available, {requested} requested")]
    SearchSpaceExhausted { available: usize, requested: usize },

    #[error("Preprocessing error: {0}")]
    PreprocessingError(String),

    #[error("Training error: {0}")]
    TrainingError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Invalid shape: expected {expected}, got {actual}")]
    ShapeError { expected: String, actual: String },

    #[error("Feature not found: {0}")]
    FeatureNotFound(String),

    #[error("Model not fitted")]
    NotFitted,

    #[error("Invalid parameter: {name} = {value}, {reason}")]
    InvalidParameter {
        name: String,
        value: String,
        reason: String,
    },
}

impl ChurnError {
    /// Shorthand for the empty-split variant
    pub fn empty_split(split: &str, detail: impl Into<String>) -> Self {
        ChurnError::EmptySplit {
            split: split.to_string(),
            detail: detail.into(),
        }
    }
}

impl From<polars::error::PolarsError> for ChurnError {
    fn from(err: polars::error::PolarsError) -> Self {
        ChurnError::DataError(err.to_string())
    }
}

impl From<serde_json::Error> for ChurnError {
    fn from(err: serde_json::Error) -> Self {
        ChurnError::SerializationError(err.to_string())
    }
}

impl From<ndarray::ShapeError> for ChurnError {
    fn from(err: ndarray::ShapeError) -> Self {
        ChurnError::ShapeError {
            expected: "valid shape".to_string(),
            actual: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ChurnError::SchemaError("column 'descEstado' missing".to_string());
        assert_eq!(err.to_string(), "Schema error: column 'descEstado' missing");
    }

    #[test]
    fn test_empty_split_display() {
        let err = ChurnError::empty_split("oot", "no rows matched 2018-02-01");
        assert_eq!(
            err.to_string(),
            "Empty split: 'oot' has zero rows (no rows matched 2018-02-01)"
        );
    }

    #[test]
    fn test_search_space_exhausted_display() {
        let err = ChurnError::SearchSpaceExhausted {
            available: 4,
            requested: 25,
        };
        assert_eq!(
            err.to_string(),
            "Search space exhausted: 4 distinct configurations available, 25 requested"
        );
    }

    #[test]
    fn test_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: ChurnError = io_err.into();
        assert!(matches!(err, ChurnError::IoError(_)));
    }
}

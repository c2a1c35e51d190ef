//! Error types for the crop advisor pipeline

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for pipeline operations
pub type Result<T> = std::result::Result<T, AdvisorError>;

/// Main error type. Every variant is terminal for a training run.
#[derive(Error, Debug)]
pub enum AdvisorError {
    #[error("Dataset not found: {}", .0.display())]
    DatasetNotFound(PathBuf),

    #[error("Dataset load error: {0}")]
    DatasetLoadError(String),

    #[error("Insufficient data: {0}")]
    InsufficientData(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Data error: {0}")]
    DataError(String),

    #[error("Feature not found: {0}")]
    FeatureNotFound(String),

    #[error("Training error: {0}")]
    TrainingError(String),

    #[error("Search cancelled after {completed} of {total} candidates")]
    SearchCancelled { completed: usize, total: usize },

    #[error("Unknown label: {0}")]
    UnknownLabel(String),

    #[error("Unknown class code: {code} (encoder has {n_classes} classes)")]
    UnknownClassCode { code: usize, n_classes: usize },

    #[error("Invalid shape: expected {expected}, got {actual}")]
    ShapeError { expected: String, actual: String },

    #[error("Model not fitted")]
    ModelNotFitted,

    #[error("Invalid parameter: {name} = {value}, {reason}")]
    InvalidParameter {
        name: String,
        value: String,
        reason: String,
    },

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Thread pool error: {0}")]
    ThreadPoolError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl From<polars::prelude::PolarsError> for AdvisorError {
    fn from(err: polars::prelude::PolarsError) -> Self {
        AdvisorError::DatasetLoadError(err.to_string())
    }
}

impl From<serde_json::Error> for AdvisorError {
    fn from(err: serde_json::Error) -> Self {
        AdvisorError::SerializationError(err.to_string())
    }
}

impl From<bincode::Error> for AdvisorError {
    fn from(err: bincode::Error) -> Self {
        AdvisorError::SerializationError(err.to_string())
    }
}

impl From<ndarray::ShapeError> for AdvisorError {
    fn from(err: ndarray::ShapeError) -> Self {
        AdvisorError::ShapeError {
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
        let err = AdvisorError::DatasetLoadError("bad header".to_string());
        assert_eq!(err.to_string(), "Dataset load error: bad header");

        let err = AdvisorError::DatasetNotFound(PathBuf::from("ml/missing.csv"));
        assert_eq!(err.to_string(), "Dataset not found: ml/missing.csv");
    }

    #[test]
    fn test_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: AdvisorError = io_err.into();
        assert!(matches!(err, AdvisorError::IoError(_)));
    }

    #[test]
    fn test_error_from_json() {
        let json_err = serde_json::from_str::<u32>("not json").unwrap_err();
        let err: AdvisorError = json_err.into();
        assert!(matches!(err, AdvisorError::SerializationError(_)));
    }
}

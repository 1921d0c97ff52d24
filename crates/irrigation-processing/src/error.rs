//! Error types for dataset loading and feature preparation.
//!
//! Errors are serializable as `{code, message}` so callers embedding the
//! library (a dashboard, a JSON CLI) can report them without string matching.

use serde::Serialize;
use serde::ser::SerializeStruct;
use thiserror::Error;

/// The main error type for dataset preparation.
#[derive(Error, Debug)]
pub enum ProcessingError {
    /// The task's target column is absent from the input table.
    #[error("Target column '{0}' not found in dataset")]
    MissingTargetColumn(String),

    /// A column required by an operation was not found.
    #[error("Column '{0}' not found in dataset")]
    ColumnNotFound(String),

    /// Every row was dropped, or the input had none to begin with.
    #[error("Dataset has no usable rows")]
    EmptyDataset,

    /// Invalid configuration provided.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// IO error wrapper.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Polars error wrapper.
    #[error("Polars error: {0}")]
    Polars(#[from] polars::error::PolarsError),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error with context.
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<ProcessingError>,
    },
}

impl ProcessingError {
    /// Add context to an error.
    pub fn with_context(self, context: impl Into<String>) -> Self {
        ProcessingError::WithContext {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// Get a stable error code for programmatic handling.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::MissingTargetColumn(_) => "MISSING_TARGET_COLUMN",
            Self::ColumnNotFound(_) => "COLUMN_NOT_FOUND",
            Self::EmptyDataset => "EMPTY_DATASET",
            Self::InvalidConfig(_) => "INVALID_CONFIG",
            Self::Io(_) => "IO_ERROR",
            Self::Polars(_) => "POLARS_ERROR",
            Self::Json(_) => "JSON_ERROR",
            Self::WithContext { source, .. } => source.error_code(),
        }
    }

    /// Check if the caller can fix this by changing its input or settings.
    ///
    /// A missing target is not recoverable locally: the table itself is wrong.
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::InvalidConfig(_) | Self::EmptyDataset => true,
            Self::WithContext { source, .. } => source.is_recoverable(),
            _ => false,
        }
    }
}

impl Serialize for ProcessingError {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let mut state = serializer.serialize_struct("ProcessingError", 2)?;
        state.serialize_field("code", &self.error_code())?;
        state.serialize_field("message", &self.to_string())?;
        state.end()
    }
}

/// Result type alias for processing operations.
pub type Result<T> = std::result::Result<T, ProcessingError>;

/// Extension trait for adding context to Results.
pub trait ResultExt<T> {
    /// Add context to an error result.
    fn context(self, context: impl Into<String>) -> Result<T>;
}

impl<T> ResultExt<T> for Result<T> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.with_context(context))
    }
}

impl<T> ResultExt<T> for std::result::Result<T, polars::error::PolarsError> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| ProcessingError::Polars(e).with_context(context))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code() {
        assert_eq!(
            ProcessingError::MissingTargetColumn("Relay_On".to_string()).error_code(),
            "MISSING_TARGET_COLUMN"
        );
        assert_eq!(ProcessingError::EmptyDataset.error_code(), "EMPTY_DATASET");
    }

    #[test]
    fn test_is_recoverable() {
        assert!(ProcessingError::EmptyDataset.is_recoverable());
        assert!(!ProcessingError::MissingTargetColumn("x".to_string()).is_recoverable());
    }

    #[test]
    fn test_error_serialization() {
        let error = ProcessingError::MissingTargetColumn("Umidade do Solo".to_string());
        let json = serde_json::to_string(&error).unwrap();
        assert!(json.contains("MISSING_TARGET_COLUMN"));
        assert!(json.contains("Umidade do Solo"));
    }

    #[test]
    fn test_with_context() {
        let error = ProcessingError::ColumnNotFound("Cultura".to_string())
            .with_context("While filtering by crop");
        assert!(error.to_string().contains("While filtering by crop"));
        assert_eq!(error.error_code(), "COLUMN_NOT_FOUND");
    }
}

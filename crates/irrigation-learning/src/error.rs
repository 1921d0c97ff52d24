//! Error types for the irrigation-learning crate.
//!
//! This module defines [`LearningError`], the main error type used throughout
//! the crate. All public API functions return [`Result<T>`].
//!
//! # Example
//!
//! ```rust,ignore
//! use irrigation_learning::{LearningError, RegressionEngine, TrainingConfig};
//!
//! let engine = RegressionEngine::new(TrainingConfig::default());
//! match engine.predict(&[25.0, 0.0]) {
//!     Err(LearningError::NoTrainedModel) => println!("train first"),
//!     other => println!("{other:?}"),
//! }
//! ```

use serde::Serialize;
use serde::ser::SerializeStruct;
use thiserror::Error;

use irrigation_processing::ProcessingError;

/// The main error type for training, selection and prediction.
///
/// This enum is marked `#[non_exhaustive]` to allow adding new variants
/// in future versions without breaking downstream code.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum LearningError {
    /// Invalid configuration provided to an engine.
    ///
    /// Check the error message for the offending setting and its accepted range.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Invalid data provided for training.
    ///
    /// Common causes:
    /// - feature matrix and target have different row counts
    /// - too few rows to carve out a non-empty train and test partition
    /// - non-binary target handed to the classification engine
    #[error("Invalid data: {0}")]
    InvalidData(String),

    /// The classification target holds a single class.
    ///
    /// No roster is produced. Supply data where the relay was both on and off.
    #[error("Classification target has a single class ({class}); at least 2 are required")]
    InsufficientClassDiversity {
        /// The only observed class value.
        class: f64,
    },

    /// Selection was requested before any model was trained.
    #[error("No trained models to select from")]
    EmptyRoster,

    /// Prediction was requested before training or loading.
    #[error("No trained model available; train or load an engine first")]
    NoTrainedModel,

    /// A prediction row does not match the training-time feature count.
    ///
    /// Build rows with [`FeatureSchema::row`](crate::FeatureSchema::row) to
    /// align features by name.
    #[error("Feature mismatch: expected {expected} values, got {actual}")]
    FeatureMismatch {
        /// Number of features recorded at training time.
        expected: usize,
        /// Number of values supplied.
        actual: usize,
    },

    /// An estimator was used before `fit`.
    #[error("Model '{0}' has not been fitted")]
    ModelNotFitted(String),

    /// A numeric routine failed (singular system, empty partition, ...).
    #[error("Computation error: {0}")]
    Computation(String),

    /// A persisted artifact is missing from the model directory.
    #[error("Artifact not found: {path}")]
    ArtifactNotFound {
        /// The path that was not found.
        path: String,
    },

    /// Dataset preparation failed.
    #[error(transparent)]
    Processing(#[from] ProcessingError),

    /// I/O error during save/load.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Artifact (de)serialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl LearningError {
    /// Get a stable error code for programmatic handling.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidConfig(_) => "INVALID_CONFIG",
            Self::InvalidData(_) => "INVALID_DATA",
            Self::InsufficientClassDiversity { .. } => "INSUFFICIENT_CLASS_DIVERSITY",
            Self::EmptyRoster => "EMPTY_ROSTER",
            Self::NoTrainedModel => "NO_TRAINED_MODEL",
            Self::FeatureMismatch { .. } => "FEATURE_MISMATCH",
            Self::ModelNotFitted(_) => "MODEL_NOT_FITTED",
            Self::Computation(_) => "COMPUTATION_ERROR",
            Self::ArtifactNotFound { .. } => "ARTIFACT_NOT_FOUND",
            Self::Processing(e) => e.error_code(),
            Self::Io(_) => "IO_ERROR",
            Self::Json(_) => "JSON_ERROR",
        }
    }

    /// Check if the caller can fix this without changing the code path.
    ///
    /// Precondition violations (train before predict) and data problems are
    /// recoverable; numeric failures and corrupted artifacts are not.
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::InvalidConfig(_)
            | Self::InvalidData(_)
            | Self::InsufficientClassDiversity { .. }
            | Self::EmptyRoster
            | Self::NoTrainedModel
            | Self::FeatureMismatch { .. }
            | Self::ArtifactNotFound { .. } => true,
            Self::Processing(e) => e.is_recoverable(),
            _ => false,
        }
    }
}

impl Serialize for LearningError {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let mut state = serializer.serialize_struct("LearningError", 2)?;
        state.serialize_field("code", &self.error_code())?;
        state.serialize_field("message", &self.to_string())?;
        state.end()
    }
}

/// Result type alias for learning operations.
pub type Result<T> = std::result::Result<T, LearningError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = LearningError::InsufficientClassDiversity { class: 1.0 };
        assert!(err.to_string().contains("single class (1)"));

        let err = LearningError::FeatureMismatch {
            expected: 12,
            actual: 10,
        };
        assert_eq!(
            err.to_string(),
            "Feature mismatch: expected 12 values, got 10"
        );
    }

    #[test]
    fn test_error_codes() {
        assert_eq!(LearningError::EmptyRoster.error_code(), "EMPTY_ROSTER");
        assert_eq!(LearningError::NoTrainedModel.error_code(), "NO_TRAINED_MODEL");
        let processing: LearningError =
            ProcessingError::MissingTargetColumn("Relay_On".to_string()).into();
        assert_eq!(processing.error_code(), "MISSING_TARGET_COLUMN");
    }

    #[test]
    fn test_is_recoverable() {
        assert!(LearningError::NoTrainedModel.is_recoverable());
        assert!(!LearningError::Computation("singular".to_string()).is_recoverable());
    }

    #[test]
    fn test_error_serialization() {
        let json = serde_json::to_string(&LearningError::EmptyRoster).unwrap();
        assert!(json.contains("\"code\":\"EMPTY_ROSTER\""));
    }
}

//! Progress reporting for training runs.
//!
//! Engines accept an optional [`ProgressCallback`] and invoke it as a run
//! moves through its [`TrainingStage`]s and across the roster.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use irrigation_learning::{ProgressUpdate, RegressionEngine, TrainingConfig};
//!
//! let engine = RegressionEngine::new(TrainingConfig::default()).on_progress(Arc::new(
//!     |update: ProgressUpdate| {
//!         if let Some((done, total)) = update.models_completed {
//!             println!("{done}/{total} {}", update.message);
//!         }
//!     },
//! ));
//! # let _ = engine;
//! ```

use std::str::FromStr;
use std::sync::Arc;

/// Stage of a training run, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[non_exhaustive]
pub enum TrainingStage {
    /// Partitioning rows into train and test.
    #[default]
    Splitting,
    /// Fitting the scaler and, when configured, the PCA projection.
    Scaling,
    /// Fitting and evaluating roster members.
    Training,
    /// Picking the best roster member.
    Selecting,
    /// The run finished and a model is selected.
    Complete,
}

impl TrainingStage {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            TrainingStage::Splitting => "splitting",
            TrainingStage::Scaling => "scaling",
            TrainingStage::Training => "training",
            TrainingStage::Selecting => "selecting",
            TrainingStage::Complete => "complete",
        }
    }

    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, TrainingStage::Complete)
    }
}

/// Error returned when parsing an unknown stage name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseTrainingStageError {
    invalid_value: String,
}

impl ParseTrainingStageError {
    #[must_use]
    pub fn invalid_value(&self) -> &str {
        &self.invalid_value
    }
}

impl std::fmt::Display for ParseTrainingStageError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "invalid training stage: '{}'. Valid values are: splitting, scaling, \
             training, selecting, complete",
            self.invalid_value
        )
    }
}

impl std::error::Error for ParseTrainingStageError {}

impl FromStr for TrainingStage {
    type Err = ParseTrainingStageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "splitting" => Ok(TrainingStage::Splitting),
            "scaling" => Ok(TrainingStage::Scaling),
            "training" => Ok(TrainingStage::Training),
            "selecting" => Ok(TrainingStage::Selecting),
            "complete" => Ok(TrainingStage::Complete),
            _ => Err(ParseTrainingStageError {
                invalid_value: s.to_string(),
            }),
        }
    }
}

/// A progress update sent to the callback.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ProgressUpdate {
    pub stage: TrainingStage,

    /// Overall progress from 0.0 to 1.0, non-decreasing within a run.
    pub progress: f64,

    /// Human-readable status message.
    pub message: String,

    /// Display name of the roster member being fitted, during
    /// [`Training`](TrainingStage::Training).
    pub current_model: Option<String>,

    /// `(completed, total)` roster members.
    pub models_completed: Option<(u32, u32)>,
}

/// Progress callback shared by an engine.
///
/// Callbacks run synchronously on the training thread and should return
/// quickly.
pub type ProgressCallback = Arc<dyn Fn(ProgressUpdate) + Send + Sync>;

/// Emits updates to an optional callback.
#[derive(Clone, Default)]
pub(crate) struct ProgressReporter {
    callback: Option<ProgressCallback>,
}

impl std::fmt::Debug for ProgressReporter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProgressReporter")
            .field("callback", &self.callback.as_ref().map(|_| "<callback>"))
            .finish()
    }
}

impl ProgressReporter {
    pub(crate) fn new(callback: ProgressCallback) -> Self {
        Self {
            callback: Some(callback),
        }
    }

    pub(crate) fn stage(&self, stage: TrainingStage, progress: f64, message: impl Into<String>) {
        if let Some(callback) = &self.callback {
            callback(ProgressUpdate {
                stage,
                progress,
                message: message.into(),
                current_model: None,
                models_completed: None,
            });
        }
    }

    /// Report roster member `done` of `total` (0-based before fitting,
    /// 1-based after). Training spans progress 0.1 to 0.9.
    pub(crate) fn model(&self, name: &str, done: usize, total: usize) {
        if let Some(callback) = &self.callback {
            let fraction = if total == 0 {
                1.0
            } else {
                done as f64 / total as f64
            };
            callback(ProgressUpdate {
                stage: TrainingStage::Training,
                progress: 0.1 + 0.8 * fraction,
                message: format!("Training {name}"),
                current_model: Some(name.to_string()),
                models_completed: Some((done as u32, total as u32)),
            });
        }
    }
}

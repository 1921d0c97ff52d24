//! irrigation-learning: model training, selection and prediction for
//! irrigation data.
//!
//! Two engines turn a prepared dataset into a fitted, selected model:
//!
//! - [`RegressionEngine`] predicts soil moisture from linear, ridge, lasso,
//!   random-forest and gradient-boosting regressors, selected by test R².
//! - [`ClassificationEngine`] predicts relay activation from logistic
//!   regression, random forest, gradient boosting, SVM and KNN, selected by
//!   test F1.
//!
//! Every estimator is implemented natively on `ndarray`.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use irrigation_learning::{RegressionEngine, TrainingConfig, TrainingData};
//! use irrigation_processing::{FeaturePreprocessor, Task, read_csv};
//!
//! let df = read_csv("dados_irrigacao.csv")?;
//! let prepared = FeaturePreprocessor::default().prepare(&df, Task::Regression)?;
//! let data = TrainingData::try_from(&prepared)?;
//!
//! let mut engine = RegressionEngine::new(TrainingConfig::default());
//! engine.train(&data)?;
//! for row in engine.summaries() {
//!     println!("{:<20} R2={:.3}", row.name, row.test_score);
//! }
//!
//! let schema = engine.schema().expect("trained");
//! let row = schema
//!     .row()
//!     .set("Temperatura", 31.0)
//!     .category("Cultura", "SOJA")
//!     .build();
//! println!("predicted moisture: {:.1}%", engine.predict(&row)?);
//! ```
//!
//! # Architecture
//!
//! ```text
//! TrainingData ──► split ──► StandardScaler ──► [Pca] ──► roster ──► select_best
//!                                                            │
//!                          FeatureSchema::row() ──► predict ◄┘
//! ```
//!
//! # Error Handling
//!
//! All fallible operations return [`Result<T>`] with [`LearningError`]:
//!
//! - [`LearningError::InsufficientClassDiversity`] - single-class target
//! - [`LearningError::EmptyRoster`] - selection before training
//! - [`LearningError::NoTrainedModel`] - prediction before training or loading
//! - [`LearningError::FeatureMismatch`] - prediction row of the wrong width
//!
//! Feature importance never fails; it returns
//! [`FeatureImportance::Unavailable`] instead.
//!
//! # Thread Safety
//!
//! Engines are `Send + Sync` but training takes `&mut self`. Give each
//! session its own engine, or wrap a shared one in a lock.

mod config;
mod data;
mod engine;
mod error;
mod importance;
pub mod metrics;
pub mod models;
mod pca;
mod persistence;
mod progress;
mod scaler;
mod schema;
mod selection;
pub mod split;
mod types;

pub use config::{TrainingConfig, TrainingConfigBuilder};
pub use data::TrainingData;
pub use engine::{ClassificationEngine, RegressionEngine, TrainedClassifier, TrainedRegressor};
pub use error::{LearningError, Result};
pub use importance::rank_importances;
pub use pca::{Pca, PcaInfo};
pub use persistence::{ArtifactPaths, SavedModel};
pub use progress::{ProgressCallback, ProgressUpdate, TrainingStage};
pub use scaler::StandardScaler;
pub use schema::{FeatureSchema, RowBuilder};
pub use selection::select_best;
pub use types::{
    ClassificationMetrics, ClassificationScores, ConfusionMatrix, FeatureImportance,
    FeatureScore, ModelSummary, RegressionMetrics, RegressionScores, SelectionMetric,
    SplitStrategy, TrainedModel,
};

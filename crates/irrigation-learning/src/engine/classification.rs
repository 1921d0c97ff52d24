use std::path::Path;
use std::time::Instant;

use ndarray::Array1;
use tracing::{debug, info, warn};

use irrigation_processing::Task;

use super::{EngineState, Partitions, check_trainable, elapsed_secs, fit_roster};
use crate::config::TrainingConfig;
use crate::data::TrainingData;
use crate::error::{LearningError, Result};
use crate::importance::rank_importances;
use crate::metrics::classification_metrics;
use crate::models::{ClassificationModel, Classifier};
use crate::pca::PcaInfo;
use crate::progress::{ProgressCallback, ProgressReporter, TrainingStage};
use crate::schema::FeatureSchema;
use crate::split::{shuffle_split, stratified_split};
use crate::types::{
    ClassificationMetrics, FeatureImportance, ModelSummary, SplitStrategy, TrainedModel,
};

/// Roster entry of the classification engine.
pub type TrainedClassifier = TrainedModel<ClassificationModel, ClassificationMetrics>;

/// Relay-activation classification engine.
///
/// The target must hold exactly two distinct values. Internally the smaller
/// one is encoded as 0 and the larger as 1 (the positive class);
/// predictions are returned in the original labels.
#[derive(Debug, Clone)]
pub struct ClassificationEngine {
    config: TrainingConfig,
    progress: ProgressReporter,
    state: EngineState<ClassificationModel, ClassificationMetrics>,
    labels: Option<[f64; 2]>,
    split_strategy: Option<SplitStrategy>,
}

static_assertions::assert_impl_all!(ClassificationEngine: Send, Sync);

/// Distinct target values in ascending order, or the diversity error.
fn binary_labels(y: &Array1<f64>) -> Result<[f64; 2]> {
    let mut classes: Vec<f64> = y.to_vec();
    classes.sort_by(f64::total_cmp);
    classes.dedup();

    match classes.as_slice() {
        [] => Err(LearningError::InvalidData("empty target".to_string())),
        [only] => Err(LearningError::InsufficientClassDiversity { class: *only }),
        [negative, positive] => Ok([*negative, *positive]),
        more => Err(LearningError::InvalidData(format!(
            "classification target must be binary, found {} classes",
            more.len()
        ))),
    }
}

impl ClassificationEngine {
    pub fn new(config: TrainingConfig) -> Self {
        Self {
            config,
            progress: ProgressReporter::default(),
            state: EngineState::default(),
            labels: None,
            split_strategy: None,
        }
    }

    /// Install a progress callback.
    #[must_use]
    pub fn on_progress(mut self, callback: ProgressCallback) -> Self {
        self.progress = ProgressReporter::new(callback);
        self
    }

    pub fn config(&self) -> &TrainingConfig {
        &self.config
    }

    /// Split (stratified when feasible), scale, fit the roster and select
    /// the member with the best test F1.
    ///
    /// # Errors
    ///
    /// - [`LearningError::InsufficientClassDiversity`] if the target holds a
    ///   single class; no roster is produced
    /// - [`LearningError::InvalidData`] for a non-binary target or too few rows
    /// - [`LearningError::EmptyRoster`] if every roster member fails; a single
    ///   failing member is skipped
    pub fn train(&mut self, data: &TrainingData) -> Result<&[TrainedClassifier]> {
        check_trainable(data.n_samples(), data.n_features())?;
        let labels = binary_labels(&data.y)?;
        self.state = EngineState::default();
        self.labels = None;
        self.split_strategy = None;

        let encoded = data.y.mapv(|v| if v == labels[1] { 1.0 } else { 0.0 });

        self.progress
            .stage(TrainingStage::Splitting, 0.0, "Splitting train/test");
        let encoded_labels = encoded.to_vec();
        let (split, strategy) = match stratified_split(
            &encoded_labels,
            self.config.test_size,
            self.config.random_seed,
        ) {
            Ok(split) => (split, SplitStrategy::Stratified),
            Err(e) => {
                warn!("Stratified split infeasible ({e}); using unstratified split");
                (
                    shuffle_split(data.n_samples(), self.config.test_size, self.config.random_seed)?,
                    SplitStrategy::Unstratified,
                )
            }
        };
        debug!(
            "Classification split ({:?}): {} train, {} test",
            strategy,
            split.train.len(),
            split.test.len()
        );

        self.progress
            .stage(TrainingStage::Scaling, 0.05, "Fitting scaler");
        let (transform, parts) = Partitions::new(&data.x, &encoded, &split, &self.config)?;

        let roster = fit_roster(
            ClassificationModel::roster(&self.config),
            &self.progress,
            ClassificationModel::name,
            |mut model| {
                let name = model.name();
                let start = Instant::now();

                model.fit(&parts.x_train, &parts.y_train)?;
                let train_pred = model.predict(&parts.x_train)?;
                let test_pred = model.predict(&parts.x_test)?;
                let y_proba = model.predict_proba(&parts.x_test)?.map(|p| p.to_vec());
                let training_time_seconds = elapsed_secs(start);

                let metrics = classification_metrics(
                    &parts.y_train.to_vec(),
                    &train_pred.to_vec(),
                    &parts.y_test.to_vec(),
                    &test_pred.to_vec(),
                );
                info!(
                    "{}: F1={:.4} accuracy={:.4} ({:.2}s)",
                    name, metrics.test.f1, metrics.test.accuracy, training_time_seconds
                );

                Ok(TrainedModel {
                    name: name.to_string(),
                    model,
                    metrics,
                    y_test: parts.y_test.iter().map(|&v| decode(labels, v)).collect(),
                    y_pred: test_pred.iter().map(|&v| decode(labels, v)).collect(),
                    y_proba,
                    training_time_seconds,
                })
            },
        )?;

        self.progress
            .stage(TrainingStage::Selecting, 0.9, "Selecting best model");
        let best = self
            .state
            .install(roster, transform, FeatureSchema::from_training_data(data, &split.train))?;
        self.labels = Some(labels);
        self.split_strategy = Some(strategy);

        let winner = &self.state.roster()[best];
        info!(
            "Best classification model: {} (F1={:.4})",
            winner.name, winner.metrics.test.f1
        );
        self.progress.stage(
            TrainingStage::Complete,
            1.0,
            format!("Selected {}", winner.name),
        );

        Ok(self.state.roster())
    }

    /// Re-run selection over the current roster and return the winner.
    pub fn select_best(&mut self) -> Result<(&str, &ClassificationModel)> {
        let idx = self.state.select()?;
        let trained = &self.state.roster()[idx];
        Ok((trained.name.as_str(), &trained.model))
    }

    pub fn best_model_name(&self) -> Option<&str> {
        self.state.selected().ok().map(|(name, _, _)| name)
    }

    /// Which split path the last training run took.
    pub fn split_strategy(&self) -> Option<SplitStrategy> {
        self.split_strategy
    }

    fn active_labels(&self, loaded: Option<[f64; 2]>) -> [f64; 2] {
        self.labels.or(loaded).unwrap_or([0.0, 1.0])
    }

    /// Predicted class label for one row in training feature order.
    pub fn predict(&self, row: &[f64]) -> Result<f64> {
        let (_, model, loaded) = self.state.selected()?;
        let x = self.state.prepare_row(row)?;
        Ok(decode(self.active_labels(loaded), model.predict(&x)?[0]))
    }

    /// Positive-class probability for one row, `None` when the selected
    /// model has no probability output.
    pub fn predict_proba(&self, row: &[f64]) -> Result<Option<f64>> {
        let (_, model, _) = self.state.selected()?;
        let x = self.state.prepare_row(row)?;
        Ok(model.predict_proba(&x)?.map(|p| p[0]))
    }

    /// Ranked importances from the random forest, or gradient boosting when
    /// no forest is in the roster.
    pub fn feature_importance(&self) -> FeatureImportance {
        let Some(schema) = self.state.schema() else {
            return FeatureImportance::Unavailable;
        };
        let source = self
            .state
            .find("Random Forest")
            .or_else(|| self.state.find("Gradient Boosting"));
        match source {
            Some(trained) => rank_importances(
                &trained.name,
                trained.model.feature_importances(),
                schema.feature_names(),
            ),
            None => FeatureImportance::Unavailable,
        }
    }

    /// Ranked importances of the selected model, trained or loaded.
    ///
    /// `Unavailable` unless the selection is a tree ensemble fitted on the
    /// original feature columns.
    pub fn selected_feature_importance(&self) -> FeatureImportance {
        let (Ok((name, model, _)), Some(schema)) = (self.state.selected(), self.state.schema())
        else {
            return FeatureImportance::Unavailable;
        };
        rank_importances(name, model.feature_importances(), schema.feature_names())
    }

    pub fn roster(&self) -> &[TrainedClassifier] {
        self.state.roster()
    }

    pub fn summaries(&self) -> Vec<ModelSummary> {
        self.state.summaries()
    }

    pub fn schema(&self) -> Option<&FeatureSchema> {
        self.state.schema()
    }

    pub fn pca_info(&self) -> Option<PcaInfo> {
        self.state.pca_info()
    }

    pub fn save(&self, dir: impl AsRef<Path>) -> Result<()> {
        self.state
            .save(dir.as_ref(), Task::Classification, self.labels)
    }

    pub fn load(dir: impl AsRef<Path>, config: TrainingConfig) -> Result<Self> {
        Ok(Self {
            config,
            progress: ProgressReporter::default(),
            state: EngineState::load(dir.as_ref(), Task::Classification)?,
            labels: None,
            split_strategy: None,
        })
    }
}

fn decode(labels: [f64; 2], encoded: f64) -> f64 {
    if encoded >= 0.5 { labels[1] } else { labels[0] }
}

use std::path::Path;
use std::time::Instant;

use tracing::{debug, info};

use irrigation_processing::Task;

use super::{EngineState, Partitions, check_trainable, elapsed_secs, fit_roster};
use crate::config::TrainingConfig;
use crate::data::TrainingData;
use crate::error::Result;
use crate::importance::rank_importances;
use crate::metrics::regression_metrics;
use crate::models::{RegressionModel, Regressor};
use crate::pca::PcaInfo;
use crate::progress::{ProgressCallback, ProgressReporter, TrainingStage};
use crate::schema::FeatureSchema;
use crate::split::shuffle_split;
use crate::types::{FeatureImportance, ModelSummary, RegressionMetrics, TrainedModel};

/// Roster entry of the regression engine.
pub type TrainedRegressor = TrainedModel<RegressionModel, RegressionMetrics>;

/// Soil-moisture regression engine.
///
/// # Example
///
/// ```rust,ignore
/// use irrigation_learning::{RegressionEngine, TrainingConfig, TrainingData};
///
/// let mut engine = RegressionEngine::new(TrainingConfig::default());
/// engine.train(&data)?;
/// let (name, _) = engine.select_best()?;
/// let row = engine.schema().unwrap().row().set("Temperatura", 28.0).build();
/// println!("{name}: {:.1}%", engine.predict(&row)?);
/// ```
#[derive(Debug, Clone)]
pub struct RegressionEngine {
    config: TrainingConfig,
    progress: ProgressReporter,
    state: EngineState<RegressionModel, RegressionMetrics>,
}

static_assertions::assert_impl_all!(RegressionEngine: Send, Sync);

impl RegressionEngine {
    pub fn new(config: TrainingConfig) -> Self {
        Self {
            config,
            progress: ProgressReporter::default(),
            state: EngineState::default(),
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

    /// Split, scale, fit the whole roster and select the best member.
    ///
    /// Any previous roster and selection are discarded first. Returns the
    /// roster in evaluation order.
    ///
    /// # Errors
    ///
    /// - [`LearningError::InvalidData`](crate::LearningError::InvalidData) if
    ///   the data cannot be split into two non-empty partitions
    /// - [`LearningError::EmptyRoster`](crate::LearningError::EmptyRoster) if
    ///   every roster member fails; a single failing member is skipped
    pub fn train(&mut self, data: &TrainingData) -> Result<&[TrainedRegressor]> {
        check_trainable(data.n_samples(), data.n_features())?;
        self.state = EngineState::default();

        self.progress
            .stage(TrainingStage::Splitting, 0.0, "Splitting train/test");
        let split = shuffle_split(data.n_samples(), self.config.test_size, self.config.random_seed)?;
        debug!(
            "Regression split: {} train, {} test",
            split.train.len(),
            split.test.len()
        );

        self.progress
            .stage(TrainingStage::Scaling, 0.05, "Fitting scaler");
        let (transform, parts) = Partitions::new(&data.x, &data.y, &split, &self.config)?;

        let roster = fit_roster(
            RegressionModel::roster(&self.config),
            &self.progress,
            RegressionModel::name,
            |mut model| {
                let name = model.name();
                let start = Instant::now();

                model.fit(&parts.x_train, &parts.y_train)?;
                let train_pred = model.predict(&parts.x_train)?;
                let test_pred = model.predict(&parts.x_test)?;
                let training_time_seconds = elapsed_secs(start);

                let y_train = parts.y_train.to_vec();
                let y_test = parts.y_test.to_vec();
                let y_pred = test_pred.to_vec();
                let metrics = regression_metrics(&y_train, &train_pred.to_vec(), &y_test, &y_pred);
                info!(
                    "{}: R2={:.4} RMSE={:.4} ({:.2}s)",
                    name, metrics.test.r2, metrics.test.rmse, training_time_seconds
                );

                Ok(TrainedModel {
                    name: name.to_string(),
                    model,
                    metrics,
                    y_test,
                    y_pred,
                    y_proba: None,
                    training_time_seconds,
                })
            },
        )?;

        self.progress
            .stage(TrainingStage::Selecting, 0.9, "Selecting best model");
        let best = self
            .state
            .install(roster, transform, FeatureSchema::from_training_data(data, &split.train))?;
        let winner = &self.state.roster()[best];
        info!(
            "Best regression model: {} (R2={:.4})",
            winner.name, winner.metrics.test.r2
        );
        self.progress.stage(
            TrainingStage::Complete,
            1.0,
            format!("Selected {}", winner.name),
        );

        Ok(self.state.roster())
    }

    /// Re-run selection over the current roster and return the winner.
    ///
    /// # Errors
    ///
    /// [`LearningError::EmptyRoster`](crate::LearningError::EmptyRoster) before
    /// any training run.
    pub fn select_best(&mut self) -> Result<(&str, &RegressionModel)> {
        let idx = self.state.select()?;
        let trained = &self.state.roster()[idx];
        Ok((trained.name.as_str(), &trained.model))
    }

    /// Name of the selected model, trained or loaded.
    pub fn best_model_name(&self) -> Option<&str> {
        self.state.selected().ok().map(|(name, _, _)| name)
    }

    /// Predict soil moisture for one row in training feature order.
    ///
    /// # Errors
    ///
    /// - [`LearningError::NoTrainedModel`](crate::LearningError::NoTrainedModel)
    ///   before training or loading
    /// - [`LearningError::FeatureMismatch`](crate::LearningError::FeatureMismatch)
    ///   if `row` has the wrong length
    pub fn predict(&self, row: &[f64]) -> Result<f64> {
        let (_, model, _) = self.state.selected()?;
        let x = self.state.prepare_row(row)?;
        Ok(model.predict(&x)?[0])
    }

    /// Ranked importances from the random forest of the current roster.
    pub fn feature_importance(&self) -> FeatureImportance {
        let (Some(trained), Some(schema)) = (self.state.find("Random Forest"), self.state.schema())
        else {
            return FeatureImportance::Unavailable;
        };
        rank_importances(
            &trained.name,
            trained.model.feature_importances(),
            schema.feature_names(),
        )
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

    pub fn roster(&self) -> &[TrainedRegressor] {
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

    /// Write the selected model, scaler, PCA and schema to `dir`.
    pub fn save(&self, dir: impl AsRef<Path>) -> Result<()> {
        self.state.save(dir.as_ref(), Task::Regression, None)
    }

    /// Restore an engine saved with [`save`](Self::save). The result predicts
    /// but has no roster.
    pub fn load(dir: impl AsRef<Path>, config: TrainingConfig) -> Result<Self> {
        Ok(Self {
            config,
            progress: ProgressReporter::default(),
            state: EngineState::load(dir.as_ref(), Task::Regression)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::LearningError;
    use ndarray::{Array1, Array2};

    // =========================================================================
    // Test Helpers
    // =========================================================================

    fn linear_data(n: usize) -> TrainingData {
        let x = Array2::from_shape_fn((n, 2), |(i, j)| {
            if j == 0 { ((i * 7) % 11) as f64 } else { (i % 5) as f64 }
        });
        let y: Array1<f64> = x.rows().into_iter().map(|r| 3.0 * r[0] - r[1] + 10.0).collect();
        TrainingData::new(x, y, vec!["Temperatura".to_string(), "PH".to_string()]).unwrap()
    }

    fn quick_config() -> TrainingConfig {
        TrainingConfig::builder().n_estimators(10).build().unwrap()
    }

    // =========================================================================
    // Training & selection
    // =========================================================================

    #[test]
    fn test_train_fills_roster_in_order() {
        let mut engine = RegressionEngine::new(quick_config());
        let roster = engine.train(&linear_data(30)).unwrap();
        let names: Vec<&str> = roster.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names[0], "Linear Regression");
        assert_eq!(names.len(), 5);
        assert!(roster.iter().all(|t| t.y_test.len() == 6));
    }

    #[test]
    fn test_selected_model_has_max_r2() {
        let mut engine = RegressionEngine::new(quick_config());
        engine.train(&linear_data(30)).unwrap();

        let best_r2 = engine
            .roster()
            .iter()
            .map(|t| t.metrics.test.r2)
            .fold(f64::NEG_INFINITY, f64::max);
        let name = engine.select_best().unwrap().0.to_string();
        let chosen = engine.roster().iter().find(|t| t.name == name).unwrap();
        assert_eq!(chosen.metrics.test.r2, best_r2);
    }

    #[test]
    fn test_failing_members_are_left_out() {
        // Unvalidated config: both ensembles reject zero estimators at fit time.
        let mut config = quick_config();
        config.n_estimators = 0;
        let mut engine = RegressionEngine::new(config);

        let roster = engine.train(&linear_data(30)).unwrap();
        let names: Vec<&str> = roster.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(
            names,
            vec!["Linear Regression", "Ridge Regression", "Lasso Regression"]
        );
        assert!(roster.iter().all(|t| t.metrics.test.r2.is_finite()));
        assert_eq!(engine.best_model_name(), Some("Linear Regression"));
        assert!(engine.predict(&[5.0, 2.0]).is_ok());
        assert_eq!(engine.feature_importance(), FeatureImportance::Unavailable);
    }

    #[test]
    fn test_select_before_train() {
        let mut engine = RegressionEngine::new(quick_config());
        assert!(matches!(engine.select_best(), Err(LearningError::EmptyRoster)));
    }

    // =========================================================================
    // Prediction
    // =========================================================================

    #[test]
    fn test_predict_before_train() {
        let engine = RegressionEngine::new(quick_config());
        assert!(matches!(
            engine.predict(&[1.0, 2.0]),
            Err(LearningError::NoTrainedModel)
        ));
    }

    #[test]
    fn test_predict_is_idempotent_and_checks_width() {
        let mut engine = RegressionEngine::new(quick_config());
        engine.train(&linear_data(30)).unwrap();

        let a = engine.predict(&[5.0, 2.0]).unwrap();
        let b = engine.predict(&[5.0, 2.0]).unwrap();
        assert_eq!(a, b);
        assert!(matches!(
            engine.predict(&[5.0]),
            Err(LearningError::FeatureMismatch { expected: 2, actual: 1 })
        ));
    }

    // =========================================================================
    // Importance & PCA
    // =========================================================================

    #[test]
    fn test_feature_importance_from_forest() {
        let mut engine = RegressionEngine::new(quick_config());
        assert_eq!(engine.feature_importance(), FeatureImportance::Unavailable);

        engine.train(&linear_data(30)).unwrap();
        match engine.feature_importance() {
            FeatureImportance::Ranked { model, scores } => {
                assert_eq!(model, "Random Forest");
                assert_eq!(scores[0].feature, "Temperatura");
            }
            FeatureImportance::Unavailable => panic!("expected ranked importances"),
        }
    }

    #[test]
    fn test_linear_winner_has_no_importance() {
        let mut engine = RegressionEngine::new(quick_config());
        engine.train(&linear_data(30)).unwrap();

        // Exactly linear target: ordinary least squares scores R2 = 1 and
        // wins ties by roster order.
        assert_eq!(engine.best_model_name(), Some("Linear Regression"));
        assert_eq!(
            engine.selected_feature_importance(),
            FeatureImportance::Unavailable
        );
        assert!(matches!(
            engine.feature_importance(),
            FeatureImportance::Ranked { .. }
        ));
    }

    #[test]
    fn test_constant_target_importance_is_unavailable() {
        let mut data = linear_data(30);
        data.y.fill(42.0);
        let mut engine = RegressionEngine::new(quick_config());
        engine.train(&data).unwrap();

        // No split ever reduces impurity, so the forest's importances sum to zero.
        let forest = engine
            .roster()
            .iter()
            .find(|t| t.name == "Random Forest")
            .unwrap();
        assert_eq!(forest.model.feature_importances().unwrap().sum(), 0.0);
        assert_eq!(engine.feature_importance(), FeatureImportance::Unavailable);
    }

    #[test]
    fn test_pca_makes_importance_unavailable() {
        let config = TrainingConfig::builder()
            .n_estimators(5)
            .pca_components(1)
            .build()
            .unwrap();
        let mut engine = RegressionEngine::new(config);
        engine.train(&linear_data(30)).unwrap();

        assert_eq!(engine.pca_info().unwrap().n_components, 1);
        assert_eq!(engine.feature_importance(), FeatureImportance::Unavailable);
        assert_eq!(
            engine.selected_feature_importance(),
            FeatureImportance::Unavailable
        );
        assert!(engine.predict(&[5.0, 2.0]).is_ok());
    }
}

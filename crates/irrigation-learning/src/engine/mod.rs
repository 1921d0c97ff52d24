//! Training engines for the two irrigation tasks.
//!
//! [`RegressionEngine`] predicts soil moisture; [`ClassificationEngine`]
//! predicts relay activation. Both follow the same run:
//!
//! 1. split rows (seeded, 20% test by default)
//! 2. fit the scaler (and optional PCA) on the training partition only
//! 3. fit every roster member on a fresh instance and score it; a member
//!    that fails is logged and left out
//! 4. select the member with the best held-out score
//!
//! An engine exclusively owns its scaler, roster and selection. Retraining
//! replaces all three; nothing is shared between engines.

mod classification;
mod regression;

pub use classification::{ClassificationEngine, TrainedClassifier};
pub use regression::{RegressionEngine, TrainedRegressor};

use std::path::Path;

use ndarray::{Array1, Array2, Axis};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{info, warn};

use irrigation_processing::Task;

use crate::config::TrainingConfig;
use crate::error::{LearningError, Result};
use crate::pca::{Pca, PcaInfo};
use crate::persistence::{ArtifactPaths, SavedModel, read_json, write_json};
use crate::progress::ProgressReporter;
use crate::scaler::StandardScaler;
use crate::schema::FeatureSchema;
use crate::selection::select_best;
use crate::split::SplitIndices;
use crate::types::{ModelSummary, SelectionMetric, TrainedModel};

/// Scaler plus optional PCA, fitted on the training partition.
#[derive(Debug, Clone)]
pub(crate) struct FeatureTransform {
    scaler: StandardScaler,
    pca: Option<Pca>,
}

impl FeatureTransform {
    /// Fit on `x_train` and return the transformed training matrix.
    fn fit(x_train: &Array2<f64>, config: &TrainingConfig) -> Result<(Self, Array2<f64>)> {
        let mut scaler = StandardScaler::new();
        let scaled = scaler.fit_transform(x_train)?;
        let (pca, projected) = match config.pca_components {
            Some(k) => {
                let pca = Pca::fit(&scaled, k, config.random_seed)?;
                let projected = pca.transform(&scaled)?;
                (Some(pca), projected)
            }
            None => (None, scaled),
        };
        Ok((Self { scaler, pca }, projected))
    }

    fn apply(&self, x: &Array2<f64>) -> Result<Array2<f64>> {
        let scaled = self.scaler.transform(x)?;
        match &self.pca {
            Some(pca) => pca.transform(&scaled),
            None => Ok(scaled),
        }
    }

    fn apply_row(&self, row: &[f64]) -> Result<Array2<f64>> {
        let row = Array1::from_vec(row.to_vec());
        let scaled = self.scaler.transform_row(row.view())?;
        let out = match &self.pca {
            Some(pca) => pca.transform_row(scaled.view())?,
            None => scaled,
        };
        Ok(out.insert_axis(Axis(0)))
    }
}

/// Train and test partitions of one run, already transformed.
pub(crate) struct Partitions {
    pub x_train: Array2<f64>,
    pub x_test: Array2<f64>,
    pub y_train: Array1<f64>,
    pub y_test: Array1<f64>,
}

impl Partitions {
    fn new(
        x: &Array2<f64>,
        y: &Array1<f64>,
        split: &SplitIndices,
        config: &TrainingConfig,
    ) -> Result<(FeatureTransform, Self)> {
        let x_train_raw = x.select(Axis(0), &split.train);
        let x_test_raw = x.select(Axis(0), &split.test);
        let (transform, x_train) = FeatureTransform::fit(&x_train_raw, config)?;
        let x_test = transform.apply(&x_test_raw)?;
        Ok((
            transform,
            Self {
                x_train,
                x_test,
                y_train: y.select(Axis(0), &split.train),
                y_test: y.select(Axis(0), &split.test),
            },
        ))
    }
}

/// Roster, selection and fitted artifacts of one engine.
#[derive(Debug, Clone)]
pub(crate) struct EngineState<M, S> {
    roster: Vec<TrainedModel<M, S>>,
    best: Option<usize>,
    /// Selection restored from disk; there is no roster behind it.
    loaded: Option<SavedModel<M>>,
    transform: Option<FeatureTransform>,
    schema: Option<FeatureSchema>,
}

impl<M, S> Default for EngineState<M, S> {
    fn default() -> Self {
        Self {
            roster: Vec::new(),
            best: None,
            loaded: None,
            transform: None,
            schema: None,
        }
    }
}

impl<M, S> EngineState<M, S>
where
    M: Clone + Serialize + DeserializeOwned,
    S: SelectionMetric,
{
    fn install(
        &mut self,
        roster: Vec<TrainedModel<M, S>>,
        transform: FeatureTransform,
        schema: FeatureSchema,
    ) -> Result<usize> {
        *self = Self {
            roster,
            best: None,
            loaded: None,
            transform: Some(transform),
            schema: Some(schema),
        };
        self.select()
    }

    fn select(&mut self) -> Result<usize> {
        let idx = select_best(&self.roster)?;
        self.best = Some(idx);
        Ok(idx)
    }

    fn roster(&self) -> &[TrainedModel<M, S>] {
        &self.roster
    }

    fn find(&self, name: &str) -> Option<&TrainedModel<M, S>> {
        self.roster.iter().find(|t| t.name == name)
    }

    fn best(&self) -> Option<&TrainedModel<M, S>> {
        self.best.and_then(|idx| self.roster.get(idx))
    }

    /// Name, model and label mapping of the current selection.
    fn selected(&self) -> Result<(&str, &M, Option<[f64; 2]>)> {
        if let Some(trained) = self.best() {
            return Ok((trained.name.as_str(), &trained.model, None));
        }
        match &self.loaded {
            Some(saved) => Ok((saved.name.as_str(), &saved.model, saved.labels)),
            None => Err(LearningError::NoTrainedModel),
        }
    }

    /// Check a raw row against the schema and transform it into a 1-row matrix.
    fn prepare_row(&self, row: &[f64]) -> Result<Array2<f64>> {
        let (Some(transform), Some(schema)) = (&self.transform, &self.schema) else {
            return Err(LearningError::NoTrainedModel);
        };
        if row.len() != schema.len() {
            return Err(LearningError::FeatureMismatch {
                expected: schema.len(),
                actual: row.len(),
            });
        }
        transform.apply_row(row)
    }

    fn summaries(&self) -> Vec<ModelSummary> {
        self.roster.iter().map(ModelSummary::from_trained).collect()
    }

    fn schema(&self) -> Option<&FeatureSchema> {
        self.schema.as_ref()
    }

    fn pca_info(&self) -> Option<PcaInfo> {
        self.transform
            .as_ref()
            .and_then(|t| t.pca.as_ref())
            .map(Pca::info)
    }

    fn save(&self, dir: &Path, task: Task, labels: Option<[f64; 2]>) -> Result<()> {
        let (name, model, loaded_labels) = self.selected()?;
        let (Some(transform), Some(schema)) = (&self.transform, &self.schema) else {
            return Err(LearningError::NoTrainedModel);
        };

        let paths = ArtifactPaths::new(dir, task);
        write_json(
            &paths.model,
            &SavedModel {
                name: name.to_string(),
                model: model.clone(),
                labels: labels.or(loaded_labels),
            },
        )?;
        write_json(&paths.scaler, &transform.scaler)?;
        if let Some(pca) = &transform.pca {
            write_json(&paths.pca, pca)?;
        } else if paths.pca.exists() {
            std::fs::remove_file(&paths.pca)?;
        }
        write_json(&paths.schema, schema)?;

        info!("Saved {} model '{}' to {}", task, name, dir.display());
        Ok(())
    }

    fn load(dir: &Path, task: Task) -> Result<Self> {
        let paths = ArtifactPaths::new(dir, task);
        let saved: SavedModel<M> = read_json(&paths.model)?;
        let scaler: StandardScaler = read_json(&paths.scaler)?;
        let pca: Option<Pca> = if paths.pca.exists() {
            Some(read_json(&paths.pca)?)
        } else {
            None
        };
        let schema: FeatureSchema = read_json(&paths.schema)?;

        info!("Loaded {} model '{}' from {}", task, saved.name, dir.display());
        Ok(Self {
            roster: Vec::new(),
            best: None,
            loaded: Some(saved),
            transform: Some(FeatureTransform { scaler, pca }),
            schema: Some(schema),
        })
    }
}

/// Run `evaluate` on every candidate in order and collect the survivors.
///
/// A member whose fit or scoring fails is logged and skipped. Fails with
/// [`LearningError::EmptyRoster`] only when no member survives.
fn fit_roster<M, T>(
    candidates: Vec<M>,
    progress: &ProgressReporter,
    name_of: impl Fn(&M) -> &'static str,
    mut evaluate: impl FnMut(M) -> Result<T>,
) -> Result<Vec<T>> {
    let total = candidates.len();
    let mut roster = Vec::with_capacity(total);
    for (idx, model) in candidates.into_iter().enumerate() {
        let name = name_of(&model);
        progress.model(name, idx, total);
        match evaluate(model) {
            Ok(trained) => roster.push(trained),
            Err(e) => warn!("{} failed ({}); leaving it out of the roster", name, e),
        }
        progress.model(name, idx + 1, total);
    }

    if roster.is_empty() {
        return Err(LearningError::EmptyRoster);
    }
    if roster.len() < total {
        warn!("{} of {} models trained", roster.len(), total);
    }
    Ok(roster)
}

/// Seconds elapsed since `start`.
fn elapsed_secs(start: std::time::Instant) -> f64 {
    start.elapsed().as_secs_f64()
}

/// Reject data that cannot be split into two non-empty partitions.
fn check_trainable(n_samples: usize, n_features: usize) -> Result<()> {
    if n_features == 0 {
        return Err(LearningError::InvalidData(
            "dataset has no feature columns".to_string(),
        ));
    }
    if n_samples < 2 {
        return Err(LearningError::InvalidData(format!(
            "need at least 2 rows to train, got {n_samples}"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    // =========================================================================
    // Roster fitting
    // =========================================================================

    #[test]
    fn test_failing_member_is_skipped() {
        let candidates = vec!["first", "broken", "last"];
        let roster = fit_roster(
            candidates,
            &ProgressReporter::default(),
            |name: &&'static str| *name,
            |name| match name {
                "broken" => Err(LearningError::Computation("singular matrix".to_string())),
                other => Ok(other.to_uppercase()),
            },
        )
        .unwrap();
        assert_eq!(roster, vec!["FIRST".to_string(), "LAST".to_string()]);
    }

    #[test]
    fn test_all_members_failing_is_empty_roster() {
        let result: Result<Vec<()>> = fit_roster(
            vec!["a", "b"],
            &ProgressReporter::default(),
            |name: &&'static str| *name,
            |_| Err(LearningError::InvalidData("no rows".to_string())),
        );
        assert!(matches!(result, Err(LearningError::EmptyRoster)));
    }
}

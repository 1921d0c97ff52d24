//! Gradient-boosted regression trees.
//!
//! Both models fit each stage to the negative gradient of their loss:
//! plain residuals for squared error, `y - p` for log loss.

use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};

use super::tree::DecisionTree;
use super::{Classifier, Regressor, check_features, check_shapes};
use crate::error::{LearningError, Result};

/// Additive stage ensemble shared by both boosting models.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
struct Stages {
    init: f64,
    trees: Vec<DecisionTree>,
    feature_importances: Option<Array1<f64>>,
    n_features: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
struct BoostParams {
    n_estimators: usize,
    max_depth: usize,
    learning_rate: f64,
    seed: u64,
}

impl Stages {
    /// Boost from `init`, mapping raw scores to predictions with `link`.
    fn fit(
        x: &Array2<f64>,
        y: &Array1<f64>,
        init: f64,
        params: BoostParams,
        link: fn(f64) -> f64,
    ) -> Result<Self> {
        check_shapes(x, y)?;
        if params.n_estimators == 0 {
            return Err(LearningError::InvalidConfig(
                "boosting needs at least one stage".to_string(),
            ));
        }

        let mut raw = Array1::from_elem(x.nrows(), init);
        let mut trees = Vec::with_capacity(params.n_estimators);
        let mut importances = Array1::<f64>::zeros(x.ncols());

        for stage in 0..params.n_estimators {
            let residuals = y - &raw.mapv(link);
            let mut tree = DecisionTree::regressor()
                .with_max_depth(params.max_depth)
                .with_seed(params.seed.wrapping_add(stage as u64));
            tree.fit(x, &residuals)?;

            raw.scaled_add(params.learning_rate, &tree.predict(x)?);
            if let Some(imp) = tree.feature_importances() {
                importances += imp;
            }
            trees.push(tree);
        }

        let total = importances.sum();
        if total > 0.0 {
            importances /= total;
        }

        Ok(Self {
            init,
            trees,
            feature_importances: Some(importances),
            n_features: x.ncols(),
        })
    }

    fn raw_scores(&self, x: &Array2<f64>, learning_rate: f64, model: &str) -> Result<Array1<f64>> {
        if self.trees.is_empty() {
            return Err(LearningError::ModelNotFitted(model.to_string()));
        }
        check_features(self.n_features, x)?;

        let mut raw = Array1::from_elem(x.nrows(), self.init);
        for tree in &self.trees {
            raw.scaled_add(learning_rate, &tree.predict(x)?);
        }
        Ok(raw)
    }
}

fn identity(v: f64) -> f64 {
    v
}

fn sigmoid(v: f64) -> f64 {
    1.0 / (1.0 + (-v).exp())
}

// =============================================================================
// Regressor
// =============================================================================

/// Squared-error boosting starting from the target mean.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GradientBoostingRegressor {
    params: BoostParams,
    stages: Stages,
}

impl GradientBoostingRegressor {
    pub fn new(n_estimators: usize, max_depth: usize, learning_rate: f64, seed: u64) -> Self {
        Self {
            params: BoostParams {
                n_estimators,
                max_depth,
                learning_rate,
                seed,
            },
            stages: Stages::default(),
        }
    }
}

impl Regressor for GradientBoostingRegressor {
    fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
        let init = y.mean().unwrap_or(0.0);
        self.stages = Stages::fit(x, y, init, self.params, identity)?;
        Ok(())
    }

    fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        self.stages
            .raw_scores(x, self.params.learning_rate, "Gradient Boosting")
    }

    fn feature_importances(&self) -> Option<&Array1<f64>> {
        self.stages.feature_importances.as_ref()
    }
}

// =============================================================================
// Classifier
// =============================================================================

/// Log-loss boosting starting from the prior log-odds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GradientBoostingClassifier {
    params: BoostParams,
    stages: Stages,
}

impl GradientBoostingClassifier {
    pub fn new(n_estimators: usize, max_depth: usize, learning_rate: f64, seed: u64) -> Self {
        Self {
            params: BoostParams {
                n_estimators,
                max_depth,
                learning_rate,
                seed,
            },
            stages: Stages::default(),
        }
    }

    fn proba(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        Ok(self
            .stages
            .raw_scores(x, self.params.learning_rate, "Gradient Boosting")?
            .mapv(sigmoid))
    }
}

impl Classifier for GradientBoostingClassifier {
    fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
        let p = y.mean().unwrap_or(0.5).clamp(1e-6, 1.0 - 1e-6);
        let init = (p / (1.0 - p)).ln();
        self.stages = Stages::fit(x, y, init, self.params, sigmoid)?;
        Ok(())
    }

    fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        Ok(self.proba(x)?.mapv(|p| if p > 0.5 { 1.0 } else { 0.0 }))
    }

    fn predict_proba(&self, x: &Array2<f64>) -> Result<Option<Array1<f64>>> {
        self.proba(x).map(Some)
    }

    fn feature_importances(&self) -> Option<&Array1<f64>> {
        self.stages.feature_importances.as_ref()
    }
}

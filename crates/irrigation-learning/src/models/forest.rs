//! Bagged decision-tree ensembles.

use ndarray::{Array1, Array2};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::tree::{Criterion, DecisionTree};
use super::{Classifier, Regressor, check_features, check_shapes};
use crate::error::{LearningError, Result};

/// Trees, their averaged importances and the fitted feature count.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
struct Forest {
    trees: Vec<DecisionTree>,
    feature_importances: Option<Array1<f64>>,
    n_features: usize,
}

impl Forest {
    /// Grow `n_estimators` trees, each on a bootstrap sample drawn with
    /// seed `seed + tree_index`.
    fn grow(
        x: &Array2<f64>,
        y: &Array1<f64>,
        n_estimators: usize,
        max_depth: usize,
        criterion: Criterion,
        max_features: Option<usize>,
        seed: u64,
    ) -> Result<Self> {
        check_shapes(x, y)?;
        if n_estimators == 0 {
            return Err(LearningError::InvalidConfig(
                "a forest needs at least one tree".to_string(),
            ));
        }

        let n = x.nrows();
        let mut trees = Vec::with_capacity(n_estimators);
        for tree_idx in 0..n_estimators {
            let tree_seed = seed.wrapping_add(tree_idx as u64);
            let mut rng = ChaCha8Rng::seed_from_u64(tree_seed);
            let sample: Vec<usize> = (0..n).map(|_| rng.gen_range(0..n)).collect();

            let mut tree = DecisionTree::new(criterion)
                .with_max_depth(max_depth)
                .with_max_features(max_features)
                .with_seed(tree_seed);
            tree.fit_indices(x, y, &sample)?;
            trees.push(tree);
        }

        let mut importances = Array1::<f64>::zeros(x.ncols());
        for tree in &trees {
            if let Some(imp) = tree.feature_importances() {
                importances += imp;
            }
        }
        let total = importances.sum();
        if total > 0.0 {
            importances /= total;
        }
        debug!("Grew forest of {} trees on {} samples", trees.len(), n);

        Ok(Self {
            trees,
            feature_importances: Some(importances),
            n_features: x.ncols(),
        })
    }

    /// Mean of the per-tree outputs.
    fn average(&self, x: &Array2<f64>, model: &str) -> Result<Array1<f64>> {
        if self.trees.is_empty() {
            return Err(LearningError::ModelNotFitted(model.to_string()));
        }
        check_features(self.n_features, x)?;

        let mut total = Array1::<f64>::zeros(x.nrows());
        for tree in &self.trees {
            total += &tree.predict(x)?;
        }
        Ok(total / self.trees.len() as f64)
    }
}

// =============================================================================
// Regressor
// =============================================================================

/// Random forest regressor; every split considers all features.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RandomForestRegressor {
    pub n_estimators: usize,
    pub max_depth: usize,
    pub seed: u64,
    forest: Forest,
}

impl RandomForestRegressor {
    pub fn new(n_estimators: usize, max_depth: usize, seed: u64) -> Self {
        Self {
            n_estimators,
            max_depth,
            seed,
            forest: Forest::default(),
        }
    }
}

impl Regressor for RandomForestRegressor {
    fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
        self.forest = Forest::grow(
            x,
            y,
            self.n_estimators,
            self.max_depth,
            Criterion::Mse,
            None,
            self.seed,
        )?;
        Ok(())
    }

    fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        self.forest.average(x, "Random Forest")
    }

    fn feature_importances(&self) -> Option<&Array1<f64>> {
        self.forest.feature_importances.as_ref()
    }
}

// =============================================================================
// Classifier
// =============================================================================

/// Random forest classifier; each split samples `sqrt(n_features)` features
/// and the ensemble probability is the mean leaf probability.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RandomForestClassifier {
    pub n_estimators: usize,
    pub max_depth: usize,
    pub seed: u64,
    forest: Forest,
}

impl RandomForestClassifier {
    pub fn new(n_estimators: usize, max_depth: usize, seed: u64) -> Self {
        Self {
            n_estimators,
            max_depth,
            seed,
            forest: Forest::default(),
        }
    }
}

impl Classifier for RandomForestClassifier {
    fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
        let max_features = ((x.ncols() as f64).sqrt().round() as usize).max(1);
        self.forest = Forest::grow(
            x,
            y,
            self.n_estimators,
            self.max_depth,
            Criterion::Gini,
            Some(max_features),
            self.seed,
        )?;
        Ok(())
    }

    fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        let proba = self.forest.average(x, "Random Forest")?;
        Ok(proba.mapv(|p| if p > 0.5 { 1.0 } else { 0.0 }))
    }

    fn predict_proba(&self, x: &Array2<f64>) -> Result<Option<Array1<f64>>> {
        self.forest.average(x, "Random Forest").map(Some)
    }

    fn feature_importances(&self) -> Option<&Array1<f64>> {
        self.forest.feature_importances.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn blobs() -> (Array2<f64>, Array1<f64>) {
        let x = array![
            [0.0, 0.1],
            [0.2, 0.0],
            [0.1, 0.3],
            [0.3, 0.2],
            [5.0, 5.1],
            [5.2, 4.9],
            [4.8, 5.0],
            [5.1, 5.3]
        ];
        let y = array![0.0, 0.0, 0.0, 0.0, 1.0, 1.0, 1.0, 1.0];
        (x, y)
    }

    #[test]
    fn test_classifier_separates_blobs() {
        let (x, y) = blobs();
        let mut rf = RandomForestClassifier::new(20, 5, 42);
        rf.fit(&x, &y).unwrap();

        assert_eq!(rf.predict(&x).unwrap(), y);
        let proba = rf.predict_proba(&array![[5.0, 5.0]]).unwrap().unwrap();
        assert!(proba[0] > 0.5);
    }

    #[test]
    fn test_regressor_is_deterministic() {
        let x = Array2::from_shape_fn((20, 2), |(i, j)| (i * (j + 1)) as f64);
        let y = Array1::from_shape_fn(20, |i| 2.0 * i as f64);

        let mut a = RandomForestRegressor::new(10, 4, 7);
        let mut b = RandomForestRegressor::new(10, 4, 7);
        a.fit(&x, &y).unwrap();
        b.fit(&x, &y).unwrap();
        assert_eq!(a.predict(&x).unwrap(), b.predict(&x).unwrap());

        let importances = a.feature_importances().unwrap();
        assert_eq!(importances.len(), 2);
        assert!((importances.sum() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_unfitted_forest() {
        let rf = RandomForestRegressor::new(10, 4, 7);
        assert!(matches!(
            rf.predict(&array![[1.0]]),
            Err(LearningError::ModelNotFitted(_))
        ));
        assert!(rf.feature_importances().is_none());
    }
}

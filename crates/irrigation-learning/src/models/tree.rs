//! CART decision tree, the building block of both ensembles.
//!
//! Splits are found by sorting each candidate feature once per node and
//! sweeping running sums, so impurity of both children is available in O(1)
//! per threshold. Leaves store the mean target of their samples; for 0/1
//! labels that mean is the positive-class probability.

use ndarray::{Array1, Array2};
use rand::SeedableRng;
use rand::seq::SliceRandom;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use super::{check_features, check_shapes};
use crate::error::{LearningError, Result};

/// Decision tree node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TreeNode {
    Leaf {
        value: f64,
        n_samples: usize,
    },
    Split {
        feature_idx: usize,
        threshold: f64,
        left: Box<TreeNode>,
        right: Box<TreeNode>,
        n_samples: usize,
    },
}

/// Impurity criterion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Criterion {
    /// Gini impurity over 0/1 labels.
    Gini,
    /// Variance of the target.
    Mse,
}

impl Criterion {
    /// Impurity of a node from its sample count, target sum and squared sum.
    fn impurity(self, count: f64, sum: f64, sq_sum: f64) -> f64 {
        if count <= 0.0 {
            return 0.0;
        }
        let mean = sum / count;
        match self {
            Self::Gini => 2.0 * mean * (1.0 - mean),
            Self::Mse => (sq_sum / count - mean * mean).max(0.0),
        }
    }
}

/// Decision tree grown to `max_depth`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionTree {
    pub criterion: Criterion,
    pub max_depth: Option<usize>,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
    /// Features sampled per split; `None` considers all of them.
    pub max_features: Option<usize>,
    pub seed: u64,
    root: Option<TreeNode>,
    n_features: usize,
    feature_importances: Option<Array1<f64>>,
}

struct BestSplit {
    feature: usize,
    threshold: f64,
    gain: f64,
}

impl DecisionTree {
    pub fn new(criterion: Criterion) -> Self {
        Self {
            criterion,
            max_depth: None,
            min_samples_split: 2,
            min_samples_leaf: 1,
            max_features: None,
            seed: 0,
            root: None,
            n_features: 0,
            feature_importances: None,
        }
    }

    pub fn classifier() -> Self {
        Self::new(Criterion::Gini)
    }

    pub fn regressor() -> Self {
        Self::new(Criterion::Mse)
    }

    #[must_use]
    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = Some(depth);
        self
    }

    #[must_use]
    pub fn with_max_features(mut self, max_features: Option<usize>) -> Self {
        self.max_features = max_features;
        self
    }

    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
        check_shapes(x, y)?;
        let indices: Vec<usize> = (0..x.nrows()).collect();
        self.fit_indices(x, y, &indices)
    }

    /// Fit on a subset of rows; indices may repeat (bootstrap samples).
    pub fn fit_indices(&mut self, x: &Array2<f64>, y: &Array1<f64>, indices: &[usize]) -> Result<()> {
        check_shapes(x, y)?;
        if indices.is_empty() {
            return Err(LearningError::InvalidData(
                "cannot grow a tree from zero samples".to_string(),
            ));
        }

        self.n_features = x.ncols();
        let mut importances = vec![0.0; self.n_features];
        let mut rng = ChaCha8Rng::seed_from_u64(self.seed);
        let root = self.grow(x, y, indices, 0, &mut importances, &mut rng);

        let total: f64 = importances.iter().sum();
        if total > 0.0 {
            importances.iter_mut().for_each(|imp| *imp /= total);
        }
        self.root = Some(root);
        self.feature_importances = Some(Array1::from_vec(importances));
        Ok(())
    }

    fn grow(
        &self,
        x: &Array2<f64>,
        y: &Array1<f64>,
        indices: &[usize],
        depth: usize,
        importances: &mut [f64],
        rng: &mut ChaCha8Rng,
    ) -> TreeNode {
        let n_samples = indices.len();
        let (sum, sq_sum) = indices
            .iter()
            .fold((0.0, 0.0), |(s, q), &i| (s + y[i], q + y[i] * y[i]));
        let value = sum / n_samples as f64;
        let leaf = TreeNode::Leaf { value, n_samples };

        let impurity = self.criterion.impurity(n_samples as f64, sum, sq_sum);
        if n_samples < self.min_samples_split
            || n_samples < 2 * self.min_samples_leaf
            || self.max_depth.is_some_and(|d| depth >= d)
            || impurity <= 1e-12
        {
            return leaf;
        }

        let Some(best) = self.best_split(x, y, indices, impurity, rng) else {
            return leaf;
        };

        let (left_idx, right_idx): (Vec<usize>, Vec<usize>) = indices
            .iter()
            .partition(|&&i| x[[i, best.feature]] <= best.threshold);
        if left_idx.is_empty() || right_idx.is_empty() {
            return leaf;
        }

        importances[best.feature] += n_samples as f64 * best.gain;

        let left = Box::new(self.grow(x, y, &left_idx, depth + 1, importances, rng));
        let right = Box::new(self.grow(x, y, &right_idx, depth + 1, importances, rng));
        TreeNode::Split {
            feature_idx: best.feature,
            threshold: best.threshold,
            left,
            right,
            n_samples,
        }
    }

    fn best_split(
        &self,
        x: &Array2<f64>,
        y: &Array1<f64>,
        indices: &[usize],
        parent_impurity: f64,
        rng: &mut ChaCha8Rng,
    ) -> Option<BestSplit> {
        let mut features: Vec<usize> = (0..x.ncols()).collect();
        if let Some(k) = self.max_features.filter(|&k| k < features.len()) {
            features.shuffle(rng);
            features.truncate(k.max(1));
        }

        let n = indices.len() as f64;
        let (total_sum, total_sq) = indices
            .iter()
            .fold((0.0, 0.0), |(s, q), &i| (s + y[i], q + y[i] * y[i]));

        let mut best: Option<BestSplit> = None;
        let mut order: Vec<usize> = indices.to_vec();

        for &feature in &features {
            order.sort_by(|&a, &b| x[[a, feature]].total_cmp(&x[[b, feature]]));

            let mut left_sum = 0.0;
            let mut left_sq = 0.0;
            for pos in 0..order.len() - 1 {
                let yi = y[order[pos]];
                left_sum += yi;
                left_sq += yi * yi;

                let current = x[[order[pos], feature]];
                let next = x[[order[pos + 1], feature]];
                if next <= current {
                    continue;
                }

                let left_n = (pos + 1) as f64;
                let right_n = n - left_n;
                if (pos + 1) < self.min_samples_leaf || (order.len() - pos - 1) < self.min_samples_leaf {
                    continue;
                }

                let weighted = (left_n * self.criterion.impurity(left_n, left_sum, left_sq)
                    + right_n
                        * self.criterion.impurity(
                            right_n,
                            total_sum - left_sum,
                            total_sq - left_sq,
                        ))
                    / n;
                let gain = parent_impurity - weighted;

                if gain > best.as_ref().map_or(1e-12, |b| b.gain) {
                    best = Some(BestSplit {
                        feature,
                        threshold: (current + next) / 2.0,
                        gain,
                    });
                }
            }
        }

        best
    }

    /// Leaf value for every row: the mean target, or the positive-class
    /// probability for a Gini tree.
    pub fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        let root = self
            .root
            .as_ref()
            .ok_or_else(|| LearningError::ModelNotFitted("DecisionTree".to_string()))?;
        check_features(self.n_features, x)?;

        Ok(x.rows()
            .into_iter()
            .map(|row| {
                let mut node = root;
                loop {
                    match node {
                        TreeNode::Leaf { value, .. } => break *value,
                        TreeNode::Split {
                            feature_idx,
                            threshold,
                            left,
                            right,
                            ..
                        } => {
                            node = if row[*feature_idx] <= *threshold {
                                left
                            } else {
                                right
                            };
                        }
                    }
                }
            })
            .collect())
    }

    pub fn feature_importances(&self) -> Option<&Array1<f64>> {
        self.feature_importances.as_ref()
    }

    pub fn depth(&self) -> usize {
        fn node_depth(node: &TreeNode) -> usize {
            match node {
                TreeNode::Leaf { .. } => 0,
                TreeNode::Split { left, right, .. } => 1 + node_depth(left).max(node_depth(right)),
            }
        }
        self.root.as_ref().map_or(0, node_depth)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_classifier_separates_threshold() {
        let x = array![[1.0], [2.0], [3.0], [10.0], [11.0], [12.0]];
        let y = array![0.0, 0.0, 0.0, 1.0, 1.0, 1.0];
        let mut tree = DecisionTree::classifier();
        tree.fit(&x, &y).unwrap();

        let predicted = tree.predict(&array![[0.0], [6.0], [20.0]]).unwrap();
        assert_eq!(predicted, array![0.0, 0.0, 1.0]);
        assert_eq!(tree.depth(), 1);
    }

    #[test]
    fn test_regressor_fits_step() {
        let x = array![[1.0], [2.0], [3.0], [4.0]];
        let y = array![5.0, 5.0, 9.0, 9.0];
        let mut tree = DecisionTree::regressor();
        tree.fit(&x, &y).unwrap();
        assert_eq!(tree.predict(&x).unwrap(), y);
    }

    #[test]
    fn test_max_depth_limits_growth() {
        let x = Array2::from_shape_fn((32, 1), |(i, _)| i as f64);
        let y = Array1::from_shape_fn(32, |i| (i % 2) as f64);
        let mut tree = DecisionTree::classifier().with_max_depth(2);
        tree.fit(&x, &y).unwrap();
        assert!(tree.depth() <= 2);
    }

    #[test]
    fn test_importances_favor_informative_feature() {
        let x = array![
            [0.0, 5.0],
            [1.0, 3.0],
            [2.0, 5.0],
            [10.0, 3.0],
            [11.0, 5.0],
            [12.0, 3.0]
        ];
        let y = array![0.0, 0.0, 0.0, 1.0, 1.0, 1.0];
        let mut tree = DecisionTree::classifier();
        tree.fit(&x, &y).unwrap();

        let importances = tree.feature_importances().unwrap();
        assert!((importances.sum() - 1.0).abs() < 1e-12);
        assert!(importances[0] > importances[1]);
    }

    #[test]
    fn test_predict_checks_feature_count() {
        let mut tree = DecisionTree::regressor();
        tree.fit(&array![[1.0, 2.0], [2.0, 1.0]], &array![1.0, 2.0]).unwrap();
        assert!(matches!(
            tree.predict(&array![[1.0]]),
            Err(LearningError::FeatureMismatch { expected: 2, actual: 1 })
        ));
    }
}

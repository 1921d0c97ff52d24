//! Native estimators and the fixed model rosters.
//!
//! Every estimator works on dense `ndarray` matrices of already-scaled
//! features. Classifiers expect binary labels encoded as `0.0`/`1.0`.
//!
//! The two roster enums, [`RegressionModel`] and [`ClassificationModel`],
//! wrap the concrete estimators so a roster can be stored, selected from and
//! persisted as a single serde type.

pub mod boosting;
pub mod forest;
pub mod knn;
pub mod linear;
pub mod logistic;
pub mod svm;
pub mod tree;

use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};

use crate::config::TrainingConfig;
use crate::error::{LearningError, Result};

pub use boosting::{GradientBoostingClassifier, GradientBoostingRegressor};
pub use forest::{RandomForestClassifier, RandomForestRegressor};
pub use knn::KnnClassifier;
pub use linear::{LassoRegression, LinearRegression, RidgeRegression};
pub use logistic::LogisticRegression;
pub use svm::SvmClassifier;
pub use tree::{Criterion, DecisionTree, TreeNode};

/// A model predicting a continuous target.
pub trait Regressor {
    fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()>;

    fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>>;

    /// Normalized per-feature importances, for models that expose them.
    fn feature_importances(&self) -> Option<&Array1<f64>> {
        None
    }
}

/// A binary classifier over `0.0`/`1.0` labels.
pub trait Classifier {
    fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()>;

    /// Hard labels, `0.0` or `1.0`.
    fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>>;

    /// Positive-class probabilities, `None` when the model has no
    /// probability output.
    fn predict_proba(&self, _x: &Array2<f64>) -> Result<Option<Array1<f64>>> {
        Ok(None)
    }

    fn feature_importances(&self) -> Option<&Array1<f64>> {
        None
    }
}

/// Shape check shared by every `fit`.
pub(crate) fn check_shapes(x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
    if x.nrows() == 0 {
        return Err(LearningError::InvalidData(
            "cannot fit on an empty matrix".to_string(),
        ));
    }
    if x.nrows() != y.len() {
        return Err(LearningError::InvalidData(format!(
            "feature matrix has {} rows but target has {}",
            x.nrows(),
            y.len()
        )));
    }
    Ok(())
}

/// Feature-count check shared by every `predict`.
pub(crate) fn check_features(expected: usize, x: &Array2<f64>) -> Result<()> {
    if x.ncols() != expected {
        return Err(LearningError::FeatureMismatch {
            expected,
            actual: x.ncols(),
        });
    }
    Ok(())
}

// =============================================================================
// Regression roster
// =============================================================================

/// One member of the regression roster.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", content = "model", rename_all = "snake_case")]
pub enum RegressionModel {
    Linear(LinearRegression),
    Ridge(RidgeRegression),
    Lasso(LassoRegression),
    RandomForest(RandomForestRegressor),
    GradientBoosting(GradientBoostingRegressor),
}

impl RegressionModel {
    /// Fresh, unfitted roster in its fixed evaluation order.
    pub fn roster(config: &TrainingConfig) -> Vec<Self> {
        vec![
            Self::Linear(LinearRegression::new()),
            Self::Ridge(RidgeRegression::new(config.ridge_alpha)),
            Self::Lasso(LassoRegression::new(config.lasso_alpha)),
            Self::RandomForest(RandomForestRegressor::new(
                config.n_estimators,
                config.forest_max_depth,
                config.random_seed,
            )),
            Self::GradientBoosting(GradientBoostingRegressor::new(
                config.n_estimators,
                config.boosting_max_depth,
                config.boosting_learning_rate,
                config.random_seed,
            )),
        ]
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Linear(_) => "Linear Regression",
            Self::Ridge(_) => "Ridge Regression",
            Self::Lasso(_) => "Lasso Regression",
            Self::RandomForest(_) => "Random Forest",
            Self::GradientBoosting(_) => "Gradient Boosting",
        }
    }

    fn inner(&self) -> &dyn Regressor {
        match self {
            Self::Linear(m) => m,
            Self::Ridge(m) => m,
            Self::Lasso(m) => m,
            Self::RandomForest(m) => m,
            Self::GradientBoosting(m) => m,
        }
    }

    fn inner_mut(&mut self) -> &mut dyn Regressor {
        match self {
            Self::Linear(m) => m,
            Self::Ridge(m) => m,
            Self::Lasso(m) => m,
            Self::RandomForest(m) => m,
            Self::GradientBoosting(m) => m,
        }
    }
}

impl Regressor for RegressionModel {
    fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
        self.inner_mut().fit(x, y)
    }

    fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        self.inner().predict(x)
    }

    fn feature_importances(&self) -> Option<&Array1<f64>> {
        self.inner().feature_importances()
    }
}

// =============================================================================
// Classification roster
// =============================================================================

/// One member of the classification roster.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", content = "model", rename_all = "snake_case")]
pub enum ClassificationModel {
    Logistic(LogisticRegression),
    RandomForest(RandomForestClassifier),
    GradientBoosting(GradientBoostingClassifier),
    Svm(SvmClassifier),
    Knn(KnnClassifier),
}

impl ClassificationModel {
    /// Fresh, unfitted roster in its fixed evaluation order.
    pub fn roster(config: &TrainingConfig) -> Vec<Self> {
        vec![
            Self::Logistic(LogisticRegression::new(config.logistic_max_iter)),
            Self::RandomForest(RandomForestClassifier::new(
                config.n_estimators,
                config.forest_max_depth,
                config.random_seed,
            )),
            Self::GradientBoosting(GradientBoostingClassifier::new(
                config.n_estimators,
                config.boosting_max_depth,
                config.boosting_learning_rate,
                config.random_seed,
            )),
            Self::Svm(SvmClassifier::new(config.svm_c, config.random_seed)),
            Self::Knn(KnnClassifier::new(config.knn_neighbors)),
        ]
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Logistic(_) => "Logistic Regression",
            Self::RandomForest(_) => "Random Forest",
            Self::GradientBoosting(_) => "Gradient Boosting",
            Self::Svm(_) => "SVM",
            Self::Knn(_) => "KNN",
        }
    }

    fn inner(&self) -> &dyn Classifier {
        match self {
            Self::Logistic(m) => m,
            Self::RandomForest(m) => m,
            Self::GradientBoosting(m) => m,
            Self::Svm(m) => m,
            Self::Knn(m) => m,
        }
    }

    fn inner_mut(&mut self) -> &mut dyn Classifier {
        match self {
            Self::Logistic(m) => m,
            Self::RandomForest(m) => m,
            Self::GradientBoosting(m) => m,
            Self::Svm(m) => m,
            Self::Knn(m) => m,
        }
    }
}

impl Classifier for ClassificationModel {
    fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
        self.inner_mut().fit(x, y)
    }

    fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        self.inner().predict(x)
    }

    fn predict_proba(&self, x: &Array2<f64>) -> Result<Option<Array1<f64>>> {
        self.inner().predict_proba(x)
    }

    fn feature_importances(&self) -> Option<&Array1<f64>> {
        self.inner().feature_importances()
    }
}

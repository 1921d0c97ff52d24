//! Configuration for the training engines.
//!
//! [`TrainingConfig`] carries the split settings and the fixed hyperparameters
//! of both model rosters. The defaults are the values the irrigation models
//! are evaluated with; there is no tuning.
//!
//! # Example
//!
//! ```
//! use irrigation_learning::TrainingConfig;
//!
//! let config = TrainingConfig::builder()
//!     .test_size(0.25)
//!     .random_seed(7)
//!     .pca_components(3)
//!     .build()
//!     .expect("valid config");
//! assert_eq!(config.pca_components, Some(3));
//! ```

use serde::{Deserialize, Serialize};

use crate::error::LearningError;

/// Split settings and roster hyperparameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingConfig {
    /// Fraction of rows held out for testing (default: 0.2).
    ///
    /// Must be in the open interval `(0.0, 1.0)`.
    pub test_size: f64,

    /// Seed for splitting and every stochastic estimator (default: 42).
    pub random_seed: u64,

    /// Project scaled features onto this many principal components before
    /// training (default: `None`, no projection).
    ///
    /// With PCA active, feature importance is reported as unavailable.
    pub pca_components: Option<usize>,

    /// L2 penalty of the ridge regressor (default: 1.0).
    pub ridge_alpha: f64,

    /// L1 penalty of the lasso regressor (default: 0.1).
    pub lasso_alpha: f64,

    /// Trees per ensemble, for both forests and boosting (default: 100).
    pub n_estimators: usize,

    /// Maximum depth of random-forest trees (default: 10).
    pub forest_max_depth: usize,

    /// Maximum depth of gradient-boosting trees (default: 5).
    pub boosting_max_depth: usize,

    /// Shrinkage applied to each boosting stage (default: 0.1).
    pub boosting_learning_rate: f64,

    /// Iteration cap of the logistic regression solver (default: 1000).
    pub logistic_max_iter: usize,

    /// Neighbours consulted by KNN (default: 5).
    pub knn_neighbors: usize,

    /// Soft-margin penalty of the SVM (default: 1.0).
    pub svm_c: f64,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            test_size: 0.2,
            random_seed: 42,
            pca_components: None,
            ridge_alpha: 1.0,
            lasso_alpha: 0.1,
            n_estimators: 100,
            forest_max_depth: 10,
            boosting_max_depth: 5,
            boosting_learning_rate: 0.1,
            logistic_max_iter: 1000,
            knn_neighbors: 5,
            svm_c: 1.0,
        }
    }
}

impl TrainingConfig {
    /// Create a new builder for `TrainingConfig`.
    #[must_use]
    pub fn builder() -> TrainingConfigBuilder {
        TrainingConfigBuilder::default()
    }

    /// Check every setting against its accepted range.
    pub fn validate(&self) -> Result<(), LearningError> {
        if self.test_size <= 0.0 || self.test_size >= 1.0 {
            return Err(LearningError::InvalidConfig(
                "test_size must be between 0.0 and 1.0 (exclusive)".to_string(),
            ));
        }

        if self.pca_components == Some(0) {
            return Err(LearningError::InvalidConfig(
                "pca_components must be at least 1".to_string(),
            ));
        }

        if self.ridge_alpha < 0.0 || self.lasso_alpha < 0.0 {
            return Err(LearningError::InvalidConfig(
                "regularization strengths must be non-negative".to_string(),
            ));
        }

        if self.n_estimators == 0 {
            return Err(LearningError::InvalidConfig(
                "n_estimators must be at least 1".to_string(),
            ));
        }

        if self.forest_max_depth == 0 || self.boosting_max_depth == 0 {
            return Err(LearningError::InvalidConfig(
                "tree depths must be at least 1".to_string(),
            ));
        }

        if self.boosting_learning_rate <= 0.0 {
            return Err(LearningError::InvalidConfig(
                "boosting_learning_rate must be positive".to_string(),
            ));
        }

        if self.logistic_max_iter == 0 {
            return Err(LearningError::InvalidConfig(
                "logistic_max_iter must be at least 1".to_string(),
            ));
        }

        if self.knn_neighbors == 0 {
            return Err(LearningError::InvalidConfig(
                "knn_neighbors must be at least 1".to_string(),
            ));
        }

        if self.svm_c <= 0.0 {
            return Err(LearningError::InvalidConfig(
                "svm_c must be positive".to_string(),
            ));
        }

        Ok(())
    }
}

/// Builder for [`TrainingConfig`].
///
/// Created via [`TrainingConfig::builder()`]. All setters return `self` to
/// allow method chaining.
#[derive(Debug, Clone, Default)]
pub struct TrainingConfigBuilder {
    config: TrainingConfig,
}

impl TrainingConfigBuilder {
    /// Set the test size fraction (default: 0.2).
    #[must_use]
    pub fn test_size(mut self, size: f64) -> Self {
        self.config.test_size = size;
        self
    }

    /// Set the random seed for reproducibility (default: 42).
    #[must_use]
    pub fn random_seed(mut self, seed: u64) -> Self {
        self.config.random_seed = seed;
        self
    }

    /// Enable PCA with `n` components.
    #[must_use]
    pub fn pca_components(mut self, n: usize) -> Self {
        self.config.pca_components = Some(n);
        self
    }

    /// Set the ridge penalty (default: 1.0).
    #[must_use]
    pub fn ridge_alpha(mut self, alpha: f64) -> Self {
        self.config.ridge_alpha = alpha;
        self
    }

    /// Set the lasso penalty (default: 0.1).
    #[must_use]
    pub fn lasso_alpha(mut self, alpha: f64) -> Self {
        self.config.lasso_alpha = alpha;
        self
    }

    /// Set the number of trees per ensemble (default: 100).
    #[must_use]
    pub fn n_estimators(mut self, n: usize) -> Self {
        self.config.n_estimators = n;
        self
    }

    /// Set the random-forest depth limit (default: 10).
    #[must_use]
    pub fn forest_max_depth(mut self, depth: usize) -> Self {
        self.config.forest_max_depth = depth;
        self
    }

    /// Set the boosting tree depth limit (default: 5).
    #[must_use]
    pub fn boosting_max_depth(mut self, depth: usize) -> Self {
        self.config.boosting_max_depth = depth;
        self
    }

    /// Set the boosting learning rate (default: 0.1).
    #[must_use]
    pub fn boosting_learning_rate(mut self, rate: f64) -> Self {
        self.config.boosting_learning_rate = rate;
        self
    }

    /// Set the logistic regression iteration cap (default: 1000).
    #[must_use]
    pub fn logistic_max_iter(mut self, iterations: usize) -> Self {
        self.config.logistic_max_iter = iterations;
        self
    }

    /// Set the KNN neighbour count (default: 5).
    #[must_use]
    pub fn knn_neighbors(mut self, k: usize) -> Self {
        self.config.knn_neighbors = k;
        self
    }

    /// Set the SVM penalty (default: 1.0).
    #[must_use]
    pub fn svm_c(mut self, c: f64) -> Self {
        self.config.svm_c = c;
        self
    }

    /// Build the configuration, validating all settings.
    ///
    /// # Errors
    ///
    /// Returns [`LearningError::InvalidConfig`] if:
    /// - `test_size` is not in range `(0.0, 1.0)`
    /// - `pca_components` is `Some(0)`
    /// - a penalty is negative, or a count/depth is zero
    pub fn build(self) -> Result<TrainingConfig, LearningError> {
        self.config.validate()?;
        Ok(self.config)
    }
}

//! Common types returned by the training engines.
//!
//! # Overview
//!
//! - [`RegressionMetrics`] / [`ClassificationMetrics`]: per-model evaluation
//! - [`TrainedModel`]: one roster entry (estimator, metrics, held-out predictions)
//! - [`FeatureImportance`]: ranked importances or an explicit `Unavailable`
//! - [`ModelSummary`]: one reporting row per roster entry
//! - [`SplitStrategy`]: which split path the classification engine took

use serde::{Deserialize, Serialize};

// =============================================================================
// Metrics
// =============================================================================

/// Regression scores on one partition.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct RegressionScores {
    pub mae: f64,
    pub mse: f64,
    pub rmse: f64,
    pub r2: f64,
}

/// Regression metrics for the train and test partitions.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct RegressionMetrics {
    pub train: RegressionScores,
    pub test: RegressionScores,
}

/// Binary classification scores on one partition.
///
/// Precision, recall and F1 are 0 when their denominator is 0.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ClassificationScores {
    pub accuracy: f64,
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
}

/// 2x2 confusion matrix, rows are actual classes, columns predicted.
///
/// Index 0 is the negative class, 1 the positive class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ConfusionMatrix(pub [[usize; 2]; 2]);

impl ConfusionMatrix {
    pub fn true_negatives(&self) -> usize {
        self.0[0][0]
    }

    pub fn false_positives(&self) -> usize {
        self.0[0][1]
    }

    pub fn false_negatives(&self) -> usize {
        self.0[1][0]
    }

    pub fn true_positives(&self) -> usize {
        self.0[1][1]
    }
}

/// Classification metrics: scores on both partitions, confusion matrix on test.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ClassificationMetrics {
    pub train: ClassificationScores,
    pub test: ClassificationScores,
    pub confusion_matrix: ConfusionMatrix,
}

/// Access to the scalar a roster is ranked by.
pub trait SelectionMetric {
    /// Name of the metric, for reports.
    const NAME: &'static str;

    /// Held-out score; higher is better.
    fn test_score(&self) -> f64;

    /// Same score on the training partition.
    fn train_score(&self) -> f64;
}

impl SelectionMetric for RegressionMetrics {
    const NAME: &'static str = "R2";

    fn test_score(&self) -> f64 {
        self.test.r2
    }

    fn train_score(&self) -> f64 {
        self.train.r2
    }
}

impl SelectionMetric for ClassificationMetrics {
    const NAME: &'static str = "F1";

    fn test_score(&self) -> f64 {
        self.test.f1
    }

    fn train_score(&self) -> f64 {
        self.train.f1
    }
}

// =============================================================================
// Roster
// =============================================================================

/// One fitted roster member with its evaluation.
///
/// Created once per training run and never modified afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainedModel<M, S> {
    /// Display name, e.g. "Random Forest".
    pub name: String,
    pub model: M,
    pub metrics: S,
    /// Held-out targets, in test-partition order.
    pub y_test: Vec<f64>,
    /// Held-out predictions aligned with `y_test`.
    pub y_pred: Vec<f64>,
    /// Positive-class probabilities on the test partition, when the model
    /// produces them.
    pub y_proba: Option<Vec<f64>>,
    pub training_time_seconds: f64,
}

/// Reporting row for one roster member.
///
/// `overfitting_risk` compares train and test scores:
/// - `"low"`: gap < 0.05
/// - `"medium"`: gap 0.05 to 0.15
/// - `"high"`: gap > 0.15
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelSummary {
    pub name: String,
    /// Name of the score, "R2" or "F1".
    pub metric: String,
    pub test_score: f64,
    pub train_score: f64,
    pub training_time_seconds: f64,
    pub overfitting_risk: String,
}

impl ModelSummary {
    pub fn from_trained<M, S: SelectionMetric>(trained: &TrainedModel<M, S>) -> Self {
        let test_score = trained.metrics.test_score();
        let train_score = trained.metrics.train_score();
        Self {
            name: trained.name.clone(),
            metric: S::NAME.to_string(),
            test_score,
            train_score,
            training_time_seconds: trained.training_time_seconds,
            overfitting_risk: overfitting_risk(train_score, test_score).to_string(),
        }
    }
}

fn overfitting_risk(train: f64, test: f64) -> &'static str {
    let gap = train - test;
    if gap < 0.05 {
        "low"
    } else if gap <= 0.15 {
        "medium"
    } else {
        "high"
    }
}

// =============================================================================
// Feature Importance
// =============================================================================

/// Importance of one feature.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureScore {
    pub feature: String,
    /// Raw importance reported by the model.
    pub importance: f64,
    /// Share of the total, in percent; all shares sum to 100.
    pub importance_percent: f64,
}

/// Result of an importance query.
///
/// `Unavailable` is a normal outcome, not an error: the selected source model
/// has no importances, or their length no longer matches the feature names.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", content = "ranking", rename_all = "snake_case")]
pub enum FeatureImportance {
    /// Scores sorted by descending importance, with the source model's name.
    Ranked {
        model: String,
        scores: Vec<FeatureScore>,
    },
    Unavailable,
}

impl FeatureImportance {
    pub fn is_available(&self) -> bool {
        matches!(self, Self::Ranked { .. })
    }

    /// Ranked scores, empty when unavailable.
    pub fn scores(&self) -> &[FeatureScore] {
        match self {
            Self::Ranked { scores, .. } => scores,
            Self::Unavailable => &[],
        }
    }
}

// =============================================================================
// Splitting
// =============================================================================

/// Which train/test split path was taken.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SplitStrategy {
    /// Class proportions preserved in both partitions.
    Stratified,
    /// Plain shuffled split; used for regression, and for classification
    /// when a class is too small to stratify.
    Unstratified,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_model_summary_from_trained() {
        let trained = TrainedModel {
            name: "Ridge Regression".to_string(),
            model: (),
            metrics: RegressionMetrics {
                train: RegressionScores {
                    r2: 0.95,
                    ..Default::default()
                },
                test: RegressionScores {
                    r2: 0.70,
                    ..Default::default()
                },
            },
            y_test: vec![],
            y_pred: vec![],
            y_proba: None,
            training_time_seconds: 0.01,
        };

        let summary = ModelSummary::from_trained(&trained);
        assert_eq!(summary.metric, "R2");
        assert_eq!(summary.test_score, 0.70);
        assert_eq!(summary.overfitting_risk, "high");
    }

    #[test]
    fn test_overfitting_risk_tiers() {
        assert_eq!(overfitting_risk(0.80, 0.79), "low");
        assert_eq!(overfitting_risk(0.90, 0.80), "medium");
        assert_eq!(overfitting_risk(0.99, 0.60), "high");
    }

    #[test]
    fn test_confusion_matrix_accessors() {
        let matrix = ConfusionMatrix([[5, 1], [2, 7]]);
        assert_eq!(matrix.true_negatives(), 5);
        assert_eq!(matrix.false_positives(), 1);
        assert_eq!(matrix.false_negatives(), 2);
        assert_eq!(matrix.true_positives(), 7);
    }

    #[test]
    fn test_feature_importance_unavailable_serialization() {
        let json = serde_json::to_string(&FeatureImportance::Unavailable).unwrap();
        assert_eq!(json, r#"{"status":"unavailable"}"#);
        assert!(FeatureImportance::Unavailable.scores().is_empty());
    }
}

//! Evaluation metrics.
//!
//! Every function returns a number for every input: degenerate cases
//! (empty input, zero denominators) yield 0 rather than an error so a roster
//! is always fully populated.

use crate::types::{
    ClassificationMetrics, ClassificationScores, ConfusionMatrix, RegressionMetrics,
    RegressionScores,
};

// =============================================================================
// Regression
// =============================================================================

pub fn mean_absolute_error(y_true: &[f64], y_pred: &[f64]) -> f64 {
    if y_true.is_empty() {
        return 0.0;
    }
    y_true
        .iter()
        .zip(y_pred)
        .map(|(t, p)| (t - p).abs())
        .sum::<f64>()
        / y_true.len() as f64
}

pub fn mean_squared_error(y_true: &[f64], y_pred: &[f64]) -> f64 {
    if y_true.is_empty() {
        return 0.0;
    }
    y_true
        .iter()
        .zip(y_pred)
        .map(|(t, p)| (t - p).powi(2))
        .sum::<f64>()
        / y_true.len() as f64
}

/// Coefficient of determination.
///
/// A constant target scores 1 when predicted exactly and 0 otherwise.
pub fn r2_score(y_true: &[f64], y_pred: &[f64]) -> f64 {
    if y_true.is_empty() {
        return 0.0;
    }
    let mean = y_true.iter().sum::<f64>() / y_true.len() as f64;
    let ss_res: f64 = y_true
        .iter()
        .zip(y_pred)
        .map(|(t, p)| (t - p).powi(2))
        .sum();
    let ss_tot: f64 = y_true.iter().map(|t| (t - mean).powi(2)).sum();

    if ss_tot == 0.0 {
        return if ss_res == 0.0 { 1.0 } else { 0.0 };
    }
    1.0 - ss_res / ss_tot
}

pub fn regression_scores(y_true: &[f64], y_pred: &[f64]) -> RegressionScores {
    let mse = mean_squared_error(y_true, y_pred);
    RegressionScores {
        mae: mean_absolute_error(y_true, y_pred),
        mse,
        rmse: mse.sqrt(),
        r2: r2_score(y_true, y_pred),
    }
}

pub fn regression_metrics(
    y_train: &[f64],
    train_pred: &[f64],
    y_test: &[f64],
    test_pred: &[f64],
) -> RegressionMetrics {
    RegressionMetrics {
        train: regression_scores(y_train, train_pred),
        test: regression_scores(y_test, test_pred),
    }
}

// =============================================================================
// Classification
// =============================================================================

/// Confusion matrix of 0/1 labels; 1 is the positive class.
pub fn confusion_matrix(y_true: &[f64], y_pred: &[f64]) -> ConfusionMatrix {
    let mut cells = [[0usize; 2]; 2];
    for (t, p) in y_true.iter().zip(y_pred) {
        let actual = usize::from(*t >= 0.5);
        let predicted = usize::from(*p >= 0.5);
        cells[actual][predicted] += 1;
    }
    ConfusionMatrix(cells)
}

fn ratio(numerator: usize, denominator: usize) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        numerator as f64 / denominator as f64
    }
}

pub fn classification_scores(y_true: &[f64], y_pred: &[f64]) -> ClassificationScores {
    let matrix = confusion_matrix(y_true, y_pred);
    let tp = matrix.true_positives();
    let fp = matrix.false_positives();
    let fn_ = matrix.false_negatives();
    let correct = tp + matrix.true_negatives();

    let precision = ratio(tp, tp + fp);
    let recall = ratio(tp, tp + fn_);
    let f1 = if precision + recall == 0.0 {
        0.0
    } else {
        2.0 * precision * recall / (precision + recall)
    };

    ClassificationScores {
        accuracy: ratio(correct, y_true.len()),
        precision,
        recall,
        f1,
    }
}

pub fn classification_metrics(
    y_train: &[f64],
    train_pred: &[f64],
    y_test: &[f64],
    test_pred: &[f64],
) -> ClassificationMetrics {
    ClassificationMetrics {
        train: classification_scores(y_train, train_pred),
        test: classification_scores(y_test, test_pred),
        confusion_matrix: confusion_matrix(y_test, test_pred),
    }
}

//! Best-of-roster selection.

use crate::error::{LearningError, Result};
use crate::types::{SelectionMetric, TrainedModel};

/// Index of the roster member with the highest held-out score.
///
/// Ties keep the earliest member, so the result follows roster order.
/// NaN scores never win.
pub fn select_best<M, S: SelectionMetric>(roster: &[TrainedModel<M, S>]) -> Result<usize> {
    if roster.is_empty() {
        return Err(LearningError::EmptyRoster);
    }

    let mut best_idx = 0;
    let mut best_score = f64::NEG_INFINITY;
    for (idx, trained) in roster.iter().enumerate() {
        let score = trained.metrics.test_score();
        if score > best_score {
            best_score = score;
            best_idx = idx;
        }
    }
    Ok(best_idx)
}

//! Feature-importance ranking.

use ndarray::Array1;
use tracing::debug;

use crate::types::{FeatureImportance, FeatureScore};

/// Rank `importances` against `feature_names`, rescaled to percentages.
///
/// Returns [`FeatureImportance::Unavailable`] when there is no vector, when
/// its length differs from the name list, or when it sums to zero.
pub fn rank_importances(
    model: &str,
    importances: Option<&Array1<f64>>,
    feature_names: &[String],
) -> FeatureImportance {
    let Some(importances) = importances else {
        debug!("{model} exposes no feature importances");
        return FeatureImportance::Unavailable;
    };
    if importances.len() != feature_names.len() {
        debug!(
            "{model} importances have {} entries for {} features",
            importances.len(),
            feature_names.len()
        );
        return FeatureImportance::Unavailable;
    }

    let total: f64 = importances.sum();
    if total.is_nan() || total <= 0.0 {
        return FeatureImportance::Unavailable;
    }

    let mut scores: Vec<FeatureScore> = feature_names
        .iter()
        .zip(importances.iter())
        .map(|(feature, &importance)| FeatureScore {
            feature: feature.clone(),
            importance,
            importance_percent: importance / total * 100.0,
        })
        .collect();
    scores.sort_by(|a, b| b.importance.total_cmp(&a.importance));

    FeatureImportance::Ranked {
        model: model.to_string(),
        scores,
    }
}

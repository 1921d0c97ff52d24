//! Training-time feature schema and name-based row reconstruction.
//!
//! The set of one-hot columns depends on which categories appeared in the
//! training data, so prediction rows are assembled by feature name, never by
//! position.
//!
//! # Example
//!
//! ```
//! use std::collections::BTreeMap;
//! use irrigation_learning::FeatureSchema;
//!
//! let schema = FeatureSchema::new(
//!     vec!["Temperatura".into(), "PH".into(), "Cultura_MILHO".into(), "Cultura_SOJA".into()],
//!     vec!["Cultura_MILHO".into(), "Cultura_SOJA".into()],
//!     BTreeMap::from([("PH".to_string(), 6.5)]),
//! );
//!
//! let row = schema
//!     .row()
//!     .set("Temperatura", 28.0)
//!     .category("Cultura", "SOJA")
//!     .build();
//! assert_eq!(row, vec![28.0, 6.5, 0.0, 1.0]);
//! ```

use std::collections::{BTreeMap, BTreeSet};

use ndarray::Axis;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::data::TrainingData;

/// Feature names in training order, which of them are one-hot indicators,
/// and training means for filling unsupplied numeric features.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureSchema {
    feature_names: Vec<String>,
    one_hot_columns: BTreeSet<String>,
    means: BTreeMap<String, f64>,
}

impl FeatureSchema {
    pub fn new(
        feature_names: Vec<String>,
        one_hot_columns: impl IntoIterator<Item = String>,
        means: BTreeMap<String, f64>,
    ) -> Self {
        Self {
            feature_names,
            one_hot_columns: one_hot_columns.into_iter().collect(),
            means,
        }
    }

    /// Schema of `data`, with means computed over the (unscaled) rows listed
    /// in `train_rows`. Held-out rows never contribute to the fill values.
    pub fn from_training_data(data: &TrainingData, train_rows: &[usize]) -> Self {
        let means = data
            .x
            .select(Axis(0), train_rows)
            .mean_axis(Axis(0))
            .map(|m| {
                data.feature_names
                    .iter()
                    .cloned()
                    .zip(m.iter().copied())
                    .collect()
            })
            .unwrap_or_default();
        Self::new(
            data.feature_names.clone(),
            data.one_hot_columns.iter().cloned(),
            means,
        )
    }

    pub fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    pub fn len(&self) -> usize {
        self.feature_names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.feature_names.is_empty()
    }

    pub fn contains(&self, feature: &str) -> bool {
        self.feature_names.iter().any(|f| f == feature)
    }

    pub fn is_one_hot(&self, feature: &str) -> bool {
        self.one_hot_columns.contains(feature)
    }

    /// Training mean of a feature, if recorded.
    pub fn mean(&self, feature: &str) -> Option<f64> {
        self.means.get(feature).copied()
    }

    /// Start building a prediction row.
    pub fn row(&self) -> RowBuilder<'_> {
        RowBuilder {
            schema: self,
            values: BTreeMap::new(),
        }
    }
}

/// Builds a feature vector in training order from named values.
#[derive(Debug, Clone)]
pub struct RowBuilder<'a> {
    schema: &'a FeatureSchema,
    values: BTreeMap<String, f64>,
}

impl RowBuilder<'_> {
    /// Set a feature by name. Names unknown to the schema are ignored.
    #[must_use]
    pub fn set(mut self, feature: &str, value: f64) -> Self {
        if self.schema.contains(feature) {
            self.values.insert(feature.to_string(), value);
        } else {
            debug!("Ignoring feature '{feature}' not seen during training");
        }
        self
    }

    /// Activate the one-hot column `{prefix}_{category}`.
    ///
    /// A category not seen during training activates nothing, leaving every
    /// column of that prefix at 0.
    #[must_use]
    pub fn category(self, prefix: &str, category: &str) -> Self {
        let column = format!("{prefix}_{category}");
        self.set(&column, 1.0)
    }

    /// Feature vector: supplied values, then 0 for one-hot columns, then the
    /// training mean (0 when unknown) for everything else.
    pub fn build(self) -> Vec<f64> {
        self.schema
            .feature_names
            .iter()
            .map(|name| match self.values.get(name) {
                Some(value) => *value,
                None if self.schema.is_one_hot(name) => 0.0,
                None => self.schema.mean(name).unwrap_or(0.0),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn schema() -> FeatureSchema {
        let data = TrainingData::new(
            array![[20.0, 1.0, 0.0], [30.0, 0.0, 1.0]],
            array![1.0, 2.0],
            vec![
                "Temperatura".to_string(),
                "Cultura_MILHO".to_string(),
                "Cultura_SOJA".to_string(),
            ],
        )
        .unwrap()
        .with_one_hot_columns(vec!["Cultura_MILHO".to_string(), "Cultura_SOJA".to_string()]);
        FeatureSchema::from_training_data(&data, &[0, 1])
    }

    #[test]
    fn test_defaults_fill_means_and_zero_one_hot() {
        let row = schema().row().build();
        assert_eq!(row, vec![25.0, 0.0, 0.0]);
    }

    #[test]
    fn test_means_ignore_held_out_rows() {
        let data = TrainingData::new(
            array![[20.0, 6.0], [30.0, 7.0], [100.0, 1.0]],
            array![1.0, 2.0, 3.0],
            vec!["Temperatura".to_string(), "PH".to_string()],
        )
        .unwrap();

        let schema = FeatureSchema::from_training_data(&data, &[1, 0]);
        assert_eq!(schema.row().build(), vec![25.0, 6.5]);
    }

    #[test]
    fn test_named_values_and_categories() {
        let schema = schema();
        let row = schema
            .row()
            .set("Temperatura", 33.0)
            .category("Cultura", "MILHO")
            .build();
        assert_eq!(row, vec![33.0, 1.0, 0.0]);
    }

    #[test]
    fn test_unknown_names_are_ignored() {
        let schema = schema();
        let row = schema
            .row()
            .set("Nível de Nitrogênio", 9.0)
            .category("Cultura", "CAFÉ")
            .build();
        assert_eq!(row, vec![25.0, 0.0, 0.0]);
    }
}

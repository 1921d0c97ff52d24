//! Conversion of prepared datasets into dense matrices.

use ndarray::{Array1, Array2};

use irrigation_processing::PreparedDataset;

use crate::error::{LearningError, Result};

/// Feature matrix, target vector and feature names of one task.
#[derive(Debug, Clone)]
pub struct TrainingData {
    pub x: Array2<f64>,
    pub y: Array1<f64>,
    pub feature_names: Vec<String>,
    /// Feature names produced by one-hot encoding.
    pub one_hot_columns: Vec<String>,
}

impl TrainingData {
    /// Build from raw parts, checking shapes.
    pub fn new(x: Array2<f64>, y: Array1<f64>, feature_names: Vec<String>) -> Result<Self> {
        if x.nrows() != y.len() {
            return Err(LearningError::InvalidData(format!(
                "feature matrix has {} rows but target has {}",
                x.nrows(),
                y.len()
            )));
        }
        if x.ncols() != feature_names.len() {
            return Err(LearningError::InvalidData(format!(
                "feature matrix has {} columns but {} names were given",
                x.ncols(),
                feature_names.len()
            )));
        }
        Ok(Self {
            x,
            y,
            feature_names,
            one_hot_columns: Vec::new(),
        })
    }

    /// Mark which features are one-hot indicators.
    #[must_use]
    pub fn with_one_hot_columns(mut self, columns: Vec<String>) -> Self {
        self.one_hot_columns = columns;
        self
    }

    pub fn n_samples(&self) -> usize {
        self.x.nrows()
    }

    pub fn n_features(&self) -> usize {
        self.x.ncols()
    }
}

impl TryFrom<&PreparedDataset> for TrainingData {
    type Error = LearningError;

    fn try_from(prepared: &PreparedDataset) -> Result<Self> {
        let rows = prepared.feature_rows()?;
        let n_rows = rows.len();
        let n_cols = prepared.n_features();
        let flat: Vec<f64> = rows.into_iter().flatten().collect();
        let x = Array2::from_shape_vec((n_rows, n_cols), flat)
            .map_err(|e| LearningError::InvalidData(e.to_string()))?;
        let y = Array1::from_vec(prepared.target_values()?);
        let one_hot = prepared
            .report
            .encoded_columns
            .iter()
            .filter(|c| prepared.feature_names.contains(c))
            .cloned()
            .collect();
        Ok(Self::new(x, y, prepared.feature_names.clone())?.with_one_hot_columns(one_hot))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use irrigation_processing::{FeaturePreprocessor, Task};
    use ndarray::array;
    use polars::prelude::*;

    #[test]
    fn test_from_prepared_dataset() {
        let df = df!(
            "Temperatura" => &[25.0, 30.0, 20.0],
            "Cultura" => &["SOJA", "MILHO", "SOJA"],
            "Umidade do Solo" => &[31.0, 22.0, 40.0],
        )
        .unwrap();
        let prepared = FeaturePreprocessor::default()
            .prepare(&df, Task::Regression)
            .unwrap();

        let data = TrainingData::try_from(&prepared).unwrap();
        assert_eq!(data.n_samples(), 3);
        assert_eq!(data.feature_names, vec!["Temperatura", "Cultura_MILHO", "Cultura_SOJA"]);
        assert_eq!(data.x.row(1).to_vec(), vec![30.0, 1.0, 0.0]);
        assert_eq!(data.y, array![31.0, 22.0, 40.0]);
        assert_eq!(data.one_hot_columns, vec!["Cultura_MILHO", "Cultura_SOJA"]);
    }

    #[test]
    fn test_shape_mismatch() {
        let result = TrainingData::new(
            array![[1.0], [2.0]],
            array![1.0],
            vec!["a".to_string()],
        );
        assert!(matches!(result, Err(LearningError::InvalidData(_))));
    }
}

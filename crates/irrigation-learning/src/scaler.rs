//! Zero-mean, unit-variance feature scaling.

use ndarray::{Array1, Array2, ArrayView1, Axis};
use serde::{Deserialize, Serialize};

use crate::error::{LearningError, Result};

/// Standard scaler: `(x - mean) / std`, population standard deviation.
///
/// Constant columns get a scale of 1 so they map to 0 instead of NaN.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StandardScaler {
    mean: Option<Array1<f64>>,
    scale: Option<Array1<f64>>,
}

impl StandardScaler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_fitted(&self) -> bool {
        self.mean.is_some()
    }

    /// Learn per-column mean and standard deviation.
    pub fn fit(&mut self, x: &Array2<f64>) -> Result<&mut Self> {
        if x.nrows() == 0 {
            return Err(LearningError::InvalidData(
                "cannot fit scaler on an empty matrix".to_string(),
            ));
        }

        let mean = x
            .mean_axis(Axis(0))
            .ok_or_else(|| LearningError::Computation("mean of empty axis".to_string()))?;
        let scale = x
            .std_axis(Axis(0), 0.0)
            .mapv(|s| if s > f64::EPSILON { s } else { 1.0 });

        self.mean = Some(mean);
        self.scale = Some(scale);
        Ok(self)
    }

    /// Scale a matrix with the fitted statistics.
    pub fn transform(&self, x: &Array2<f64>) -> Result<Array2<f64>> {
        let (mean, scale) = self.params()?;
        if x.ncols() != mean.len() {
            return Err(LearningError::FeatureMismatch {
                expected: mean.len(),
                actual: x.ncols(),
            });
        }
        Ok((x - mean) / scale)
    }

    /// Scale a single row.
    pub fn transform_row(&self, row: ArrayView1<f64>) -> Result<Array1<f64>> {
        let (mean, scale) = self.params()?;
        if row.len() != mean.len() {
            return Err(LearningError::FeatureMismatch {
                expected: mean.len(),
                actual: row.len(),
            });
        }
        Ok((&row - mean) / scale)
    }

    pub fn fit_transform(&mut self, x: &Array2<f64>) -> Result<Array2<f64>> {
        self.fit(x)?;
        self.transform(x)
    }

    fn params(&self) -> Result<(&Array1<f64>, &Array1<f64>)> {
        match (&self.mean, &self.scale) {
            (Some(mean), Some(scale)) => Ok((mean, scale)),
            _ => Err(LearningError::ModelNotFitted("StandardScaler".to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_fit_transform_centers_and_scales() {
        let x = array![[1.0, 10.0], [3.0, 10.0], [5.0, 10.0]];
        let mut scaler = StandardScaler::new();
        let scaled = scaler.fit_transform(&x).unwrap();

        let col0: Vec<f64> = scaled.column(0).to_vec();
        let std = (8.0f64 / 3.0).sqrt();
        assert!((col0[0] + 2.0 / std).abs() < 1e-12);
        assert!(col0[1].abs() < 1e-12);
        // Constant column maps to zero.
        assert!(scaled.column(1).iter().all(|v| *v == 0.0));
    }

    #[test]
    fn test_transform_uses_training_statistics() {
        let mut scaler = StandardScaler::new();
        scaler.fit(&array![[0.0], [2.0]]).unwrap();
        let row = scaler.transform_row(array![4.0].view()).unwrap();
        assert_eq!(row, array![3.0]);
    }

    #[test]
    fn test_unfitted_and_mismatch() {
        let scaler = StandardScaler::new();
        assert!(matches!(
            scaler.transform(&array![[1.0]]),
            Err(LearningError::ModelNotFitted(_))
        ));

        let mut scaler = StandardScaler::new();
        scaler.fit(&array![[1.0, 2.0], [3.0, 4.0]]).unwrap();
        assert!(matches!(
            scaler.transform_row(array![1.0].view()),
            Err(LearningError::FeatureMismatch {
                expected: 2,
                actual: 1
            })
        ));
    }
}

//! k-nearest-neighbours classification by majority vote.

use ndarray::{Array1, Array2, ArrayView1};
use serde::{Deserialize, Serialize};

use super::{Classifier, check_features, check_shapes};
use crate::error::{LearningError, Result};

/// Euclidean KNN over the stored training set.
///
/// The probability of the positive class is the share of positive
/// neighbours; ties in distance keep the earlier training row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KnnClassifier {
    pub k: usize,
    x_train: Option<Array2<f64>>,
    y_train: Option<Array1<f64>>,
}

impl KnnClassifier {
    pub fn new(k: usize) -> Self {
        Self {
            k,
            x_train: None,
            y_train: None,
        }
    }

    fn neighbour_share(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        let (Some(x_train), Some(y_train)) = (&self.x_train, &self.y_train) else {
            return Err(LearningError::ModelNotFitted("KNN".to_string()));
        };
        check_features(x_train.ncols(), x)?;
        let k = self.k.min(x_train.nrows()).max(1);

        Ok(x.rows()
            .into_iter()
            .map(|query| {
                let mut distances: Vec<(f64, usize)> = x_train
                    .rows()
                    .into_iter()
                    .enumerate()
                    .map(|(i, row)| (squared_distance(query, row), i))
                    .collect();
                distances.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));

                let positives = distances[..k]
                    .iter()
                    .filter(|(_, i)| y_train[*i] >= 0.5)
                    .count();
                positives as f64 / k as f64
            })
            .collect())
    }
}

fn squared_distance(a: ArrayView1<f64>, b: ArrayView1<f64>) -> f64 {
    a.iter().zip(b.iter()).map(|(u, v)| (u - v).powi(2)).sum()
}

impl Classifier for KnnClassifier {
    fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
        check_shapes(x, y)?;
        if self.k == 0 {
            return Err(LearningError::InvalidConfig(
                "KNN needs at least one neighbour".to_string(),
            ));
        }
        self.x_train = Some(x.clone());
        self.y_train = Some(y.clone());
        Ok(())
    }

    fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        Ok(self
            .neighbour_share(x)?
            .mapv(|share| if share > 0.5 { 1.0 } else { 0.0 }))
    }

    fn predict_proba(&self, x: &Array2<f64>) -> Result<Option<Array1<f64>>> {
        self.neighbour_share(x).map(Some)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_majority_vote() {
        let x = array![[0.0], [0.1], [0.2], [5.0], [5.1], [5.2], [5.3]];
        let y = array![0.0, 0.0, 0.0, 1.0, 1.0, 1.0, 1.0];
        let mut knn = KnnClassifier::new(3);
        knn.fit(&x, &y).unwrap();

        assert_eq!(knn.predict(&array![[0.05], [5.05]]).unwrap(), array![0.0, 1.0]);
        let proba = knn.predict_proba(&array![[2.6]]).unwrap().unwrap();
        // Nearest three: 0.2, 5.0, 5.1.
        assert!((proba[0] - 2.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_k_capped_by_training_size() {
        let mut knn = KnnClassifier::new(5);
        knn.fit(&array![[0.0], [1.0]], &array![1.0, 1.0]).unwrap();
        assert_eq!(knn.predict(&array![[0.5]]).unwrap(), array![1.0]);
    }
}

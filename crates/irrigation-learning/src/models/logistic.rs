//! Binary logistic regression fitted by batch gradient descent.

use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};

use super::{Classifier, check_features, check_shapes};
use crate::error::{LearningError, Result};

/// L2-regularized logistic regression.
///
/// The penalty is `1 / n_samples`, matching an inverse regularization
/// strength of 1 on the summed loss.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogisticRegression {
    pub max_iter: usize,
    pub learning_rate: f64,
    pub tol: f64,
    weights: Option<Array1<f64>>,
    bias: f64,
}

fn sigmoid(z: f64) -> f64 {
    if z >= 0.0 {
        1.0 / (1.0 + (-z).exp())
    } else {
        let e = z.exp();
        e / (1.0 + e)
    }
}

impl LogisticRegression {
    pub fn new(max_iter: usize) -> Self {
        Self {
            max_iter,
            learning_rate: 0.1,
            tol: 1e-6,
            weights: None,
            bias: 0.0,
        }
    }

    pub fn coefficients(&self) -> Option<&Array1<f64>> {
        self.weights.as_ref()
    }

    fn proba(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        let w = self
            .weights
            .as_ref()
            .ok_or_else(|| LearningError::ModelNotFitted("Logistic Regression".to_string()))?;
        check_features(w.len(), x)?;
        Ok((x.dot(w) + self.bias).mapv(sigmoid))
    }
}

impl Classifier for LogisticRegression {
    fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
        check_shapes(x, y)?;
        let n = x.nrows() as f64;
        let alpha = 1.0 / n;

        let mut w = Array1::<f64>::zeros(x.ncols());
        let mut b = 0.0;

        for _ in 0..self.max_iter {
            let p = (x.dot(&w) + b).mapv(sigmoid);
            let error = &p - y;

            let dw = x.t().dot(&error) / n + &w * alpha;
            let db = error.sum() / n;

            w.scaled_add(-self.learning_rate, &dw);
            b -= self.learning_rate * db;

            let grad_norm = (dw.dot(&dw) + db * db).sqrt();
            if grad_norm < self.tol {
                break;
            }
        }

        self.weights = Some(w);
        self.bias = b;
        Ok(())
    }

    fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        Ok(self.proba(x)?.mapv(|p| if p >= 0.5 { 1.0 } else { 0.0 }))
    }

    fn predict_proba(&self, x: &Array2<f64>) -> Result<Option<Array1<f64>>> {
        self.proba(x).map(Some)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_separable_data() {
        let x = array![[-2.0, -1.0], [-1.5, -2.0], [-1.0, -0.5], [1.0, 0.5], [1.5, 2.0], [2.0, 1.0]];
        let y = array![0.0, 0.0, 0.0, 1.0, 1.0, 1.0];
        let mut model = LogisticRegression::new(1000);
        model.fit(&x, &y).unwrap();

        assert_eq!(model.predict(&x).unwrap(), y);
        let proba = model.predict_proba(&array![[3.0, 3.0]]).unwrap().unwrap();
        assert!(proba[0] > 0.8);
        assert!(model.coefficients().unwrap()[0] > 0.0);
    }

    #[test]
    fn test_sigmoid_is_stable() {
        assert!(sigmoid(-1000.0) >= 0.0);
        assert!(sigmoid(1000.0) <= 1.0);
        assert!((sigmoid(0.0) - 0.5).abs() < 1e-12);
    }
}

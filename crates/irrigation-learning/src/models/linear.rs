//! Least-squares, ridge and lasso regression.
//!
//! All three fit an intercept by centering `X` and `y` first, so the penalty
//! never applies to the intercept.

use ndarray::{Array1, Array2, Axis};
use serde::{Deserialize, Serialize};

use super::{Regressor, check_shapes};
use crate::error::{LearningError, Result};

/// Fitted coefficients shared by the linear regressors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinearFit {
    pub coefficients: Array1<f64>,
    pub intercept: f64,
}

impl LinearFit {
    fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        if x.ncols() != self.coefficients.len() {
            return Err(LearningError::FeatureMismatch {
                expected: self.coefficients.len(),
                actual: x.ncols(),
            });
        }
        Ok(x.dot(&self.coefficients) + self.intercept)
    }
}

struct Centered {
    x: Array2<f64>,
    y: Array1<f64>,
    x_mean: Array1<f64>,
    y_mean: f64,
}

fn center(x: &Array2<f64>, y: &Array1<f64>) -> Result<Centered> {
    let x_mean = x
        .mean_axis(Axis(0))
        .ok_or_else(|| LearningError::InvalidData("empty training matrix".to_string()))?;
    let y_mean = y.mean().unwrap_or(0.0);
    Ok(Centered {
        x: x - &x_mean,
        y: y - y_mean,
        x_mean,
        y_mean,
    })
}

/// Solve `(XᵀX + alpha·I) w = Xᵀy` on centered data.
fn solve_normal_equations(data: &Centered, alpha: f64) -> Result<LinearFit> {
    let mut xtx = data.x.t().dot(&data.x);
    for i in 0..xtx.nrows() {
        xtx[[i, i]] += alpha;
    }
    let xty = data.x.t().dot(&data.y);

    let coefficients = cholesky_solve(&xtx, &xty)
        .or_else(|| matrix_inverse(&xtx).map(|inv| inv.dot(&xty)))
        .ok_or_else(|| {
            LearningError::Computation("normal equations are singular".to_string())
        })?;

    let intercept = data.y_mean - coefficients.dot(&data.x_mean);
    Ok(LinearFit {
        coefficients,
        intercept,
    })
}

/// Cholesky solve of a symmetric positive-definite system.
///
/// A non-positive pivot triggers one retry with a small diagonal ridge.
fn cholesky_solve(a: &Array2<f64>, b: &Array1<f64>) -> Option<Array1<f64>> {
    cholesky_inner(a, b).or_else(|| {
        let n = a.nrows();
        if n == 0 {
            return None;
        }
        let ridge = 1e-8 * a.diag().iter().map(|v| v.abs()).sum::<f64>() / n as f64;
        let mut regularized = a.clone();
        for k in 0..n {
            regularized[[k, k]] += ridge.max(1e-12);
        }
        cholesky_inner(&regularized, b)
    })
}

fn cholesky_inner(a: &Array2<f64>, b: &Array1<f64>) -> Option<Array1<f64>> {
    let n = a.nrows();
    if n != a.ncols() || n != b.len() {
        return None;
    }

    let mut l = Array2::<f64>::zeros((n, n));
    for i in 0..n {
        for j in 0..=i {
            let sum: f64 = (0..j).map(|k| l[[i, k]] * l[[j, k]]).sum();
            if i == j {
                let diag = a[[i, i]] - sum;
                if diag <= 0.0 {
                    return None;
                }
                l[[i, j]] = diag.sqrt();
            } else {
                l[[i, j]] = (a[[i, j]] - sum) / l[[j, j]];
            }
        }
    }

    // L y = b
    let mut y = Array1::<f64>::zeros(n);
    for i in 0..n {
        let sum: f64 = (0..i).map(|j| l[[i, j]] * y[j]).sum();
        y[i] = (b[i] - sum) / l[[i, i]];
    }

    // Lᵀ x = y
    let mut x = Array1::<f64>::zeros(n);
    for i in (0..n).rev() {
        let sum: f64 = ((i + 1)..n).map(|j| l[[j, i]] * x[j]).sum();
        x[i] = (y[i] - sum) / l[[i, i]];
    }

    Some(x)
}

/// Gauss-Jordan inverse with partial pivoting.
fn matrix_inverse(m: &Array2<f64>) -> Option<Array2<f64>> {
    let n = m.nrows();
    if n != m.ncols() {
        return None;
    }

    let mut aug = Array2::<f64>::zeros((n, 2 * n));
    for i in 0..n {
        for j in 0..n {
            aug[[i, j]] = m[[i, j]];
        }
        aug[[i, n + i]] = 1.0;
    }

    for col in 0..n {
        let pivot_row = (col..n).max_by(|&a, &b| {
            aug[[a, col]].abs().total_cmp(&aug[[b, col]].abs())
        })?;
        if pivot_row != col {
            for j in 0..2 * n {
                aug.swap([col, j], [pivot_row, j]);
            }
        }

        let pivot = aug[[col, col]];
        if pivot.abs() < 1e-10 {
            return None;
        }
        for j in 0..2 * n {
            aug[[col, j]] /= pivot;
        }

        for row in 0..n {
            if row != col {
                let factor = aug[[row, col]];
                for j in 0..2 * n {
                    aug[[row, j]] -= factor * aug[[col, j]];
                }
            }
        }
    }

    Some(aug.slice(ndarray::s![.., n..]).to_owned())
}

fn fitted<'a>(fit: &'a Option<LinearFit>, name: &str) -> Result<&'a LinearFit> {
    fit.as_ref()
        .ok_or_else(|| LearningError::ModelNotFitted(name.to_string()))
}

// =============================================================================
// Ordinary least squares
// =============================================================================

/// Ordinary least squares.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LinearRegression {
    fit: Option<LinearFit>,
}

impl LinearRegression {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn coefficients(&self) -> Option<&Array1<f64>> {
        self.fit.as_ref().map(|f| &f.coefficients)
    }
}

impl Regressor for LinearRegression {
    fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
        check_shapes(x, y)?;
        self.fit = Some(solve_normal_equations(&center(x, y)?, 0.0)?);
        Ok(())
    }

    fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        fitted(&self.fit, "Linear Regression")?.predict(x)
    }
}

// =============================================================================
// Ridge
// =============================================================================

/// L2-penalized least squares.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RidgeRegression {
    pub alpha: f64,
    fit: Option<LinearFit>,
}

impl RidgeRegression {
    pub fn new(alpha: f64) -> Self {
        Self { alpha, fit: None }
    }

    pub fn coefficients(&self) -> Option<&Array1<f64>> {
        self.fit.as_ref().map(|f| &f.coefficients)
    }
}

impl Regressor for RidgeRegression {
    fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
        check_shapes(x, y)?;
        self.fit = Some(solve_normal_equations(&center(x, y)?, self.alpha)?);
        Ok(())
    }

    fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        fitted(&self.fit, "Ridge Regression")?.predict(x)
    }
}

// =============================================================================
// Lasso
// =============================================================================

/// L1-penalized least squares, solved by cyclic coordinate descent.
///
/// Objective: `(1 / 2n)·‖y − Xw‖² + alpha·‖w‖₁`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LassoRegression {
    pub alpha: f64,
    pub max_iter: usize,
    pub tol: f64,
    fit: Option<LinearFit>,
}

impl LassoRegression {
    pub fn new(alpha: f64) -> Self {
        Self {
            alpha,
            max_iter: 1000,
            tol: 1e-6,
            fit: None,
        }
    }

    pub fn coefficients(&self) -> Option<&Array1<f64>> {
        self.fit.as_ref().map(|f| &f.coefficients)
    }

    fn soft_threshold(value: f64, threshold: f64) -> f64 {
        if value > threshold {
            value - threshold
        } else if value < -threshold {
            value + threshold
        } else {
            0.0
        }
    }
}

impl Regressor for LassoRegression {
    fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
        check_shapes(x, y)?;
        let data = center(x, y)?;
        let n_features = data.x.ncols();
        let lambda = self.alpha * data.x.nrows() as f64;

        let col_norms: Vec<f64> = (0..n_features)
            .map(|j| data.x.column(j).mapv(|v| v * v).sum())
            .collect();

        let mut w = Array1::<f64>::zeros(n_features);
        let mut residual = data.y.clone();

        for _ in 0..self.max_iter {
            let mut max_change = 0.0f64;
            for j in 0..n_features {
                if col_norms[j] < 1e-15 {
                    continue;
                }
                let column = data.x.column(j);
                let rho = column.dot(&residual) + col_norms[j] * w[j];
                let updated = Self::soft_threshold(rho, lambda) / col_norms[j];
                let delta = w[j] - updated;
                if delta != 0.0 {
                    residual.scaled_add(delta, &column);
                    w[j] = updated;
                }
                max_change = max_change.max(delta.abs());
            }
            if max_change < self.tol {
                break;
            }
        }

        let intercept = data.y_mean - w.dot(&data.x_mean);
        self.fit = Some(LinearFit {
            coefficients: w,
            intercept,
        });
        Ok(())
    }

    fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        fitted(&self.fit, "Lasso Regression")?.predict(x)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn line() -> (Array2<f64>, Array1<f64>) {
        // y = 2·x0 − x1 + 3
        let x = array![
            [1.0, 0.0],
            [2.0, 1.0],
            [3.0, 0.5],
            [4.0, 2.0],
            [5.0, 1.5],
            [6.0, 3.0],
        ];
        let y = x.map_axis(Axis(1), |r| 2.0 * r[0] - r[1] + 3.0);
        (x, y)
    }

    #[test]
    fn test_linear_regression_recovers_coefficients() {
        let (x, y) = line();
        let mut model = LinearRegression::new();
        model.fit(&x, &y).unwrap();

        let coefficients = model.coefficients().unwrap();
        assert!((coefficients[0] - 2.0).abs() < 1e-8);
        assert!((coefficients[1] + 1.0).abs() < 1e-8);

        let predicted = model.predict(&array![[10.0, 0.0]]).unwrap();
        assert!((predicted[0] - 23.0).abs() < 1e-6);
    }

    #[test]
    fn test_ridge_shrinks_coefficients() {
        let (x, y) = line();
        let mut ols = LinearRegression::new();
        let mut ridge = RidgeRegression::new(10.0);
        ols.fit(&x, &y).unwrap();
        ridge.fit(&x, &y).unwrap();

        let norm = |w: &Array1<f64>| w.dot(w);
        assert!(norm(ridge.coefficients().unwrap()) < norm(ols.coefficients().unwrap()));
    }

    #[test]
    fn test_lasso_zeroes_irrelevant_feature() {
        // Second feature is noise-free but irrelevant.
        let x = array![[1.0, 0.3], [2.0, -0.2], [3.0, 0.1], [4.0, -0.1], [5.0, 0.2], [6.0, -0.3]];
        let y = x.column(0).mapv(|v| 3.0 * v);
        let mut lasso = LassoRegression::new(0.5);
        lasso.fit(&x, &y).unwrap();

        let w = lasso.coefficients().unwrap();
        assert!(w[0] > 2.0);
        assert_eq!(w[1], 0.0);
    }

    #[test]
    fn test_collinear_features_still_fit() {
        let x = array![[1.0, 2.0], [2.0, 4.0], [3.0, 6.0], [4.0, 8.0]];
        let y = array![1.0, 2.0, 3.0, 4.0];
        let mut model = LinearRegression::new();
        model.fit(&x, &y).unwrap();
        let predicted = model.predict(&x).unwrap();
        for (p, t) in predicted.iter().zip(y.iter()) {
            assert!((p - t).abs() < 1e-3);
        }
    }

    #[test]
    fn test_predict_before_fit() {
        let model = RidgeRegression::new(1.0);
        assert!(matches!(
            model.predict(&array![[1.0]]),
            Err(LearningError::ModelNotFitted(_))
        ));
    }
}

//! RBF support-vector classifier with Platt-calibrated probabilities.
//!
//! Training uses simplified SMO. Kernel rows are computed when a pair is
//! updated and the decision values of all samples are cached, so memory
//! stays linear in the number of samples. The sigmoid `P(y=1 | f) = 1 / (1 + exp(A·f + B))` is then fitted to the
//! training decision values by Newton's method with backtracking.

use ndarray::{Array1, Array2, ArrayView1};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{Classifier, check_features, check_shapes};
use crate::error::{LearningError, Result};

const MAX_PASSES: usize = 5;
const MAX_SWEEPS: usize = 1_000;
const TOL: f64 = 1e-3;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct SupportVectors {
    vectors: Array2<f64>,
    /// `alpha_i · y_i` for each support vector.
    dual_coef: Array1<f64>,
    bias: f64,
    gamma: f64,
}

impl SupportVectors {
    fn decision(&self, sample: ArrayView1<f64>) -> f64 {
        self.vectors
            .rows()
            .into_iter()
            .zip(self.dual_coef.iter())
            .map(|(sv, coef)| coef * rbf(self.gamma, sv, sample))
            .sum::<f64>()
            + self.bias
    }
}

/// Platt sigmoid parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
struct Platt {
    a: f64,
    b: f64,
}

impl Platt {
    fn probability(&self, decision: f64) -> f64 {
        let z = self.a * decision + self.b;
        if z >= 0.0 {
            let e = (-z).exp();
            e / (1.0 + e)
        } else {
            1.0 / (1.0 + z.exp())
        }
    }
}

/// Soft-margin SVM with an RBF kernel and `gamma = 1 / (n_features · var(X))`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SvmClassifier {
    pub c: f64,
    pub seed: u64,
    model: Option<SupportVectors>,
    platt: Option<Platt>,
}

fn rbf(gamma: f64, a: ArrayView1<f64>, b: ArrayView1<f64>) -> f64 {
    let dist: f64 = a.iter().zip(b.iter()).map(|(u, v)| (u - v).powi(2)).sum();
    (-gamma * dist).exp()
}

/// `K(x_i, x_k)` for every training row `k`.
fn kernel_row(gamma: f64, x: &Array2<f64>, i: usize) -> Array1<f64> {
    let sample = x.row(i);
    x.rows().into_iter().map(|row| rbf(gamma, sample, row)).collect()
}

impl SvmClassifier {
    pub fn new(c: f64, seed: u64) -> Self {
        Self {
            c,
            seed,
            model: None,
            platt: None,
        }
    }

    pub fn n_support_vectors(&self) -> usize {
        self.model.as_ref().map_or(0, |m| m.vectors.nrows())
    }

    fn fitted(&self) -> Result<(&SupportVectors, &Platt)> {
        match (&self.model, &self.platt) {
            (Some(model), Some(platt)) => Ok((model, platt)),
            _ => Err(LearningError::ModelNotFitted("SVM".to_string())),
        }
    }

    /// Signed distance-like score; positive means the positive class.
    pub fn decision_function(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        let (model, _) = self.fitted()?;
        check_features(model.vectors.ncols(), x)?;
        Ok(x.rows().into_iter().map(|row| model.decision(row)).collect())
    }

    fn smo(&self, x: &Array2<f64>, y: &Array1<f64>, gamma: f64) -> (Array1<f64>, f64) {
        let n = y.len();
        let mut alphas = Array1::<f64>::zeros(n);
        let mut bias = 0.0;
        let mut rng = ChaCha8Rng::seed_from_u64(self.seed);
        // sum_i alpha_i · y_i · K(x_i, x_k), without the bias.
        let mut margins = Array1::<f64>::zeros(n);

        let mut passes = 0;
        let mut sweeps = 0;
        while passes < MAX_PASSES && sweeps < MAX_SWEEPS && n > 1 {
            let mut changed = 0;
            for i in 0..n {
                let e_i = margins[i] + bias - y[i];
                let violates = (y[i] * e_i < -TOL && alphas[i] < self.c)
                    || (y[i] * e_i > TOL && alphas[i] > 0.0);
                if !violates {
                    continue;
                }

                let j = loop {
                    let j = rng.gen_range(0..n);
                    if j != i {
                        break j;
                    }
                };
                let e_j = margins[j] + bias - y[j];
                let (ai_old, aj_old) = (alphas[i], alphas[j]);

                let (low, high) = if y[i] != y[j] {
                    ((aj_old - ai_old).max(0.0), (self.c + aj_old - ai_old).min(self.c))
                } else {
                    ((ai_old + aj_old - self.c).max(0.0), (ai_old + aj_old).min(self.c))
                };
                if (high - low).abs() < 1e-10 {
                    continue;
                }

                let row_i = kernel_row(gamma, x, i);
                let (k_ii, k_ij) = (row_i[i], row_i[j]);
                let k_jj = rbf(gamma, x.row(j), x.row(j));
                let eta = 2.0 * k_ij - k_ii - k_jj;
                if eta >= 0.0 {
                    continue;
                }

                alphas[j] = (aj_old - y[j] * (e_i - e_j) / eta).clamp(low, high);
                if (alphas[j] - aj_old).abs() < 1e-5 {
                    continue;
                }
                alphas[i] = ai_old + y[i] * y[j] * (aj_old - alphas[j]);

                let (delta_i, delta_j) = (y[i] * (alphas[i] - ai_old), y[j] * (alphas[j] - aj_old));
                margins.scaled_add(delta_i, &row_i);
                margins.scaled_add(delta_j, &kernel_row(gamma, x, j));

                let b1 = bias - e_i - delta_i * k_ii - delta_j * k_ij;
                let b2 = bias - e_j - delta_i * k_ij - delta_j * k_jj;
                bias = if alphas[i] > 0.0 && alphas[i] < self.c {
                    b1
                } else if alphas[j] > 0.0 && alphas[j] < self.c {
                    b2
                } else {
                    (b1 + b2) / 2.0
                };
                changed += 1;
            }

            sweeps += 1;
            passes = if changed == 0 { passes + 1 } else { 0 };
        }

        (alphas, bias)
    }
}

/// Newton fit of the Platt sigmoid on decision values `f` and 0/1 labels.
fn fit_platt(f: &[f64], labels: &[f64]) -> Platt {
    const MAX_ITER: usize = 100;
    const MIN_STEP: f64 = 1e-10;
    const SIGMA: f64 = 1e-12;
    const EPS: f64 = 1e-5;

    let n_pos = labels.iter().filter(|&&l| l >= 0.5).count() as f64;
    let n_neg = labels.len() as f64 - n_pos;
    let hi = (n_pos + 1.0) / (n_pos + 2.0);
    let lo = 1.0 / (n_neg + 2.0);
    let targets: Vec<f64> = labels.iter().map(|&l| if l >= 0.5 { hi } else { lo }).collect();

    let objective = |a: f64, b: f64| -> f64 {
        f.iter()
            .zip(&targets)
            .map(|(fi, t)| {
                let z = fi * a + b;
                if z >= 0.0 {
                    t * z + (-z).exp().ln_1p()
                } else {
                    (t - 1.0) * z + z.exp().ln_1p()
                }
            })
            .sum()
    };

    let mut a = 0.0;
    let mut b = ((n_neg + 1.0) / (n_pos + 1.0)).ln();
    let mut fval = objective(a, b);

    for _ in 0..MAX_ITER {
        let (mut h11, mut h22, mut h21) = (SIGMA, SIGMA, 0.0);
        let (mut g1, mut g2) = (0.0, 0.0);
        for (fi, t) in f.iter().zip(&targets) {
            let z = fi * a + b;
            let (p, q) = if z >= 0.0 {
                let e = (-z).exp();
                (e / (1.0 + e), 1.0 / (1.0 + e))
            } else {
                let e = z.exp();
                (1.0 / (1.0 + e), e / (1.0 + e))
            };
            let d2 = p * q;
            h11 += fi * fi * d2;
            h22 += d2;
            h21 += fi * d2;
            let d1 = t - p;
            g1 += fi * d1;
            g2 += d1;
        }
        if g1.abs() < EPS && g2.abs() < EPS {
            break;
        }

        let det = h11 * h22 - h21 * h21;
        let da = -(h22 * g1 - h21 * g2) / det;
        let db = -(-h21 * g1 + h11 * g2) / det;
        let gd = g1 * da + g2 * db;

        let mut step = 1.0;
        while step >= MIN_STEP {
            let (new_a, new_b) = (a + step * da, b + step * db);
            let new_f = objective(new_a, new_b);
            if new_f < fval + 1e-4 * step * gd {
                a = new_a;
                b = new_b;
                fval = new_f;
                break;
            }
            step /= 2.0;
        }
        if step < MIN_STEP {
            break;
        }
    }

    Platt { a, b }
}

impl Classifier for SvmClassifier {
    fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
        check_shapes(x, y)?;
        let n = x.nrows();

        let mean = x.mean().unwrap_or(0.0);
        let variance = x.mapv(|v| (v - mean).powi(2)).mean().unwrap_or(0.0);
        let gamma = if variance > 0.0 {
            1.0 / (x.ncols() as f64 * variance)
        } else {
            1.0
        };

        let signed = y.mapv(|v| if v >= 0.5 { 1.0 } else { -1.0 });
        let (alphas, bias) = self.smo(x, &signed, gamma);

        let support: Vec<usize> = (0..n).filter(|&i| alphas[i] > 1e-8).collect();
        let vectors = x.select(ndarray::Axis(0), &support);
        let dual_coef: Array1<f64> = support.iter().map(|&i| alphas[i] * signed[i]).collect();
        debug!("SVM kept {} support vectors of {} samples", support.len(), n);

        let model = SupportVectors {
            vectors,
            dual_coef,
            bias,
            gamma,
        };
        let decisions: Vec<f64> = x.rows().into_iter().map(|row| model.decision(row)).collect();
        let labels: Vec<f64> = y.to_vec();
        self.platt = Some(fit_platt(&decisions, &labels));
        self.model = Some(model);
        Ok(())
    }

    fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        Ok(self
            .decision_function(x)?
            .mapv(|d| if d > 0.0 { 1.0 } else { 0.0 }))
    }

    fn predict_proba(&self, x: &Array2<f64>) -> Result<Option<Array1<f64>>> {
        let (_, platt) = self.fitted()?;
        Ok(Some(self.decision_function(x)?.mapv(|d| platt.probability(d))))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn two_clusters() -> (Array2<f64>, Array1<f64>) {
        let x = array![
            [-2.0, -2.0],
            [-1.8, -2.2],
            [-2.2, -1.7],
            [-1.9, -1.9],
            [2.0, 2.0],
            [2.1, 1.8],
            [1.8, 2.2],
            [2.2, 2.1]
        ];
        let y = array![0.0, 0.0, 0.0, 0.0, 1.0, 1.0, 1.0, 1.0];
        (x, y)
    }

    #[test]
    fn test_separates_clusters() {
        let (x, y) = two_clusters();
        let mut svm = SvmClassifier::new(1.0, 42);
        svm.fit(&x, &y).unwrap();

        assert_eq!(svm.predict(&x).unwrap(), y);
        assert!(svm.n_support_vectors() > 0);
    }

    #[test]
    fn test_probabilities_are_calibrated_direction() {
        let (x, y) = two_clusters();
        let mut svm = SvmClassifier::new(1.0, 42);
        svm.fit(&x, &y).unwrap();

        let proba = svm
            .predict_proba(&array![[-2.0, -2.0], [2.0, 2.0]])
            .unwrap()
            .unwrap();
        assert!(proba[0] < 0.5);
        assert!(proba[1] > 0.5);
        assert!(proba.iter().all(|p| (0.0..=1.0).contains(p)));
    }

    #[test]
    fn test_fits_beyond_five_thousand_rows() {
        let n = 5_200;
        let x = Array2::from_shape_fn((n, 2), |(i, j)| {
            let t = (i % 100) as f64 / 25.0 - 2.0;
            if j == 0 { t } else { ((i / 100) % 7) as f64 * 0.1 }
        });
        let y: Array1<f64> = x.column(0).mapv(|t| if t > 0.0 { 1.0 } else { 0.0 });

        let mut svm = SvmClassifier::new(1.0, 42);
        svm.fit(&x, &y).unwrap();

        let far_points = array![[-1.5, 0.3], [1.5, 0.3]];
        assert_eq!(svm.predict(&far_points).unwrap(), array![0.0, 1.0]);
        assert!(svm.n_support_vectors() < n);
    }

    #[test]
    fn test_platt_prior_only() {
        // Uninformative decision values leave the prior-based intercept.
        let platt = fit_platt(&[0.0, 0.0, 0.0, 0.0], &[1.0, 0.0, 0.0, 0.0]);
        let p = platt.probability(0.0);
        assert!(p > 0.2 && p < 0.4);
    }
}

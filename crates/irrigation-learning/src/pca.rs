//! Principal component projection of scaled features.
//!
//! Components are the top eigenvectors of the covariance matrix, extracted
//! by power iteration with deflation.

use ndarray::{Array1, Array2, ArrayView1, Axis};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{LearningError, Result};

const MAX_ITER: usize = 500;
const TOLERANCE: f64 = 1e-10;

/// Fitted PCA projection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pca {
    mean: Array1<f64>,
    /// One component per row, `n_components x n_features`.
    components: Array2<f64>,
    explained_variance: Vec<f64>,
    explained_variance_ratio: Vec<f64>,
}

/// Summary of a fitted projection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PcaInfo {
    pub n_components: usize,
    pub explained_variance_ratio: Vec<f64>,
    pub total_explained_variance: f64,
}

impl Pca {
    /// Fit `n_components` components (capped at the feature and sample count).
    pub fn fit(x: &Array2<f64>, n_components: usize, seed: u64) -> Result<Self> {
        let (n, d) = x.dim();
        if n < 2 || d == 0 {
            return Err(LearningError::InvalidData(
                "PCA requires at least 2 samples and 1 feature".to_string(),
            ));
        }
        let k = n_components.min(d).min(n);

        let mean = x
            .mean_axis(Axis(0))
            .ok_or_else(|| LearningError::Computation("mean of empty axis".to_string()))?;
        let centered = x - &mean;
        let mut work = centered.t().dot(&centered) / (n as f64 - 1.0);
        let total_variance: f64 = work.diag().sum().max(1e-12);

        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let mut components = Array2::zeros((k, d));
        let mut explained_variance = Vec::with_capacity(k);

        for c in 0..k {
            let mut v = Array1::from_shape_fn(d, |_| rng.gen_range(-1.0..1.0));
            normalize(&mut v);
            let mut eigenvalue = 0.0;

            for _ in 0..MAX_ITER {
                let mut w = work.dot(&v);
                eigenvalue = v.dot(&w);
                normalize(&mut w);
                let diff = (&w - &v).mapv(|e| e * e).sum().sqrt();
                v = w;
                if diff < TOLERANCE {
                    break;
                }
            }

            let eigenvalue = f64::max(eigenvalue, 0.0);
            explained_variance.push(eigenvalue);
            components.row_mut(c).assign(&v);

            // Deflate: A -= lambda * v v^T
            let outer = v
                .view()
                .insert_axis(Axis(1))
                .dot(&v.view().insert_axis(Axis(0)));
            work = work - outer * eigenvalue;
        }

        let explained_variance_ratio: Vec<f64> = explained_variance
            .iter()
            .map(|ev| ev / total_variance)
            .collect();
        debug!(
            "PCA kept {} of {} dimensions ({:.1}% variance)",
            k,
            d,
            explained_variance_ratio.iter().sum::<f64>() * 100.0
        );

        Ok(Self {
            mean,
            components,
            explained_variance,
            explained_variance_ratio,
        })
    }

    pub fn n_components(&self) -> usize {
        self.components.nrows()
    }

    pub fn transform(&self, x: &Array2<f64>) -> Result<Array2<f64>> {
        if x.ncols() != self.mean.len() {
            return Err(LearningError::FeatureMismatch {
                expected: self.mean.len(),
                actual: x.ncols(),
            });
        }
        Ok((x - &self.mean).dot(&self.components.t()))
    }

    pub fn transform_row(&self, row: ArrayView1<f64>) -> Result<Array1<f64>> {
        if row.len() != self.mean.len() {
            return Err(LearningError::FeatureMismatch {
                expected: self.mean.len(),
                actual: row.len(),
            });
        }
        Ok(self.components.dot(&(&row - &self.mean)))
    }

    pub fn info(&self) -> PcaInfo {
        PcaInfo {
            n_components: self.n_components(),
            explained_variance_ratio: self.explained_variance_ratio.clone(),
            total_explained_variance: self.explained_variance_ratio.iter().sum(),
        }
    }

    pub fn explained_variance(&self) -> &[f64] {
        &self.explained_variance
    }
}

fn normalize(v: &mut Array1<f64>) {
    let norm = v.dot(&*v).sqrt().max(1e-12);
    v.mapv_inplace(|e| e / norm);
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_pca_finds_dominant_axis() {
        let x = array![
            [1.0, 2.0],
            [2.0, 4.1],
            [3.0, 5.9],
            [4.0, 8.0],
            [5.0, 10.1],
        ];
        let pca = Pca::fit(&x, 1, 42).unwrap();
        let info = pca.info();

        assert_eq!(info.n_components, 1);
        assert!(info.total_explained_variance > 0.99);

        let projected = pca.transform(&x).unwrap();
        assert_eq!(projected.dim(), (5, 1));
    }

    #[test]
    fn test_transform_row_matches_matrix() {
        let x = array![[1.0, 0.0, 2.0], [0.0, 1.0, 1.0], [2.0, 1.0, 0.0], [1.0, 2.0, 1.0]];
        let pca = Pca::fit(&x, 2, 7).unwrap();
        let full = pca.transform(&x).unwrap();
        let single = pca.transform_row(x.row(2)).unwrap();
        for (a, b) in full.row(2).iter().zip(single.iter()) {
            assert!((a - b).abs() < 1e-12);
        }
    }

    #[test]
    fn test_components_capped_by_features() {
        let x = array![[1.0, 2.0], [2.0, 1.0], [3.0, 3.0]];
        let pca = Pca::fit(&x, 5, 42).unwrap();
        assert_eq!(pca.n_components(), 2);
    }
}

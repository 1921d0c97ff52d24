//! Seeded train/test partitioning.
//!
//! Both splitters are pure functions of `(labels, test_size, seed)`, so the
//! same input always produces the same partition.

use std::collections::BTreeMap;

use rand::SeedableRng;
use rand::seq::SliceRandom;
use rand_chacha::ChaCha8Rng;

use crate::error::{LearningError, Result};

/// Row indices of the two partitions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SplitIndices {
    pub train: Vec<usize>,
    pub test: Vec<usize>,
}

/// Number of test rows for `n` samples: `ceil(test_size * n)`.
fn test_count(n: usize, test_size: f64) -> Result<usize> {
    let n_test = (test_size * n as f64).ceil() as usize;
    if n_test == 0 || n_test >= n {
        return Err(LearningError::InvalidData(format!(
            "cannot split {n} samples with test_size {test_size}: \
             both partitions must be non-empty"
        )));
    }
    Ok(n_test)
}

/// Test rows given to one class by [`stratified_split`].
struct Allocation {
    class: i64,
    count: usize,
    remainder: f64,
    max: usize,
}

/// Shuffled split ignoring labels.
pub fn shuffle_split(n: usize, test_size: f64, seed: u64) -> Result<SplitIndices> {
    let n_test = test_count(n, test_size)?;
    let mut indices: Vec<usize> = (0..n).collect();
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    indices.shuffle(&mut rng);

    let train = indices.split_off(n_test);
    Ok(SplitIndices {
        train,
        test: indices,
    })
}

/// Split preserving class proportions in both partitions.
///
/// Fails with [`LearningError::InvalidData`] when a class has fewer than two
/// members or a partition would be smaller than the number of classes;
/// callers fall back to [`shuffle_split`].
pub fn stratified_split(labels: &[f64], test_size: f64, seed: u64) -> Result<SplitIndices> {
    let n = labels.len();
    let n_test = test_count(n, test_size)?;
    let n_train = n - n_test;

    let mut by_class: BTreeMap<i64, Vec<usize>> = BTreeMap::new();
    for (i, label) in labels.iter().enumerate() {
        by_class.entry(label.round() as i64).or_default().push(i);
    }

    if let Some((class, members)) = by_class.iter().find(|(_, m)| m.len() < 2) {
        return Err(LearningError::InvalidData(format!(
            "class {class} has {} member(s); stratification needs at least 2",
            members.len()
        )));
    }
    let n_classes = by_class.len();
    if n_test < n_classes || n_train < n_classes {
        return Err(LearningError::InvalidData(format!(
            "partitions of {n_train}/{n_test} rows cannot hold {n_classes} classes"
        )));
    }

    // Largest-remainder allocation of test rows per class, keeping every
    // class in both partitions. The totals above guarantee this fits.
    let mut allocation: Vec<Allocation> = by_class
        .iter()
        .map(|(&class, members)| {
            let exact = members.len() as f64 * n_test as f64 / n as f64;
            let max = members.len() - 1;
            Allocation {
                class,
                count: (exact.floor() as usize).clamp(1, max),
                remainder: exact - exact.floor(),
                max,
            }
        })
        .collect();
    let mut assigned: usize = allocation.iter().map(|a| a.count).sum();
    while assigned < n_test {
        let Some(a) = allocation
            .iter_mut()
            .filter(|a| a.count < a.max)
            .max_by(|a, b| a.remainder.total_cmp(&b.remainder))
        else {
            break;
        };
        a.count += 1;
        a.remainder -= 1.0;
        assigned += 1;
    }
    while assigned > n_test {
        let Some(a) = allocation
            .iter_mut()
            .filter(|a| a.count > 1)
            .min_by(|a, b| a.remainder.total_cmp(&b.remainder))
        else {
            break;
        };
        a.count -= 1;
        a.remainder += 1.0;
        assigned -= 1;
    }

    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut train = Vec::with_capacity(n_train);
    let mut test = Vec::with_capacity(n_test);
    for Allocation { class, count, .. } in allocation {
        let mut members = by_class.get(&class).cloned().unwrap_or_default();
        members.shuffle(&mut rng);
        test.extend_from_slice(&members[..count]);
        train.extend_from_slice(&members[count..]);
    }

    test.shuffle(&mut rng);
    train.shuffle(&mut rng);
    Ok(SplitIndices { train, test })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shuffle_split_sizes_and_determinism() {
        let a = shuffle_split(10, 0.2, 42).unwrap();
        let b = shuffle_split(10, 0.2, 42).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.test.len(), 2);
        assert_eq!(a.train.len(), 8);

        let mut all: Vec<usize> = a.train.iter().chain(a.test.iter()).copied().collect();
        all.sort_unstable();
        assert_eq!(all, (0..10).collect::<Vec<_>>());
    }

    #[test]
    fn test_shuffle_split_rejects_tiny_input() {
        assert!(shuffle_split(1, 0.2, 42).is_err());
    }

    #[test]
    fn test_stratified_split_preserves_ratio() {
        let labels: Vec<f64> = (0..50).map(|i| if i < 40 { 0.0 } else { 1.0 }).collect();
        let split = stratified_split(&labels, 0.2, 42).unwrap();

        assert_eq!(split.test.len(), 10);
        let positives = split.test.iter().filter(|&&i| labels[i] == 1.0).count();
        assert_eq!(positives, 2);
    }

    #[test]
    fn test_stratified_split_matches_unstratified_test_size() {
        // 19/2 at 20%: the minority's exact share rounds down to zero.
        let labels: Vec<f64> = (0..21).map(|i| if i < 19 { 0.0 } else { 1.0 }).collect();
        let split = stratified_split(&labels, 0.2, 42).unwrap();
        assert_eq!(split.test.len(), 5);
        assert_eq!(split.train.len(), 16);
        assert!(split.test.iter().any(|&i| labels[i] == 1.0));
        assert!(split.train.iter().any(|&i| labels[i] == 1.0));

        for n in 10..80 {
            for minority in [2, 3, n / 3, n / 2] {
                let labels: Vec<f64> =
                    (0..n).map(|i| if i < minority { 1.0 } else { 0.0 }).collect();
                let stratified = stratified_split(&labels, 0.2, 7).unwrap();
                let plain = shuffle_split(n, 0.2, 7).unwrap();
                assert_eq!(stratified.test.len(), plain.test.len(), "n={n} minority={minority}");
                assert_eq!(stratified.train.len(), plain.train.len(), "n={n} minority={minority}");
            }
        }
    }

    #[test]
    fn test_stratified_split_infeasible_singleton_class() {
        let mut labels = vec![0.0; 20];
        labels[3] = 1.0;
        let err = stratified_split(&labels, 0.2, 42).unwrap_err();
        assert!(matches!(err, LearningError::InvalidData(_)));
    }
}

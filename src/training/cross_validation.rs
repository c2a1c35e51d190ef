//! Stratified splitting: the hold-out split and k-fold cross-validation

use crate::error::{AdvisorError, Result};
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A single train/test split
#[derive(Debug, Clone)]
pub struct CVSplit {
    pub train_indices: Vec<usize>,
    pub test_indices: Vec<usize>,
    pub fold_idx: usize,
}

/// Row indices grouped by class code, in ascending class order
fn indices_by_class(y: &[usize]) -> BTreeMap<usize, Vec<usize>> {
    let mut by_class: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
    for (i, &class) in y.iter().enumerate() {
        by_class.entry(class).or_default().push(i);
    }
    by_class
}

/// Hold-out split that preserves class proportions.
///
/// Each class contributes `round(count * test_size)` rows to the test side,
/// clamped so both sides keep at least one row of every class. Classes with
/// fewer than two rows cannot be split and yield `InsufficientData`.
pub fn stratified_train_test_split(y: &[usize], test_size: f64, seed: u64) -> Result<CVSplit> {
    if !(test_size > 0.0 && test_size < 1.0) {
        return Err(AdvisorError::InvalidParameter {
            name: "test_size".to_string(),
            value: test_size.to_string(),
            reason: "must be strictly between 0 and 1".to_string(),
        });
    }

    let by_class = indices_by_class(y);
    if let Some((class, rows)) = by_class.iter().find(|(_, rows)| rows.len() < 2) {
        return Err(AdvisorError::InsufficientData(format!(
            "class code {} has {} sample(s); a stratified split needs at least 2 per class",
            class,
            rows.len()
        )));
    }

    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut train_indices = Vec::with_capacity(y.len());
    let mut test_indices = Vec::new();

    for mut rows in by_class.into_values() {
        rows.shuffle(&mut rng);
        let n_test = ((rows.len() as f64) * test_size).round() as usize;
        let n_test = n_test.clamp(1, rows.len() - 1);
        test_indices.extend_from_slice(&rows[..n_test]);
        train_indices.extend_from_slice(&rows[n_test..]);
    }

    train_indices.shuffle(&mut rng);
    test_indices.shuffle(&mut rng);

    Ok(CVSplit {
        train_indices,
        test_indices,
        fold_idx: 0,
    })
}

/// Stratified k-fold splitter
#[derive(Debug, Clone)]
pub struct StratifiedKFold {
    n_splits: usize,
    random_state: Option<u64>,
}

impl StratifiedKFold {
    pub fn new(n_splits: usize) -> Self {
        Self {
            n_splits,
            random_state: None,
        }
    }

    /// Shuffle rows within each class before assigning folds
    pub fn with_shuffle(mut self, seed: u64) -> Self {
        self.random_state = Some(seed);
        self
    }

    pub fn n_splits(&self) -> usize {
        self.n_splits
    }

    /// Generate train/test splits.
    ///
    /// Rows of each class are dealt round-robin across folds, continuing
    /// from where the previous class stopped, so fold sizes differ by at
    /// most one.
    pub fn split(&self, y: &[usize]) -> Result<Vec<CVSplit>> {
        if self.n_splits < 2 {
            return Err(AdvisorError::InvalidParameter {
                name: "cv_folds".to_string(),
                value: self.n_splits.to_string(),
                reason: "must be at least 2".to_string(),
            });
        }

        let by_class = indices_by_class(y);
        if let Some((class, rows)) = by_class.iter().find(|(_, rows)| rows.len() < self.n_splits) {
            return Err(AdvisorError::InsufficientData(format!(
                "class code {} has {} training sample(s), fewer than {} folds",
                class,
                rows.len(),
                self.n_splits
            )));
        }

        let mut rng = self.random_state.map(ChaCha8Rng::seed_from_u64);
        let mut folds: Vec<Vec<usize>> = vec![Vec::new(); self.n_splits];
        let mut offset = 0;

        for mut rows in by_class.into_values() {
            if let Some(rng) = rng.as_mut() {
                rows.shuffle(rng);
            }
            for (i, &row) in rows.iter().enumerate() {
                folds[(offset + i) % self.n_splits].push(row);
            }
            offset = (offset + rows.len()) % self.n_splits;
        }

        let splits = (0..self.n_splits)
            .map(|fold_idx| {
                let train_indices = folds
                    .iter()
                    .enumerate()
                    .filter(|(i, _)| *i != fold_idx)
                    .flat_map(|(_, fold)| fold.iter().copied())
                    .collect();
                CVSplit {
                    train_indices,
                    test_indices: folds[fold_idx].clone(),
                    fold_idx,
                }
            })
            .collect();

        Ok(splits)
    }
}

/// Cross-validation results
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CVResults {
    /// Scores for each fold
    pub scores: Vec<f64>,
    /// Mean score across folds
    pub mean_score: f64,
    /// Standard deviation of scores
    pub std_score: f64,
    /// Number of folds
    pub n_folds: usize,
}

impl CVResults {
    /// Create CV results from fold scores
    pub fn from_scores(scores: Vec<f64>) -> Self {
        let n_folds = scores.len();
        if n_folds == 0 {
            return Self {
                scores,
                mean_score: 0.0,
                std_score: 0.0,
                n_folds,
            };
        }
        let mean_score = scores.iter().sum::<f64>() / n_folds as f64;
        let variance = scores.iter().map(|s| (s - mean_score).powi(2)).sum::<f64>() / n_folds as f64;
        let std_score = variance.sqrt();

        Self {
            scores,
            mean_score,
            std_score,
            n_folds,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels(counts: &[usize]) -> Vec<usize> {
        counts
            .iter()
            .enumerate()
            .flat_map(|(class, &n)| std::iter::repeat(class).take(n))
            .collect()
    }

    #[test]
    fn test_stratified_k_fold_preserves_classes() {
        let y = labels(&[50, 30, 20]);
        let splits = StratifiedKFold::new(5).with_shuffle(42).split(&y).unwrap();

        assert_eq!(splits.len(), 5);
        for split in &splits {
            assert_eq!(split.test_indices.len(), 20);
            assert_eq!(split.train_indices.len(), 80);
            let class0 = split.test_indices.iter().filter(|&&i| y[i] == 0).count();
            assert_eq!(class0, 10);
        }

        let mut all_test: Vec<usize> = splits.iter().flat_map(|s| s.test_indices.clone()).collect();
        all_test.sort();
        assert_eq!(all_test, (0..100).collect::<Vec<_>>());
    }

    #[test]
    fn test_stratified_k_fold_uneven_sizes() {
        let y = labels(&[7, 6]);
        let splits = StratifiedKFold::new(5).split(&y).unwrap();
        let sizes: Vec<usize> = splits.iter().map(|s| s.test_indices.len()).collect();
        let max = *sizes.iter().max().unwrap();
        let min = *sizes.iter().min().unwrap();
        assert!(max - min <= 1, "fold sizes {:?}", sizes);
    }

    #[test]
    fn test_stratified_k_fold_too_few_per_class() {
        let y = labels(&[10, 4]);
        let err = StratifiedKFold::new(5).split(&y).unwrap_err();
        assert!(matches!(err, AdvisorError::InsufficientData(_)));
    }

    #[test]
    fn test_k_fold_deterministic_with_seed() {
        let y = labels(&[20, 20]);
        let a = StratifiedKFold::new(4).with_shuffle(3).split(&y).unwrap();
        let b = StratifiedKFold::new(4).with_shuffle(3).split(&y).unwrap();
        for (sa, sb) in a.iter().zip(b.iter()) {
            assert_eq!(sa.test_indices, sb.test_indices);
        }
    }

    #[test]
    fn test_train_test_split_proportions() {
        let y = labels(&[100, 100, 100]);
        let split = stratified_train_test_split(&y, 0.2, 42).unwrap();

        assert_eq!(split.test_indices.len(), 60);
        assert_eq!(split.train_indices.len(), 240);
        for class in 0..3 {
            let n = split.test_indices.iter().filter(|&&i| y[i] == class).count();
            assert_eq!(n, 20);
        }

        let mut all: Vec<usize> = split
            .train_indices
            .iter()
            .chain(split.test_indices.iter())
            .copied()
            .collect();
        all.sort();
        assert_eq!(all, (0..300).collect::<Vec<_>>());
    }

    #[test]
    fn test_train_test_split_singleton_class() {
        let y = labels(&[10, 1]);
        let err = stratified_train_test_split(&y, 0.2, 42).unwrap_err();
        assert!(matches!(err, AdvisorError::InsufficientData(_)));
    }

    #[test]
    fn test_train_test_split_small_class_keeps_both_sides() {
        let y = labels(&[2, 10]);
        let split = stratified_train_test_split(&y, 0.2, 42).unwrap();
        assert_eq!(split.test_indices.iter().filter(|&&i| y[i] == 0).count(), 1);
        assert_eq!(split.train_indices.iter().filter(|&&i| y[i] == 0).count(), 1);
    }

    #[test]
    fn test_train_test_split_bad_size() {
        assert!(stratified_train_test_split(&[0, 0, 1, 1], 1.0, 1).is_err());
    }

    #[test]
    fn test_cv_results() {
        let results = CVResults::from_scores(vec![0.8, 0.9, 1.0]);
        assert!((results.mean_score - 0.9).abs() < 1e-12);
        assert_eq!(results.n_folds, 3);
    }
}

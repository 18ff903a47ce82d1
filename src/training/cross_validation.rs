//! Cross-validation splitters

use crate::error::{ChurnError, Result};
use ndarray::Array1;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Cross-validation strategy
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum CVStrategy {
    /// K-Fold cross-validation
    KFold { n_splits: usize, shuffle: bool },
    /// Stratified K-Fold, keeping the class balance per fold
    StratifiedKFold { n_splits: usize, shuffle: bool },
}

impl Default for CVStrategy {
    fn default() -> Self {
        CVStrategy::StratifiedKFold {
            n_splits: 3,
            shuffle: true,
        }
    }
}

/// A single train/test split
#[derive(Debug, Clone)]
pub struct CVSplit {
    pub train_indices: Vec<usize>,
    pub test_indices: Vec<usize>,
    pub fold_idx: usize,
}

/// Cross-validation splitter
///
/// Fold assignment is fully determined by the strategy and seed. Within
/// each split the indices come back sorted, preserving row order.
pub struct CrossValidator {
    strategy: CVStrategy,
    random_state: Option<u64>,
}

impl CrossValidator {
    /// Create a new cross-validator
    pub fn new(strategy: CVStrategy) -> Self {
        Self {
            strategy,
            random_state: None,
        }
    }

    /// Set random state for reproducibility
    pub fn with_random_state(mut self, seed: u64) -> Self {
        self.random_state = Some(seed);
        self
    }

    /// Generate train/test splits
    pub fn split(&self, n_samples: usize, y: Option<&Array1<f64>>) -> Result<Vec<CVSplit>> {
        match &self.strategy {
            CVStrategy::KFold { n_splits, shuffle } => {
                self.k_fold_split(n_samples, *n_splits, *shuffle)
            }
            CVStrategy::StratifiedKFold { n_splits, shuffle } => {
                let y = y.ok_or_else(|| {
                    ChurnError::TrainingError(
                        "stratified k-fold requires a target array".to_string(),
                    )
                })?;
                self.stratified_k_fold_split(n_samples, y, *n_splits, *shuffle)
            }
        }
    }

    fn validate(&self, n_samples: usize, n_splits: usize) -> Result<()> {
        if n_splits < 2 {
            return Err(ChurnError::InvalidParameter {
                name: "n_splits".to_string(),
                value: n_splits.to_string(),
                reason: "must be at least 2".to_string(),
            });
        }
        if n_samples < n_splits {
            return Err(ChurnError::TrainingError(format!(
                "n_samples ({}) must be >= n_splits ({})",
                n_samples, n_splits
            )));
        }
        Ok(())
    }

    fn rng(&self) -> ChaCha8Rng {
        match self.random_state {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_entropy(),
        }
    }

    fn k_fold_split(
        &self,
        n_samples: usize,
        n_splits: usize,
        shuffle: bool,
    ) -> Result<Vec<CVSplit>> {
        self.validate(n_samples, n_splits)?;

        let mut indices: Vec<usize> = (0..n_samples).collect();
        if shuffle {
            indices.shuffle(&mut self.rng());
        }

        // The first n_samples % n_splits folds absorb the remainder
        let fold_sizes: Vec<usize> = (0..n_splits)
            .map(|i| {
                let base = n_samples / n_splits;
                let remainder = n_samples % n_splits;
                if i < remainder {
                    base + 1
                } else {
                    base
                }
            })
            .collect();

        let mut splits = Vec::with_capacity(n_splits);
        let mut current = 0;

        for fold_idx in 0..n_splits {
            let fold_size = fold_sizes[fold_idx];
            let mut test_indices: Vec<usize> = indices[current..current + fold_size].to_vec();
            let mut train_indices: Vec<usize> = indices[..current]
                .iter()
                .chain(indices[current + fold_size..].iter())
                .copied()
                .collect();

            test_indices.sort_unstable();
            train_indices.sort_unstable();

            splits.push(CVSplit {
                train_indices,
                test_indices,
                fold_idx,
            });

            current += fold_size;
        }

        Ok(splits)
    }

    fn stratified_k_fold_split(
        &self,
        n_samples: usize,
        y: &Array1<f64>,
        n_splits: usize,
        shuffle: bool,
    ) -> Result<Vec<CVSplit>> {
        self.validate(n_samples, n_splits)?;

        if y.len() != n_samples {
            return Err(ChurnError::ShapeError {
                expected: format!("y length = {}", n_samples),
                actual: format!("y length = {}", y.len()),
            });
        }

        // Keyed by class, ordered, so fold assignment is reproducible
        let mut class_indices: BTreeMap<i64, Vec<usize>> = BTreeMap::new();
        for (idx, &val) in y.iter().enumerate() {
            class_indices.entry(val.round() as i64).or_default().push(idx);
        }

        if class_indices.len() < 2 {
            return Err(ChurnError::DegenerateLabels(format!(
                "stratified split needs at least two classes, found {}",
                class_indices.len()
            )));
        }

        let mut rng = self.rng();
        if shuffle {
            for indices in class_indices.values_mut() {
                indices.shuffle(&mut rng);
            }
        }

        // One continuous cursor deals every class, so fold totals differ by
        // at most one row even when several classes leave a remainder
        let mut folds: Vec<Vec<usize>> = vec![Vec::new(); n_splits];
        let mut cursor = 0usize;
        for indices in class_indices.values() {
            for &idx in indices {
                folds[cursor % n_splits].push(idx);
                cursor += 1;
            }
        }

        let mut splits = Vec::with_capacity(n_splits);
        for fold_idx in 0..n_splits {
            let mut test_indices = folds[fold_idx].clone();
            let mut train_indices: Vec<usize> = folds
                .iter()
                .enumerate()
                .filter(|(i, _)| *i != fold_idx)
                .flat_map(|(_, f)| f.iter().copied())
                .collect();

            test_indices.sort_unstable();
            train_indices.sort_unstable();

            splits.push(CVSplit {
                train_indices,
                test_indices,
                fold_idx,
            });
        }

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
    pub fn from_scores(scores: Vec<f64>) -> Result<Self> {
        let n_folds = scores.len();
        if n_folds == 0 {
            return Err(ChurnError::TrainingError(
                "cannot aggregate zero fold scores".to_string(),
            ));
        }

        let mean_score = scores.iter().sum::<f64>() / n_folds as f64;
        let variance =
            scores.iter().map(|s| (s - mean_score).powi(2)).sum::<f64>() / n_folds as f64;

        Ok(Self {
            scores,
            mean_score,
            std_score: variance.sqrt(),
            n_folds,
        })
    }
}

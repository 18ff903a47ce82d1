//! Out-of-time and train/test partitioning
//!
//! The out-of-time (oot) slice is everything dated exactly at the reference
//! cutoff; the remainder is shuffled with a seeded RNG and divided into
//! train and test. All three slices are disjoint and together cover the
//! input frame. Re-running with the same seed and cutoff reproduces the
//! same row membership.

use crate::error::{ChurnError, Result};
use polars::prelude::*;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

/// The three disjoint slices of a training run
#[derive(Debug, Clone)]
pub struct DataSplits {
    pub train: DataFrame,
    pub test: DataFrame,
    pub oot: DataFrame,
}

impl DataSplits {
    pub fn total_rows(&self) -> usize {
        self.train.height() + self.test.height() + self.oot.height()
    }
}

/// Partition `df` into `{train, test, oot}`.
///
/// `oot` collects rows whose `reference_col` equals `reference_date`
/// exactly (rows with a null reference date stay in the remainder). The
/// remainder is split `1 - test_size` / `test_size` after a seeded
/// shuffle; the test slice gets `ceil(n * test_size)` rows.
pub fn split_dataset(
    df: &DataFrame,
    reference_col: &str,
    reference_date: &str,
    test_size: f64,
    seed: u64,
) -> Result<DataSplits> {
    if !(test_size > 0.0 && test_size < 1.0) {
        return Err(ChurnError::InvalidParameter {
            name: "test_size".to_string(),
            value: test_size.to_string(),
            reason: "must be strictly between 0 and 1".to_string(),
        });
    }

    let ref_col = df
        .column(reference_col)
        .map_err(|_| {
            ChurnError::SchemaError(format!(
                "reference column '{}' not present in dataset",
                reference_col
            ))
        })?
        .str()
        .map_err(|_| {
            ChurnError::SchemaError(format!(
                "reference column '{}' must be string-typed",
                reference_col
            ))
        })?;

    let mask: BooleanChunked = ref_col
        .into_iter()
        .map(|v| v == Some(reference_date))
        .collect();

    let oot = df.filter(&mask)?;
    if oot.height() == 0 {
        return Err(ChurnError::empty_split(
            "oot",
            format!("no rows match reference date '{}'", reference_date),
        ));
    }

    let rest = df.filter(&!&mask)?;
    let n_rest = rest.height();
    if n_rest == 0 {
        return Err(ChurnError::empty_split(
            "train",
            format!("all rows match reference date '{}'", reference_date),
        ));
    }

    let n_test = ((n_rest as f64) * test_size).ceil() as usize;
    if n_test == 0 {
        return Err(ChurnError::empty_split(
            "test",
            format!("{} remaining rows at test_size {}", n_rest, test_size),
        ));
    }
    if n_test >= n_rest {
        return Err(ChurnError::empty_split(
            "train",
            format!("{} remaining rows at test_size {}", n_rest, test_size),
        ));
    }

    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut indices: Vec<u32> = (0..n_rest as u32).collect();
    indices.shuffle(&mut rng);

    let mut test_idx: Vec<u32> = indices[..n_test].to_vec();
    let mut train_idx: Vec<u32> = indices[n_test..].to_vec();
    // Sort to keep original row order within each slice
    test_idx.sort_unstable();
    train_idx.sort_unstable();

    let train = rest.take(&IdxCa::from_vec("idx".into(), train_idx))?;
    let test = rest.take(&IdxCa::from_vec("idx".into(), test_idx))?;

    Ok(DataSplits { train, test, oot })
}

//! Training run configuration

use crate::error::{ChurnError, Result};
use crate::optimizer::ParamGrid;
use crate::preprocessing::PreprocessingConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Configuration for a full training run
///
/// Defaults reproduce the monthly seller-churn run: out-of-time slice at
/// 2018-02-01, seeded 80/20 split, and the forest grid searched with 25
/// trials over 3 folds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainConfig {
    /// Target column, a 0/1 churn flag
    pub target_column: String,

    /// Identifier columns excluded from the feature set
    pub id_columns: Vec<String>,

    /// Reference-period column
    pub reference_column: String,

    /// Rows whose reference equals this date form the out-of-time slice
    pub reference_date: String,

    /// Fraction of remaining rows held out for test
    pub test_size: f64,

    /// Seed for every stochastic step
    pub seed: u64,

    /// Preprocessing column wiring
    pub preprocessing: PreprocessingConfig,

    /// Hyperparameter grid for the forest
    pub grid: ParamGrid,

    /// Sampled configurations per search
    pub n_trials: usize,

    /// Cross-validation folds
    pub cv_folds: usize,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            target_column: "flChurn".to_string(),
            id_columns: vec!["idVendedor".to_string()],
            reference_column: "dtReferencia".to_string(),
            reference_date: "2018-02-01".to_string(),
            test_size: 0.2,
            seed: 42,
            preprocessing: PreprocessingConfig::default(),
            grid: Self::default_grid(),
            n_trials: 25,
            cv_folds: 3,
        }
    }
}

impl TrainConfig {
    /// Create a new configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// The forest grid searched by the default run, 36 combinations
    pub fn default_grid() -> ParamGrid {
        ParamGrid::new()
            .ints("max_depth", vec![9, 10, 11])
            .strings("criterion", vec!["gini"])
            .ints("min_samples_leaf", vec![90, 100, 110])
            .ints("n_estimators", vec![90, 100, 200, 500])
    }

    /// Builder method to set the target column
    pub fn with_target_column(mut self, column: impl Into<String>) -> Self {
        self.target_column = column.into();
        self
    }

    /// Builder method to set the identifier columns
    pub fn with_id_columns(mut self, columns: Vec<String>) -> Self {
        self.id_columns = columns;
        self
    }

    /// Builder method to set the reference column
    pub fn with_reference_column(mut self, column: impl Into<String>) -> Self {
        self.reference_column = column.into();
        self
    }

    /// Builder method to set the out-of-time reference date
    pub fn with_reference_date(mut self, date: impl Into<String>) -> Self {
        self.reference_date = date.into();
        self
    }

    /// Builder method to set the test fraction
    pub fn with_test_size(mut self, test_size: f64) -> Self {
        self.test_size = test_size;
        self
    }

    /// Builder method to set the seed
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Builder method to set the preprocessing wiring
    pub fn with_preprocessing(mut self, preprocessing: PreprocessingConfig) -> Self {
        self.preprocessing = preprocessing;
        self
    }

    /// Builder method to set the hyperparameter grid
    pub fn with_grid(mut self, grid: ParamGrid) -> Self {
        self.grid = grid;
        self
    }

    /// Builder method to set the number of search trials
    pub fn with_n_trials(mut self, n_trials: usize) -> Self {
        self.n_trials = n_trials;
        self
    }

    /// Builder method to set the number of CV folds
    pub fn with_cv_folds(mut self, cv_folds: usize) -> Self {
        self.cv_folds = cv_folds;
        self
    }

    /// Check the numeric knobs before a run
    pub fn validate(&self) -> Result<()> {
        if !(self.test_size > 0.0 && self.test_size < 1.0) {
            return Err(ChurnError::InvalidParameter {
                name: "test_size".to_string(),
                value: self.test_size.to_string(),
                reason: "must be strictly between 0 and 1".to_string(),
            });
        }
        if self.n_trials == 0 {
            return Err(ChurnError::InvalidParameter {
                name: "n_trials".to_string(),
                value: "0".to_string(),
                reason: "the search needs at least one trial".to_string(),
            });
        }
        if self.cv_folds < 2 {
            return Err(ChurnError::InvalidParameter {
                name: "cv_folds".to_string(),
                value: self.cv_folds.to_string(),
                reason: "must be at least 2".to_string(),
            });
        }
        Ok(())
    }

    /// Columns excluded from the feature set
    pub fn excluded_columns(&self) -> Vec<String> {
        let mut excluded = self.id_columns.clone();
        excluded.push(self.reference_column.clone());
        excluded.push(self.target_column.clone());
        excluded
    }

    /// Load a configuration from a JSON file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&json)?;
        Ok(config)
    }

    /// Save the configuration to a JSON file
    pub fn to_file(&self, path: impl AsRef<Path>) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }
}

//! churn-model - Seller churn prediction pipeline
//!
//! This crate takes a monthly seller analytical base table and produces a
//! scored random forest churn model:
//! - Out-of-time holdout at a fixed reference date, then a seeded
//!   train/test split of the remainder
//! - A six-stage preprocessing chain fitted on the train slice only
//! - Randomized hyperparameter search over a discrete forest grid with
//!   stratified cross-validation
//! - One JSON artifact with the model, its features, and accuracy/AUC on
//!   the train, test, and out-of-time slices
//!
//! # Modules
//!
//! - [`data`] - ABT loading, feature partitioning, dataset splitting
//! - [`preprocessing`] - The six-stage encoding and imputation chain
//! - [`training`] - Tree and forest learners, cross-validation, metrics,
//!   hyperparameter selection, and the training engine
//! - [`optimizer`] - Discrete grids and randomized search
//! - [`model`] - The fitted scorer (preprocessing chain plus forest)
//! - [`artifact`] - The persisted training output
//! - [`cli`] - Command-line interface

pub mod error;

pub mod artifact;
pub mod data;
pub mod model;
pub mod optimizer;
pub mod preprocessing;
pub mod training;

pub mod cli;

pub use error::{ChurnError, Result};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::error::{ChurnError, Result};

    pub use crate::artifact::{ModelArtifact, DEFAULT_ARTIFACT_PATH};
    pub use crate::data::{split_dataset, DataLoader, DataSaver, DataSplits, FeatureSet};
    pub use crate::model::ChurnModel;
    pub use crate::optimizer::{
        OptimizeDirection, ParamGrid, ParamValue, RandomSearch, Study, TrialParams, TrialResult,
    };
    pub use crate::preprocessing::{PreprocessingConfig, PreprocessingPipeline};
    pub use crate::training::{
        accuracy, roc_auc, CVResults, CVStrategy, CrossValidator, Criterion, DecisionTree,
        EvaluationReport, ForestSearch, MaxFeatures, RandomForestClassifier, SplitScores,
        TrainConfig, TrainEngine, TrainOutcome,
    };
}

//! End-to-end training run
//!
//! `TrainEngine` drives a full run from a raw seller frame to a persisted
//! artifact: schema validation, the out-of-time and train/test partition,
//! preprocessing fit on the train slice only, randomized forest search,
//! and evaluation on all three slices. Any failed stage aborts the run.

use crate::artifact::ModelArtifact;
use crate::data::{split_dataset, FeatureSet};
use crate::error::{ChurnError, Result};
use crate::model::{columns_to_matrix, ChurnModel};
use crate::optimizer::{Study, TrialParams};
use crate::preprocessing::PreprocessingPipeline;
use ndarray::Array1;
use polars::prelude::*;
use std::time::Instant;
use tracing::info;

use super::{EvaluationReport, ForestSearch, SplitScores, TrainConfig};

/// Everything a completed run produces
#[derive(Debug, Clone)]
pub struct TrainOutcome {
    /// The refitted winning model
    pub model: ChurnModel,
    /// Accuracy and AUC on the train, test and oot slices
    pub evaluation: EvaluationReport,
    /// Parameters of the winning trial
    pub best_params: TrialParams,
    /// Mean cross-validated AUC of the winning trial
    pub best_cv_auc: f64,
    /// Every evaluated trial
    pub study: Study,
    pub train_rows: usize,
    pub test_rows: usize,
    pub oot_rows: usize,
    pub elapsed_secs: f64,
}

impl TrainOutcome {
    /// Package the outcome for persistence
    pub fn into_artifact(self) -> ModelArtifact {
        ModelArtifact::from_run(self.model, &self.evaluation)
    }
}

/// Orchestrates a churn training run
#[derive(Debug, Clone)]
pub struct TrainEngine {
    config: TrainConfig,
}

impl TrainEngine {
    pub fn new(config: TrainConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &TrainConfig {
        &self.config
    }

    /// Run the full pipeline on a raw seller frame
    pub fn run(&self, df: &DataFrame) -> Result<TrainOutcome> {
        let start = Instant::now();

        self.config.validate()?;
        self.validate_schema(df)?;
        info!(rows = df.height(), columns = df.width(), "Starting training run");

        let features = FeatureSet::from_dataframe(df, &self.config.excluded_columns())?;
        info!(
            categorical = features.categorical.len(),
            numeric = features.numeric.len(),
            "Partitioned feature columns"
        );

        let splits = split_dataset(
            df,
            &self.config.reference_column,
            &self.config.reference_date,
            self.config.test_size,
            self.config.seed,
        )?;
        info!(
            train = splits.train.height(),
            test = splits.test.height(),
            oot = splits.oot.height(),
            "Partitioned dataset"
        );

        let y_train = self.extract_target(&splits.train, "train")?;
        let y_test = self.extract_target(&splits.test, "test")?;
        let y_oot = self.extract_target(&splits.oot, "oot")?;

        let n_pos = y_train.iter().filter(|&&v| v == 1.0).count();
        if n_pos == 0 || n_pos == y_train.len() {
            return Err(ChurnError::DegenerateLabels(format!(
                "train split has a single class ({} positives out of {} rows)",
                n_pos,
                y_train.len()
            )));
        }

        let feature_cols = features.all();
        let train_features = splits
            .train
            .select(feature_cols.iter().map(|s| s.as_str()))?;
        let mut pipeline =
            PreprocessingPipeline::new(&self.config.preprocessing, features.categorical.clone());
        let train_encoded = pipeline.fit_transform(&train_features, &y_train)?;
        let x_train = columns_to_matrix(&train_encoded, pipeline.output_columns())?;
        info!(
            rows = x_train.nrows(),
            encoded_features = x_train.ncols(),
            "Fitted preprocessing chain on train slice"
        );

        let search = ForestSearch::new(self.config.grid.clone())
            .with_n_trials(self.config.n_trials)
            .with_cv_folds(self.config.cv_folds)
            .with_seed(self.config.seed);
        let outcome = search.fit(&x_train, &y_train)?;

        let model = ChurnModel::new(pipeline, outcome.best_forest, features);

        let evaluation = EvaluationReport {
            train: Self::evaluate_split(&model, &splits.train, &y_train)?,
            test: Self::evaluate_split(&model, &splits.test, &y_test)?,
            oot: Self::evaluate_split(&model, &splits.oot, &y_oot)?,
        };
        info!(
            auc_train = evaluation.train.auc,
            auc_test = evaluation.test.auc,
            auc_oot = evaluation.oot.auc,
            "Evaluated model on all slices"
        );

        Ok(TrainOutcome {
            model,
            evaluation,
            best_params: outcome.best_params,
            best_cv_auc: outcome.best_score,
            study: outcome.study,
            train_rows: splits.train.height(),
            test_rows: splits.test.height(),
            oot_rows: splits.oot.height(),
            elapsed_secs: start.elapsed().as_secs_f64(),
        })
    }

    /// Check the frame against everything the config declares
    fn validate_schema(&self, df: &DataFrame) -> Result<()> {
        let config = &self.config;

        for name in config
            .id_columns
            .iter()
            .chain(std::iter::once(&config.reference_column))
        {
            if df.column(name).is_err() {
                return Err(ChurnError::SchemaError(format!(
                    "declared column '{}' not present in dataset",
                    name
                )));
            }
        }

        let target = df.column(&config.target_column).map_err(|_| {
            ChurnError::SchemaError(format!(
                "target column '{}' not present in dataset",
                config.target_column
            ))
        })?;
        let target_f64 = target.cast(&DataType::Float64).map_err(|_| {
            ChurnError::SchemaError(format!(
                "target column '{}' is not numeric (found {})",
                config.target_column,
                target.dtype()
            ))
        })?;
        for value in target_f64
            .f64()
            .map_err(|e| ChurnError::DataError(e.to_string()))?
            .into_iter()
        {
            match value {
                None => {
                    return Err(ChurnError::SchemaError(format!(
                        "target column '{}' has missing values",
                        config.target_column
                    )))
                }
                Some(v) if v != 0.0 && v != 1.0 => {
                    return Err(ChurnError::SchemaError(format!(
                        "target column '{}' has non-binary value {}",
                        config.target_column, v
                    )))
                }
                _ => {}
            }
        }

        let pp = &config.preprocessing;
        for name in pp
            .mean_encode_columns
            .iter()
            .chain(std::iter::once(&pp.onehot_column))
        {
            let column = df.column(name).map_err(|_| {
                ChurnError::SchemaError(format!(
                    "declared column '{}' not present in dataset",
                    name
                ))
            })?;
            if !matches!(column.dtype(), DataType::String | DataType::Categorical(_, _)) {
                return Err(ChurnError::SchemaError(format!(
                    "column '{}' must be string-typed for categorical encoding (found {})",
                    name,
                    column.dtype()
                )));
            }
        }
        for name in pp.fill_999_columns.iter().chain(pp.fill_0_columns.iter()) {
            let column = df.column(name).map_err(|_| {
                ChurnError::SchemaError(format!(
                    "declared column '{}' not present in dataset",
                    name
                ))
            })?;
            if !numeric_dtype(column.dtype()) {
                return Err(ChurnError::SchemaError(format!(
                    "column '{}' must be numeric for missing-value fill (found {})",
                    name,
                    column.dtype()
                )));
            }
        }

        Ok(())
    }

    /// Pull the target column of one slice as a dense 0/1 vector
    fn extract_target(&self, df: &DataFrame, split: &str) -> Result<Array1<f64>> {
        let target = df
            .column(&self.config.target_column)
            .map_err(|_| ChurnError::FeatureNotFound(self.config.target_column.clone()))?;
        let casted = target
            .cast(&DataType::Float64)
            .map_err(|e| ChurnError::DataError(e.to_string()))?;
        casted
            .f64()
            .map_err(|e| ChurnError::DataError(e.to_string()))?
            .into_iter()
            .map(|v| {
                v.ok_or_else(|| {
                    ChurnError::SchemaError(format!(
                        "target column '{}' has missing values in the {} slice",
                        self.config.target_column, split
                    ))
                })
            })
            .collect()
    }

    /// Score one slice with a single preprocessing pass
    fn evaluate_split(model: &ChurnModel, df: &DataFrame, y: &Array1<f64>) -> Result<SplitScores> {
        let x = model.feature_matrix(df)?;
        let proba = model.forest().predict_proba(&x)?;
        let pred = proba.mapv(|p| if p > 0.5 { 1.0 } else { 0.0 });
        SplitScores::compute(y, &pred, &proba)
    }
}

fn numeric_dtype(dtype: &DataType) -> bool {
    matches!(
        dtype,
        DataType::Int8
            | DataType::Int16
            | DataType::Int32
            | DataType::Int64
            | DataType::UInt8
            | DataType::UInt16
            | DataType::UInt32
            | DataType::UInt64
            | DataType::Float32
            | DataType::Float64
            | DataType::Boolean
    )
}

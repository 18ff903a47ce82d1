//! The fitted churn model: preprocessing chain plus forest

use crate::data::FeatureSet;
use crate::error::{ChurnError, Result};
use crate::preprocessing::PreprocessingPipeline;
use crate::training::RandomForestClassifier;
use ndarray::{Array1, Array2};
use polars::prelude::*;
use serde::{Deserialize, Serialize};

/// A trained churn scorer
///
/// Bundles the fitted preprocessing chain, the winning forest, and the
/// raw feature columns it expects, so scoring takes the same frames the
/// trainer read.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChurnModel {
    pipeline: PreprocessingPipeline,
    forest: RandomForestClassifier,
    features: FeatureSet,
}

impl ChurnModel {
    /// Assemble a model from its fitted parts
    pub fn new(
        pipeline: PreprocessingPipeline,
        forest: RandomForestClassifier,
        features: FeatureSet,
    ) -> Self {
        Self {
            pipeline,
            forest,
            features,
        }
    }

    /// The raw feature partition the model expects
    pub fn features(&self) -> &FeatureSet {
        &self.features
    }

    /// Raw input column names, categorical then numeric
    pub fn feature_columns(&self) -> Vec<String> {
        self.features.all()
    }

    /// The fitted forest
    pub fn forest(&self) -> &RandomForestClassifier {
        &self.forest
    }

    /// The fitted preprocessing chain
    pub fn pipeline(&self) -> &PreprocessingPipeline {
        &self.pipeline
    }

    /// Select, preprocess, and materialize a frame as a feature matrix
    pub fn feature_matrix(&self, df: &DataFrame) -> Result<Array2<f64>> {
        let feature_columns = self.features.all();
        let selected = df
            .select(feature_columns.iter().map(|s| s.as_str()))
            .map_err(|e| {
                ChurnError::SchemaError(format!("frame is missing model features: {}", e))
            })?;

        let transformed = self.pipeline.transform(&selected)?;
        columns_to_matrix(&transformed, self.pipeline.output_columns())
    }

    /// Positive-class probability per row of a raw frame
    pub fn predict_proba(&self, df: &DataFrame) -> Result<Array1<f64>> {
        let x = self.feature_matrix(df)?;
        self.forest.predict_proba(&x)
    }

    /// Hard 0/1 churn labels per row of a raw frame
    pub fn predict(&self, df: &DataFrame) -> Result<Array1<f64>> {
        let x = self.feature_matrix(df)?;
        self.forest.predict(&x)
    }
}

/// Named columns of a frame as a row-major f64 matrix
///
/// A missing value here means an upstream stage failed its contract, so
/// it is an error rather than a silent fill.
pub(crate) fn columns_to_matrix(df: &DataFrame, col_names: &[String]) -> Result<Array2<f64>> {
    let n_rows = df.height();
    let n_cols = col_names.len();

    let col_data: Vec<Vec<f64>> = col_names
        .iter()
        .map(|col_name| {
            let column = df
                .column(col_name)
                .map_err(|_| ChurnError::FeatureNotFound(col_name.clone()))?;
            let casted = column
                .cast(&DataType::Float64)
                .map_err(|e| ChurnError::DataError(e.to_string()))?;
            casted
                .f64()
                .map_err(|e| ChurnError::DataError(e.to_string()))?
                .into_iter()
                .map(|v| {
                    v.ok_or_else(|| {
                        ChurnError::DataError(format!(
                            "column '{}' has missing values after preprocessing",
                            col_name
                        ))
                    })
                })
                .collect()
        })
        .collect::<Result<Vec<Vec<f64>>>>()?;

    let col_refs: Vec<&[f64]> = col_data.iter().map(|c| c.as_slice()).collect();
    Ok(Array2::from_shape_fn((n_rows, n_cols), |(r, c)| {
        col_refs[c][r]
    }))
}

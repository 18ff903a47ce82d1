//! The fitted six-stage preprocessing chain

use super::{
    config::PreprocessingConfig,
    encoder::{MeanEncoder, OneHotEncoder},
    imputer::{ArbitraryNumberImputer, CategoricalImputer, MeanImputer},
    Stage,
};
use crate::error::{ChurnError, Result};
use ndarray::Array1;
use polars::prelude::*;
use serde::{Deserialize, Serialize};

/// Ordered preprocessing chain for the churn features
///
/// Stage order is fixed and load-bearing: mean-target encoding turns
/// unseen categories into nulls that only the mean imputation directly
/// after it may fill. Fitting captures the output schema; every later
/// transform is forced onto that same column set and order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PreprocessingPipeline {
    cat_imputer: CategoricalImputer,
    mean_encoder: MeanEncoder,
    encoded_imputer: MeanImputer,
    onehot: OneHotEncoder,
    fill_999: ArbitraryNumberImputer,
    fill_0: ArbitraryNumberImputer,
    output_columns: Vec<String>,
    is_fitted: bool,
}

impl PreprocessingPipeline {
    /// Build an unfitted chain from the column wiring plus the dataset's
    /// categorical feature list (sentinel imputation covers all of them).
    pub fn new(config: &PreprocessingConfig, categorical_columns: Vec<String>) -> Self {
        Self {
            cat_imputer: CategoricalImputer::new(
                config.sentinel_label.clone(),
                categorical_columns,
            ),
            mean_encoder: MeanEncoder::new(config.mean_encode_columns.clone()),
            encoded_imputer: MeanImputer::new(config.mean_encode_columns.clone()),
            onehot: OneHotEncoder::new(config.onehot_column.clone(), config.onehot_drop_last),
            fill_999: ArbitraryNumberImputer::new(999.0, config.fill_999_columns.clone()),
            fill_0: ArbitraryNumberImputer::new(0.0, config.fill_0_columns.clone()),
            output_columns: Vec::new(),
            is_fitted: false,
        }
    }

    /// Fit every stage on the training slice, threading the frame through
    /// the chain so each stage learns from its predecessor's output.
    pub fn fit(&mut self, df: &DataFrame, target: &Array1<f64>) -> Result<&mut Self> {
        if df.height() == 0 {
            return Err(ChurnError::PreprocessingError(
                "cannot fit preprocessing on an empty frame".to_string(),
            ));
        }

        self.cat_imputer.fit(df, None)?;
        let step = self.cat_imputer.transform(df)?;

        self.mean_encoder.fit(&step, Some(target))?;
        let step = self.mean_encoder.transform(&step)?;

        self.encoded_imputer.fit(&step, None)?;
        let step = self.encoded_imputer.transform(&step)?;

        self.onehot.fit(&step, None)?;
        let step = self.onehot.transform(&step)?;

        self.fill_999.fit(&step, None)?;
        let step = self.fill_999.transform(&step)?;

        self.fill_0.fit(&step, None)?;
        let step = self.fill_0.transform(&step)?;

        self.output_columns = step
            .get_column_names()
            .iter()
            .map(|s| s.to_string())
            .collect();
        self.is_fitted = true;
        Ok(self)
    }

    /// Apply the fitted chain and enforce the train-time output schema
    pub fn transform(&self, df: &DataFrame) -> Result<DataFrame> {
        if !self.is_fitted {
            return Err(ChurnError::NotFitted);
        }

        let step = self.cat_imputer.transform(df)?;
        let step = self.mean_encoder.transform(&step)?;
        let step = self.encoded_imputer.transform(&step)?;
        let step = self.onehot.transform(&step)?;
        let step = self.fill_999.transform(&step)?;
        let step = self.fill_0.transform(&step)?;

        step.select(self.output_columns.iter().map(|s| s.as_str()))
            .map_err(|e| {
                ChurnError::SchemaError(format!(
                    "transformed frame does not match the fitted schema: {}",
                    e
                ))
            })
    }

    /// Fit on the training slice, then transform it
    pub fn fit_transform(&mut self, df: &DataFrame, target: &Array1<f64>) -> Result<DataFrame> {
        self.fit(df, target)?;
        self.transform(df)
    }

    /// Column names (and order) every transform output carries
    pub fn output_columns(&self) -> &[String] {
        &self.output_columns
    }

    pub fn is_fitted(&self) -> bool {
        self.is_fitted
    }

    /// The fitted mean encoder (inspection)
    pub fn mean_encoder(&self) -> &MeanEncoder {
        &self.mean_encoder
    }

    /// The fitted one-hot encoder (inspection)
    pub fn onehot(&self) -> &OneHotEncoder {
        &self.onehot
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chain_config() -> PreprocessingConfig {
        PreprocessingConfig::new()
            .with_sentinel_label("Faltante")
            .with_mean_encode_columns(vec!["descCidade".to_string()])
            .with_onehot_column("descEstado")
            .with_fill_999_columns(vec!["avgTempoResposta1M".to_string()])
            .with_fill_0_columns(vec!["qtMediaFotos".to_string()])
    }

    fn train_frame() -> DataFrame {
        df! {
            "descCidade" => &[Some("sao paulo"), Some("campinas"), None, Some("sao paulo")],
            "descEstado" => &["SP", "SP", "RJ", "MG"],
            "avgTempoResposta1M" => &[Some(1.0), None, Some(3.0), Some(5.0)],
            "qtMediaFotos" => &[None, Some(2.0), Some(4.0), None],
        }
        .unwrap()
    }

    fn train_target() -> Array1<f64> {
        Array1::from_vec(vec![1.0, 0.0, 1.0, 0.0])
    }

    fn categoricals() -> Vec<String> {
        vec!["descCidade".to_string(), "descEstado".to_string()]
    }

    #[test]
    fn test_fit_transform_produces_no_nulls() {
        let mut pipeline = PreprocessingPipeline::new(&chain_config(), categoricals());
        let out = pipeline.fit_transform(&train_frame(), &train_target()).unwrap();

        for column in out.get_columns() {
            assert_eq!(
                column.null_count(),
                0,
                "column '{}' still has missing values",
                column.name()
            );
        }
    }

    #[test]
    fn test_output_schema_is_stable_across_frames() {
        let mut pipeline = PreprocessingPipeline::new(&chain_config(), categoricals());
        pipeline.fit(&train_frame(), &train_target()).unwrap();

        let other = df! {
            "descCidade" => &[Some("niteroi"), None],
            "descEstado" => &["RJ", "PR"],
            "avgTempoResposta1M" => &[None::<f64>, None],
            "qtMediaFotos" => &[Some(1.0), None],
        }
        .unwrap();

        let train_out = pipeline.transform(&train_frame()).unwrap();
        let other_out = pipeline.transform(&other).unwrap();

        let train_cols: Vec<String> = train_out
            .get_column_names()
            .iter()
            .map(|s| s.to_string())
            .collect();
        let other_cols: Vec<String> = other_out
            .get_column_names()
            .iter()
            .map(|s| s.to_string())
            .collect();
        assert_eq!(train_cols, other_cols, "schema must match across splits");
        assert_eq!(pipeline.output_columns(), train_cols.as_slice());
    }

    #[test]
    fn test_transform_is_pure_after_fit() {
        let mut pipeline = PreprocessingPipeline::new(&chain_config(), categoricals());
        pipeline.fit(&train_frame(), &train_target()).unwrap();

        let once = pipeline.transform(&train_frame()).unwrap();
        let twice = pipeline.transform(&train_frame()).unwrap();
        assert!(once.equals(&twice), "repeated transform must be identical");
    }

    #[test]
    fn test_unseen_categories_fully_resolved() {
        let mut pipeline = PreprocessingPipeline::new(&chain_config(), categoricals());
        pipeline.fit(&train_frame(), &train_target()).unwrap();

        // City and state both unseen in train, numeric cells missing
        let unseen = df! {
            "descCidade" => &["porto alegre"],
            "descEstado" => &["RS"],
            "avgTempoResposta1M" => &[None::<f64>],
            "qtMediaFotos" => &[None::<f64>],
        }
        .unwrap();

        let out = pipeline.transform(&unseen).unwrap();
        for column in out.get_columns() {
            assert_eq!(
                column.null_count(),
                0,
                "unseen category left a missing value in '{}'",
                column.name()
            );
        }
    }

    #[test]
    fn test_encoded_imputer_runs_after_encoder() {
        // The order dependency: an unseen category must pick up the mean of
        // the encoded train column, which only exists if encoding ran first.
        let mut pipeline = PreprocessingPipeline::new(&chain_config(), categoricals());
        pipeline.fit(&train_frame(), &train_target()).unwrap();

        // Train encodings: sao paulo -> 0.5 (targets 1,0), campinas -> 0.0,
        // Faltante -> 1.0. Column mean = (0.5 + 0.0 + 1.0 + 0.5) / 4 = 0.5.
        let unseen = df! {
            "descCidade" => &["porto alegre"],
            "descEstado" => &["SP"],
            "avgTempoResposta1M" => &[1.0],
            "qtMediaFotos" => &[1.0],
        }
        .unwrap();

        let out = pipeline.transform(&unseen).unwrap();
        let encoded = out.column("descCidade").unwrap().f64().unwrap().get(0).unwrap();
        assert!((encoded - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_transform_before_fit_errors() {
        let pipeline = PreprocessingPipeline::new(&chain_config(), categoricals());
        let result = pipeline.transform(&train_frame());
        assert!(matches!(result, Err(ChurnError::NotFitted)));
    }

    #[test]
    fn test_fit_on_empty_frame_errors() {
        let empty = train_frame().head(Some(0));
        let mut pipeline = PreprocessingPipeline::new(&chain_config(), categoricals());
        let result = pipeline.fit(&empty, &Array1::from_vec(vec![]));
        assert!(matches!(result, Err(ChurnError::PreprocessingError(_))));
    }

    #[test]
    fn test_missing_wired_column_errors() {
        let df = df! { "descCidade" => &["a"] }.unwrap();
        let mut pipeline =
            PreprocessingPipeline::new(&chain_config(), vec!["descCidade".to_string()]);
        let result = pipeline.fit(&df, &Array1::from_vec(vec![1.0]));
        assert!(matches!(result, Err(ChurnError::FeatureNotFound(_))));
    }
}

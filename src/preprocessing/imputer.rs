//! Missing value imputation stages
//!
//! Three imputers cover the churn chain: sentinel-label filling for
//! categorical columns, train-mean filling for the mean-encoded columns,
//! and fixed-constant filling for the two numeric column groups. Each
//! learns its state on the training slice and applies it unchanged
//! everywhere else.

use crate::error::{ChurnError, Result};
use crate::preprocessing::Stage;
use ndarray::Array1;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Fills missing categorical values with a fixed sentinel label
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoricalImputer {
    fill_label: String,
    columns: Vec<String>,
    is_fitted: bool,
}

impl CategoricalImputer {
    pub fn new(fill_label: impl Into<String>, columns: Vec<String>) -> Self {
        Self {
            fill_label: fill_label.into(),
            columns,
            is_fitted: false,
        }
    }

    pub fn fill_label(&self) -> &str {
        &self.fill_label
    }

    fn fill_column(&self, series: &Series) -> Result<Series> {
        // Categorical-dtype columns are materialized as strings on the way
        // through, so downstream encoders only ever see String columns.
        let materialized = match series.dtype() {
            DataType::String => series.clone(),
            DataType::Categorical(_, _) => series
                .cast(&DataType::String)
                .map_err(|_| not_string(series.name().as_str()))?,
            _ => return Err(not_string(series.name().as_str())),
        };
        let ca = materialized
            .str()
            .map_err(|_| not_string(series.name().as_str()))?;

        let filled: StringChunked = ca
            .into_iter()
            .map(|opt| Some(opt.unwrap_or(self.fill_label.as_str())))
            .collect();

        Ok(filled.with_name(series.name().clone()).into_series())
    }
}

impl Stage for CategoricalImputer {
    fn fit(&mut self, df: &DataFrame, _target: Option<&Array1<f64>>) -> Result<()> {
        for col_name in &self.columns {
            let column = df
                .column(col_name)
                .map_err(|_| ChurnError::FeatureNotFound(col_name.clone()))?;
            if !matches!(
                column.dtype(),
                DataType::String | DataType::Categorical(_, _)
            ) {
                return Err(not_string(col_name));
            }
        }
        self.is_fitted = true;
        Ok(())
    }

    fn transform(&self, df: &DataFrame) -> Result<DataFrame> {
        if !self.is_fitted {
            return Err(ChurnError::NotFitted);
        }

        let mut result = df.clone();
        for col_name in &self.columns {
            let column = df
                .column(col_name)
                .map_err(|_| ChurnError::FeatureNotFound(col_name.clone()))?;
            let filled = self.fill_column(column.as_materialized_series())?;
            result.with_column(filled)?;
        }

        Ok(result)
    }
}

/// Fills missing numeric values with the train-time column mean
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MeanImputer {
    columns: Vec<String>,
    means: BTreeMap<String, f64>,
    is_fitted: bool,
}

impl MeanImputer {
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            means: BTreeMap::new(),
            is_fitted: false,
        }
    }

    pub fn mean_for(&self, column: &str) -> Option<f64> {
        self.means.get(column).copied()
    }
}

impl Stage for MeanImputer {
    fn fit(&mut self, df: &DataFrame, _target: Option<&Array1<f64>>) -> Result<()> {
        self.means.clear();

        for col_name in &self.columns {
            let column = df
                .column(col_name)
                .map_err(|_| ChurnError::FeatureNotFound(col_name.clone()))?;
            let ca = cast_f64(column.as_materialized_series())?;

            let mean = ca.mean().ok_or_else(|| {
                ChurnError::PreprocessingError(format!(
                    "column '{}' has no non-missing values to average",
                    col_name
                ))
            })?;
            self.means.insert(col_name.clone(), mean);
        }

        self.is_fitted = true;
        Ok(())
    }

    fn transform(&self, df: &DataFrame) -> Result<DataFrame> {
        if !self.is_fitted {
            return Err(ChurnError::NotFitted);
        }

        let mut result = df.clone();
        for col_name in &self.columns {
            let column = df
                .column(col_name)
                .map_err(|_| ChurnError::FeatureNotFound(col_name.clone()))?;
            let mean = self.means[col_name];

            let ca = cast_f64(column.as_materialized_series())?;
            let filled: Float64Chunked =
                ca.into_iter().map(|opt| Some(opt.unwrap_or(mean))).collect();

            result.with_column(filled.with_name(col_name.as_str().into()).into_series())?;
        }

        Ok(result)
    }
}

/// Fills missing numeric values with a fixed constant (999 or 0 in the
/// churn chain)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArbitraryNumberImputer {
    fill_value: f64,
    columns: Vec<String>,
    is_fitted: bool,
}

impl ArbitraryNumberImputer {
    pub fn new(fill_value: f64, columns: Vec<String>) -> Self {
        Self {
            fill_value,
            columns,
            is_fitted: false,
        }
    }

    pub fn fill_value(&self) -> f64 {
        self.fill_value
    }
}

impl Stage for ArbitraryNumberImputer {
    fn fit(&mut self, df: &DataFrame, _target: Option<&Array1<f64>>) -> Result<()> {
        for col_name in &self.columns {
            let column = df
                .column(col_name)
                .map_err(|_| ChurnError::FeatureNotFound(col_name.clone()))?;
            cast_f64(column.as_materialized_series())?;
        }
        self.is_fitted = true;
        Ok(())
    }

    fn transform(&self, df: &DataFrame) -> Result<DataFrame> {
        if !self.is_fitted {
            return Err(ChurnError::NotFitted);
        }

        let mut result = df.clone();
        for col_name in &self.columns {
            let column = df
                .column(col_name)
                .map_err(|_| ChurnError::FeatureNotFound(col_name.clone()))?;

            let ca = cast_f64(column.as_materialized_series())?;
            let filled: Float64Chunked = ca
                .into_iter()
                .map(|opt| Some(opt.unwrap_or(self.fill_value)))
                .collect();

            result.with_column(filled.with_name(col_name.as_str().into()).into_series())?;
        }

        Ok(result)
    }
}

fn cast_f64(series: &Series) -> Result<Float64Chunked> {
    let casted = series.cast(&DataType::Float64).map_err(|_| {
        ChurnError::PreprocessingError(format!(
            "column '{}' is not numeric (dtype {})",
            series.name(),
            series.dtype()
        ))
    })?;
    Ok(casted.f64()?.clone())
}

fn not_string(col_name: &str) -> ChurnError {
    ChurnError::PreprocessingError(format!("column '{}' is not string-typed", col_name))
}

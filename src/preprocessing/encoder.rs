//! Categorical encoders: mean-target and one-hot
//!
//! `MeanEncoder` replaces a category with the mean of the training target
//! for that category, which turns the high-cardinality city/category/state
//! columns into single numeric columns. Categories never seen in training
//! encode to missing and are resolved by the mean imputation stage that
//! must follow it. `OneHotEncoder` expands one low-cardinality column into
//! 0/1 indicators over the sorted training vocabulary, dropping the last
//! level.

use crate::error::{ChurnError, Result};
use crate::preprocessing::Stage;
use ndarray::Array1;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Replaces category values with train-time target means
///
/// Mappings live in ordered maps so a saved model serializes the same way
/// on every run with the same seed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MeanEncoder {
    columns: Vec<String>,
    target_means: BTreeMap<String, BTreeMap<String, f64>>,
    is_fitted: bool,
}

impl MeanEncoder {
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            target_means: BTreeMap::new(),
            is_fitted: false,
        }
    }

    /// Learned category -> mean mapping for one column
    pub fn mapping_for(&self, column: &str) -> Option<&BTreeMap<String, f64>> {
        self.target_means.get(column)
    }

    fn compute_target_means(ca: &StringChunked, target: &Array1<f64>) -> BTreeMap<String, f64> {
        let mut sums: BTreeMap<String, f64> = BTreeMap::new();
        let mut counts: BTreeMap<String, usize> = BTreeMap::new();

        for (opt, &y) in ca.into_iter().zip(target.iter()) {
            if let Some(value) = opt {
                *sums.entry(value.to_string()).or_insert(0.0) += y;
                *counts.entry(value.to_string()).or_insert(0) += 1;
            }
        }

        sums.into_iter()
            .map(|(category, sum)| {
                let count = counts[&category] as f64;
                (category, sum / count)
            })
            .collect()
    }
}

impl Stage for MeanEncoder {
    fn fit(&mut self, df: &DataFrame, target: Option<&Array1<f64>>) -> Result<()> {
        let y = target.ok_or_else(|| {
            ChurnError::PreprocessingError("mean encoding requires the training target".to_string())
        })?;

        if y.len() != df.height() {
            return Err(ChurnError::ShapeError {
                expected: format!("{} target values", df.height()),
                actual: format!("{}", y.len()),
            });
        }

        self.target_means.clear();
        for col_name in &self.columns {
            let column = df
                .column(col_name)
                .map_err(|_| ChurnError::FeatureNotFound(col_name.clone()))?;
            let ca = column.str().map_err(|_| {
                ChurnError::PreprocessingError(format!(
                    "column '{}' is not string-typed",
                    col_name
                ))
            })?;

            self.target_means
                .insert(col_name.clone(), Self::compute_target_means(ca, y));
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
            let ca = column.str().map_err(|_| {
                ChurnError::PreprocessingError(format!(
                    "column '{}' is not string-typed",
                    col_name
                ))
            })?;
            let means = &self.target_means[col_name];

            // Unseen categories become null here; the mean imputation stage
            // that follows in the chain fills them.
            let encoded: Float64Chunked = ca
                .into_iter()
                .map(|opt| opt.and_then(|v| means.get(v).copied()))
                .collect();

            result.with_column(encoded.with_name(col_name.as_str().into()).into_series())?;
        }

        Ok(result)
    }
}

/// Expands one categorical column into 0/1 indicator columns
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OneHotEncoder {
    column: String,
    drop_last: bool,
    categories: Vec<String>,
    is_fitted: bool,
}

impl OneHotEncoder {
    pub fn new(column: impl Into<String>, drop_last: bool) -> Self {
        Self {
            column: column.into(),
            drop_last,
            categories: Vec::new(),
            is_fitted: false,
        }
    }

    /// Categories kept as indicator columns (drop-last applied)
    pub fn kept_categories(&self) -> &[String] {
        if self.drop_last && !self.categories.is_empty() {
            &self.categories[..self.categories.len() - 1]
        } else {
            &self.categories
        }
    }

    /// Names of the indicator columns this encoder produces
    pub fn output_columns(&self) -> Vec<String> {
        self.kept_categories()
            .iter()
            .map(|cat| format!("{}_{}", self.column, cat))
            .collect()
    }
}

impl Stage for OneHotEncoder {
    fn fit(&mut self, df: &DataFrame, _target: Option<&Array1<f64>>) -> Result<()> {
        let column = df
            .column(&self.column)
            .map_err(|_| ChurnError::FeatureNotFound(self.column.clone()))?;
        let ca = column.str().map_err(|_| {
            ChurnError::PreprocessingError(format!(
                "column '{}' is not string-typed",
                self.column
            ))
        })?;

        let mut categories: Vec<String> = ca
            .into_iter()
            .flatten()
            .map(|v| v.to_string())
            .collect::<std::collections::HashSet<_>>()
            .into_iter()
            .collect();
        categories.sort();

        if categories.is_empty() {
            return Err(ChurnError::PreprocessingError(format!(
                "column '{}' has no categories to encode",
                self.column
            )));
        }

        self.categories = categories;
        self.is_fitted = true;
        Ok(())
    }

    fn transform(&self, df: &DataFrame) -> Result<DataFrame> {
        if !self.is_fitted {
            return Err(ChurnError::NotFitted);
        }

        let column = df
            .column(&self.column)
            .map_err(|_| ChurnError::FeatureNotFound(self.column.clone()))?;
        let ca = column.str().map_err(|_| {
            ChurnError::PreprocessingError(format!(
                "column '{}' is not string-typed",
                self.column
            ))
        })?;

        let mut indicators: Vec<Column> = Vec::with_capacity(self.kept_categories().len());
        for category in self.kept_categories() {
            let values: Vec<i32> = ca
                .into_iter()
                .map(|opt| if opt == Some(category.as_str()) { 1 } else { 0 })
                .collect();
            indicators.push(Column::new(
                format!("{}_{}", self.column, category).into(),
                values,
            ));
        }

        let result = df.drop(&self.column)?;
        let result = result.hstack(&indicators)?;
        Ok(result)
    }
}

//! Feature partition: categorical vs numeric columns
//!
//! The partition is computed once per run from the loaded frame's schema,
//! excluding the identifier and target columns. String-typed columns are
//! categorical, numeric and boolean columns are numeric, and anything else
//! is rejected so that every feature lands in exactly one bucket. Both
//! lists are sorted so pipeline construction sees the same column order on
//! every run.

use crate::error::{ChurnError, Result};
use polars::prelude::*;
use serde::{Deserialize, Serialize};

/// Partition of feature columns by observed value type
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureSet {
    /// String-typed feature columns, sorted
    pub categorical: Vec<String>,
    /// Numeric (and boolean) feature columns, sorted
    pub numeric: Vec<String>,
}

impl FeatureSet {
    /// Partition the frame's columns, excluding id and target columns.
    ///
    /// Every excluded name must exist in the frame; every remaining column
    /// must be string-typed or numeric.
    pub fn from_dataframe(df: &DataFrame, exclude: &[String]) -> Result<Self> {
        for name in exclude {
            if df.column(name).is_err() {
                return Err(ChurnError::SchemaError(format!(
                    "declared column '{}' not present in dataset",
                    name
                )));
            }
        }

        let mut categorical = Vec::new();
        let mut numeric = Vec::new();

        for column in df.get_columns() {
            let name = column.name().to_string();
            if exclude.contains(&name) {
                continue;
            }

            match column.dtype() {
                DataType::String | DataType::Categorical(_, _) => categorical.push(name),
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
                | DataType::Boolean => numeric.push(name),
                other => {
                    return Err(ChurnError::SchemaError(format!(
                        "column '{}' has unsupported dtype {} (expected string or numeric)",
                        name, other
                    )))
                }
            }
        }

        if categorical.is_empty() && numeric.is_empty() {
            return Err(ChurnError::SchemaError(
                "no feature columns remain after excluding id and target columns".to_string(),
            ));
        }

        categorical.sort();
        numeric.sort();

        Ok(Self { categorical, numeric })
    }

    /// All feature names, sorted
    pub fn all(&self) -> Vec<String> {
        let mut all: Vec<String> = self
            .categorical
            .iter()
            .chain(self.numeric.iter())
            .cloned()
            .collect();
        all.sort();
        all
    }

    /// Total number of features
    pub fn len(&self) -> usize {
        self.categorical.len() + self.numeric.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, name: &str) -> bool {
        self.categorical.iter().any(|c| c == name) || self.numeric.iter().any(|c| c == name)
    }
}

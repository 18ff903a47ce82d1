//! Discrete hyperparameter grid

use crate::error::{ChurnError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A single candidate value in the grid
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ParamValue {
    Int(i64),
    Float(f64),
    String(String),
    Bool(bool),
}

impl ParamValue {
    /// Get as int
    pub fn as_int(&self) -> Option<i64> {
        match self {
            ParamValue::Int(v) => Some(*v),
            ParamValue::Float(v) => Some(*v as i64),
            _ => None,
        }
    }

    /// Get as float
    pub fn as_float(&self) -> Option<f64> {
        match self {
            ParamValue::Float(v) => Some(*v),
            ParamValue::Int(v) => Some(*v as f64),
            _ => None,
        }
    }

    /// Get as string
    pub fn as_str(&self) -> Option<&str> {
        match self {
            ParamValue::String(v) => Some(v),
            _ => None,
        }
    }

    /// Get as bool
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            ParamValue::Bool(v) => Some(*v),
            _ => None,
        }
    }
}

/// One fully specified configuration drawn from the grid
pub type TrialParams = HashMap<String, ParamValue>;

/// A named dimension with its candidate values
#[derive(Debug, Clone, Serialize, Deserialize)]
struct GridDimension {
    name: String,
    values: Vec<ParamValue>,
}

/// Cartesian grid of discrete candidates
///
/// Every combination has a stable index so a search can enumerate or
/// sample the grid without materializing it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParamGrid {
    dimensions: Vec<GridDimension>,
}

impl ParamGrid {
    /// Create a new empty grid
    pub fn new() -> Self {
        Self {
            dimensions: Vec::new(),
        }
    }

    /// Add a named dimension
    pub fn add(mut self, name: impl Into<String>, values: Vec<ParamValue>) -> Self {
        self.dimensions.push(GridDimension {
            name: name.into(),
            values,
        });
        self
    }

    /// Add an integer dimension
    pub fn ints(self, name: impl Into<String>, values: Vec<i64>) -> Self {
        self.add(name, values.into_iter().map(ParamValue::Int).collect())
    }

    /// Add a float dimension
    pub fn floats(self, name: impl Into<String>, values: Vec<f64>) -> Self {
        self.add(name, values.into_iter().map(ParamValue::Float).collect())
    }

    /// Add a categorical dimension
    pub fn strings(self, name: impl Into<String>, values: Vec<&str>) -> Self {
        self.add(
            name,
            values.into_iter().map(|v| ParamValue::String(v.to_string())).collect(),
        )
    }

    /// Add a boolean dimension
    pub fn bools(self, name: impl Into<String>) -> Self {
        self.add(name, vec![ParamValue::Bool(false), ParamValue::Bool(true)])
    }

    /// Total number of combinations in the grid
    pub fn n_combinations(&self) -> usize {
        if self.dimensions.is_empty() {
            return 0;
        }
        self.dimensions.iter().map(|d| d.values.len()).product()
    }

    /// Decode a combination index into a full configuration
    ///
    /// Mixed-radix decoding with the first dimension varying fastest, so
    /// index order is stable for a given grid.
    pub fn combination(&self, index: usize) -> Result<TrialParams> {
        let total = self.n_combinations();
        if index >= total {
            return Err(ChurnError::InvalidParameter {
                name: "combination index".to_string(),
                value: index.to_string(),
                reason: format!("grid has {} combinations", total),
            });
        }

        let mut remainder = index;
        let mut params = TrialParams::with_capacity(self.dimensions.len());
        for dim in &self.dimensions {
            let n = dim.values.len();
            params.insert(dim.name.clone(), dim.values[remainder % n].clone());
            remainder /= n;
        }
        Ok(params)
    }

    /// Dimension names in insertion order
    pub fn param_names(&self) -> Vec<String> {
        self.dimensions.iter().map(|d| d.name.clone()).collect()
    }

    /// Number of dimensions
    pub fn len(&self) -> usize {
        self.dimensions.len()
    }

    /// Check if the grid has no dimensions
    pub fn is_empty(&self) -> bool {
        self.dimensions.is_empty()
    }
}

impl Default for ParamGrid {
    fn default() -> Self {
        Self::new()
    }
}

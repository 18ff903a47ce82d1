//! Hyperparameter search
//!
//! A discrete Cartesian grid plus seeded random search without
//! replacement over it, generic over any objective returning a score.

mod grid;
mod search;

pub use grid::{ParamGrid, ParamValue, TrialParams};
pub use search::{OptimizeDirection, RandomSearch, Study, TrialResult};

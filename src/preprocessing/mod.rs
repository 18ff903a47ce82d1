//! Feature preprocessing for the churn pipeline
//!
//! Six stages, fitted on the training slice only and applied in a fixed
//! order: categorical sentinel imputation, mean-target encoding, mean
//! imputation of the encoded columns, one-hot encoding, and two
//! fixed-constant imputations (999 and 0).

mod config;
mod encoder;
mod imputer;
mod pipeline;

pub use config::PreprocessingConfig;
pub use encoder::{MeanEncoder, OneHotEncoder};
pub use imputer::{ArbitraryNumberImputer, CategoricalImputer, MeanImputer};
pub use pipeline::PreprocessingPipeline;

use crate::error::Result;
use ndarray::Array1;
use polars::prelude::DataFrame;

/// A stateful transform: learned once on the training slice, applied
/// unchanged to every slice.
///
/// `target` is consumed only by stages that need the label while fitting
/// (mean-target encoding); the other stages ignore it.
pub trait Stage {
    fn fit(&mut self, df: &DataFrame, target: Option<&Array1<f64>>) -> Result<()>;

    fn transform(&self, df: &DataFrame) -> Result<DataFrame>;

    fn fit_transform(
        &mut self,
        df: &DataFrame,
        target: Option<&Array1<f64>>,
    ) -> Result<DataFrame> {
        self.fit(df, target)?;
        self.transform(df)
    }
}

//! Dataset handling: loading, feature partitioning, splitting

pub mod features;
pub mod loader;
pub mod split;

pub use features::FeatureSet;
pub use loader::{DataLoader, DataSaver};
pub use split::{split_dataset, DataSplits};

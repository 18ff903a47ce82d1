//! Model training module
//!
//! Covers the supervised side of a churn run: the decision tree and
//! random forest learners, stratified cross-validation, the randomized
//! hyperparameter search, accuracy and ROC-AUC metrics, and the engine
//! that drives a run end to end.

mod config;
mod cross_validation;
mod decision_tree;
mod engine;
mod metrics;
mod random_forest;
mod selection;

pub use config::TrainConfig;
pub use cross_validation::{CVResults, CVSplit, CVStrategy, CrossValidator};
pub use decision_tree::{Criterion, DecisionTree, TreeNode};
pub use engine::{TrainEngine, TrainOutcome};
pub use metrics::{accuracy, roc_auc, EvaluationReport, SplitScores};
pub use random_forest::{MaxFeatures, RandomForestClassifier};
pub use selection::{forest_from_params, ForestSearch, SearchOutcome};

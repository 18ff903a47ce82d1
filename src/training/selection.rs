//! Model selection: randomized search scored by cross-validated AUC

use super::cross_validation::{CVResults, CVStrategy, CrossValidator};
use super::decision_tree::Criterion;
use super::metrics::roc_auc;
use super::random_forest::RandomForestClassifier;
use crate::error::{ChurnError, Result};
use crate::optimizer::{OptimizeDirection, ParamGrid, RandomSearch, Study, TrialParams};
use ndarray::{Array1, Array2, Axis};
use tracing::{debug, info};

const KNOWN_PARAMS: [&str; 5] = [
    "n_estimators",
    "max_depth",
    "criterion",
    "min_samples_leaf",
    "min_samples_split",
];

fn positive_int(params: &TrialParams, name: &str) -> Result<Option<usize>> {
    match params.get(name) {
        None => Ok(None),
        Some(value) => {
            let v = value.as_int().ok_or_else(|| ChurnError::InvalidParameter {
                name: name.to_string(),
                value: format!("{:?}", value),
                reason: "expected an integer".to_string(),
            })?;
            if v < 1 {
                return Err(ChurnError::InvalidParameter {
                    name: name.to_string(),
                    value: v.to_string(),
                    reason: "must be at least 1".to_string(),
                });
            }
            Ok(Some(v as usize))
        }
    }
}

/// Build an unfitted forest from one grid draw
///
/// Recognizes the usual forest knobs and rejects anything else, so a
/// mistyped grid dimension fails the run instead of being ignored.
pub fn forest_from_params(params: &TrialParams, seed: u64) -> Result<RandomForestClassifier> {
    for key in params.keys() {
        if !KNOWN_PARAMS.contains(&key.as_str()) {
            return Err(ChurnError::InvalidParameter {
                name: key.clone(),
                value: format!("{:?}", params[key]),
                reason: "not a forest hyperparameter".to_string(),
            });
        }
    }

    let n_estimators = positive_int(params, "n_estimators")?.ok_or_else(|| {
        ChurnError::InvalidParameter {
            name: "n_estimators".to_string(),
            value: "missing".to_string(),
            reason: "the grid must set the number of trees".to_string(),
        }
    })?;

    let mut forest = RandomForestClassifier::new(n_estimators).with_random_state(seed);

    if let Some(depth) = positive_int(params, "max_depth")? {
        forest = forest.with_max_depth(depth);
    }
    if let Some(leaf) = positive_int(params, "min_samples_leaf")? {
        forest = forest.with_min_samples_leaf(leaf);
    }
    if let Some(split) = positive_int(params, "min_samples_split")? {
        forest = forest.with_min_samples_split(split);
    }
    if let Some(value) = params.get("criterion") {
        let name = value.as_str().ok_or_else(|| ChurnError::InvalidParameter {
            name: "criterion".to_string(),
            value: format!("{:?}", value),
            reason: "expected a string".to_string(),
        })?;
        forest = forest.with_criterion(Criterion::parse(name)?);
    }

    Ok(forest)
}

/// Outcome of a forest search: the refitted winner plus the full study
#[derive(Debug)]
pub struct SearchOutcome {
    /// Best forest refitted on the whole training slice
    pub best_forest: RandomForestClassifier,
    /// Parameters of the winning trial
    pub best_params: TrialParams,
    /// Mean cross-validated AUC of the winning trial
    pub best_score: f64,
    /// Every evaluated trial
    pub study: Study,
}

/// Randomized hyperparameter search for the churn forest
///
/// Draws configurations from the grid without replacement, scores each by
/// mean AUC over seeded stratified folds shared across trials, and refits
/// the winner on the full training slice.
pub struct ForestSearch {
    grid: ParamGrid,
    n_trials: usize,
    cv_folds: usize,
    seed: u64,
}

impl ForestSearch {
    /// Create a new search over the given grid
    pub fn new(grid: ParamGrid) -> Self {
        Self {
            grid,
            n_trials: 25,
            cv_folds: 3,
            seed: 42,
        }
    }

    /// Set the number of sampled configurations
    pub fn with_n_trials(mut self, n_trials: usize) -> Self {
        self.n_trials = n_trials;
        self
    }

    /// Set the number of CV folds
    pub fn with_cv_folds(mut self, cv_folds: usize) -> Self {
        self.cv_folds = cv_folds;
        self
    }

    /// Set the seed for sampling, folds, and forests
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Run the search and refit the best configuration
    pub fn fit(&self, x: &Array2<f64>, y: &Array1<f64>) -> Result<SearchOutcome> {
        if self.n_trials == 0 {
            return Err(ChurnError::InvalidParameter {
                name: "n_trials".to_string(),
                value: "0".to_string(),
                reason: "the search needs at least one trial".to_string(),
            });
        }

        // Folds are fixed once so every trial sees the same partition
        let splitter = CrossValidator::new(CVStrategy::StratifiedKFold {
            n_splits: self.cv_folds,
            shuffle: true,
        })
        .with_random_state(self.seed);
        let splits = splitter.split(x.nrows(), Some(y))?;

        let folds: Vec<(Array2<f64>, Array1<f64>, Array2<f64>, Array1<f64>)> = splits
            .iter()
            .map(|split| {
                let x_train = x.select(Axis(0), &split.train_indices);
                let y_train = Array1::from_vec(
                    split.train_indices.iter().map(|&i| y[i]).collect(),
                );
                let x_test = x.select(Axis(0), &split.test_indices);
                let y_test =
                    Array1::from_vec(split.test_indices.iter().map(|&i| y[i]).collect());
                (x_train, y_train, x_test, y_test)
            })
            .collect();

        let seed = self.seed;
        let objective = |params: &TrialParams| -> Result<f64> {
            let scores: Vec<f64> = folds
                .iter()
                .map(|(x_train, y_train, x_test, y_test)| {
                    let mut forest = forest_from_params(params, seed)?;
                    forest.fit(x_train, y_train)?;
                    let proba = forest.predict_proba(x_test)?;
                    roc_auc(y_test, &proba)
                })
                .collect::<Result<_>>()?;

            let results = CVResults::from_scores(scores)?;
            debug!(
                mean_auc = results.mean_score,
                std_auc = results.std_score,
                "trial scored"
            );
            Ok(results.mean_score)
        };

        let study = RandomSearch::new(self.grid.clone())
            .with_n_trials(self.n_trials)
            .with_seed(self.seed)
            .with_direction(OptimizeDirection::Maximize)
            .run(objective)?;

        let best_params = study
            .best_params()
            .cloned()
            .ok_or_else(|| ChurnError::TrainingError("search produced no trials".to_string()))?;
        let best_score = study
            .best_value()
            .ok_or_else(|| ChurnError::TrainingError("search produced no trials".to_string()))?;

        info!(
            best_auc = best_score,
            trials = study.trials.len(),
            "search finished, refitting best configuration"
        );

        let mut best_forest = forest_from_params(&best_params, self.seed)?;
        best_forest.fit(x, y)?;

        Ok(SearchOutcome {
            best_forest,
            best_params,
            best_score,
            study,
        })
    }
}

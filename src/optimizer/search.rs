//! Seeded random search over a discrete grid

use super::grid::{ParamGrid, TrialParams};
use crate::error::{ChurnError, Result};
use rand::prelude::*;
use rand_xoshiro::Xoshiro256PlusPlus;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::time::Instant;

/// Optimization direction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum OptimizeDirection {
    Minimize,
    Maximize,
}

/// Result of a single trial
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrialResult {
    /// Trial number in sampled order
    pub trial_id: usize,
    /// Parameters used
    pub params: TrialParams,
    /// Objective value
    pub value: f64,
    /// Trial duration in seconds
    pub duration_secs: f64,
}

/// Study containing all trials
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Study {
    /// All trial results in sampled order
    pub trials: Vec<TrialResult>,
    /// Best trial index
    pub best_trial_idx: Option<usize>,
    /// Total duration
    pub total_duration_secs: f64,
    /// Optimization direction
    pub direction: OptimizeDirection,
}

impl Study {
    /// Create a new study
    pub fn new(direction: OptimizeDirection) -> Self {
        Self {
            trials: Vec::new(),
            best_trial_idx: None,
            total_duration_secs: 0.0,
            direction,
        }
    }

    /// Get the best trial
    pub fn best_trial(&self) -> Option<&TrialResult> {
        self.best_trial_idx.map(|idx| &self.trials[idx])
    }

    /// Get the best value
    pub fn best_value(&self) -> Option<f64> {
        self.best_trial().map(|t| t.value)
    }

    /// Get the best parameters
    pub fn best_params(&self) -> Option<&TrialParams> {
        self.best_trial().map(|t| &t.params)
    }

    /// Add a trial result
    ///
    /// Strict comparison, so on ties the earlier trial keeps the lead.
    pub fn add_trial(&mut self, result: TrialResult) {
        let idx = self.trials.len();

        let is_better = match self.best_trial_idx {
            None => true,
            Some(best_idx) => {
                let best_val = self.trials[best_idx].value;
                match self.direction {
                    OptimizeDirection::Minimize => result.value < best_val,
                    OptimizeDirection::Maximize => result.value > best_val,
                }
            }
        };

        if is_better {
            self.best_trial_idx = Some(idx);
        }

        self.trials.push(result);
    }
}

/// Random search without replacement over a [`ParamGrid`]
///
/// Samples distinct combination indices with a seeded shuffle, evaluates
/// the objective for each, and keeps every trial in the study. A failed
/// trial aborts the whole search with its error.
pub struct RandomSearch {
    grid: ParamGrid,
    n_trials: usize,
    seed: u64,
    direction: OptimizeDirection,
}

impl RandomSearch {
    /// Create a new search over the given grid
    pub fn new(grid: ParamGrid) -> Self {
        Self {
            grid,
            n_trials: 10,
            seed: 42,
            direction: OptimizeDirection::Maximize,
        }
    }

    /// Set the number of trials to sample
    pub fn with_n_trials(mut self, n_trials: usize) -> Self {
        self.n_trials = n_trials;
        self
    }

    /// Set the sampling seed
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Set the optimization direction
    pub fn with_direction(mut self, direction: OptimizeDirection) -> Self {
        self.direction = direction;
        self
    }

    /// Run the search with an objective function
    ///
    /// Trials evaluate in parallel, but results are folded into the study
    /// in sampled order so the best-trial tie-break stays deterministic.
    pub fn run<F>(&self, objective: F) -> Result<Study>
    where
        F: Fn(&TrialParams) -> Result<f64> + Sync,
    {
        let available = self.grid.n_combinations();
        if available < self.n_trials {
            return Err(ChurnError::SearchSpaceExhausted {
                available,
                requested: self.n_trials,
            });
        }

        let start = Instant::now();

        let mut indices: Vec<usize> = (0..available).collect();
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(self.seed);
        indices.shuffle(&mut rng);
        indices.truncate(self.n_trials);

        let candidates: Vec<(usize, TrialParams)> = indices
            .iter()
            .enumerate()
            .map(|(trial_id, &idx)| Ok((trial_id, self.grid.combination(idx)?)))
            .collect::<Result<_>>()?;

        let trials: Vec<TrialResult> = candidates
            .into_par_iter()
            .map(|(trial_id, params)| {
                let trial_start = Instant::now();
                let value = objective(&params)?;
                Ok(TrialResult {
                    trial_id,
                    params,
                    value,
                    duration_secs: trial_start.elapsed().as_secs_f64(),
                })
            })
            .collect::<Result<_>>()?;

        let mut study = Study::new(self.direction.clone());
        for trial in trials {
            study.add_trial(trial);
        }
        study.total_duration_secs = start.elapsed().as_secs_f64();

        Ok(study)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn depth_grid() -> ParamGrid {
        ParamGrid::new().ints("max_depth", vec![1, 2, 3, 4, 5, 6])
    }

    fn depth_objective(params: &TrialParams) -> Result<f64> {
        Ok(params["max_depth"].as_int().unwrap() as f64)
    }

    #[test]
    fn test_search_is_deterministic() {
        let run_once = || {
            RandomSearch::new(depth_grid())
                .with_n_trials(4)
                .with_seed(42)
                .run(depth_objective)
                .unwrap()
        };

        let a = run_once();
        let b = run_once();

        assert_eq!(a.trials.len(), 4);
        let values_a: Vec<f64> = a.trials.iter().map(|t| t.value).collect();
        let values_b: Vec<f64> = b.trials.iter().map(|t| t.value).collect();
        assert_eq!(values_a, values_b, "same seed must sample the same trials");
        assert_eq!(a.best_params(), b.best_params());
    }

    #[test]
    fn test_seed_changes_sample() {
        let sample = |seed: u64| -> Vec<f64> {
            RandomSearch::new(depth_grid())
                .with_n_trials(3)
                .with_seed(seed)
                .run(depth_objective)
                .unwrap()
                .trials
                .iter()
                .map(|t| t.value)
                .collect()
        };

        // Not guaranteed for any pair of seeds, but holds for these
        assert_ne!(sample(42), sample(43));
    }

    #[test]
    fn test_samples_without_replacement() {
        let study = RandomSearch::new(depth_grid())
            .with_n_trials(6)
            .with_seed(7)
            .run(depth_objective)
            .unwrap();

        let mut depths: Vec<i64> = study
            .trials
            .iter()
            .map(|t| t.params["max_depth"].as_int().unwrap())
            .collect();
        depths.sort_unstable();
        assert_eq!(depths, vec![1, 2, 3, 4, 5, 6], "full draw must cover the grid");
    }

    #[test]
    fn test_exhausted_grid_errors() {
        let result = RandomSearch::new(depth_grid())
            .with_n_trials(7)
            .run(depth_objective);

        match result {
            Err(ChurnError::SearchSpaceExhausted { available, requested }) => {
                assert_eq!(available, 6);
                assert_eq!(requested, 7);
            }
            other => panic!("expected SearchSpaceExhausted, got {:?}", other.map(|s| s.trials.len())),
        }
    }

    #[test]
    fn test_maximize_picks_largest() {
        let study = RandomSearch::new(depth_grid())
            .with_n_trials(6)
            .run(depth_objective)
            .unwrap();
        assert_eq!(study.best_value(), Some(6.0));
    }

    #[test]
    fn test_minimize_picks_smallest() {
        let study = RandomSearch::new(depth_grid())
            .with_n_trials(6)
            .with_direction(OptimizeDirection::Minimize)
            .run(depth_objective)
            .unwrap();
        assert_eq!(study.best_value(), Some(1.0));
    }

    #[test]
    fn test_tie_keeps_first_sampled() {
        let study = RandomSearch::new(depth_grid())
            .with_n_trials(6)
            .run(|_| Ok(1.0))
            .unwrap();
        assert_eq!(study.best_trial_idx, Some(0));
    }

    #[test]
    fn test_failed_trial_aborts_search() {
        let result = RandomSearch::new(depth_grid()).with_n_trials(6).run(|params| {
            if params["max_depth"].as_int() == Some(3) {
                Err(ChurnError::TrainingError("bad trial".to_string()))
            } else {
                Ok(0.0)
            }
        });
        assert!(matches!(result, Err(ChurnError::TrainingError(_))));
    }
}

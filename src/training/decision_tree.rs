//! Decision tree classifier

use crate::error::{ChurnError, Result};
use ndarray::{Array1, Array2};
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

/// Decision tree node
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum TreeNode {
    /// Leaf node with prediction value
    Leaf { value: f64, n_samples: usize },
    /// Internal node with split
    Split {
        feature_idx: usize,
        threshold: f64,
        left: Box<TreeNode>,
        right: Box<TreeNode>,
        n_samples: usize,
        impurity: f64,
    },
}

/// Impurity criterion
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub enum Criterion {
    /// Gini impurity
    Gini,
    /// Shannon entropy
    Entropy,
}

impl Criterion {
    /// Parse from the usual lowercase names
    pub fn parse(name: &str) -> Result<Self> {
        match name {
            "gini" => Ok(Criterion::Gini),
            "entropy" => Ok(Criterion::Entropy),
            other => Err(ChurnError::InvalidParameter {
                name: "criterion".to_string(),
                value: other.to_string(),
                reason: "expected 'gini' or 'entropy'".to_string(),
            }),
        }
    }
}

/// Binary decision tree classifier
///
/// Targets are 0/1. Split search sorts each candidate feature once and
/// sweeps boundaries with running class counts; candidate features are a
/// seeded random subset per node when `max_features` is set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionTree {
    /// Tree root
    root: Option<TreeNode>,
    /// Maximum depth
    pub max_depth: Option<usize>,
    /// Minimum samples to split
    pub min_samples_split: usize,
    /// Minimum samples in leaf
    pub min_samples_leaf: usize,
    /// Features considered per node
    pub max_features: Option<usize>,
    /// Impurity criterion
    pub criterion: Criterion,
    /// Seed for the per-node feature subsets
    pub random_state: Option<u64>,
    /// Number of features seen at fit
    n_features: usize,
    /// Feature importances
    feature_importances: Option<Array1<f64>>,
}

impl Default for DecisionTree {
    fn default() -> Self {
        Self::new()
    }
}

impl DecisionTree {
    /// Create a new unfitted tree
    pub fn new() -> Self {
        Self {
            root: None,
            max_depth: None,
            min_samples_split: 2,
            min_samples_leaf: 1,
            max_features: None,
            criterion: Criterion::Gini,
            random_state: None,
            n_features: 0,
            feature_importances: None,
        }
    }

    /// Set maximum depth
    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = Some(depth);
        self
    }

    /// Set minimum samples to split
    pub fn with_min_samples_split(mut self, min_samples: usize) -> Self {
        self.min_samples_split = min_samples;
        self
    }

    /// Set minimum samples in leaf
    pub fn with_min_samples_leaf(mut self, min_samples: usize) -> Self {
        self.min_samples_leaf = min_samples;
        self
    }

    /// Set criterion
    pub fn with_criterion(mut self, criterion: Criterion) -> Self {
        self.criterion = criterion;
        self
    }

    /// Set the number of features tried per node
    pub fn with_max_features(mut self, max_features: usize) -> Self {
        self.max_features = Some(max_features);
        self
    }

    /// Set the feature-subset seed
    pub fn with_random_state(mut self, seed: u64) -> Self {
        self.random_state = Some(seed);
        self
    }

    /// Fit the tree to training data
    pub fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<&mut Self> {
        let n_samples = x.nrows();
        let n_features = x.ncols();

        if n_samples != y.len() {
            return Err(ChurnError::ShapeError {
                expected: format!("y length = {}", n_samples),
                actual: format!("y length = {}", y.len()),
            });
        }
        if n_samples == 0 {
            return Err(ChurnError::TrainingError(
                "cannot fit a tree on zero samples".to_string(),
            ));
        }

        self.n_features = n_features;

        let mut importances = vec![0.0; n_features];
        let mut rng = ChaCha8Rng::seed_from_u64(self.random_state.unwrap_or(0));

        let indices: Vec<usize> = (0..n_samples).collect();
        self.root = Some(self.build_tree(x, y, &indices, 0, &mut importances, &mut rng));

        let total: f64 = importances.iter().sum();
        if total > 0.0 {
            for imp in &mut importances {
                *imp /= total;
            }
        }
        self.feature_importances = Some(Array1::from_vec(importances));

        Ok(self)
    }

    fn build_tree(
        &self,
        x: &Array2<f64>,
        y: &Array1<f64>,
        indices: &[usize],
        depth: usize,
        importances: &mut [f64],
        rng: &mut ChaCha8Rng,
    ) -> TreeNode {
        let n_samples = indices.len();
        let n_pos = indices.iter().filter(|&&i| y[i] > 0.5).count();

        let should_stop = n_samples < self.min_samples_split
            || n_samples <= self.min_samples_leaf
            || self.max_depth.map_or(false, |d| depth >= d)
            || n_pos == 0
            || n_pos == n_samples;

        if should_stop {
            return leaf(n_samples, n_pos);
        }

        if let Some((best_feature, best_threshold, best_gain)) =
            self.find_best_split(x, y, indices, n_pos, rng)
        {
            let (left_indices, right_indices): (Vec<usize>, Vec<usize>) = indices
                .iter()
                .partition(|&&i| x[[i, best_feature]] <= best_threshold);

            if left_indices.len() < self.min_samples_leaf
                || right_indices.len() < self.min_samples_leaf
            {
                return leaf(n_samples, n_pos);
            }

            importances[best_feature] += n_samples as f64 * best_gain;

            let left = Box::new(self.build_tree(x, y, &left_indices, depth + 1, importances, rng));
            let right =
                Box::new(self.build_tree(x, y, &right_indices, depth + 1, importances, rng));

            TreeNode::Split {
                feature_idx: best_feature,
                threshold: best_threshold,
                left,
                right,
                n_samples,
                impurity: self.impurity_from_counts(n_samples, n_pos),
            }
        } else {
            leaf(n_samples, n_pos)
        }
    }

    /// Best (feature, threshold, gain) over a random feature subset
    ///
    /// Per feature: sort the node's values once, then sweep the boundaries
    /// between distinct neighbors keeping running positive counts, so each
    /// candidate threshold costs O(1).
    fn find_best_split(
        &self,
        x: &Array2<f64>,
        y: &Array1<f64>,
        indices: &[usize],
        n_pos: usize,
        rng: &mut ChaCha8Rng,
    ) -> Option<(usize, f64, f64)> {
        let n_features = x.ncols();
        let k = self.max_features.unwrap_or(n_features).min(n_features).max(1);

        let mut feature_ids: Vec<usize> = (0..n_features).collect();
        if k < n_features {
            feature_ids.shuffle(rng);
            feature_ids.truncate(k);
        }

        let total_n = indices.len();
        let parent_impurity = self.impurity_from_counts(total_n, n_pos);

        let mut best_gain = 0.0f64;
        let mut best: Option<(usize, f64, f64)> = None;

        for &feature_idx in &feature_ids {
            let mut pairs: Vec<(f64, bool)> = indices
                .iter()
                .map(|&i| (x[[i, feature_idx]], y[i] > 0.5))
                .collect();
            pairs.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(std::cmp::Ordering::Equal));

            let mut left_n = 0usize;
            let mut left_pos = 0usize;

            for window_end in 0..total_n - 1 {
                left_n += 1;
                if pairs[window_end].1 {
                    left_pos += 1;
                }

                // Boundaries only exist between distinct values
                if pairs[window_end].0 >= pairs[window_end + 1].0 {
                    continue;
                }

                let right_n = total_n - left_n;
                if left_n < self.min_samples_leaf || right_n < self.min_samples_leaf {
                    continue;
                }

                let right_pos = n_pos - left_pos;
                let weighted = (left_n as f64 * self.impurity_from_counts(left_n, left_pos)
                    + right_n as f64 * self.impurity_from_counts(right_n, right_pos))
                    / total_n as f64;

                let gain = parent_impurity - weighted;
                if gain > best_gain {
                    best_gain = gain;
                    let threshold = (pairs[window_end].0 + pairs[window_end + 1].0) / 2.0;
                    best = Some((feature_idx, threshold, gain));
                }
            }
        }

        best
    }

    fn impurity_from_counts(&self, n: usize, n_pos: usize) -> f64 {
        if n == 0 {
            return 0.0;
        }
        let p = n_pos as f64 / n as f64;
        let q = 1.0 - p;
        match self.criterion {
            Criterion::Gini => 1.0 - p * p - q * q,
            Criterion::Entropy => {
                let mut entropy = 0.0;
                if p > 0.0 {
                    entropy -= p * p.ln();
                }
                if q > 0.0 {
                    entropy -= q * q.ln();
                }
                entropy
            }
        }
    }

    /// Predict hard 0/1 labels
    pub fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        let root = self.root.as_ref().ok_or(ChurnError::NotFitted)?;

        if x.ncols() != self.n_features {
            return Err(ChurnError::ShapeError {
                expected: format!("{} features", self.n_features),
                actual: format!("{} features", x.ncols()),
            });
        }

        let predictions: Vec<f64> = (0..x.nrows())
            .map(|i| {
                let sample = x.row(i);
                predict_sample(root, &sample.to_vec())
            })
            .collect();

        Ok(Array1::from_vec(predictions))
    }

    /// Get feature importances
    pub fn feature_importances(&self) -> Option<&Array1<f64>> {
        self.feature_importances.as_ref()
    }

    /// Get tree depth
    pub fn depth(&self) -> usize {
        match &self.root {
            None => 0,
            Some(node) => node_depth(node),
        }
    }

    /// Get number of leaves
    pub fn n_leaves(&self) -> usize {
        match &self.root {
            None => 0,
            Some(node) => count_leaves(node),
        }
    }
}

/// Majority-class leaf, ties predicting negative
fn leaf(n_samples: usize, n_pos: usize) -> TreeNode {
    let value = if n_pos * 2 > n_samples { 1.0 } else { 0.0 };
    TreeNode::Leaf { value, n_samples }
}

fn predict_sample(node: &TreeNode, sample: &[f64]) -> f64 {
    match node {
        TreeNode::Leaf { value, .. } => *value,
        TreeNode::Split {
            feature_idx,
            threshold,
            left,
            right,
            ..
        } => {
            if sample[*feature_idx] <= *threshold {
                predict_sample(left, sample)
            } else {
                predict_sample(right, sample)
            }
        }
    }
}

fn node_depth(node: &TreeNode) -> usize {
    match node {
        TreeNode::Leaf { .. } => 1,
        TreeNode::Split { left, right, .. } => 1 + node_depth(left).max(node_depth(right)),
    }
}

fn count_leaves(node: &TreeNode) -> usize {
    match node {
        TreeNode::Leaf { .. } => 1,
        TreeNode::Split { left, right, .. } => count_leaves(left) + count_leaves(right),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_separable_data() {
        let x = array![[0.0], [0.1], [0.2], [1.0], [1.1], [1.2]];
        let y = array![0.0, 0.0, 0.0, 1.0, 1.0, 1.0];

        let mut tree = DecisionTree::new();
        tree.fit(&x, &y).unwrap();

        let predictions = tree.predict(&x).unwrap();
        for (p, a) in predictions.iter().zip(y.iter()) {
            assert_eq!(p, a, "separable data must classify exactly");
        }
    }

    #[test]
    fn test_max_depth_limits_tree() {
        let x = array![[1.0], [2.0], [3.0], [4.0], [5.0], [6.0], [7.0], [8.0]];
        let y = array![0.0, 1.0, 0.0, 1.0, 0.0, 1.0, 0.0, 1.0];

        let mut tree = DecisionTree::new().with_max_depth(2);
        tree.fit(&x, &y).unwrap();

        assert!(tree.depth() <= 3, "depth {} exceeds limit", tree.depth());
    }

    #[test]
    fn test_min_samples_leaf_respected() {
        let x = array![[1.0], [2.0], [3.0], [4.0], [5.0], [6.0]];
        let y = array![0.0, 0.0, 0.0, 1.0, 1.0, 1.0];

        let mut tree = DecisionTree::new().with_min_samples_leaf(3);
        tree.fit(&x, &y).unwrap();

        // Only the 3/3 boundary split is allowed
        assert!(tree.depth() <= 2);
        let predictions = tree.predict(&x).unwrap();
        assert_eq!(predictions[0], 0.0);
        assert_eq!(predictions[5], 1.0);
    }

    #[test]
    fn test_pure_node_is_leaf() {
        let x = array![[1.0], [2.0], [3.0]];
        let y = array![1.0, 1.0, 1.0];

        let mut tree = DecisionTree::new();
        tree.fit(&x, &y).unwrap();

        assert_eq!(tree.depth(), 1);
        assert_eq!(tree.n_leaves(), 1);
        let predictions = tree.predict(&x).unwrap();
        assert!(predictions.iter().all(|&p| p == 1.0));
    }

    #[test]
    fn test_feature_subsampling_is_seeded() {
        let x = array![
            [0.0, 5.0, 1.0],
            [0.1, 4.0, 2.0],
            [0.2, 3.0, 3.0],
            [1.0, 2.0, 4.0],
            [1.1, 1.0, 5.0],
            [1.2, 0.0, 6.0],
        ];
        let y = array![0.0, 0.0, 0.0, 1.0, 1.0, 1.0];

        let fit_once = || {
            let mut tree = DecisionTree::new()
                .with_max_features(1)
                .with_random_state(42);
            tree.fit(&x, &y).unwrap();
            tree.predict(&x).unwrap()
        };

        assert_eq!(fit_once(), fit_once(), "same seed must grow the same tree");
    }

    #[test]
    fn test_constant_feature_ignored() {
        let x = array![[1.0, 7.0], [2.0, 7.0], [3.0, 7.0], [4.0, 7.0]];
        let y = array![0.0, 0.0, 1.0, 1.0];

        let mut tree = DecisionTree::new();
        tree.fit(&x, &y).unwrap();

        let importances = tree.feature_importances().unwrap();
        assert!(importances[0] > 0.0);
        assert_eq!(importances[1], 0.0, "constant feature cannot split");
    }

    #[test]
    fn test_shape_mismatch_errors() {
        let x = array![[1.0], [2.0]];
        let y = array![0.0, 1.0, 0.0];

        let mut tree = DecisionTree::new();
        assert!(matches!(
            tree.fit(&x, &y),
            Err(ChurnError::ShapeError { .. })
        ));
    }

    #[test]
    fn test_predict_before_fit_errors() {
        let tree = DecisionTree::new();
        let x = array![[1.0]];
        assert!(matches!(tree.predict(&x), Err(ChurnError::NotFitted)));
    }

    #[test]
    fn test_predict_wrong_width_errors() {
        let x = array![[1.0], [2.0], [3.0], [4.0]];
        let y = array![0.0, 0.0, 1.0, 1.0];

        let mut tree = DecisionTree::new();
        tree.fit(&x, &y).unwrap();

        let wide = array![[1.0, 2.0]];
        assert!(matches!(
            tree.predict(&wide),
            Err(ChurnError::ShapeError { .. })
        ));
    }

    #[test]
    fn test_criterion_parse() {
        assert_eq!(Criterion::parse("gini").unwrap(), Criterion::Gini);
        assert_eq!(Criterion::parse("entropy").unwrap(), Criterion::Entropy);
        assert!(Criterion::parse("mse").is_err());
    }
}

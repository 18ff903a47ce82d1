//! Integration test: model training workflow
//!
//! Covers the learner stack below the engine: decision tree and forest
//! fits on a churn-shaped matrix, stratified folds, and the randomized
//! search that ties them together.

use churn_model::optimizer::ParamGrid;
use churn_model::training::{
    accuracy, roc_auc, CVStrategy, CrossValidator, DecisionTree, ForestSearch,
    RandomForestClassifier,
};
use ndarray::{Array1, Array2};

/// Matrix shaped like the encoded churn features: column 0 is a response
/// time whose classes overlap in the middle, column 1 a noise column the
/// learner should mostly ignore. One row in four is a churner.
fn churn_matrix(n: usize) -> (Array2<f64>, Array1<f64>) {
    let y = Array1::from_shape_fn(n, |i| if i % 4 == 0 { 1.0 } else { 0.0 });
    let x = Array2::from_shape_fn((n, 2), |(i, j)| {
        let churned = i % 4 == 0;
        match j {
            0 => {
                if churned {
                    20.0 + (i % 40) as f64
                } else {
                    (i % 40) as f64
                }
            }
            _ => ((i * 13) % 100) as f64 / 100.0,
        }
    });
    (x, y)
}

#[test]
fn test_decision_tree_learns_the_response_time_split() {
    let (x, y) = churn_matrix(200);
    let mut tree = DecisionTree::new()
        .with_max_depth(4)
        .with_min_samples_leaf(5);
    tree.fit(&x, &y).unwrap();

    let pred = tree.predict(&x).unwrap();
    let acc = accuracy(&y, &pred).unwrap();
    assert!(
        acc > 0.8,
        "overlapping classes should still split well, got {}",
        acc
    );
}

#[test]
fn test_forest_probabilities_rank_churners_higher() {
    let (x, y) = churn_matrix(200);
    let mut forest = RandomForestClassifier::new(20)
        .with_max_depth(5)
        .with_random_state(42);
    forest.fit(&x, &y).unwrap();

    let proba = forest.predict_proba(&x).unwrap();
    assert_eq!(proba.len(), 200);
    assert!(proba.iter().all(|p| (0.0..=1.0).contains(p)));

    let auc = roc_auc(&y, &proba).unwrap();
    assert!(auc > 0.8, "forest should rank churners higher, got {}", auc);
}

#[test]
fn test_forest_importances_cover_every_feature() {
    let (x, y) = churn_matrix(200);
    let mut forest = RandomForestClassifier::new(10)
        .with_max_depth(5)
        .with_random_state(42);
    forest.fit(&x, &y).unwrap();

    let importances = forest.feature_importances().unwrap();
    assert_eq!(importances.len(), 2, "one weight per matrix column");
    assert!(importances.iter().all(|&v| v >= 0.0));
    assert!(importances[0] > importances[1], "signal beats noise");
}

#[test]
fn test_forest_seed_reproduces_probabilities() {
    let (x, y) = churn_matrix(120);

    let fit_once = || {
        let mut forest = RandomForestClassifier::new(15)
            .with_max_depth(4)
            .with_random_state(7);
        forest.fit(&x, &y).unwrap();
        forest.predict_proba(&x).unwrap()
    };

    assert_eq!(fit_once(), fit_once(), "same seed, same probabilities");
}

#[test]
fn test_stratified_folds_keep_both_classes() {
    let (_, y) = churn_matrix(200);
    let splitter = CrossValidator::new(CVStrategy::StratifiedKFold {
        n_splits: 4,
        shuffle: true,
    })
    .with_random_state(42);

    let splits = splitter.split(200, Some(&y)).unwrap();
    assert_eq!(splits.len(), 4);

    for split in &splits {
        assert_eq!(split.train_indices.len() + split.test_indices.len(), 200);
        let positives = split
            .test_indices
            .iter()
            .filter(|&&i| y[i] > 0.5)
            .count();
        assert!(
            positives > 0 && positives < split.test_indices.len(),
            "every fold must hold out both classes"
        );
    }
}

#[test]
fn test_search_draws_distinct_configurations() {
    let (x, y) = churn_matrix(160);
    let grid = ParamGrid::new()
        .ints("n_estimators", vec![5, 15])
        .ints("max_depth", vec![3, 6]);

    let outcome = ForestSearch::new(grid)
        .with_n_trials(3)
        .with_cv_folds(3)
        .with_seed(42)
        .fit(&x, &y)
        .unwrap();

    assert_eq!(outcome.study.trials.len(), 3);
    for pair in outcome.study.trials.windows(2) {
        assert_ne!(
            pair[0].params, pair[1].params,
            "sampling without replacement never repeats a draw"
        );
    }
    assert!((0.0..=1.0).contains(&outcome.best_score));
    assert!(outcome.best_forest.is_fitted(), "winner refit on all rows");

    let n_estimators = outcome.best_params["n_estimators"].as_int().unwrap();
    assert!([5, 15].contains(&n_estimators), "winner comes from the grid");
}

#[test]
fn test_search_winner_generalizes_to_unseen_rows() {
    let (x, y) = churn_matrix(240);
    let (x_holdout, y_holdout) = {
        let x2 = Array2::from_shape_fn((80, 2), |(i, j)| x[[i * 3, j]] + 0.25);
        let y2 = Array1::from_shape_fn(80, |i| y[i * 3]);
        (x2, y2)
    };

    let grid = ParamGrid::new()
        .ints("n_estimators", vec![10])
        .ints("max_depth", vec![5]);
    let outcome = ForestSearch::new(grid)
        .with_n_trials(1)
        .with_cv_folds(3)
        .with_seed(42)
        .fit(&x, &y)
        .unwrap();

    let proba = outcome.best_forest.predict_proba(&x_holdout).unwrap();
    let auc = roc_auc(&y_holdout, &proba).unwrap();
    assert!(
        auc > 0.8,
        "shifted copies of the training rows still rank correctly, got {}",
        auc
    );
}

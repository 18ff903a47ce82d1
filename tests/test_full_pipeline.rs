//! Integration test: churn training pipeline end-to-end
//!
//! Drives `TrainEngine` over a synthetic seller snapshot and checks the
//! date-based split, the reported metrics and the persisted artifact.

use churn_model::artifact::ModelArtifact;
use churn_model::error::ChurnError;
use churn_model::optimizer::ParamGrid;
use churn_model::preprocessing::PreprocessingConfig;
use churn_model::training::{TrainConfig, TrainEngine};
use polars::prelude::*;

const N_REST: usize = 800;
const N_OOT: usize = 200;

/// Seller feature table with two categorical and two numeric features.
///
/// Rows 0..800 predate the cutoff, the last 200 sit at it. Roughly one
/// seller in five churns, and churn shows in the features twice over:
/// churned sellers cluster in different cities and answer buyers more
/// slowly. The out-of-time window also carries a city and a state never
/// seen before the cutoff, plus nulls in every feature column.
fn seller_table() -> DataFrame {
    let n = N_REST + N_OOT;
    let mut dates = Vec::with_capacity(n);
    let mut ids = Vec::with_capacity(n);
    let mut labels = Vec::with_capacity(n);
    let mut cities: Vec<Option<String>> = Vec::with_capacity(n);
    let mut states: Vec<Option<String>> = Vec::with_capacity(n);
    let mut response: Vec<Option<f64>> = Vec::with_capacity(n);
    let mut photos: Vec<Option<f64>> = Vec::with_capacity(n);

    for i in 0..n {
        let at_cutoff = i >= N_REST;
        let churned = i % 5 == 0;
        dates.push(if at_cutoff { "2018-02-01" } else { "2018-01-01" }.to_string());
        ids.push(format!("seller_{}", i));
        labels.push(if churned { 1i64 } else { 0 });

        // City tracks churn with some contamination so the fit stays honest
        let pool: [&str; 3] = if churned != (i % 17 == 3) {
            ["campinas", "santos", "itu"]
        } else {
            ["sao paulo", "osasco", "guarulhos"]
        };
        cities.push(if i % 53 == 0 {
            None
        } else if at_cutoff && i % 7 == 0 {
            Some("niteroi".to_string())
        } else {
            Some(pool[i % 3].to_string())
        });

        states.push(if i % 67 == 0 {
            None
        } else if at_cutoff && i % 11 == 0 {
            Some("PR".to_string())
        } else {
            Some(["SP", "RJ", "MG"][i % 3].to_string())
        });

        response.push(if i % 13 == 0 {
            None
        } else if churned {
            Some(35.0 + (i % 30) as f64)
        } else {
            Some((i % 30) as f64)
        });
        photos.push(if i % 9 == 0 { None } else { Some((i % 10) as f64) });
    }

    df! {
        "dtReferencia" => dates,
        "idVendedor" => ids,
        "flChurn" => labels,
        "descCidade" => cities,
        "descEstado" => states,
        "avgTempoResposta1M" => response,
        "qtMediaFotos" => photos,
    }
    .unwrap()
}

fn pipeline_config() -> TrainConfig {
    let preprocessing = PreprocessingConfig::new()
        .with_mean_encode_columns(vec!["descCidade".to_string()])
        .with_onehot_column("descEstado")
        .with_fill_999_columns(vec!["avgTempoResposta1M".to_string()])
        .with_fill_0_columns(vec!["qtMediaFotos".to_string()]);
    let grid = ParamGrid::new()
        .ints("max_depth", vec![4, 5])
        .strings("criterion", vec!["gini"])
        .ints("min_samples_leaf", vec![10])
        .ints("n_estimators", vec![10]);

    TrainConfig::new()
        .with_preprocessing(preprocessing)
        .with_grid(grid)
        .with_n_trials(2)
        .with_cv_folds(3)
}

#[test]
fn test_split_sizes_follow_the_reference_date() {
    let df = seller_table();
    let outcome = TrainEngine::new(pipeline_config()).run(&df).unwrap();

    assert_eq!(outcome.oot_rows, N_OOT, "every cutoff row lands in oot");
    assert_eq!(outcome.train_rows + outcome.test_rows, N_REST);
    assert_eq!(outcome.test_rows, 160, "ceil(800 * 0.2) rows held out");
    assert_eq!(outcome.train_rows, 640);
}

#[test]
fn test_search_stays_within_budget_and_learns() {
    let df = seller_table();
    let outcome = TrainEngine::new(pipeline_config()).run(&df).unwrap();

    assert_eq!(outcome.study.trials.len(), 2, "two trials requested");
    assert!((0.0..=1.0).contains(&outcome.best_cv_auc));
    assert!(
        outcome.evaluation.train.auc > 0.7,
        "features correlate with churn, train AUC was {}",
        outcome.evaluation.train.auc
    );
}

#[test]
fn test_artifact_reports_all_six_metrics() {
    let df = seller_table();
    let artifact = TrainEngine::new(pipeline_config())
        .run(&df)
        .unwrap()
        .into_artifact();

    let json = serde_json::to_value(&artifact).unwrap();
    for key in [
        "Acc train",
        "AUC train",
        "Acc test",
        "AUC test",
        "Acc oot",
        "AUC oot",
    ] {
        let value = json
            .get(key)
            .and_then(serde_json::Value::as_f64)
            .unwrap_or_else(|| panic!("artifact is missing '{}'", key));
        assert!(value.is_finite(), "'{}' must be a real number", key);
        assert!((0.0..=1.0).contains(&value), "'{}' out of range: {}", key, value);
    }
    assert!(json.get("model").is_some());
    assert_eq!(artifact.features.len(), 4, "two categorical plus two numeric");
}

#[test]
fn test_saved_artifact_scores_the_oot_window() {
    let df = seller_table();
    let artifact = TrainEngine::new(pipeline_config())
        .run(&df)
        .unwrap()
        .into_artifact();

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("model_rf.json");
    artifact.save(&path).unwrap();

    let restored = ModelArtifact::load(&path).unwrap();
    let oot = df.slice(N_REST as i64, N_OOT);
    let proba = restored.model.predict_proba(&oot).unwrap();

    assert_eq!(proba.len(), N_OOT);
    assert!(
        proba.iter().all(|p| (0.0..=1.0).contains(p)),
        "unseen cities, unseen states and nulls must all resolve to scores"
    );
}

#[test]
fn test_two_runs_produce_identical_artifacts() {
    let df = seller_table();
    let config = pipeline_config();

    let a = TrainEngine::new(config.clone()).run(&df).unwrap().into_artifact();
    let b = TrainEngine::new(config).run(&df).unwrap().into_artifact();

    assert_eq!(
        serde_json::to_string(&a).unwrap(),
        serde_json::to_string(&b).unwrap(),
        "fixed seed must reproduce the artifact byte for byte"
    );
}

#[test]
fn test_model_scores_rows_unlike_anything_trained_on() {
    let df = seller_table();
    let outcome = TrainEngine::new(pipeline_config()).run(&df).unwrap();

    let incoming = df! {
        "descCidade" => &[None::<&str>, Some("porto alegre")],
        "descEstado" => &[Some("RS"), None::<&str>],
        "avgTempoResposta1M" => &[None::<f64>, Some(12.0)],
        "qtMediaFotos" => &[Some(3.0), None::<f64>],
    }
    .unwrap();

    let proba = outcome.model.predict_proba(&incoming).unwrap();
    assert_eq!(proba.len(), 2);
    assert!(
        proba.iter().all(|p| (0.0..=1.0).contains(p)),
        "imputation must cover every gap at scoring time"
    );
}

#[test]
fn test_cutoff_matching_no_rows_aborts_the_run() {
    let df = seller_table();
    let config = pipeline_config().with_reference_date("2030-01-01");

    match TrainEngine::new(config).run(&df) {
        Err(ChurnError::EmptySplit { split, .. }) => {
            assert_eq!(split, "oot", "the empty window must be named");
        }
        other => panic!(
            "an empty oot window must abort the run, got {:?}",
            other.map(|_| ())
        ),
    }
}

#[test]
fn test_trial_budget_beyond_the_grid_aborts_the_run() {
    let df = seller_table();
    let config = pipeline_config().with_n_trials(10);

    match TrainEngine::new(config).run(&df) {
        Err(ChurnError::SearchSpaceExhausted {
            available,
            requested,
        }) => {
            assert_eq!(available, 2);
            assert_eq!(requested, 10);
        }
        other => panic!(
            "sampling without replacement cannot honor the budget, got {:?}",
            other.map(|_| ())
        ),
    }
}

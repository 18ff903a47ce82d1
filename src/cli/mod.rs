//! Command-line interface
//!
//! Three commands: `train` runs the full pipeline and writes the JSON
//! artifact, `predict` scores a frame with a saved artifact, and `info`
//! prints what a saved artifact contains.

use anyhow::Context;
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use colored::*;
use polars::prelude::*;
use std::path::{Path, PathBuf};
use std::time::Instant;

use crate::artifact::{ModelArtifact, DEFAULT_ARTIFACT_PATH};
use crate::data::{DataLoader, DataSaver};
use crate::optimizer::ParamValue;
use crate::training::{TrainConfig, TrainEngine};

// ─── Styling helpers ───────────────────────────────────────────────────────────

fn dim(s: &str) -> ColoredString {
    s.truecolor(100, 100, 100)
}
fn accent(s: &str) -> ColoredString {
    s.truecolor(120, 170, 255)
}
fn muted(s: &str) -> ColoredString {
    s.truecolor(140, 140, 140)
}
fn ok(s: &str) -> ColoredString {
    s.truecolor(100, 210, 120)
}

fn section(title: &str) {
    println!();
    println!("  {}", title.white().bold());
    println!("  {}", dim(&"─".repeat(56)));
}

fn step_run(msg: &str) {
    print!("  {} {}... ", accent("›"), msg);
}

fn step_done(detail: &str) {
    println!("{} {}", ok("done"), dim(detail));
}

// ─── CLI definition ────────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(name = "churn")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Seller churn prediction pipeline")]
#[command(long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Train the churn model and write the artifact
    Train {
        /// Input seller table (CSV, TSV, JSON, or Parquet)
        #[arg(short, long)]
        data: PathBuf,

        /// Training configuration file (JSON); defaults apply if omitted
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Output artifact file
        #[arg(short, long, default_value = DEFAULT_ARTIFACT_PATH)]
        output: PathBuf,

        /// Out-of-time cutoff date (YYYY-MM-DD), overrides the config
        #[arg(long)]
        reference_date: Option<String>,

        /// Random seed, overrides the config
        #[arg(long)]
        seed: Option<u64>,

        /// Number of search trials, overrides the config
        #[arg(long)]
        n_trials: Option<usize>,

        /// Cross-validation folds, overrides the config
        #[arg(long)]
        cv_folds: Option<usize>,

        /// Test fraction of the pre-cutoff rows, overrides the config
        #[arg(long)]
        test_size: Option<f64>,
    },

    /// Score a seller table with a saved artifact
    Predict {
        /// Trained model artifact
        #[arg(short, long, default_value = DEFAULT_ARTIFACT_PATH)]
        model: PathBuf,

        /// Input seller table
        #[arg(short, long)]
        data: PathBuf,

        /// Output scored CSV
        #[arg(short, long, default_value = "predictions.csv")]
        output: PathBuf,
    },

    /// Show what a saved artifact contains
    Info {
        /// Trained model artifact
        #[arg(short, long, default_value = DEFAULT_ARTIFACT_PATH)]
        model: PathBuf,
    },
}

// ─── Data loading ──────────────────────────────────────────────────────────────

pub fn load_data(path: &Path) -> anyhow::Result<DataFrame> {
    let path_str = path
        .to_str()
        .with_context(|| format!("path {} is not valid UTF-8", path.display()))?;
    let df = DataLoader::new().load_auto(path_str)?;
    Ok(df)
}

fn validate_reference_date(date: &str) -> anyhow::Result<()> {
    NaiveDate::parse_from_str(date, "%Y-%m-%d")
        .map(|_| ())
        .map_err(|_| anyhow::anyhow!("reference date '{}' is not a YYYY-MM-DD date", date))
}

fn format_param(value: &ParamValue) -> String {
    match value {
        ParamValue::Int(v) => v.to_string(),
        ParamValue::Float(v) => v.to_string(),
        ParamValue::String(v) => v.clone(),
        ParamValue::Bool(v) => v.to_string(),
    }
}

// ─── Commands ──────────────────────────────────────────────────────────────────

#[allow(clippy::too_many_arguments)]
pub fn cmd_train(
    data_path: &Path,
    config_path: Option<&Path>,
    output_path: &Path,
    reference_date: Option<&str>,
    seed: Option<u64>,
    n_trials: Option<usize>,
    cv_folds: Option<usize>,
    test_size: Option<f64>,
) -> anyhow::Result<()> {
    section("Train");

    let mut config = match config_path {
        Some(path) => TrainConfig::from_file(path)?,
        None => TrainConfig::default(),
    };
    if let Some(date) = reference_date {
        config = config.with_reference_date(date);
    }
    if let Some(seed) = seed {
        config = config.with_seed(seed);
    }
    if let Some(n) = n_trials {
        config = config.with_n_trials(n);
    }
    if let Some(k) = cv_folds {
        config = config.with_cv_folds(k);
    }
    if let Some(t) = test_size {
        config = config.with_test_size(t);
    }
    validate_reference_date(&config.reference_date)?;

    step_run("Loading data");
    let start = Instant::now();
    let df = load_data(data_path)?;
    step_done(&format!(
        "{} rows × {} cols in {:?}",
        df.height(),
        df.width(),
        start.elapsed()
    ));

    step_run(&format!(
        "Training forest ({} trials, {}-fold cv)",
        config.n_trials, config.cv_folds
    ));
    let start = Instant::now();
    let engine = TrainEngine::new(config);
    let outcome = engine.run(&df)?;
    step_done(&format!("{:.1}s", start.elapsed().as_secs_f64()));

    println!();
    println!(
        "  {:<18} {}",
        muted("Best CV AUC"),
        format!("{:.4}", outcome.best_cv_auc).white().bold()
    );
    let mut params: Vec<_> = outcome.best_params.iter().collect();
    params.sort_by(|a, b| a.0.cmp(b.0));
    for (name, value) in params {
        println!("  {:<18} {}", muted(name), format_param(value).white());
    }

    section("Evaluation");
    println!(
        "  {:<8} {:>10} {:>10}",
        muted("Split"),
        muted("Accuracy"),
        muted("AUC")
    );
    println!("  {}", dim(&"─".repeat(30)));
    for (name, scores) in [
        ("train", &outcome.evaluation.train),
        ("test", &outcome.evaluation.test),
        ("oot", &outcome.evaluation.oot),
    ] {
        println!("  {:<8} {:>10.4} {:>10.4}", name, scores.accuracy, scores.auc);
    }

    println!();
    step_run(&format!("Saving → {}", output_path.display()));
    let artifact = outcome.into_artifact();
    artifact.save(output_path)?;
    step_done(&format!("{} features", artifact.features.len()));

    println!();
    Ok(())
}

pub fn cmd_predict(
    model_path: &Path,
    data_path: &Path,
    output_path: &Path,
) -> anyhow::Result<()> {
    section("Predict");

    step_run("Loading model");
    let artifact = ModelArtifact::load(model_path)?;
    step_done(&format!("{} features", artifact.features.len()));

    step_run("Loading data");
    let df = load_data(data_path)?;
    step_done(&format!("{} rows × {} cols", df.height(), df.width()));

    step_run("Scoring");
    let start = Instant::now();
    let scores = artifact.model.predict_proba(&df)?;
    step_done(&format!("{} rows in {:?}", scores.len(), start.elapsed()));

    let labels: Vec<i64> = scores.iter().map(|&p| if p > 0.5 { 1 } else { 0 }).collect();
    let n_flagged = labels.iter().filter(|&&l| l == 1).count();
    let mean_score = scores.iter().sum::<f64>() / scores.len().max(1) as f64;

    let mut scored = df;
    scored.with_column(Series::new("churn_score".into(), scores.to_vec()))?;
    scored.with_column(Series::new("churn_label".into(), labels))?;

    step_run(&format!("Saving → {}", output_path.display()));
    let output_str = output_path
        .to_str()
        .with_context(|| format!("path {} is not valid UTF-8", output_path.display()))?;
    DataSaver::save_csv(&mut scored, output_str)?;
    step_done(&format!("{} rows × {} cols", scored.height(), scored.width()));

    println!();
    println!(
        "  {:<16} {}",
        muted("Mean score"),
        format!("{:.4}", mean_score).white()
    );
    println!(
        "  {:<16} {}",
        muted("Flagged"),
        format!("{} of {}", n_flagged, scored.height()).white()
    );
    println!();
    Ok(())
}

pub fn cmd_info(model_path: &Path) -> anyhow::Result<()> {
    section("Model Info");

    let artifact = ModelArtifact::load(model_path)?;
    let model = &artifact.model;

    println!("  {:<16} {}", muted("File"), model_path.display());
    println!("  {:<16} {}", muted("Trees"), model.forest().n_trees());
    println!("  {:<16} {}", muted("Raw features"), artifact.features.len());
    println!(
        "  {:<16} {}",
        muted("Encoded"),
        model.pipeline().output_columns().len()
    );
    println!();

    for line in artifact.scores().summary().lines() {
        println!("  {}", line);
    }

    if let Some(importances) = model.forest().feature_importances() {
        section("Top features");
        let mut pairs: Vec<(String, f64)> = model
            .pipeline()
            .output_columns()
            .iter()
            .cloned()
            .zip(importances.iter().copied())
            .collect();
        pairs.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        for (name, importance) in pairs.iter().take(10) {
            println!("  {:<28} {:.4}", name, importance);
        }
    }

    section("Input columns");
    for name in &artifact.features {
        println!("  {}", name);
    }

    println!();
    Ok(())
}

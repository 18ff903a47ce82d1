//! Persisted training output
//!
//! One JSON document per run: the six split metrics, the fitted model, and
//! the raw feature list. The metric keys keep their reporting-friendly
//! spelling ("Acc train", "AUC oot") so downstream dashboards read them
//! without a mapping layer.

use crate::error::Result;
use crate::model::ChurnModel;
use crate::training::{EvaluationReport, SplitScores};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::info;

/// Where `churn train` writes its artifact unless told otherwise
pub const DEFAULT_ARTIFACT_PATH: &str = "model_rf.json";

/// The complete output of a training run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelArtifact {
    #[serde(rename = "Acc train")]
    pub acc_train: f64,
    #[serde(rename = "AUC train")]
    pub auc_train: f64,
    #[serde(rename = "Acc test")]
    pub acc_test: f64,
    #[serde(rename = "AUC test")]
    pub auc_test: f64,
    #[serde(rename = "Acc oot")]
    pub acc_oot: f64,
    #[serde(rename = "AUC oot")]
    pub auc_oot: f64,
    pub model: ChurnModel,
    pub features: Vec<String>,
}

impl ModelArtifact {
    /// Bundle a fitted model with its evaluation for persistence
    pub fn from_run(model: ChurnModel, evaluation: &EvaluationReport) -> Self {
        let features = model.feature_columns();
        Self {
            acc_train: evaluation.train.accuracy,
            auc_train: evaluation.train.auc,
            acc_test: evaluation.test.accuracy,
            auc_test: evaluation.test.auc,
            acc_oot: evaluation.oot.accuracy,
            auc_oot: evaluation.oot.auc,
            model,
            features,
        }
    }

    /// Rebuild the evaluation table from the stored metrics
    pub fn scores(&self) -> EvaluationReport {
        EvaluationReport {
            train: SplitScores {
                accuracy: self.acc_train,
                auc: self.auc_train,
            },
            test: SplitScores {
                accuracy: self.acc_test,
                auc: self.auc_test,
            },
            oot: SplitScores {
                accuracy: self.acc_oot,
                auc: self.auc_oot,
            },
        }
    }

    /// Write the artifact as pretty-printed JSON
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        info!(path = %path.display(), "Model artifact saved");
        Ok(())
    }

    /// Read an artifact back from disk
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = fs::read_to_string(path)?;
        let artifact: Self = serde_json::from_str(&json)?;
        info!(path = %path.display(), "Model artifact loaded");
        Ok(artifact)
    }
}

//! Classification metrics and the per-split evaluation report

use crate::error::{ChurnError, Result};
use ndarray::Array1;
use serde::{Deserialize, Serialize};

fn validate_pair(y_true: &Array1<f64>, other: &Array1<f64>, metric: &str) -> Result<()> {
    if y_true.len() != other.len() {
        return Err(ChurnError::ShapeError {
            expected: format!("{} values", y_true.len()),
            actual: format!("{} values", other.len()),
        });
    }
    if y_true.is_empty() {
        return Err(ChurnError::empty_split(
            "evaluation",
            format!("cannot compute {} on zero samples", metric),
        ));
    }
    if let Some(bad) = y_true.iter().find(|&&v| v != 0.0 && v != 1.0) {
        return Err(ChurnError::DataError(format!(
            "{}: labels must be 0 or 1, found {}",
            metric, bad
        )));
    }
    Ok(())
}

/// Fraction of predictions matching the true labels
pub fn accuracy(y_true: &Array1<f64>, y_pred: &Array1<f64>) -> Result<f64> {
    validate_pair(y_true, y_pred, "accuracy")?;

    let correct: usize = y_true
        .iter()
        .zip(y_pred.iter())
        .filter(|(t, p)| (*t - *p).abs() < 0.5)
        .count();
    Ok(correct as f64 / y_true.len() as f64)
}

/// Area under the ROC curve from positive-class scores
///
/// Walks the scores in descending order, advancing through tied groups as
/// one block and accumulating trapezoid area, so tied scores contribute
/// their average rank. Needs both classes present.
pub fn roc_auc(y_true: &Array1<f64>, y_score: &Array1<f64>) -> Result<f64> {
    validate_pair(y_true, y_score, "roc_auc")?;

    if y_score.iter().any(|s| s.is_nan()) {
        return Err(ChurnError::DataError(
            "roc_auc: scores contain NaN".to_string(),
        ));
    }

    let n = y_true.len();
    let n_pos = y_true.iter().filter(|&&v| v > 0.5).count();
    let n_neg = n - n_pos;
    if n_pos == 0 || n_neg == 0 {
        return Err(ChurnError::DegenerateLabels(format!(
            "ROC AUC needs both classes, got {} positives and {} negatives",
            n_pos, n_neg
        )));
    }

    let mut pairs: Vec<(f64, bool)> = y_score
        .iter()
        .zip(y_true.iter())
        .map(|(&s, &t)| (s, t > 0.5))
        .collect();
    pairs.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));

    let mut area = 0.0;
    let mut tp = 0.0;
    let mut fp = 0.0;
    let mut prev_tp = 0.0;
    let mut prev_fp = 0.0;

    let mut i = 0;
    while i < n {
        let score = pairs[i].0;
        while i < n && pairs[i].0 == score {
            if pairs[i].1 {
                tp += 1.0;
            } else {
                fp += 1.0;
            }
            i += 1;
        }
        area += (fp - prev_fp) * (tp + prev_tp) / 2.0;
        prev_tp = tp;
        prev_fp = fp;
    }

    Ok(area / (n_pos as f64 * n_neg as f64))
}

/// Accuracy and AUC for one evaluation slice
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SplitScores {
    pub accuracy: f64,
    pub auc: f64,
}

impl SplitScores {
    /// Score a slice from its labels, hard predictions, and scores
    pub fn compute(
        y_true: &Array1<f64>,
        y_pred: &Array1<f64>,
        y_score: &Array1<f64>,
    ) -> Result<Self> {
        Ok(Self {
            accuracy: accuracy(y_true, y_pred)?,
            auc: roc_auc(y_true, y_score)?,
        })
    }
}

/// Metrics for the three evaluation slices
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct EvaluationReport {
    pub train: SplitScores,
    pub test: SplitScores,
    pub oot: SplitScores,
}

impl EvaluationReport {
    /// Human-readable metric table
    pub fn summary(&self) -> String {
        let mut report = String::new();
        report.push_str(&format!(
            "{:<8} {:>10} {:>10}\n",
            "split", "accuracy", "auc"
        ));
        for (name, scores) in [
            ("train", &self.train),
            ("test", &self.test),
            ("oot", &self.oot),
        ] {
            report.push_str(&format!(
                "{:<8} {:>10.4} {:>10.4}\n",
                name, scores.accuracy, scores.auc
            ));
        }
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_accuracy_counts_matches() {
        let y_true = array![1.0, 0.0, 1.0, 1.0, 0.0, 1.0, 0.0, 0.0];
        let y_pred = array![1.0, 0.0, 1.0, 0.0, 0.0, 1.0, 1.0, 0.0];

        let acc = accuracy(&y_true, &y_pred).unwrap();
        assert!((acc - 0.75).abs() < 1e-12);
    }

    #[test]
    fn test_accuracy_empty_errors() {
        let empty = Array1::from_vec(vec![]);
        assert!(matches!(
            accuracy(&empty, &empty),
            Err(ChurnError::EmptySplit { .. })
        ));
    }

    #[test]
    fn test_auc_empty_errors() {
        let empty = Array1::from_vec(vec![]);
        assert!(matches!(
            roc_auc(&empty, &empty),
            Err(ChurnError::EmptySplit { .. })
        ));
    }

    #[test]
    fn test_accuracy_length_mismatch() {
        let y_true = array![1.0, 0.0];
        let y_pred = array![1.0];
        assert!(matches!(
            accuracy(&y_true, &y_pred),
            Err(ChurnError::ShapeError { .. })
        ));
    }

    #[test]
    fn test_auc_perfect_separation() {
        let y_true = array![0.0, 0.0, 1.0, 1.0];
        let y_score = array![0.1, 0.2, 0.8, 0.9];
        assert!((roc_auc(&y_true, &y_score).unwrap() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_auc_inverted_scores() {
        let y_true = array![0.0, 0.0, 1.0, 1.0];
        let y_score = array![0.9, 0.8, 0.2, 0.1];
        assert!(roc_auc(&y_true, &y_score).unwrap().abs() < 1e-12);
    }

    #[test]
    fn test_auc_known_value() {
        // Classic worked example with one miss: AUC = 0.75
        let y_true = array![0.0, 0.0, 1.0, 1.0];
        let y_score = array![0.1, 0.4, 0.35, 0.8];
        assert!((roc_auc(&y_true, &y_score).unwrap() - 0.75).abs() < 1e-12);
    }

    #[test]
    fn test_auc_all_tied_is_half() {
        let y_true = array![1.0, 0.0, 1.0, 0.0];
        let y_score = array![0.5, 0.5, 0.5, 0.5];
        assert!((roc_auc(&y_true, &y_score).unwrap() - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_auc_single_class_errors() {
        let y_true = array![1.0, 1.0, 1.0];
        let y_score = array![0.2, 0.5, 0.9];
        assert!(matches!(
            roc_auc(&y_true, &y_score),
            Err(ChurnError::DegenerateLabels(_))
        ));
    }

    #[test]
    fn test_non_binary_labels_rejected() {
        let y_true = array![0.0, 2.0];
        let y_score = array![0.1, 0.9];
        assert!(roc_auc(&y_true, &y_score).is_err());
    }

    #[test]
    fn test_nan_scores_rejected() {
        let y_true = array![0.0, 1.0];
        let y_score = array![0.1, f64::NAN];
        assert!(roc_auc(&y_true, &y_score).is_err());
    }

    #[test]
    fn test_report_summary_lists_splits() {
        let scores = SplitScores {
            accuracy: 0.9,
            auc: 0.95,
        };
        let report = EvaluationReport {
            train: scores,
            test: scores,
            oot: scores,
        };

        let text = report.summary();
        assert!(text.contains("train"));
        assert!(text.contains("test"));
        assert!(text.contains("oot"));
        assert!(text.contains("0.9500"));
    }
}

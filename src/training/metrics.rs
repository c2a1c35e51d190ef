//! Evaluation metrics for the held-out split

use crate::error::{AdvisorError, Result};
use ndarray::Array1;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Fraction of matching predictions; 0.0 for empty input
pub fn accuracy(y_true: &[usize], y_pred: &[usize]) -> f64 {
    if y_true.is_empty() {
        return 0.0;
    }
    let correct = y_true.iter().zip(y_pred).filter(|(t, p)| t == p).count();
    correct as f64 / y_true.len() as f64
}

fn ratio(num: usize, den: usize) -> f64 {
    if den == 0 {
        0.0
    } else {
        num as f64 / den as f64
    }
}

/// Precision, recall and F1 for one class (or an average row)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassMetrics {
    pub label: String,
    pub precision: f64,
    pub recall: f64,
    pub f1_score: f64,
    pub support: usize,
}

/// Per-class report with macro and weighted averages.
/// Undefined ratios (no predictions or no support) count as 0.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassificationReport {
    pub classes: Vec<ClassMetrics>,
    pub accuracy: f64,
    pub macro_avg: ClassMetrics,
    pub weighted_avg: ClassMetrics,
}

impl ClassificationReport {
    pub fn compute(y_true: &[usize], y_pred: &[usize], class_names: &[String]) -> Result<Self> {
        if y_true.len() != y_pred.len() {
            return Err(AdvisorError::ShapeError {
                expected: format!("{} predictions", y_true.len()),
                actual: format!("{} predictions", y_pred.len()),
            });
        }

        let n_classes = class_names.len();
        let mut tp = vec![0usize; n_classes];
        let mut predicted = vec![0usize; n_classes];
        let mut support = vec![0usize; n_classes];

        for (&t, &p) in y_true.iter().zip(y_pred) {
            for code in [t, p] {
                if code >= n_classes {
                    return Err(AdvisorError::UnknownClassCode { code, n_classes });
                }
            }
            support[t] += 1;
            predicted[p] += 1;
            if t == p {
                tp[t] += 1;
            }
        }

        let classes: Vec<ClassMetrics> = class_names
            .iter()
            .enumerate()
            .map(|(c, name)| {
                let precision = ratio(tp[c], predicted[c]);
                let recall = ratio(tp[c], support[c]);
                let f1_score = if precision + recall > 0.0 {
                    2.0 * precision * recall / (precision + recall)
                } else {
                    0.0
                };
                ClassMetrics {
                    label: name.clone(),
                    precision,
                    recall,
                    f1_score,
                    support: support[c],
                }
            })
            .collect();

        let total = y_true.len();
        let uniform = vec![1.0; n_classes];
        let by_support: Vec<f64> = support.iter().map(|&s| s as f64).collect();
        let macro_avg = average_row("macro avg", &classes, &uniform, total);
        let weighted_avg = average_row("weighted avg", &classes, &by_support, total);

        Ok(Self {
            accuracy: accuracy(y_true, y_pred),
            classes,
            macro_avg,
            weighted_avg,
        })
    }
}

impl fmt::Display for ClassificationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let width = self
            .classes
            .iter()
            .map(|m| m.label.len())
            .chain(std::iter::once("weighted avg".len()))
            .max()
            .unwrap_or(12);

        writeln!(
            f,
            "{:>width$}  {:>9}  {:>9}  {:>9}  {:>9}",
            "", "precision", "recall", "f1-score", "support"
        )?;
        writeln!(f)?;
        for m in &self.classes {
            write_row(f, m, width)?;
        }
        writeln!(f)?;
        writeln!(
            f,
            "{:>width$}  {:>9}  {:>9}  {:>9.2}  {:>9}",
            "accuracy", "", "", self.accuracy, self.macro_avg.support
        )?;
        write_row(f, &self.macro_avg, width)?;
        write_row(f, &self.weighted_avg, width)
    }
}

fn average_row(label: &str, classes: &[ClassMetrics], weights: &[f64], support: usize) -> ClassMetrics {
    let norm: f64 = weights.iter().sum();
    let mean = |f: fn(&ClassMetrics) -> f64| {
        if norm > 0.0 {
            classes.iter().zip(weights).map(|(m, w)| w * f(m)).sum::<f64>() / norm
        } else {
            0.0
        }
    };
    ClassMetrics {
        label: label.to_string(),
        precision: mean(|m| m.precision),
        recall: mean(|m| m.recall),
        f1_score: mean(|m| m.f1_score),
        support,
    }
}

fn write_row(f: &mut fmt::Formatter<'_>, m: &ClassMetrics, width: usize) -> fmt::Result {
    writeln!(
        f,
        "{:>width$}  {:>9.2}  {:>9.2}  {:>9.2}  {:>9}",
        m.label, m.precision, m.recall, m.f1_score, m.support
    )
}

/// Feature name paired with its normalised importance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureImportance {
    pub feature: String,
    pub importance: f64,
}

/// Features sorted by descending importance; equal scores keep column order.
pub fn rank_feature_importances(names: &[String], importances: &Array1<f64>) -> Vec<FeatureImportance> {
    let mut ranked: Vec<FeatureImportance> = names
        .iter()
        .zip(importances.iter())
        .map(|(name, &importance)| FeatureImportance {
            feature: name.clone(),
            importance,
        })
        .collect();
    ranked.sort_by(|a, b| {
        b.importance
            .partial_cmp(&a.importance)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    ranked
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn names(n: &[&str]) -> Vec<String> {
        n.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_accuracy() {
        assert_eq!(accuracy(&[0, 1, 2, 2], &[0, 1, 1, 2]), 0.75);
        assert_eq!(accuracy(&[], &[]), 0.0);
    }

    #[test]
    fn test_report_per_class() {
        let y_true = [0, 0, 1, 1];
        let y_pred = [0, 1, 1, 1];
        let report = ClassificationReport::compute(&y_true, &y_pred, &names(&["apple", "rice"])).unwrap();

        let apple = &report.classes[0];
        assert_eq!(apple.precision, 1.0);
        assert_eq!(apple.recall, 0.5);
        assert!((apple.f1_score - 2.0 / 3.0).abs() < 1e-12);

        let rice = &report.classes[1];
        assert!((rice.precision - 2.0 / 3.0).abs() < 1e-12);
        assert_eq!(rice.recall, 1.0);
        assert_eq!(report.accuracy, 0.75);
        assert_eq!(report.macro_avg.recall, 0.75);
    }

    #[test]
    fn test_zero_division_is_zero() {
        let report = ClassificationReport::compute(&[0, 0], &[0, 0], &names(&["a", "b"])).unwrap();
        let b = &report.classes[1];
        assert_eq!((b.precision, b.recall, b.f1_score, b.support), (0.0, 0.0, 0.0, 0));
        assert_eq!(report.weighted_avg.precision, 1.0);
        assert_eq!(report.macro_avg.precision, 0.5);
    }

    #[test]
    fn test_report_rejects_unknown_code() {
        let err = ClassificationReport::compute(&[0, 3], &[0, 0], &names(&["a", "b"])).unwrap_err();
        assert!(matches!(err, AdvisorError::UnknownClassCode { code: 3, .. }));
    }

    #[test]
    fn test_report_display() {
        let report = ClassificationReport::compute(&[0, 1], &[0, 1], &names(&["maize", "rice"])).unwrap();
        let text = report.to_string();
        assert!(text.contains("maize"));
        assert!(text.contains("weighted avg"));
    }

    #[test]
    fn test_rank_feature_importances() {
        let ranked = rank_feature_importances(&names(&["N", "P", "K"]), &array![0.2, 0.5, 0.3]);
        let order: Vec<&str> = ranked.iter().map(|r| r.feature.as_str()).collect();
        assert_eq!(order, vec!["P", "K", "N"]);
    }
}

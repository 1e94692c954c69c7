use std::fmt;

use serde::Serialize;

/// Display names for label 0 and label 1.
pub const CLASS_NAMES: [&str; 2] = ["fail", "pass"];

/// Precision, recall, F1 and support for one class (or an average row).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassMetrics {
    pub label: String,
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    pub support: usize,
}

/// Held-out evaluation of a binary classifier.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassificationReport {
    pub classes: Vec<ClassMetrics>,
    pub accuracy: f64,
    pub macro_avg: ClassMetrics,
    pub weighted_avg: ClassMetrics,
    /// `confusion[true][predicted]`
    pub confusion: [[usize; 2]; 2],
}

/// Fraction of matching labels. Empty input scores 0.
pub fn accuracy(y_true: &[u8], y_pred: &[u8]) -> f64 {
    assert_eq!(
        y_true.len(),
        y_pred.len(),
        "y_true and y_pred must have the same length"
    );
    if y_true.is_empty() {
        return 0.0;
    }
    let correct = y_true.iter().zip(y_pred).filter(|(t, p)| t == p).count();
    correct as f64 / y_true.len() as f64
}

/// 2x2 confusion matrix indexed as `[true][predicted]`.
pub fn confusion_matrix(y_true: &[u8], y_pred: &[u8]) -> [[usize; 2]; 2] {
    assert_eq!(
        y_true.len(),
        y_pred.len(),
        "y_true and y_pred must have the same length"
    );
    let mut cm = [[0usize; 2]; 2];
    for (&t, &p) in y_true.iter().zip(y_pred) {
        cm[(t == 1) as usize][(p == 1) as usize] += 1;
    }
    cm
}

fn ratio(num: usize, den: usize) -> f64 {
    if den == 0 {
        0.0
    } else {
        num as f64 / den as f64
    }
}

/// Per-class precision/recall/F1 plus macro and support-weighted averages.
///
/// Undefined ratios (no predictions or no support for a class) are reported
/// as 0.
pub fn classification_report(y_true: &[u8], y_pred: &[u8]) -> ClassificationReport {
    let cm = confusion_matrix(y_true, y_pred);
    let total = y_true.len();

    let classes: Vec<ClassMetrics> = (0..2)
        .map(|k| {
            let tp = cm[k][k];
            let predicted = cm[0][k] + cm[1][k];
            let support = cm[k][0] + cm[k][1];
            let precision = ratio(tp, predicted);
            let recall = ratio(tp, support);
            let f1 = if precision + recall == 0.0 {
                0.0
            } else {
                2.0 * precision * recall / (precision + recall)
            };
            ClassMetrics {
                label: CLASS_NAMES[k].to_string(),
                precision,
                recall,
                f1,
                support,
            }
        })
        .collect();

    let macro_avg = ClassMetrics {
        label: "macro avg".to_string(),
        precision: classes.iter().map(|c| c.precision).sum::<f64>() / 2.0,
        recall: classes.iter().map(|c| c.recall).sum::<f64>() / 2.0,
        f1: classes.iter().map(|c| c.f1).sum::<f64>() / 2.0,
        support: total,
    };

    let weight = |f: fn(&ClassMetrics) -> f64| -> f64 {
        if total == 0 {
            0.0
        } else {
            classes
                .iter()
                .map(|c| f(c) * c.support as f64)
                .sum::<f64>()
                / total as f64
        }
    };
    let weighted_avg = ClassMetrics {
        label: "weighted avg".to_string(),
        precision: weight(|c| c.precision),
        recall: weight(|c| c.recall),
        f1: weight(|c| c.f1),
        support: total,
    };

    ClassificationReport {
        accuracy: accuracy(y_true, y_pred),
        classes,
        macro_avg,
        weighted_avg,
        confusion: cm,
    }
}

impl fmt::Display for ClassificationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{:>14} {:>10} {:>10} {:>10} {:>10}",
            "", "precision", "recall", "f1-score", "support"
        )?;
        writeln!(f)?;
        for c in &self.classes {
            writeln!(
                f,
                "{:>14} {:>10.2} {:>10.2} {:>10.2} {:>10}",
                c.label, c.precision, c.recall, c.f1, c.support
            )?;
        }
        writeln!(f)?;
        writeln!(
            f,
            "{:>14} {:>10} {:>10} {:>10.2} {:>10}",
            "accuracy", "", "", self.accuracy, self.macro_avg.support
        )?;
        for c in [&self.macro_avg, &self.weighted_avg] {
            writeln!(
                f,
                "{:>14} {:>10.2} {:>10.2} {:>10.2} {:>10}",
                c.label, c.precision, c.recall, c.f1, c.support
            )?;
        }
        Ok(())
    }
}

//! Data structures and helpers for labelled student records.
//!
//! This module defines the feature vector served over HTTP, the label
//! derivation rules used at training time, and the seeded train/held-out
//! split used to report an honest accuracy estimate.
use ndarray::{Array1, Array2, Axis};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

use crate::error::{PipelineError, Result};

/// Feature columns, in the order the pipeline consumes them.
pub const FEATURE_COLUMNS: [&str; 4] = [
    "weekly_self_study_hours",
    "attendance_percentage",
    "class_participation",
    "total_score",
];

/// Column used to derive labels by threshold.
pub const SCORE_COLUMN: &str = "total_score";

/// Fallback column used to derive labels when no score column exists.
pub const GRADE_COLUMN: &str = "grade";

pub const DEFAULT_PASS_THRESHOLD: f64 = 50.0;

/// Fraction of rows held out for evaluation.
pub const DEFAULT_TEST_FRACTION: f64 = 0.2;

/// A single student's features.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FeatureVector {
    pub weekly_self_study_hours: f64,
    pub attendance_percentage: f64,
    pub class_participation: f64,
    pub total_score: f64,
}

impl FeatureVector {
    /// Values in [`FEATURE_COLUMNS`] order.
    pub fn to_array(&self) -> [f64; 4] {
        [
            self.weekly_self_study_hours,
            self.attendance_percentage,
            self.class_participation,
            self.total_score,
        ]
    }

    /// A one-row matrix suitable for pipeline inference.
    pub fn to_matrix(&self) -> Array2<f64> {
        let values = self.to_array();
        Array2::from_shape_fn((1, values.len()), |(_, c)| values[c])
    }
}

/// Raw values of whichever column labels are derived from.
#[derive(Debug, Clone, PartialEq)]
pub enum LabelColumn {
    /// Numeric `total_score` values; missing cells are `NaN`.
    Score(Vec<f64>),
    /// Free-form `grade` strings.
    Grade(Vec<String>),
}

impl LabelColumn {
    pub fn len(&self) -> usize {
        match self {
            LabelColumn::Score(v) => v.len(),
            LabelColumn::Grade(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn source_name(&self) -> &'static str {
        match self {
            LabelColumn::Score(_) => SCORE_COLUMN,
            LabelColumn::Grade(_) => GRADE_COLUMN,
        }
    }
}

/// 1 (pass) when `score >= pass_threshold`, else 0. A missing score is a fail.
pub fn label_from_score(score: f64, pass_threshold: f64) -> u8 {
    if score >= pass_threshold {
        1
    } else {
        0
    }
}

/// 0 for `"f"` / `"fail"` (trimmed, case-insensitive), 1 for anything else.
///
/// Any grade that is not spelled as a fail, including typos and blanks,
/// counts as a pass.
pub fn label_from_grade(grade: &str) -> u8 {
    match grade.trim().to_lowercase().as_str() {
        "f" | "fail" => 0,
        _ => 1,
    }
}

/// Derive binary pass/fail labels from a score or grade column.
pub fn derive_labels(column: &LabelColumn, pass_threshold: f64) -> Array1<u8> {
    match column {
        LabelColumn::Score(scores) => scores
            .iter()
            .map(|&s| label_from_score(s, pass_threshold))
            .collect(),
        LabelColumn::Grade(grades) => grades.iter().map(|g| label_from_grade(g)).collect(),
    }
}

/// Feature matrix plus derived labels, ready for splitting.
#[derive(Debug, Clone)]
pub struct StudentData {
    pub x: Array2<f64>,
    pub y: Array1<u8>,
    /// Name of the column the labels were derived from.
    pub label_source: &'static str,
    pub pass_threshold: f64,
}

impl StudentData {
    pub fn n_samples(&self) -> usize {
        self.x.nrows()
    }

    pub fn n_missing(&self) -> usize {
        self.x.iter().filter(|v| v.is_nan()).count()
    }

    pub fn log_input_data_summary(&self) {
        let n_pass = self.y.iter().filter(|&&v| v == 1).count();
        log::info!("----- Input Data Summary -----");
        log::info!(
            "{} rows: {} pass / {} fail (labels from `{}`, threshold {})",
            self.n_samples(),
            n_pass,
            self.n_samples() - n_pass,
            self.label_source,
            self.pass_threshold
        );
        log::info!(
            "{} feature columns, {} missing cells",
            self.x.ncols(),
            self.n_missing()
        );
        log::info!("-------------------------------");
    }
}

/// Result of a seeded train/held-out split.
#[derive(Debug, Clone)]
pub struct TrainTestSplit {
    pub x_train: Array2<f64>,
    pub y_train: Array1<u8>,
    pub x_test: Array2<f64>,
    pub y_test: Array1<u8>,
    /// Original row indices of the training rows.
    pub train_indices: Vec<usize>,
    /// Original row indices of the held-out rows.
    pub test_indices: Vec<usize>,
}

/// Shuffle rows with a seeded RNG and hold out `ceil(test_fraction * n)` of them.
///
/// Both partitions are guaranteed to be non-empty, so at least two rows are
/// required.
pub fn train_test_split(
    x: &Array2<f64>,
    y: &Array1<u8>,
    test_fraction: f64,
    seed: u64,
) -> Result<TrainTestSplit> {
    let n_samples = x.nrows();
    if n_samples != y.len() {
        return Err(PipelineError::InvalidTrainingData(format!(
            "{} feature rows but {} labels",
            n_samples,
            y.len()
        )));
    }
    if n_samples < 2 {
        return Err(PipelineError::InvalidTrainingData(format!(
            "at least 2 rows are required to split into train and held-out sets, got {}",
            n_samples
        )));
    }
    if !(test_fraction > 0.0 && test_fraction < 1.0) {
        return Err(PipelineError::InvalidTrainingData(format!(
            "test fraction must be in (0, 1), got {}",
            test_fraction
        )));
    }

    let n_test = ((test_fraction * n_samples as f64).ceil() as usize).clamp(1, n_samples - 1);

    let mut indices: Vec<usize> = (0..n_samples).collect();
    let mut rng = StdRng::seed_from_u64(seed);
    indices.shuffle(&mut rng);

    let test_indices = indices[..n_test].to_vec();
    let train_indices = indices[n_test..].to_vec();

    Ok(TrainTestSplit {
        x_train: x.select(Axis(0), &train_indices),
        y_train: y.select(Axis(0), &train_indices),
        x_test: x.select(Axis(0), &test_indices),
        y_test: y.select(Axis(0), &test_indices),
        train_indices,
        test_indices,
    })
}

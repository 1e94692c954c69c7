use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while preparing data, fitting, persisting or running a pipeline.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// The dataset has no column to derive pass/fail labels from.
    #[error("Dataset has neither a `total_score` nor a `grade` column to derive labels from")]
    MissingLabelSource,
    /// One or more feature columns are absent from the dataset header.
    #[error("Dataset is missing required feature column(s): {}", .0.join(", "))]
    MissingFeatures(Vec<String>),
    /// A cell could not be parsed as a number.
    #[error("Row {row}: column `{column}` has non-numeric value {value:?}")]
    Unparseable {
        row: usize,
        column: String,
        value: String,
    },
    /// Training data is structurally unusable (empty, single class, ...).
    #[error("Invalid training data: {0}")]
    InvalidTrainingData(String),
    /// The model backend refused to fit.
    #[error("Failed to fit {model} classifier: {reason}")]
    Fit { model: String, reason: String },
    /// Inference was attempted with inputs the pipeline cannot handle.
    #[error("Inference failed: {0}")]
    Inference(String),
    /// Reading or writing an artifact file failed.
    #[error("Artifact I/O error at {path}: {source}")]
    ArtifactIo {
        path: PathBuf,
        source: std::io::Error,
    },
    /// The artifact file exists but cannot be decoded.
    #[error("Artifact at {path} is corrupt: {source}")]
    ArtifactCorrupt {
        path: PathBuf,
        source: serde_json::Error,
    },
    /// The artifact decodes but does not match what this build serves.
    #[error("Artifact is incompatible: {0}")]
    ArtifactIncompatible(String),
}

pub type Result<T> = std::result::Result<T, PipelineError>;

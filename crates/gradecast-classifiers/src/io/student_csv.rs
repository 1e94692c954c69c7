//! Delimited-text reader for student performance datasets.
use std::path::Path;

use anyhow::{Context, Result};
use csv::StringRecord;
use ndarray::Array2;

use crate::data_handling::{
    derive_labels, LabelColumn, StudentData, DEFAULT_PASS_THRESHOLD, FEATURE_COLUMNS,
    GRADE_COLUMN, SCORE_COLUMN,
};
use crate::error::PipelineError;

/// Cell values treated as missing (compared case-insensitively after trimming).
const MISSING_TOKENS: [&str; 5] = ["", "na", "nan", "null", "none"];

/// Configuration for reading a student dataset.
#[derive(Debug, Clone)]
pub struct StudentReaderConfig {
    /// Feature columns to load (in order).
    pub feature_columns: Vec<String>,
    /// Numeric column labels are thresholded on.
    pub score_column: String,
    /// Fallback categorical column used when `score_column` is absent.
    pub grade_column: String,
    /// Inclusive pass threshold applied to `score_column`.
    pub pass_threshold: f64,
    /// Field delimiter. `None` picks tab for `.tsv` files and comma otherwise.
    pub delimiter: Option<u8>,
}

impl Default for StudentReaderConfig {
    fn default() -> Self {
        Self {
            feature_columns: FEATURE_COLUMNS.iter().map(|c| c.to_string()).collect(),
            score_column: SCORE_COLUMN.to_string(),
            grade_column: GRADE_COLUMN.to_string(),
            pass_threshold: DEFAULT_PASS_THRESHOLD,
            delimiter: None,
        }
    }
}

impl StudentReaderConfig {
    pub fn with_pass_threshold(pass_threshold: f64) -> Self {
        Self {
            pass_threshold,
            ..Self::default()
        }
    }
}

/// Read a student dataset with the default columns and threshold.
pub fn read_student_data<P: AsRef<Path>>(path: P) -> Result<StudentData> {
    read_student_data_with_config(path, &StudentReaderConfig::default())
}

/// Read a student dataset, validate its columns and derive labels.
///
/// Column presence is checked before any row is parsed, so a dataset with
/// the wrong header fails with a [`PipelineError`] naming the missing columns
/// rather than with a numeric error further down the pipeline.
pub fn read_student_data_with_config<P: AsRef<Path>>(
    path: P,
    config: &StudentReaderConfig,
) -> Result<StudentData> {
    let path = path.as_ref();
    let delimiter = config.delimiter.unwrap_or_else(|| delimiter_for(path));

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(true)
        .from_path(path)
        .with_context(|| format!("Failed to open dataset: {}", path.display()))?;

    let headers = reader
        .headers()
        .context("Failed to read dataset header row")?
        .clone();

    let score_idx = find_column(&headers, &config.score_column);
    let grade_idx = find_column(&headers, &config.grade_column);
    if score_idx.is_none() && grade_idx.is_none() {
        return Err(PipelineError::MissingLabelSource.into());
    }

    let mut missing = Vec::new();
    let mut feature_indices = Vec::with_capacity(config.feature_columns.len());
    for name in &config.feature_columns {
        match find_column(&headers, name) {
            Some(idx) => feature_indices.push(idx),
            None => missing.push(name.clone()),
        }
    }
    if !missing.is_empty() {
        return Err(PipelineError::MissingFeatures(missing).into());
    }

    let mut features = Vec::new();
    let mut scores = Vec::new();
    let mut grades = Vec::new();

    for (row_idx, result) in reader.records().enumerate() {
        let row = row_idx + 1;
        let record = result.with_context(|| format!("Failed to read row {}", row))?;

        for (&idx, name) in feature_indices.iter().zip(&config.feature_columns) {
            features.push(parse_cell(&record, idx, name, row)?);
        }

        match score_idx {
            Some(idx) => scores.push(parse_cell(&record, idx, &config.score_column, row)?),
            None => grades.push(
                grade_idx
                    .and_then(|idx| record.get(idx))
                    .unwrap_or_default()
                    .to_string(),
            ),
        }
    }

    let label_column = match score_idx {
        Some(_) => LabelColumn::Score(scores),
        None => LabelColumn::Grade(grades),
    };

    let n_samples = label_column.len();
    if n_samples == 0 {
        return Err(PipelineError::InvalidTrainingData(format!(
            "{} contains a header but no rows",
            path.display()
        ))
        .into());
    }

    let x = Array2::from_shape_vec((n_samples, feature_indices.len()), features)
        .context("Failed to build feature matrix")?;
    let y = derive_labels(&label_column, config.pass_threshold);

    Ok(StudentData {
        x,
        y,
        label_source: label_column.source_name(),
        pass_threshold: config.pass_threshold,
    })
}

fn delimiter_for(path: &Path) -> u8 {
    match path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .as_deref()
    {
        Some("tsv") => b'\t',
        _ => b',',
    }
}

fn find_column(headers: &StringRecord, name: &str) -> Option<usize> {
    headers.iter().position(|header| header.trim() == name)
}

/// Parse a numeric cell; missing tokens become `NaN` for later imputation.
fn parse_cell(
    record: &StringRecord,
    idx: usize,
    column: &str,
    row: usize,
) -> std::result::Result<f64, PipelineError> {
    let raw = record.get(idx).unwrap_or_default().trim();
    if MISSING_TOKENS.iter().any(|t| raw.eq_ignore_ascii_case(t)) {
        return Ok(f64::NAN);
    }
    raw.parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| PipelineError::Unparseable {
            row,
            column: column.to_string(),
            value: raw.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(fields: &[&str]) -> StringRecord {
        StringRecord::from(fields.to_vec())
    }

    #[test]
    fn parse_cell_maps_missing_tokens_to_nan() {
        let rec = record(&["", " NA ", "nan", "Null"]);
        for idx in 0..4 {
            assert!(parse_cell(&rec, idx, "c", 1).unwrap().is_nan());
        }
    }

    #[test]
    fn parse_cell_rejects_text_and_infinities() {
        let rec = record(&["abc", "inf"]);
        let err = parse_cell(&rec, 0, "total_score", 7).unwrap_err();
        assert!(err.to_string().contains("Row 7"));
        assert!(err.to_string().contains("total_score"));
        assert!(parse_cell(&rec, 1, "total_score", 7).is_err());
    }

    #[test]
    fn tsv_extension_selects_tab() {
        assert_eq!(delimiter_for(Path::new("data.TSV")), b'\t');
        assert_eq!(delimiter_for(Path::new("data.csv")), b',');
        assert_eq!(delimiter_for(Path::new("data")), b',');
    }
}

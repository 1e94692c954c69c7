//! Preprocessing applied in front of every classifier.
//!
//! A [`Preprocessor`] imputes missing values with per-column medians and then
//! standardizes each column to zero mean and unit variance. Both statistics
//! are fit on the training split only and stored in the artifact, so held-out
//! rows and serving inputs are transformed with exactly the same numbers.

use ndarray::Array2;
use serde::{Deserialize, Serialize};

use crate::error::{PipelineError, Result};

/// Median imputer followed by a standard scaler (per-column mean/std).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Preprocessor {
    pub median: Vec<f64>,
    pub mean: Vec<f64>,
    pub std: Vec<f64>,
}

impl Preprocessor {
    /// Columns with a stddev below this are only centered.
    const MIN_STD: f64 = 1e-12;

    pub fn n_features(&self) -> usize {
        self.mean.len()
    }

    fn check_width(&self, width: usize) -> Result<()> {
        let n = self.n_features();
        if self.median.len() != n || self.std.len() != n {
            return Err(PipelineError::Inference(format!(
                "preprocessor statistics are inconsistent (median {}, mean {}, std {})",
                self.median.len(),
                n,
                self.std.len()
            )));
        }
        if width != n {
            return Err(PipelineError::Inference(format!(
                "expected {} features, got {}",
                n, width
            )));
        }
        Ok(())
    }

    /// Impute and scale a single row.
    pub fn transform_row(&self, row: &[f64]) -> Result<Vec<f64>> {
        self.check_width(row.len())?;
        Ok(row
            .iter()
            .enumerate()
            .map(|(c, &v)| {
                let v = if v.is_nan() { self.median[c] } else { v };
                (v - self.mean[c]) / self.std[c]
            })
            .collect())
    }
}

/// Median of the non-missing values, or `None` when every value is missing.
pub fn median(values: &[f64]) -> Option<f64> {
    let mut present: Vec<f64> = values.iter().copied().filter(|v| !v.is_nan()).collect();
    if present.is_empty() {
        return None;
    }
    present.sort_by(|a, b| a.total_cmp(b));
    let mid = present.len() / 2;
    if present.len() % 2 == 0 {
        Some((present[mid - 1] + present[mid]) / 2.0)
    } else {
        Some(present[mid])
    }
}

/// Fit a [`Preprocessor`] from an `Array2<f64>` where rows are samples and
/// columns are features. Missing values are `NaN`.
pub fn fit_preprocessor(x: &Array2<f64>) -> Result<Preprocessor> {
    let (nrows, ncols) = x.dim();
    if nrows == 0 || ncols == 0 {
        return Err(PipelineError::InvalidTrainingData(
            "cannot fit preprocessing on an empty matrix".to_string(),
        ));
    }

    let mut medians = Vec::with_capacity(ncols);
    for (c, column) in x.columns().into_iter().enumerate() {
        let values = column.to_vec();
        let m = median(&values).ok_or_else(|| {
            PipelineError::InvalidTrainingData(format!(
                "feature column {} has no values in the training split",
                c
            ))
        })?;
        medians.push(m);
    }

    let imputed = impute(x, &medians);
    let nrows_f = nrows as f64;

    let mut mean = vec![0.0f64; ncols];
    let mut std = vec![0.0f64; ncols];
    for (c, column) in imputed.columns().into_iter().enumerate() {
        mean[c] = column.sum() / nrows_f;
        let var = column.iter().map(|v| (v - mean[c]).powi(2)).sum::<f64>() / nrows_f;
        let sd = var.sqrt();
        std[c] = if sd < Preprocessor::MIN_STD { 1.0 } else { sd };
    }

    Ok(Preprocessor {
        median: medians,
        mean,
        std,
    })
}

/// Replace `NaN` cells with the per-column medians.
pub fn impute(x: &Array2<f64>, medians: &[f64]) -> Array2<f64> {
    let mut out = x.clone();
    for ((_, c), v) in out.indexed_iter_mut() {
        if v.is_nan() {
            *v = medians[c];
        }
    }
    out
}

/// Transform all rows using the provided [`Preprocessor`].
pub fn transform_all(x: &Array2<f64>, pre: &Preprocessor) -> Result<Array2<f64>> {
    pre.check_width(x.ncols())?;
    let mut out = impute(x, &pre.median);
    for ((_, c), v) in out.indexed_iter_mut() {
        *v = (*v - pre.mean[c]) / pre.std[c];
    }
    Ok(out)
}

/// Fit the preprocessor and return it with the transformed matrix.
pub fn fit_transform(x: &Array2<f64>) -> Result<(Preprocessor, Array2<f64>)> {
    let pre = fit_preprocessor(x)?;
    let transformed = transform_all(x, &pre)?;
    Ok((pre, transformed))
}

use ndarray::Array2;

use crate::error::Result;

/// Probability above which a sample is classified as a pass.
pub const DECISION_THRESHOLD: f64 = 0.5;

/// Hard binary decision (1 = pass) for a pass-class probability.
pub fn decision(probability: f64) -> u8 {
    if probability > DECISION_THRESHOLD {
        1
    } else {
        0
    }
}

/// A small trait abstraction for the binary classifiers a pipeline can hold.
/// Rows of `x` are already imputed and standardized.
pub trait ClassifierModel {
    /// Fit the model. `y` uses the crate convention (1 for pass, 0 for fail).
    fn fit(&mut self, x: &Array2<f64>, y: &[u8]) -> Result<()>;

    /// Predict the pass-class probability (0..1) for every row.
    fn predict_proba(&self, x: &Array2<f64>) -> Result<Vec<f64>>;

    /// Predict hard labels (1 for pass, 0 for fail).
    fn predict(&self, x: &Array2<f64>) -> Result<Vec<u8>> {
        Ok(self
            .predict_proba(x)?
            .into_iter()
            .map(decision)
            .collect())
    }

    /// Optional human readable name for the model
    fn name(&self) -> &str {
        "classifier"
    }
}

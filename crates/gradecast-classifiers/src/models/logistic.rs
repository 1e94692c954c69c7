use linfa::traits::{Fit, Predict};
use linfa::Dataset;
use linfa_logistic::LogisticRegression;
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};

use crate::config::{ModelConfig, ModelType};
use crate::error::{PipelineError, Result};
use crate::models::classifier_trait::ClassifierModel;

/// Learned weights of a binary logistic regression.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LinearCoefficients {
    pub weights: Vec<f64>,
    pub intercept: f64,
}

/// L2-regularized logistic regression fitted with linfa.
///
/// Only the coefficients are kept after fitting; inference is a dot product
/// and a sigmoid, so serving does not depend on the optimizer.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LogisticClassifier {
    coefficients: Option<LinearCoefficients>,
    params: ModelConfig,
}

impl LogisticClassifier {
    pub fn new(params: ModelConfig) -> Self {
        LogisticClassifier {
            coefficients: None,
            params,
        }
    }

    pub fn coefficients(&self) -> Option<&LinearCoefficients> {
        self.coefficients.as_ref()
    }
}

fn sigmoid(z: f64) -> f64 {
    1.0 / (1.0 + (-z).exp())
}

impl ClassifierModel for LogisticClassifier {
    fn fit(&mut self, x: &Array2<f64>, y: &[u8]) -> Result<()> {
        let (max_iterations, alpha) = match &self.params.model_type {
            ModelType::Logistic {
                max_iterations,
                alpha,
            } => (*max_iterations, *alpha),
            other => {
                return Err(PipelineError::Fit {
                    model: self.name().to_string(),
                    reason: format!("expected Logistic params, got {:?}", other),
                })
            }
        };

        if x.nrows() != y.len() {
            return Err(PipelineError::Fit {
                model: self.name().to_string(),
                reason: format!("{} rows but {} labels", x.nrows(), y.len()),
            });
        }

        let targets: Array1<bool> = y.iter().map(|&l| l == 1).collect();
        let dataset = Dataset::new(x.to_owned(), targets);

        log::debug!(
            "Fitting logistic regression: alpha {}, max {} iterations",
            alpha,
            max_iterations
        );
        let fitted = LogisticRegression::default()
            .alpha(alpha)
            .max_iterations(max_iterations)
            .fit(&dataset)
            .map_err(|e: linfa_logistic::error::Error| PipelineError::Fit {
                model: self.name().to_string(),
                reason: e.to_string(),
            })?;

        // linfa picks its positive class from the data, so orient the
        // coefficients such that a positive margin always means pass
        let mut weights = fitted.params().to_owned();
        let mut intercept = fitted.intercept();
        let decided: Array1<bool> = fitted.predict(dataset.records());
        let margins = dataset.records().dot(&weights) + intercept;
        let anchor = (0..margins.len())
            .max_by(|&a, &b| margins[a].abs().total_cmp(&margins[b].abs()));
        if let Some(i) = anchor {
            if (margins[i] > 0.0) != decided[i] {
                weights.mapv_inplace(|w| -w);
                intercept = -intercept;
            }
        }

        self.coefficients = Some(LinearCoefficients {
            weights: weights.to_vec(),
            intercept,
        });
        Ok(())
    }

    fn predict_proba(&self, x: &Array2<f64>) -> Result<Vec<f64>> {
        let coef = self.coefficients.as_ref().ok_or_else(|| {
            PipelineError::Inference("logistic classifier has not been fitted".to_string())
        })?;
        if coef.weights.len() != x.ncols() {
            return Err(PipelineError::Inference(format!(
                "logistic classifier expects {} features, got {}",
                coef.weights.len(),
                x.ncols()
            )));
        }
        let weights = Array1::from_vec(coef.weights.clone());
        Ok(x
            .dot(&weights)
            .iter()
            .map(|z| sigmoid(z + coef.intercept))
            .collect())
    }

    fn name(&self) -> &str {
        "logistic"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn toy_data() -> (Array2<f64>, Vec<u8>) {
        let x = Array2::from_shape_fn((40, 2), |(r, c)| {
            let t = r as f64 / 39.0 * 4.0 - 2.0;
            if c == 0 {
                t
            } else {
                ((r * 7) % 5) as f64 * 0.1
            }
        });
        let y = (0..40).map(|r| if r >= 20 { 1 } else { 0 }).collect();
        (x, y)
    }

    #[test]
    fn test_logistic_classifier() {
        let (x, y) = toy_data();
        let mut classifier = LogisticClassifier::new(ModelConfig::new(ModelType::logistic()));
        classifier.fit(&x, &y).unwrap();

        let coef = classifier.coefficients().unwrap();
        assert!(coef.weights[0] > 0.0, "weights: {:?}", coef.weights);

        let probabilities = classifier.predict_proba(&x).unwrap();
        assert!(probabilities.iter().all(|p| (0.0..=1.0).contains(p)));
        assert!(probabilities[0] < 0.5);
        assert!(probabilities[39] > 0.5);
    }

    #[test]
    fn wrong_width_is_an_inference_error() {
        let (x, y) = toy_data();
        let mut classifier = LogisticClassifier::new(ModelConfig::new(ModelType::logistic()));
        classifier.fit(&x, &y).unwrap();
        let wide = Array2::zeros((1, 3));
        assert!(matches!(
            classifier.predict_proba(&wide),
            Err(PipelineError::Inference(_))
        ));
    }

    #[test]
    fn sigmoid_is_centered() {
        assert_eq!(sigmoid(0.0), 0.5);
        assert!(sigmoid(10.0) > 0.99);
    }
}

use ndarray::Array2;
use serde::{Deserialize, Serialize};

use crate::config::{ModelConfig, ModelType};
use crate::error::Result;
use crate::models::classifier_trait::ClassifierModel;
use crate::models::gbdt::GBDTClassifier;
use crate::models::logistic::LogisticClassifier;

/// Every classifier a pipeline can carry. Serialized as part of the artifact.
#[derive(Serialize, Deserialize)]
pub enum Classifier {
    GBDT(GBDTClassifier),
    Logistic(LogisticClassifier),
}

/// Build an unfitted classifier from a `ModelConfig`.
/// Currently this is a thin factory implemented as a single function.
pub fn build_model(params: ModelConfig) -> Classifier {
    match params.model_type {
        ModelType::GBDT { .. } => Classifier::GBDT(GBDTClassifier::new(params)),
        ModelType::Logistic { .. } => Classifier::Logistic(LogisticClassifier::new(params)),
    }
}

impl ClassifierModel for Classifier {
    fn fit(&mut self, x: &Array2<f64>, y: &[u8]) -> Result<()> {
        match self {
            Classifier::GBDT(m) => m.fit(x, y),
            Classifier::Logistic(m) => m.fit(x, y),
        }
    }

    fn predict_proba(&self, x: &Array2<f64>) -> Result<Vec<f64>> {
        match self {
            Classifier::GBDT(m) => m.predict_proba(x),
            Classifier::Logistic(m) => m.predict_proba(x),
        }
    }

    fn name(&self) -> &str {
        match self {
            Classifier::GBDT(m) => m.name(),
            Classifier::Logistic(m) => m.name(),
        }
    }
}

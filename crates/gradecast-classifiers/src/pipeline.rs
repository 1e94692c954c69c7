//! The fitted preprocessing + classifier pipeline and its on-disk artifact.
//!
//! A [`Pipeline`] is produced once by [`Pipeline::fit`], written to a single
//! JSON file with [`Pipeline::save`] and read back with [`Pipeline::load`].
//! It is never mutated after fitting. The artifact carries a format version
//! and the ordered feature names; loading rejects either one drifting from
//! what this build serves.
use std::fmt;
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use chrono::{DateTime, Utc};
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};

use crate::config::ModelConfig;
use crate::data_handling::{FeatureVector, FEATURE_COLUMNS};
use crate::error::{PipelineError, Result};
use crate::models::classifier_trait::{decision, ClassifierModel};
use crate::models::factory::{build_model, Classifier};
use crate::preprocessing::{fit_preprocessor, transform_all, Preprocessor};

/// Version of the artifact layout written by this build.
pub const FORMAT_VERSION: u32 = 2;

/// Default artifact path used by both the trainer and the service.
pub const DEFAULT_MODEL_PATH: &str = "model.json";

/// Binary outcome of a prediction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PassFail {
    Pass,
    Fail,
}

impl PassFail {
    pub fn from_label(label: u8) -> Self {
        if label == 1 {
            PassFail::Pass
        } else {
            PassFail::Fail
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PassFail::Pass => "pass",
            PassFail::Fail => "fail",
        }
    }
}

impl fmt::Display for PassFail {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Label plus the model's probability of the pass class.
///
/// `probability` is always P(pass), also when `label` is [`PassFail::Fail`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    #[serde(rename = "prediction")]
    pub label: PassFail,
    pub probability: f64,
}

/// Only the fields needed to decide whether the full artifact is readable.
#[derive(Deserialize)]
struct ArtifactHeader {
    format_version: u32,
}

#[derive(Serialize, Deserialize)]
pub struct Pipeline {
    format_version: u32,
    feature_names: Vec<String>,
    pass_threshold: f64,
    trained_at: DateTime<Utc>,
    model_config: ModelConfig,
    preprocessor: Preprocessor,
    classifier: Classifier,
}

impl Pipeline {
    /// Fit preprocessing on `x_train`, then the configured classifier on the
    /// transformed rows.
    pub fn fit(
        x_train: &Array2<f64>,
        y_train: &Array1<u8>,
        config: &ModelConfig,
        pass_threshold: f64,
    ) -> Result<Self> {
        if x_train.ncols() != FEATURE_COLUMNS.len() {
            return Err(PipelineError::InvalidTrainingData(format!(
                "expected {} feature columns, got {}",
                FEATURE_COLUMNS.len(),
                x_train.ncols()
            )));
        }
        if x_train.nrows() != y_train.len() {
            return Err(PipelineError::InvalidTrainingData(format!(
                "{} feature rows but {} labels",
                x_train.nrows(),
                y_train.len()
            )));
        }
        let n_pass = y_train.iter().filter(|&&l| l == 1).count();
        if n_pass == 0 || n_pass == y_train.len() {
            let only = if n_pass == 0 { "fail" } else { "pass" };
            return Err(PipelineError::InvalidTrainingData(format!(
                "training split only contains `{}` rows; both classes are required",
                only
            )));
        }

        let preprocessor = fit_preprocessor(x_train)?;
        let x_scaled = transform_all(x_train, &preprocessor)?;

        let mut classifier = build_model(config.clone());
        let labels = y_train.to_vec();
        classifier.fit(&x_scaled, &labels)?;
        log::info!(
            "Fitted {} classifier on {} rows",
            classifier.name(),
            x_train.nrows()
        );

        Ok(Pipeline {
            format_version: FORMAT_VERSION,
            feature_names: FEATURE_COLUMNS.iter().map(|c| c.to_string()).collect(),
            pass_threshold,
            trained_at: Utc::now(),
            model_config: config.clone(),
            preprocessor,
            classifier,
        })
    }

    /// Pass-class probability for every row of raw (untransformed) features.
    pub fn predict_proba(&self, x: &Array2<f64>) -> Result<Vec<f64>> {
        if x.iter().any(|v| v.is_infinite()) {
            return Err(PipelineError::Inference(
                "features must be finite numbers".to_string(),
            ));
        }
        let x_scaled = transform_all(x, &self.preprocessor)?;
        self.classifier.predict_proba(&x_scaled)
    }

    /// Hard labels (1 for pass) for every row of raw features.
    pub fn predict(&self, x: &Array2<f64>) -> Result<Vec<u8>> {
        Ok(self
            .predict_proba(x)?
            .into_iter()
            .map(decision)
            .collect())
    }

    /// Classify one student.
    pub fn predict_one(&self, features: &FeatureVector) -> Result<Prediction> {
        let probability = self
            .predict_proba(&features.to_matrix())?
            .into_iter()
            .next()
            .ok_or_else(|| PipelineError::Inference("model returned no prediction".to_string()))?;
        Ok(Prediction {
            label: PassFail::from_label(decision(probability)),
            probability,
        })
    }

    pub fn model_name(&self) -> &str {
        self.classifier.name()
    }

    pub fn model_config(&self) -> &ModelConfig {
        &self.model_config
    }

    pub fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    pub fn pass_threshold(&self) -> f64 {
        self.pass_threshold
    }

    pub fn trained_at(&self) -> DateTime<Utc> {
        self.trained_at
    }

    /// Write the artifact to `path`, replacing any existing file.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let io_err = |source: std::io::Error| PipelineError::ArtifactIo {
            path: path.to_path_buf(),
            source,
        };

        let file = File::create(path).map_err(io_err)?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer(&mut writer, self).map_err(|e| io_err(e.into()))?;
        writer.flush().map_err(io_err)?;
        log::info!("Saved {} pipeline to {}", self.model_name(), path.display());
        Ok(())
    }

    /// Read an artifact written by [`Pipeline::save`] and check that it matches
    /// this build's format version and feature order.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| PipelineError::ArtifactIo {
            path: path.to_path_buf(),
            source,
        })?;
        let value: serde_json::Value =
            serde_json::from_reader(BufReader::new(file)).map_err(|source| {
                PipelineError::ArtifactCorrupt {
                    path: path.to_path_buf(),
                    source,
                }
            })?;

        let header: ArtifactHeader =
            serde_json::from_value(value.clone()).map_err(|source| {
                PipelineError::ArtifactCorrupt {
                    path: path.to_path_buf(),
                    source,
                }
            })?;
        if header.format_version != FORMAT_VERSION {
            return Err(PipelineError::ArtifactIncompatible(format!(
                "format version {} is not supported (expected {})",
                header.format_version, FORMAT_VERSION
            )));
        }

        let pipeline: Pipeline =
            serde_json::from_value(value).map_err(|source| PipelineError::ArtifactCorrupt {
                path: path.to_path_buf(),
                source,
            })?;
        pipeline.check_schema()?;
        Ok(pipeline)
    }

    fn check_schema(&self) -> Result<()> {
        let expected: Vec<&str> = FEATURE_COLUMNS.to_vec();
        let found: Vec<&str> = self.feature_names.iter().map(String::as_str).collect();
        if found != expected {
            return Err(PipelineError::ArtifactIncompatible(format!(
                "artifact features [{}] do not match served features [{}]",
                found.join(", "),
                expected.join(", ")
            )));
        }
        if self.preprocessor.n_features() != expected.len() {
            return Err(PipelineError::ArtifactIncompatible(format!(
                "preprocessor was fit on {} features, expected {}",
                self.preprocessor.n_features(),
                expected.len()
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ModelType;

    /// Rows whose label is a pure function of `total_score`.
    fn synthetic(n: usize) -> (Array2<f64>, Array1<u8>) {
        let x = Array2::from_shape_fn((n, 4), |(r, c)| {
            let score = 20.0 + 75.0 * r as f64 / (n - 1) as f64;
            match c {
                0 => 1.0 + score / 12.0 + 0.3 * (((r * 37) % 11) as f64 - 5.0),
                1 => 55.0 + score / 2.5 + 0.7 * (((r * 53) % 13) as f64 - 6.0),
                2 => ((r * 7) % 5) as f64 + 1.0,
                _ => score,
            }
        });
        let y = x.column(3).iter().map(|&s| (s >= 50.0) as u8).collect();
        (x, y)
    }

    #[test]
    fn single_class_training_split_is_rejected() {
        let (x, _) = synthetic(10);
        let y = Array1::from_elem(10, 1u8);
        let err = Pipeline::fit(&x, &y, &ModelConfig::default(), 50.0)
            .err()
            .expect("fit must fail");
        assert!(matches!(err, PipelineError::InvalidTrainingData(_)));
    }

    #[test]
    fn wrong_feature_count_is_rejected() {
        let x = Array2::zeros((4, 3));
        let y = Array1::from_vec(vec![0, 1, 0, 1]);
        assert!(Pipeline::fit(&x, &y, &ModelConfig::default(), 50.0).is_err());
    }

    #[test]
    fn predictions_are_deterministic_for_both_models() {
        let (x, y) = synthetic(40);
        let student = FeatureVector {
            weekly_self_study_hours: 5.0,
            attendance_percentage: 85.0,
            class_participation: 4.0,
            total_score: 67.5,
        };
        for model in [ModelType::gbdt(), ModelType::logistic()] {
            let pipeline = Pipeline::fit(&x, &y, &ModelConfig::new(model), 50.0).unwrap();
            let a = pipeline.predict_one(&student).unwrap();
            let b = pipeline.predict_one(&student).unwrap();
            assert_eq!(a.probability.to_bits(), b.probability.to_bits());
            assert_eq!(a.label, PassFail::Pass);
            assert!(a.probability > 0.5);
        }
    }

    #[test]
    fn infinite_features_are_an_inference_error() {
        let (x, y) = synthetic(20);
        let pipeline = Pipeline::fit(&x, &y, &ModelConfig::default(), 50.0).unwrap();
        let student = FeatureVector {
            weekly_self_study_hours: f64::INFINITY,
            attendance_percentage: 85.0,
            class_participation: 4.0,
            total_score: 67.5,
        };
        assert!(matches!(
            pipeline.predict_one(&student),
            Err(PipelineError::Inference(_))
        ));
    }

    #[test]
    fn prediction_serializes_with_wire_names() {
        let p = Prediction {
            label: PassFail::Fail,
            probability: 0.25,
        };
        let json = serde_json::to_value(p).unwrap();
        assert_eq!(json["prediction"], "fail");
        assert_eq!(json["probability"], 0.25);
    }
}

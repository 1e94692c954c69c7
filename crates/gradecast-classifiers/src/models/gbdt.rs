use gbdt::config::Config;
use gbdt::decision_tree::{Data, DataVec};
use gbdt::gradient_boost::GBDT;
use ndarray::Array2;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

use crate::config::{ModelConfig, ModelType};
use crate::error::{PipelineError, Result};
use crate::models::classifier_trait::ClassifierModel;

/// One booster of the ensemble and the columns it was trained on.
#[derive(Serialize, Deserialize)]
struct EnsembleMember {
    features: Vec<usize>,
    model: GBDT,
}

/// Gradient Boosting Decision Tree (GBDT) classifier
///
/// A bag of log-likelihood boosters whose pass probabilities are averaged.
/// Member `i` is trained on a column subset drawn from `seed + i`. The
/// boosters' own row and feature sampling stays off, so a refit with the
/// same seed reproduces the model.
#[derive(Serialize, Deserialize)]
pub struct GBDTClassifier {
    members: Vec<EnsembleMember>,
    params: ModelConfig,
}

impl GBDTClassifier {
    pub fn new(params: ModelConfig) -> Self {
        GBDTClassifier {
            members: Vec::new(),
            params,
        }
    }

    pub fn is_fitted(&self) -> bool {
        !self.members.is_empty()
    }

    /// Column indices used by each member, in member order.
    pub fn member_features(&self) -> Vec<&[usize]> {
        self.members.iter().map(|m| m.features.as_slice()).collect()
    }
}

/// Sorted subset of `ceil(fraction * n_features)` columns, at least one.
fn sample_features(n_features: usize, fraction: f64, seed: u64) -> Vec<usize> {
    let k = ((fraction * n_features as f64).ceil() as usize).clamp(1, n_features);
    let mut rng = StdRng::seed_from_u64(seed);
    let mut features = rand::seq::index::sample(&mut rng, n_features, k).into_vec();
    features.sort_unstable();
    features
}

fn to_data_vec(x: &Array2<f64>, features: &[usize], y: Option<&[u8]>) -> DataVec {
    let mut data = DataVec::with_capacity(x.nrows());
    for (i, row) in x.rows().into_iter().enumerate() {
        let values = features.iter().map(|&c| row[c] as f32).collect();
        // log-likelihood loss expects labels in {-1, 1}
        let label = match y {
            Some(y) if y[i] == 1 => 1.0,
            Some(_) => -1.0,
            None => 0.0,
        };
        data.push(Data::new_training_data(values, 1.0, label, None));
    }
    data
}

impl ClassifierModel for GBDTClassifier {
    fn fit(&mut self, x: &Array2<f64>, y: &[u8]) -> Result<()> {
        if x.nrows() != y.len() {
            return Err(PipelineError::Fit {
                model: self.name().to_string(),
                reason: format!("{} rows but {} labels", x.nrows(), y.len()),
            });
        }
        if x.ncols() == 0 {
            return Err(PipelineError::Fit {
                model: self.name().to_string(),
                reason: "no feature columns".to_string(),
            });
        }

        match &self.params.model_type {
            ModelType::GBDT {
                num_trees,
                max_depth,
                learning_rate,
                min_leaf_size,
                training_optimization_level,
                num_members,
                feature_fraction,
            } => {
                if *num_members == 0 || !(*feature_fraction > 0.0 && *feature_fraction <= 1.0) {
                    return Err(PipelineError::Fit {
                        model: self.name().to_string(),
                        reason: format!(
                            "need at least one member and a feature fraction in (0, 1], got {} and {}",
                            num_members, feature_fraction
                        ),
                    });
                }

                log::debug!(
                    "Fitting GBDT ensemble: {} members x {} trees, max depth {}, shrinkage {}",
                    num_members,
                    num_trees,
                    max_depth,
                    learning_rate
                );

                let mut members = Vec::with_capacity(*num_members as usize);
                for i in 0..*num_members {
                    let features = sample_features(
                        x.ncols(),
                        *feature_fraction,
                        self.params.seed.wrapping_add(i as u64),
                    );

                    let mut config = Config::new();
                    config.set_feature_size(features.len());
                    config.set_shrinkage(*learning_rate);
                    config.set_max_depth(*max_depth);
                    config.set_iterations(*num_trees as usize);
                    config.set_min_leaf_size(*min_leaf_size);
                    config.set_data_sample_ratio(1.0);
                    config.set_feature_sample_ratio(1.0);
                    config.set_debug(false);
                    config.set_training_optimization_level(*training_optimization_level);
                    config.set_loss("LogLikelyhood");

                    let mut gbdt = GBDT::new(&config);
                    let mut train_x = to_data_vec(x, &features, Some(y));
                    gbdt.fit(&mut train_x);

                    members.push(EnsembleMember {
                        features,
                        model: gbdt,
                    });
                }

                self.members = members;
                log::debug!("GBDT member columns: {:?}", self.member_features());
                Ok(())
            }
            other => Err(PipelineError::Fit {
                model: self.name().to_string(),
                reason: format!("expected GBDT params, got {:?}", other),
            }),
        }
    }

    fn predict_proba(&self, x: &Array2<f64>) -> Result<Vec<f64>> {
        if !self.is_fitted() {
            return Err(PipelineError::Inference(
                "GBDT classifier has not been fitted".to_string(),
            ));
        }

        let mut totals = vec![0.0f64; x.nrows()];
        for member in &self.members {
            if let Some(&c) = member.features.iter().find(|&&c| c >= x.ncols()) {
                return Err(PipelineError::Inference(format!(
                    "GBDT member expects column {} but input has {} columns",
                    c,
                    x.ncols()
                )));
            }
            let test_x = to_data_vec(x, &member.features, None);
            for (total, p) in totals.iter_mut().zip(member.model.predict(&test_x)) {
                *total += (p as f64).clamp(0.0, 1.0);
            }
        }

        let n = self.members.len() as f64;
        Ok(totals.into_iter().map(|t| (t / n).clamp(0.0, 1.0)).collect())
    }

    fn name(&self) -> &str {
        "gbdt"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::classifier_trait::decision;

    fn toy_data() -> (Array2<f64>, Vec<u8>) {
        // second feature perfectly separates the classes
        let x = Array2::from_shape_fn((20, 3), |(r, c)| match c {
            0 => (r % 5) as f64 * 0.1,
            1 => {
                if r % 2 == 0 {
                    1.0
                } else {
                    -1.0
                }
            }
            _ => 0.5,
        });
        let y = (0..20).map(|r| if r % 2 == 0 { 1 } else { 0 }).collect();
        (x, y)
    }

    #[test]
    fn test_gbdt_classifier() {
        let (x, y) = toy_data();

        let mut classifier = GBDTClassifier::new(ModelConfig::new(ModelType::gbdt()));
        classifier.fit(&x, &y).unwrap();

        let probabilities = classifier.predict_proba(&x).unwrap();
        assert_eq!(probabilities.len(), y.len());
        assert!(probabilities.iter().all(|p| (0.0..=1.0).contains(p)));

        let predicted: Vec<u8> = probabilities.iter().map(|&p| decision(p)).collect();
        assert_eq!(predicted, y);
    }

    #[test]
    fn unfitted_model_refuses_to_predict() {
        let (x, y) = toy_data();
        let mut classifier = GBDTClassifier::new(ModelConfig::default());
        assert!(!classifier.is_fitted());
        assert!(matches!(
            classifier.predict_proba(&x),
            Err(PipelineError::Inference(_))
        ));

        classifier.fit(&x, &y).unwrap();
        assert!(classifier.is_fitted());
        assert!(classifier.predict_proba(&x).is_ok());
    }

    #[test]
    fn feature_subsets_are_seeded_and_vary_by_member() {
        let n_features = 8;
        let subsets: Vec<Vec<usize>> = (0..5)
            .map(|i| sample_features(n_features, 0.5, 42 + i))
            .collect();

        for subset in &subsets {
            assert_eq!(subset.len(), 4);
            assert!(subset.windows(2).all(|w| w[0] < w[1]));
            assert!(subset.iter().all(|&c| c < n_features));
        }
        assert!(subsets.iter().any(|s| s != &subsets[0]));
        assert_eq!(sample_features(n_features, 0.5, 43), subsets[1]);
        assert_eq!(sample_features(3, 0.01, 1), sample_features(3, 0.01, 1));
        assert_eq!(sample_features(3, 0.01, 1).len(), 1);
        assert_eq!(sample_features(3, 1.0, 9), vec![0, 1, 2]);
    }

    #[test]
    fn ensemble_fit_is_reproducible() {
        let (x, y) = toy_data();
        let mut a = GBDTClassifier::new(ModelConfig::default());
        let mut b = GBDTClassifier::new(ModelConfig::default());
        a.fit(&x, &y).unwrap();
        b.fit(&x, &y).unwrap();

        assert_eq!(a.member_features(), b.member_features());
        assert_eq!(a.member_features().len(), 5);
        let pa = a.predict_proba(&x).unwrap();
        let pb = b.predict_proba(&x).unwrap();
        assert_eq!(
            pa.iter().map(|p| p.to_bits()).collect::<Vec<_>>(),
            pb.iter().map(|p| p.to_bits()).collect::<Vec<_>>()
        );
    }

    #[test]
    fn one_dominant_column_does_not_decide_every_member() {
        // Both columns separate the training rows perfectly. The query row
        // disagrees between them, so a model that only ever split on
        // column 0 would give it a probability near zero.
        let x = Array2::from_shape_fn((40, 2), |(r, _)| {
            let magnitude = 1.0 + (r % 3) as f64 * 0.1;
            if r >= 20 {
                magnitude
            } else {
                -magnitude
            }
        });
        let y: Vec<u8> = (0..40).map(|r| (r >= 20) as u8).collect();

        let params = ModelConfig::new(ModelType::GBDT {
            num_trees: 20,
            max_depth: 3,
            learning_rate: 0.1,
            min_leaf_size: 1,
            training_optimization_level: 2,
            num_members: 16,
            feature_fraction: 0.5,
        });
        let mut classifier = GBDTClassifier::new(params);
        classifier.fit(&x, &y).unwrap();

        let members = classifier.member_features();
        assert!(members.iter().all(|f| f.len() == 1));
        assert!(members.iter().any(|f| **f == [0]));
        assert!(members.iter().any(|f| **f == [1]));

        let query = Array2::from_shape_vec((1, 2), vec![-1.0, 1.0]).unwrap();
        let p = classifier.predict_proba(&query).unwrap()[0];
        assert!(p > 0.05, "every member followed column 0: p = {}", p);
        assert!(p < 0.95, "every member followed column 1: p = {}", p);
    }

    #[test]
    fn narrower_input_is_an_inference_error() {
        let (x, y) = toy_data();
        let mut classifier = GBDTClassifier::new(ModelConfig::default());
        classifier.fit(&x, &y).unwrap();
        let narrow = Array2::<f64>::zeros((2, 2));
        assert!(matches!(
            classifier.predict_proba(&narrow),
            Err(PipelineError::Inference(_))
        ));
    }

    #[test]
    fn logistic_params_are_rejected() {
        let (x, y) = toy_data();
        let mut classifier = GBDTClassifier::new(ModelConfig::new(ModelType::logistic()));
        assert!(matches!(
            classifier.fit(&x, &y),
            Err(PipelineError::Fit { .. })
        ));
    }
}

use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Seed shared by the train/held-out split and any seeded model backend.
pub const DEFAULT_SEED: u64 = 42;

/// Central configuration for models in the crate.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct ModelConfig {
    pub seed: u64,

    #[serde(flatten)]
    pub model_type: ModelType,
}

/// Supported model types and their hyper-parameters.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub enum ModelType {
    /// Bagged ensemble of gradient-boosted tree models.
    ///
    /// Each of the `num_members` boosters runs `num_trees` rounds on its own
    /// seeded subset of `feature_fraction` of the columns.
    GBDT {
        num_trees: u32,
        max_depth: u32,
        learning_rate: f32,
        min_leaf_size: usize,
        training_optimization_level: u8,
        #[serde(default = "default_num_members")]
        num_members: u32,
        #[serde(default = "default_feature_fraction")]
        feature_fraction: f64,
    },
    /// L2-regularized logistic regression.
    Logistic { max_iterations: u64, alpha: f64 },
}

fn default_num_members() -> u32 {
    5
}

fn default_feature_fraction() -> f64 {
    0.75
}

impl Default for ModelType {
    fn default() -> Self {
        ModelType::gbdt()
    }
}

impl ModelType {
    pub fn gbdt() -> Self {
        ModelType::GBDT {
            num_trees: 100,
            max_depth: 4,
            learning_rate: 0.1,
            min_leaf_size: 1,
            training_optimization_level: 2,
            num_members: default_num_members(),
            feature_fraction: default_feature_fraction(),
        }
    }

    pub fn logistic() -> Self {
        ModelType::Logistic {
            max_iterations: 200,
            alpha: 1.0,
        }
    }

    /// Short name used in logs, reports and file names.
    pub fn name(&self) -> &'static str {
        match self {
            ModelType::GBDT { .. } => "gbdt",
            ModelType::Logistic { .. } => "logistic",
        }
    }
}

impl FromStr for ModelType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "gbdt" | "random_forest" | "ensemble" => Ok(ModelType::gbdt()),
            "logistic" | "linear" => Ok(ModelType::logistic()),
            _ => Err(format!(
                "Unknown model type: {}. Valid options are: gbdt (alias random_forest), logistic",
                s
            )),
        }
    }
}

impl ModelConfig {
    pub fn new(model_type: ModelType) -> Self {
        Self {
            seed: DEFAULT_SEED,
            model_type,
        }
    }
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self::new(ModelType::default())
    }
}

use anyhow::{Context, Result};
use clap::ArgMatches;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::str::FromStr;

use gradecast_classifiers::config::{ModelConfig, ModelType};
use gradecast_classifiers::data_handling::{DEFAULT_PASS_THRESHOLD, DEFAULT_TEST_FRACTION};
use gradecast_classifiers::pipeline::DEFAULT_MODEL_PATH;

use crate::util::validate_tsv_or_csv_file;

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct TrainConfig {
    pub version: String,
    pub train_data: String,
    /// Where the fitted pipeline artifact is written. Overwritten if present.
    pub output_file: String,
    pub model: ModelConfig,
    /// Students scoring at or above this `total_score` are labelled pass.
    pub pass_threshold: f64,
    pub test_fraction: f64,
    /// Optional HTML report with held-out metrics and plots.
    pub report_file: Option<String>,
}

impl Default for TrainConfig {
    fn default() -> Self {
        TrainConfig {
            version: clap::crate_version!().to_string(),
            train_data: String::new(),
            output_file: String::from(DEFAULT_MODEL_PATH),
            model: ModelConfig::default(),
            pass_threshold: DEFAULT_PASS_THRESHOLD,
            test_fraction: DEFAULT_TEST_FRACTION,
            report_file: None,
        }
    }
}

impl TrainConfig {
    /// Build a config from an optional JSON file, then apply CLI overrides.
    pub fn from_arguments(config_path: Option<&PathBuf>, matches: &ArgMatches) -> Result<Self> {
        let mut config = match config_path {
            Some(path) => {
                let config_json = fs::read_to_string(path)
                    .with_context(|| format!("Failed to read config file: {}", path.display()))?;
                TrainConfig::from_json(&config_json)?
            }
            None => TrainConfig::default(),
        };

        if let Some(train_data) = matches.get_one::<String>("csv") {
            config.train_data = train_data.clone();
        }
        if let Some(model_type) = matches.get_one::<String>("model_type") {
            let requested = ModelType::from_str(model_type).map_err(anyhow::Error::msg)?;
            // keep hyperparameters from the file when the family is unchanged
            if requested.name() != config.model.model_type.name() {
                config.model.model_type = requested;
            }
        }
        if let Some(threshold) = matches.get_one::<f64>("threshold") {
            config.pass_threshold = *threshold;
        }
        if let Some(output_file) = matches.get_one::<String>("output_file") {
            config.output_file = output_file.clone();
        }
        if let Some(report_file) = matches.get_one::<String>("report_file") {
            config.report_file = Some(report_file.clone());
        }

        config.validate()?;
        Ok(config)
    }

    /// Parse a (possibly partial) JSON config. Missing or invalid fields keep
    /// their defaults and are reported with a warning.
    pub fn from_json(config_json: &str) -> Result<Self> {
        let partial: serde_json::Value =
            serde_json::from_str(config_json).context("Config file is not valid JSON")?;
        let mut config = TrainConfig::default();

        macro_rules! load_or_default {
            ($field:ident) => {
                if let Some(val) = partial.get(stringify!($field)) {
                    if let Ok(parsed) = serde_json::from_value(val.clone()) {
                        config.$field = parsed;
                    } else {
                        log::warn!(
                            "Config Invalid value for '{}', using default: {:?}",
                            stringify!($field),
                            config.$field
                        );
                    }
                } else {
                    log::warn!(
                        "Config Missing field '{}', using default: {:?}",
                        stringify!($field),
                        config.$field
                    );
                }
            };
        }

        load_or_default!(train_data);
        load_or_default!(output_file);
        load_or_default!(model);
        load_or_default!(pass_threshold);
        load_or_default!(test_fraction);
        load_or_default!(report_file);

        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.train_data.is_empty() {
            anyhow::bail!("No training data given. Pass --csv <path> or set `train_data` in the config file.");
        }
        validate_tsv_or_csv_file(&self.train_data)?;
        if !self.pass_threshold.is_finite() {
            anyhow::bail!("Pass threshold must be a finite number, got {}", self.pass_threshold);
        }
        if !(self.test_fraction > 0.0 && self.test_fraction < 1.0) {
            anyhow::bail!("test_fraction must be in (0, 1), got {}", self.test_fraction);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::{Arg, Command};

    fn command() -> Command {
        Command::new("train")
            .arg(Arg::new("csv").long("csv"))
            .arg(Arg::new("model_type").long("model"))
            .arg(
                Arg::new("threshold")
                    .long("threshold")
                    .value_parser(clap::value_parser!(f64)),
            )
            .arg(Arg::new("output_file").long("out"))
            .arg(Arg::new("report_file").long("report"))
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let config = TrainConfig::from_json(r#"{"pass_threshold": 60.0}"#).unwrap();
        assert_eq!(config.pass_threshold, 60.0);
        assert_eq!(config.output_file, DEFAULT_MODEL_PATH);
        assert_eq!(config.model, ModelConfig::default());
    }

    #[test]
    fn invalid_field_falls_back_to_default() {
        let config = TrainConfig::from_json(r#"{"test_fraction": "lots"}"#).unwrap();
        assert_eq!(config.test_fraction, DEFAULT_TEST_FRACTION);
    }

    #[test]
    fn cli_flags_override_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let csv = dir.path().join("students.csv");
        std::fs::write(&csv, "x\n").unwrap();
        let csv = csv.to_str().unwrap().to_string();

        let matches = command()
            .try_get_matches_from([
                "train",
                "--csv",
                csv.as_str(),
                "--model",
                "logistic",
                "--threshold",
                "65",
                "--out",
                "out.json",
            ])
            .unwrap();
        let config = TrainConfig::from_arguments(None, &matches).unwrap();
        assert_eq!(config.train_data, csv);
        assert_eq!(config.model.model_type.name(), "logistic");
        assert_eq!(config.pass_threshold, 65.0);
        assert_eq!(config.output_file, "out.json");
        assert!(config.report_file.is_none());
    }

    #[test]
    fn missing_training_data_is_an_error() {
        let matches = command().try_get_matches_from(["train"]).unwrap();
        let err = TrainConfig::from_arguments(None, &matches).unwrap_err();
        assert!(err.to_string().contains("--csv"));
    }
}

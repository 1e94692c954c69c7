use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

use gradecast_classifiers::config::{ModelConfig, ModelType};
use gradecast_classifiers::data_handling::train_test_split;
use gradecast_classifiers::io::{read_student_data_with_config, StudentReaderConfig};
use gradecast_classifiers::pipeline::Pipeline;
use gradecast_classifiers::stats::{accuracy, classification_report, ClassificationReport};

use crate::train::input::TrainConfig;
use crate::train::report::write_training_report;

/// What a training run produced.
#[derive(Debug, Clone)]
pub struct TrainingOutcome {
    pub accuracy: f64,
    pub report: ClassificationReport,
    pub model_path: PathBuf,
    pub n_train: usize,
    pub n_test: usize,
}

/// Train with explicit arguments and defaults for everything else.
///
/// Returns the held-out accuracy and the per-class report, and writes the
/// fitted pipeline to `output_path`.
pub fn train<P: AsRef<Path>, Q: AsRef<Path>>(
    dataset_path: P,
    model_type: ModelType,
    pass_threshold: f64,
    output_path: Q,
) -> Result<(f64, ClassificationReport)> {
    let config = TrainConfig {
        train_data: dataset_path.as_ref().to_string_lossy().into_owned(),
        output_file: output_path.as_ref().to_string_lossy().into_owned(),
        model: ModelConfig::new(model_type),
        pass_threshold,
        ..TrainConfig::default()
    };
    let outcome = run_training(&config)?;
    Ok((outcome.accuracy, outcome.report))
}

/// Load, split, fit, evaluate, print, save and (optionally) report.
///
/// Nothing is written unless fitting and evaluation succeed.
pub fn run_training(config: &TrainConfig) -> Result<TrainingOutcome> {
    log::info!(
        "Training {} model on {} (pass threshold {})",
        config.model.model_type.name(),
        config.train_data,
        config.pass_threshold
    );

    let reader_config = StudentReaderConfig::with_pass_threshold(config.pass_threshold);
    let data = read_student_data_with_config(&config.train_data, &reader_config)
        .with_context(|| format!("Failed to load training data from {}", config.train_data))?;
    data.log_input_data_summary();

    let split = train_test_split(&data.x, &data.y, config.test_fraction, config.model.seed)
        .context("Failed to split training data")?;
    log::info!(
        "Split {} rows into {} train / {} held-out (seed {})",
        data.n_samples(),
        split.x_train.nrows(),
        split.x_test.nrows(),
        config.model.seed
    );

    let pipeline = Pipeline::fit(
        &split.x_train,
        &split.y_train,
        &config.model,
        config.pass_threshold,
    )
    .context("Failed to fit pipeline")?;

    let probabilities = pipeline
        .predict_proba(&split.x_test)
        .context("Failed to evaluate held-out rows")?;
    let y_pred = pipeline
        .predict(&split.x_test)
        .context("Failed to evaluate held-out rows")?;
    let y_true = split.y_test.to_vec();

    let acc = accuracy(&y_true, &y_pred);
    let report = classification_report(&y_true, &y_pred);

    println!("Accuracy: {:.4}", acc);
    println!("{}", report);

    let model_path = PathBuf::from(&config.output_file);
    pipeline
        .save(&model_path)
        .with_context(|| format!("Failed to write model to {}", model_path.display()))?;

    if let Some(report_file) = &config.report_file {
        write_training_report(&pipeline, &report, &probabilities, &y_true, report_file)
            .with_context(|| format!("Failed to write training report to {}", report_file))?;
        log::info!("Wrote training report to {}", report_file);
    }

    Ok(TrainingOutcome {
        accuracy: acc,
        report,
        model_path,
        n_train: split.x_train.nrows(),
        n_test: split.x_test.nrows(),
    })
}

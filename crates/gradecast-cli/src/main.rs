use anyhow::Result;
use clap::{Arg, ArgMatches, Command, ValueHint};
use log::LevelFilter;
use std::path::PathBuf;

use gradecast_cli::serve::input::ServeConfig;
use gradecast_cli::serve::run_server;
use gradecast_cli::train::input::TrainConfig;
use gradecast_cli::train::trainer;

fn main() -> Result<()> {
    env_logger::Builder::default()
        .filter_level(LevelFilter::Error)
        .parse_env(env_logger::Env::default().filter_or("GRADECAST_LOG", "error,gradecast=info"))
        .init();

    let matches = Command::new("gradecast")
        .version(clap::crate_version!())
        .about("\u{1F393} Gradecast - student pass/fail prediction")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .subcommand(
            Command::new("train")
                .about("Train a pass/fail pipeline from a student dataset and save it")
                .arg(
                    Arg::new("config")
                        .help("Path to an optional JSON training configuration file")
                        .required(false)
                        .value_parser(clap::value_parser!(PathBuf))
                        .value_hint(ValueHint::FilePath),
                )
                .arg(
                    Arg::new("csv")
                        .long("csv")
                        .value_parser(clap::builder::NonEmptyStringValueParser::new())
                        .help(
                            "Path to the training data (*.csv or *.tsv). \
                             Overrides the training data file specified in the configuration file.",
                        )
                        .value_hint(ValueHint::FilePath),
                )
                .arg(
                    Arg::new("model_type")
                        .short('m')
                        .long("model")
                        .help(
                            "Classifier to train. random_forest is an alias for the \
                             gradient-boosted tree ensemble.",
                        )
                        .value_parser(["gbdt", "random_forest", "logistic"])
                        .value_hint(ValueHint::Other),
                )
                .arg(
                    Arg::new("threshold")
                        .short('t')
                        .long("threshold")
                        .help("Students with total_score at or above this value are labelled pass [default: 50]")
                        .value_parser(clap::value_parser!(f64)),
                )
                .arg(
                    Arg::new("output_file")
                        .short('o')
                        .long("out")
                        .value_parser(clap::builder::NonEmptyStringValueParser::new())
                        .help("File the trained pipeline is written to [default: model.json]")
                        .value_hint(ValueHint::FilePath),
                )
                .arg(
                    Arg::new("report_file")
                        .long("report")
                        .value_parser(clap::builder::NonEmptyStringValueParser::new())
                        .help("Write an HTML training report to this file")
                        .value_hint(ValueHint::FilePath),
                ),
        )
        .subcommand(
            Command::new("serve")
                .about("Serve predictions from a trained pipeline over HTTP")
                .arg(
                    Arg::new("model_path")
                        .long("model")
                        .value_parser(clap::builder::NonEmptyStringValueParser::new())
                        .help("Path to the trained pipeline [default: model.json]")
                        .value_hint(ValueHint::FilePath),
                )
                .arg(
                    Arg::new("host")
                        .long("host")
                        .value_parser(clap::builder::NonEmptyStringValueParser::new())
                        .help("Address to bind [default: 0.0.0.0]")
                        .value_hint(ValueHint::Hostname),
                )
                .arg(
                    Arg::new("port")
                        .short('p')
                        .long("port")
                        .help("Port to listen on. Falls back to the PORT environment variable, then 8000.")
                        .value_parser(clap::value_parser!(u16)),
                ),
        )
        .help_template(
            "{usage-heading} {usage}\n\n\
             {about-with-newline}\n\
             Version {version}\n\n\
             {all-args}{after-help}",
        )
        .get_matches();

    match matches.subcommand() {
        Some(("train", train_matches)) => handle_train(train_matches),
        Some(("serve", serve_matches)) => handle_serve(serve_matches),
        _ => unreachable!("Subcommand is required by CLI configuration"),
    }
}

fn handle_train(matches: &ArgMatches) -> Result<()> {
    let config_path: Option<&PathBuf> = matches.get_one("config");

    if config_path.is_none() && matches.get_one::<String>("csv").is_none() {
        eprintln!("[Gradecast::Train] No config file provided and no --csv given. Config template:");
        println!(
            "{}",
            serde_json::to_string_pretty(&TrainConfig::default()).unwrap_or_default()
        );
        // usage error: nothing to train on
        std::process::exit(2)
    }

    if let Some(path) = config_path {
        log::info!("[Gradecast::Train] Using config: {:?}", path);
    }

    let params = match TrainConfig::from_arguments(config_path, matches) {
        Ok(params) => params,
        Err(e) => {
            log::error!("Invalid training configuration: {:#}", e);
            std::process::exit(1)
        }
    };

    match trainer::run_training(&params) {
        Ok(outcome) => {
            log::info!(
                "[Gradecast::Train] Held-out accuracy {:.4} ({} train / {} test); model written to {}",
                outcome.accuracy,
                outcome.n_train,
                outcome.n_test,
                outcome.model_path.display()
            );
            Ok(())
        }
        Err(e) => {
            log::error!("Training failed: {:#}", e);
            std::process::exit(1)
        }
    }
}

fn handle_serve(matches: &ArgMatches) -> Result<()> {
    let config = ServeConfig::from_arguments(matches)?;
    log::info!(
        "[Gradecast::Serve] Serving {} on {}:{}",
        config.model_path,
        config.host,
        config.port
    );

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    runtime.block_on(run_server(&config))
}

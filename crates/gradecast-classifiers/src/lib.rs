//! gradecast-classifiers: pass/fail prediction for student performance records.
//!
//! This crate holds everything the trainer and the prediction service share:
//! reading student CSV/TSV files, label derivation, median imputation and
//! standardization, the GBDT and logistic classifiers, the fitted
//! [`pipeline::Pipeline`] with its JSON artifact, evaluation metrics and the
//! optional HTML training report.
pub mod config;
pub mod data_handling;
pub mod error;
pub mod io;
pub mod models;
pub mod pipeline;
pub mod preprocessing;
pub mod report;
pub mod stats;

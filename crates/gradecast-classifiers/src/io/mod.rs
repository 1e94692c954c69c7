//! IO utilities for loading labelled student datasets.

pub mod student_csv;

pub use student_csv::{
    read_student_data, read_student_data_with_config, StudentReaderConfig,
};

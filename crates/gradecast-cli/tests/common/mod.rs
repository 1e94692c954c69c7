#![allow(dead_code)]

use std::path::{Path, PathBuf};

/// Write a synthetic student CSV whose pass/fail follows `total_score`.
pub fn synthetic_csv(dir: &Path, n: usize) -> PathBuf {
    let mut csv = String::from(
        "student_id,weekly_self_study_hours,attendance_percentage,class_participation,total_score,grade\n",
    );
    for i in 0..n {
        let score = 20.0 + 75.0 * i as f64 / (n - 1) as f64;
        // noisy, so total_score is the only column that separates the classes
        let hours = 1.0 + score / 12.0 + 0.3 * (((i * 37) % 11) as f64 - 5.0);
        let attendance = 55.0 + score / 2.5 + 0.7 * (((i * 53) % 13) as f64 - 6.0);
        let participation = ((i * 7) % 5) as f64 + 1.0;
        let grade = if score >= 50.0 { "B" } else { "F" };
        csv.push_str(&format!(
            "s{i},{hours:.2},{attendance:.2},{participation},{score:.2},{grade}\n"
        ));
    }
    let path = dir.join("students.csv");
    std::fs::write(&path, csv).unwrap();
    path
}

pub const EXAMPLE_BODY: &str = r#"{"weekly_self_study_hours":5.0,"attendance_percentage":85.0,"class_participation":4.0,"total_score":67.5}"#;

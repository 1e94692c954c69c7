use gradecast_classifiers::error::PipelineError;
use gradecast_classifiers::preprocessing::{fit_preprocessor, fit_transform, transform_all};
use ndarray::{array, Array2};

#[test]
fn statistics_come_from_the_training_rows_only() {
    let train = array![[1.0, 100.0], [3.0, 200.0], [5.0, 300.0]];
    let held_out = array![[1000.0, -50.0]];

    let (pre, scaled) = fit_transform(&train).unwrap();
    assert_eq!(pre.mean, vec![3.0, 200.0]);

    for column in scaled.columns() {
        let mean = column.sum() / column.len() as f64;
        let var = column.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / column.len() as f64;
        assert!(mean.abs() < 1e-12);
        assert!((var - 1.0).abs() < 1e-12);
    }

    // held-out rows never shift the fitted statistics
    let transformed = transform_all(&held_out, &pre).unwrap();
    let expected = (1000.0 - 3.0) / pre.std[0];
    assert!((transformed[[0, 0]] - expected).abs() < 1e-9);
    assert_eq!(pre.mean, vec![3.0, 200.0]);
}

#[test]
fn missing_inference_values_take_the_training_median() {
    let train = array![[1.0], [2.0], [10.0]];
    let pre = fit_preprocessor(&train).unwrap();
    assert_eq!(pre.median, vec![2.0]);

    let row = pre.transform_row(&[f64::NAN]).unwrap();
    let median_row = pre.transform_row(&[2.0]).unwrap();
    assert_eq!(row, median_row);
}

#[test]
fn entirely_missing_column_is_a_training_error() {
    let train = array![[1.0, f64::NAN], [2.0, f64::NAN]];
    assert!(matches!(
        fit_preprocessor(&train),
        Err(PipelineError::InvalidTrainingData(_))
    ));
}

#[test]
fn empty_matrix_is_a_training_error() {
    let empty: Array2<f64> = Array2::zeros((0, 4));
    assert!(fit_preprocessor(&empty).is_err());
}

#[test]
fn preprocessor_survives_json() {
    let train = array![[1.0, 7.0], [f64::NAN, 9.0], [4.0, 8.0]];
    let pre = fit_preprocessor(&train).unwrap();
    let json = serde_json::to_string(&pre).unwrap();
    let restored = serde_json::from_str(&json).unwrap();
    assert_eq!(pre, restored);
}

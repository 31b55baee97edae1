//! Tests for error types

use std::path::PathBuf;

use cluster_sweep::dataset::NormMethod;
use cluster_sweep::sweep::SweepOption;
use cluster_sweep::Error;

#[test]
fn test_dataset_not_found_error() {
    let error = Error::DatasetNotFound(PathBuf::from("data/protein.dat"));
    let error_str = format!("{error}");
    assert!(error_str.contains("Dataset not found"));
    assert!(error_str.contains("data/protein.dat"));
}

#[test]
fn test_parse_error() {
    let error = Error::Parse {
        line: 7,
        message: "expected 3 fields, found 2".to_string(),
    };
    let error_str = format!("{error}");
    assert!(error_str.contains("line 7"));
    assert!(error_str.contains("expected 3 fields"));
}

#[test]
fn test_unsupported_normalization_error() {
    let error = "whiten".parse::<NormMethod>().unwrap_err();
    let error_str = format!("{error}");
    assert!(error_str.contains("Unsupported normalization method"));
    assert!(error_str.contains("whiten"));
    assert!(error_str.contains("feature_scale"));
}

#[test]
fn test_unsupported_option_error() {
    let error = "min_size".parse::<SweepOption>().unwrap_err();
    assert!(matches!(error, Error::UnsupportedOption(ref name) if name == "min_size"));
    assert!(format!("{error}").contains("min_cluster_size"));
}

#[test]
fn test_invalid_input_error() {
    let error = Error::InvalidInput("sample size 10 exceeds 4 rows".to_string());
    let error_str = format!("{error}");
    assert!(error_str.contains("Invalid input"));
    assert!(error_str.contains("exceeds 4 rows"));
}

#[test]
fn test_invalid_config_error() {
    let error = Error::InvalidConfig("runs must be at least 1".to_string());
    assert!(format!("{error}").contains("Invalid configuration"));
}

#[test]
fn test_clustering_error() {
    let error = Error::Clustering("MinClusterSizeTooSmall".to_string());
    assert!(format!("{error}").contains("Clustering failed"));
}

#[test]
fn test_repetition_failed_error() {
    let error = Error::RepetitionFailed {
        run: 3,
        status: "exit code 1".to_string(),
    };
    let error_str = format!("{error}");
    assert!(error_str.contains("Repetition 3 failed"));
    assert!(error_str.contains("exit code 1"));
    assert!(error_str.contains("Aggregation skipped"));
}

#[test]
fn test_io_error_conversion() {
    let io_error = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
    let error: Error = io_error.into();
    let error_str = format!("{error}");
    assert!(error_str.contains("IO error"));
    assert!(error_str.contains("file not found"));
}

#[test]
fn test_json_error_conversion() {
    let json_error = serde_json::from_str::<serde_json::Value>("{ not json").unwrap_err();
    let error: Error = json_error.into();
    assert!(format!("{error}").contains("JSON error"));
}

#[test]
fn test_other_error() {
    let error = Error::Other("custom error message".to_string());
    assert_eq!(format!("{error}"), "custom error message");
}

#[test]
fn test_error_debug_format() {
    let error = Error::Plot("backend".to_string());
    let debug_str = format!("{error:?}");
    assert!(debug_str.contains("Plot"));
}

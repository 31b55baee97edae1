//! Data loading and preparation pipeline tests

use std::fs;
use std::sync::Arc;

use arrow::array::{ArrayRef, Float32Array, Int64Array};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use cluster_sweep::clustering::{ClusteringSession, HdbscanSession};
use cluster_sweep::config::NormSpec;
use cluster_sweep::dataset::Dataset;
use cluster_sweep::driver::suite::{ColumnList, ValueList};
use cluster_sweep::driver::{prepare, SuiteArgs};
use cluster_sweep::sweep::SweepOption;
use cluster_sweep::Error;
use parquet::arrow::ArrowWriter;

/// Two well-separated blobs in columns 1-2, a frame counter in column 0
fn trajectory_text() -> String {
    let mut text = String::new();
    for frame in 0..40 {
        let (cx, cy) = if frame % 2 == 0 { (0.0, 0.0) } else { (50.0, 50.0) };
        let dx = f64::from(frame % 5) * 0.1;
        let dy = f64::from(frame / 5) * 0.1;
        text.push_str(&format!("{frame} {} {}\n", cx + dx, cy + dy));
    }
    text
}

fn suite_args(data: &std::path::Path) -> SuiteArgs {
    SuiteArgs {
        data: data.to_path_buf(),
        sample: 0,
        frange: Some([1, 2]),
        fplots: ColumnList(vec![1, 2]),
        cnames: None,
        norm: None,
        part: None,
        range: false,
        option: SweepOption::MinClusterSize,
        min: ValueList(vec![5.0]),
        threads: 2,
        runcount: 1,
        datetime: "tag".to_string(),
        seed: Some(7),
        results_dir: "RESULTS".into(),
        logs_dir: "LOGS".into(),
        defer_stats: false,
    }
}

#[test]
fn test_whitespace_file_to_clusters() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("trajectory.dat");
    fs::write(&path, trajectory_text()).unwrap();

    let raw = Dataset::read_table(&path).unwrap();
    assert_eq!(raw.num_rows(), 40);
    assert_eq!(raw.num_columns(), 3);

    let data = prepare(&suite_args(&path), raw).unwrap();
    assert_eq!(data.num_columns(), 2);
    assert_eq!(data.source_columns(), &[1, 2]);

    let result = HdbscanSession::new()
        .run(&data, SweepOption::MinClusterSize, 5.0, 2)
        .unwrap();
    assert_eq!(result.labels().len(), 40);
    assert!(result.n_clusters() >= 2);

    // No cluster spans both blobs (even frames sit in one, odd in the other)
    let labels = result.labels();
    let even: std::collections::BTreeSet<i32> =
        labels.iter().step_by(2).copied().filter(|&l| l >= 0).collect();
    let odd: std::collections::BTreeSet<i32> =
        labels.iter().skip(1).step_by(2).copied().filter(|&l| l >= 0).collect();
    assert!(even.is_disjoint(&odd));
}

#[test]
fn test_sampling_is_reproducible_with_seed() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("trajectory.dat");
    fs::write(&path, trajectory_text()).unwrap();

    let mut args = suite_args(&path);
    args.sample = 10;
    let a = prepare(&args, Dataset::read_table(&path).unwrap()).unwrap();
    let b = prepare(&args, Dataset::read_table(&path).unwrap()).unwrap();
    assert_eq!(a.num_rows(), 10);
    assert_eq!(a.to_rows(), b.to_rows());
}

#[test]
fn test_partition_then_standard_score() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("trajectory.dat");
    fs::write(&path, trajectory_text()).unwrap();

    let mut args = suite_args(&path);
    args.norm = Some(NormSpec {
        method: "standard_score".to_string(),
        columns: vec![],
    });
    args.part = Some(cluster_sweep::config::PartitionSpec {
        column: 0,
        range: 19.0,
    });
    let data = prepare(&args, Dataset::read_table(&path).unwrap()).unwrap();
    // Frames 0..=19 survive; normalization ran over all 40 rows first
    assert_eq!(data.num_rows(), 20);
    assert_eq!(data.num_columns(), 2);
}

#[test]
fn test_unknown_norm_method_fails_preparation() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("trajectory.dat");
    fs::write(&path, trajectory_text()).unwrap();

    let mut args = suite_args(&path);
    args.norm = Some(NormSpec {
        method: "zscore".to_string(),
        columns: vec![],
    });
    let err = prepare(&args, Dataset::read_table(&path).unwrap()).unwrap_err();
    assert!(matches!(err, Error::UnsupportedNormalization(_)));
    assert!(err.to_string().contains("Unsupported normalization method"));
}

#[test]
fn test_ragged_file_reports_line() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("ragged.dat");
    fs::write(&path, "1 2 3\n4 5 6\n7 8\n").unwrap();
    let err = Dataset::read_table(&path).unwrap_err();
    assert!(matches!(err, Error::Parse { line: 3, .. }));
}

#[test]
fn test_parquet_dataset_is_cast_to_f64() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("frames.parquet");

    let schema = Arc::new(Schema::new(vec![
        Field::new("frame", DataType::Int64, false),
        Field::new("x", DataType::Float32, false),
    ]));
    let batch = RecordBatch::try_new(
        Arc::clone(&schema),
        vec![
            Arc::new(Int64Array::from(vec![0, 1, 2])) as ArrayRef,
            Arc::new(Float32Array::from(vec![0.5, 1.5, 2.5])) as ArrayRef,
        ],
    )
    .unwrap();
    let file = fs::File::create(&path).unwrap();
    let mut writer = ArrowWriter::try_new(file, schema, None).unwrap();
    writer.write(&batch).unwrap();
    writer.close().unwrap();

    let data = Dataset::read_table(&path).unwrap();
    assert_eq!(data.num_rows(), 3);
    assert_eq!(data.column_names(), vec!["frame", "x"]);
    assert_eq!(data.column(0), &[0.0, 1.0, 2.0]);
    assert_eq!(data.column(1), &[0.5, 1.5, 2.5]);
}

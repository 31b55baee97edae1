//! Data preparation benchmarks
//!
//! Measures the transforms applied before every clustering call on a
//! trajectory-sized table.
//!
//! Run with: cargo bench --bench prep_benchmarks

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use rand::rngs::StdRng;
use rand::SeedableRng;

use cluster_sweep::clustering::cluster_count;
use cluster_sweep::dataset::{
    normalize, sample, select_by_column, select_by_time, Dataset, NormMethod,
};

const SMALL_SIZE: usize = 1_000; // 1K rows
const MEDIUM_SIZE: usize = 100_000; // 100K rows
const COLUMNS: usize = 6;

#[allow(clippy::cast_precision_loss)]
fn table(rows: usize) -> Dataset {
    let columns = (0..COLUMNS)
        .map(|c| (0..rows).map(|r| ((r * (c + 3)) % 997) as f64).collect())
        .collect();
    Dataset::from_columns(columns).unwrap()
}

/// Benchmark both normalization methods
fn bench_normalize(c: &mut Criterion) {
    let mut group = c.benchmark_group("normalize");

    for size in [SMALL_SIZE, MEDIUM_SIZE] {
        let data = table(size);
        group.bench_with_input(BenchmarkId::new("standard_score", size), &data, |b, data| {
            b.iter(|| normalize(black_box(data), NormMethod::StandardScore, &[]).unwrap());
        });
        group.bench_with_input(BenchmarkId::new("feature_scale", size), &data, |b, data| {
            b.iter(|| normalize(black_box(data), NormMethod::FeatureScale, &[1, 2, 3]).unwrap());
        });
    }

    group.finish();
}

/// Benchmark sampling and row/column partitioning
fn bench_partition(c: &mut Criterion) {
    let mut group = c.benchmark_group("partition");
    let data = table(MEDIUM_SIZE);

    group.bench_function("sample_10pct", |b| {
        let mut rng = StdRng::seed_from_u64(42);
        b.iter(|| sample(black_box(&data), MEDIUM_SIZE / 10, &mut rng).unwrap());
    });
    group.bench_function("select_by_time_half", |b| {
        b.iter(|| select_by_time(black_box(&data), 498.0, 0).unwrap());
    });
    group.bench_function("select_by_column", |b| {
        b.iter(|| select_by_column(black_box(&data), [1, 3]).unwrap());
    });
    group.bench_function("to_rows", |b| {
        b.iter(|| black_box(&data).to_rows());
    });

    group.finish();
}

/// Benchmark cluster counting over HDBSCAN-sized label vectors
#[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
fn bench_cluster_count(c: &mut Criterion) {
    let labels: Vec<i32> = (0..MEDIUM_SIZE).map(|i| (i % 51) as i32 - 1).collect();
    c.bench_function("cluster_count_100k", |b| {
        b.iter(|| cluster_count(black_box(&labels)));
    });
}

criterion_group!(benches, bench_normalize, bench_partition, bench_cluster_count);
criterion_main!(benches);

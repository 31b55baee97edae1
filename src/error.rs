//! Error types for cluster-sweep
//!
//! Every failure is fatal to the current run. Partial outputs already written
//! under `RESULTS/` are left in place.

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// cluster-sweep error types
#[derive(Error, Debug)]
pub enum Error {
    /// Input dataset path does not exist
    #[error("Dataset not found: {}\nCheck the `data` entry of the run configuration", .0.display())]
    DatasetNotFound(PathBuf),

    /// Dataset text could not be parsed into a numeric table
    #[error("Parse error at line {line}: {message}")]
    Parse {
        /// 1-based line number in the source file
        line: usize,
        /// What went wrong
        message: String,
    },

    /// Normalization method name is not one of the supported methods
    #[error("Unsupported normalization method: {0}\nExpected one of: standard_score, feature_scale")]
    UnsupportedNormalization(String),

    /// Swept hyperparameter name is not recognised
    #[error("Unsupported sweep option: {0}\nExpected one of: min_samples, min_cluster_size")]
    UnsupportedOption(String),

    /// Invalid argument to a data preparation or clustering call
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Run configuration is malformed
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// The clustering library rejected the data or parameters
    #[error("Clustering failed: {0}")]
    Clustering(String),

    /// Plot rendering failed
    #[error("Plot error: {0}")]
    Plot(String),

    /// A repetition subprocess exited unsuccessfully
    #[error("Repetition {run} failed ({status})\nAggregation skipped: the multirun table is incomplete")]
    RepetitionFailed {
        /// 1-based repetition number
        run: usize,
        /// Exit status description
        status: String,
    },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// CSV error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Arrow error
    #[error("Arrow error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),

    /// Parquet error
    #[error("Parquet error: {0}")]
    Parquet(#[from] parquet::errors::ParquetError),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

//! Declarative run configuration (`config.json`)
//!
//! ```json
//! {
//!   "data": "data/protein.dat",
//!   "sample": 5000,
//!   "partition": { "column": 0, "range": 10000 },
//!   "norm": { "method": "feature_scale", "columns": [1, 2, 3] },
//!   "range": [1, 3],
//!   "plot_cols": [1, 2],
//!   "parameters": { "range": true, "option": "min_samples", "min": [5, 50, 5] },
//!   "threads": 4,
//!   "runs": 10
//! }
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::dataset::NormMethod;
use crate::sweep::{ParameterSweep, SweepOption};
use crate::{Error, Result};

/// Default clustering thread count.
pub const DEFAULT_THREADS: usize = 4;

const fn default_threads() -> usize {
    DEFAULT_THREADS
}

const fn default_runs() -> usize {
    1
}

const fn default_workers() -> usize {
    1
}

/// Row partition by a time/frame column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PartitionSpec {
    /// Column holding the time/frame value
    pub column: usize,
    /// Inclusive upper bound on that column
    pub range: f64,
}

/// Normalization method and the columns it applies to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormSpec {
    /// `standard_score` or `feature_scale`
    pub method: String,
    /// Columns rescaled by `feature_scale`
    #[serde(default)]
    pub columns: Vec<usize>,
}

impl NormSpec {
    /// Parsed normalization method.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnsupportedNormalization`] for unknown names
    pub fn method(&self) -> Result<NormMethod> {
        self.method.parse()
    }
}

/// Parameter sweep section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterSpec {
    /// Treat `min` as `[start, stop, step]`
    #[serde(default)]
    pub range: bool,
    /// Swept hyperparameter
    #[serde(default)]
    pub option: SweepOption,
    /// Literal values or range bounds
    pub min: Vec<f64>,
}

impl ParameterSpec {
    /// Expand into the ordered sweep.
    ///
    /// # Errors
    ///
    /// Returns error if the value list is malformed
    pub fn sweep(&self) -> Result<ParameterSweep> {
        ParameterSweep::from_spec(self.range, &self.min)
    }
}

/// Top-level run configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunConfig {
    /// Whitespace-delimited (or `.parquet`) dataset
    pub data: PathBuf,
    /// Rows to sample; 0 keeps every row
    #[serde(default)]
    pub sample: usize,
    /// Optional time partition
    #[serde(default)]
    pub partition: Option<PartitionSpec>,
    /// Optional normalization
    #[serde(default)]
    pub norm: Option<NormSpec>,
    /// Inclusive column bounds of the clustered features
    #[serde(default)]
    pub range: Option<[usize; 2]>,
    /// Source columns to scatter-plot pairwise; empty disables plotting
    #[serde(default)]
    pub plot_cols: Vec<usize>,
    /// Parameter sweep
    pub parameters: ParameterSpec,
    /// Threads per clustering call
    #[serde(default = "default_threads")]
    pub threads: usize,
    /// Number of repetitions
    #[serde(default = "default_runs")]
    pub runs: usize,
    /// Base sampling seed; repetition `n` uses `seed + n`
    #[serde(default)]
    pub seed: Option<u64>,
    /// Column names applied after column selection
    #[serde(default)]
    pub cnames: Option<Vec<String>>,
    /// Repetitions run concurrently (1 = sequential)
    #[serde(default = "default_workers")]
    pub workers: usize,
}

impl RunConfig {
    /// Load and validate a configuration file.
    ///
    /// # Errors
    ///
    /// Returns error if the file is unreadable, malformed or invalid
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    /// Check everything that can be checked before any output is written.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DatasetNotFound`] for a missing dataset, otherwise
    /// [`Error::InvalidConfig`] or a method/option parse error
    pub fn validate(&self) -> Result<()> {
        if !self.data.exists() {
            return Err(Error::DatasetNotFound(self.data.clone()));
        }
        if self.runs == 0 {
            return Err(Error::InvalidConfig("runs must be at least 1".to_string()));
        }
        if self.threads == 0 || self.workers == 0 {
            return Err(Error::InvalidConfig(
                "threads and workers must be at least 1".to_string(),
            ));
        }
        if let Some([start, end]) = self.range {
            if start > end {
                return Err(Error::InvalidConfig(format!(
                    "column range [{start}, {end}] is reversed"
                )));
            }
        }
        if let Some(norm) = &self.norm {
            norm.method()?;
        }
        self.parameters.sweep()?;
        Ok(())
    }

    /// Sampling seed for repetition `run`.
    #[must_use]
    pub fn seed_for_run(&self, run: usize) -> Option<u64> {
        self.seed.map(|s| s.wrapping_add(run as u64))
    }
}

//! Clustering sessions
//!
//! A session wraps one call into an external clustering library with a
//! single swept hyperparameter. Sessions do no file I/O.

use std::collections::BTreeSet;

use hdbscan::{Hdbscan, HdbscanHyperParams};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::dataset::Dataset;
use crate::sweep::{integer_parameter, SweepOption};
use crate::{Error, Result};

/// Label assigned to points outside every cluster.
pub const NOISE_LABEL: i32 = -1;

/// Outcome of one clustering call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterResult {
    n_clusters: usize,
    labels: Vec<i32>,
}

impl ClusterResult {
    /// Build a result from labels, counting clusters with [`cluster_count`].
    #[must_use]
    pub fn from_labels(labels: Vec<i32>) -> Self {
        Self {
            n_clusters: cluster_count(&labels),
            labels,
        }
    }

    /// Number of clusters found (noise excluded).
    #[must_use]
    pub const fn n_clusters(&self) -> usize {
        self.n_clusters
    }

    /// One label per input row, [`NOISE_LABEL`] for noise.
    #[must_use]
    pub fn labels(&self) -> &[i32] {
        &self.labels
    }

    /// Number of rows labelled as noise.
    #[must_use]
    pub fn noise_count(&self) -> usize {
        self.labels.iter().filter(|&&l| l == NOISE_LABEL).count()
    }
}

/// Number of distinct non-noise labels.
///
/// ```rust
/// use cluster_sweep::clustering::cluster_count;
///
/// assert_eq!(cluster_count(&[-1, -1, -1]), 0);
/// assert_eq!(cluster_count(&[0, 0, 1]), 2);
/// ```
#[must_use]
pub fn cluster_count(labels: &[i32]) -> usize {
    labels
        .iter()
        .filter(|&&l| l != NOISE_LABEL)
        .collect::<BTreeSet<_>>()
        .len()
}

/// A clustering algorithm driven by one swept hyperparameter.
pub trait ClusteringSession: Send + Sync {
    /// Cluster `data` with `option` set to `parameter`, using up to
    /// `threads` worker threads.
    ///
    /// # Errors
    ///
    /// Returns error if the parameter is invalid for the data or the
    /// library rejects the input
    fn run(
        &self,
        data: &Dataset,
        option: SweepOption,
        parameter: f64,
        threads: usize,
    ) -> Result<ClusterResult>;
}

/// HDBSCAN session backed by the `hdbscan` crate.
#[derive(Debug, Default, Clone, Copy)]
pub struct HdbscanSession;

impl HdbscanSession {
    /// Create a new session.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    fn hyper_params(option: SweepOption, value: usize, rows: usize) -> Result<HdbscanHyperParams> {
        let params = match option {
            SweepOption::MinSamples => {
                if value >= rows {
                    return Err(Error::InvalidInput(format!(
                        "min_samples={value} needs more than {rows} rows"
                    )));
                }
                HdbscanHyperParams::builder().min_samples(value).build()
            }
            SweepOption::MinClusterSize => {
                if value < 2 {
                    return Err(Error::InvalidInput(format!(
                        "min_cluster_size must be at least 2, got {value}"
                    )));
                }
                HdbscanHyperParams::builder().min_cluster_size(value).build()
            }
        };
        Ok(params)
    }
}

impl ClusteringSession for HdbscanSession {
    fn run(
        &self,
        data: &Dataset,
        option: SweepOption,
        parameter: f64,
        threads: usize,
    ) -> Result<ClusterResult> {
        let value = integer_parameter(parameter)?;
        let rows = data.to_rows();
        let params = Self::hyper_params(option, value, rows.len())?;

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(threads.max(1))
            .build()
            .map_err(|e| Error::Clustering(format!("thread pool: {e}")))?;

        debug!(%option, value, rows = rows.len(), threads, "running hdbscan");
        let labels = pool
            .install(|| Hdbscan::new(&rows, params).cluster())
            .map_err(|e| Error::Clustering(format!("{e:?}")))?;

        Ok(ClusterResult::from_labels(labels))
    }
}

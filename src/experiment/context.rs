//! Run Context - on-disk layout of one results session

use std::path::{Path, PathBuf};

use chrono::{DateTime, TimeZone};

use crate::sweep::integer_parameter;
use crate::Result;

/// Format of the timestamp tag naming a results session.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d__%H-%M-%S";

/// File name of the multirun cluster-count table.
pub const MULTIRUN_CSV: &str = "hdbscan_multirun_results.csv";

/// Explicit run context threaded through every driver call.
///
/// Names the results root, the session tag shared by all repetitions, and
/// the 1-based repetition number. All output paths derive from it:
///
/// ```text
/// <root>/<tag>/results.json
/// <root>/<tag>/statistics/hdbscan_multirun_results.csv
/// <root>/<tag>/run_<n>/min_<value>/results.json
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunContext {
    results_root: PathBuf,
    tag: String,
    run: usize,
}

impl RunContext {
    /// Create a context for repetition `run` of session `tag`.
    #[must_use]
    pub fn new(results_root: impl Into<PathBuf>, tag: impl Into<String>, run: usize) -> Self {
        Self {
            results_root: results_root.into(),
            tag: tag.into(),
            run,
        }
    }

    /// Timestamp tag for a new session, e.g. `2024-03-05__14-07-09`.
    #[must_use]
    pub fn timestamp_tag<Tz: TimeZone>(now: &DateTime<Tz>) -> String
    where
        Tz::Offset: std::fmt::Display,
    {
        now.format(TIMESTAMP_FORMAT).to_string()
    }

    /// Same session, different repetition.
    #[must_use]
    pub fn for_run(&self, run: usize) -> Self {
        Self {
            run,
            ..self.clone()
        }
    }

    /// Session timestamp tag.
    #[must_use]
    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// 1-based repetition number.
    #[must_use]
    pub const fn run(&self) -> usize {
        self.run
    }

    /// Results root (`RESULTS` by default).
    #[must_use]
    pub fn results_root(&self) -> &Path {
        &self.results_root
    }

    /// `<root>/<tag>`
    #[must_use]
    pub fn session_dir(&self) -> PathBuf {
        self.results_root.join(&self.tag)
    }

    /// `<root>/<tag>/run_<n>`
    #[must_use]
    pub fn run_dir(&self) -> PathBuf {
        self.session_dir().join(format!("run_{}", self.run))
    }

    /// `<root>/<tag>/run_<n>/min_<value>`, value truncated to an integer.
    ///
    /// # Errors
    ///
    /// Returns error for parameter values below 1
    pub fn param_dir(&self, value: f64) -> Result<PathBuf> {
        Ok(self.run_dir().join(format!("min_{}", integer_parameter(value)?)))
    }

    /// `<root>/<tag>/statistics`
    #[must_use]
    pub fn stats_dir(&self) -> PathBuf {
        self.session_dir().join("statistics")
    }

    /// Cumulative results document shared by all repetitions.
    #[must_use]
    pub fn results_path(&self) -> PathBuf {
        self.session_dir().join("results.json")
    }

    /// Multirun cluster-count table.
    #[must_use]
    pub fn multirun_csv(&self) -> PathBuf {
        self.stats_dir().join(MULTIRUN_CSV)
    }

    /// Per-parameter mean/std table.
    #[must_use]
    pub fn stats_csv(&self) -> PathBuf {
        self.stats_dir().join("hdbscan_multirun_stats.csv")
    }

    /// Error-bar plot of the multirun statistics.
    #[must_use]
    pub fn stats_plot(&self) -> PathBuf {
        self.stats_dir().join("hdbscan_multirun_stats.png")
    }

    /// Sweep record of this repetition when stats are deferred to the runner.
    #[must_use]
    pub fn deferred_record_path(&self) -> PathBuf {
        self.run_dir().join("summary.json")
    }

    /// Cluster-count row of this repetition when stats are deferred.
    #[must_use]
    pub fn deferred_row_path(&self) -> PathBuf {
        self.run_dir().join("n_clusters.csv")
    }

    /// Log file of this session under `logs_root`.
    #[must_use]
    pub fn log_path(&self, logs_root: &Path) -> PathBuf {
        logs_root.join(&self.tag)
    }
}

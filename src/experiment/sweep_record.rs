//! Sweep Record - results of one parameter sweep and the cumulative document

use std::fs;
use std::path::Path;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::clustering::ClusterResult;
use crate::Result;

/// Result of clustering at one parameter value.
///
/// Serialized as `{"min": <value>, "results": {"n_clusters": .., "labels": [..]}}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParamRun {
    min: f64,
    results: ClusterResult,
}

impl ParamRun {
    /// Create a new parameter run.
    #[must_use]
    pub const fn new(min: f64, results: ClusterResult) -> Self {
        Self { min, results }
    }

    /// Get the swept parameter value.
    #[must_use]
    pub const fn min(&self) -> f64 {
        self.min
    }

    /// Get the clustering outcome.
    #[must_use]
    pub const fn results(&self) -> &ClusterResult {
        &self.results
    }

    /// Write this run as pretty JSON.
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be written
    pub fn write(&self, path: &Path) -> Result<()> {
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }
}

/// All parameter runs of one sweep plus its wall-clock time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SweepRecord {
    datetime: DateTime<Utc>,
    paramruns: Vec<ParamRun>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    elapsed: Option<String>,
}

impl SweepRecord {
    /// Start a new, empty sweep record stamped with the current time.
    #[must_use]
    pub fn new() -> Self {
        Self {
            datetime: Utc::now(),
            paramruns: Vec::new(),
            elapsed: None,
        }
    }

    /// Get the time the sweep started.
    #[must_use]
    pub const fn datetime(&self) -> DateTime<Utc> {
        self.datetime
    }

    /// Get the parameter runs in sweep order.
    #[must_use]
    pub fn paramruns(&self) -> &[ParamRun] {
        &self.paramruns
    }

    /// Get the elapsed time, e.g. `"12s"`, once the sweep is finished.
    #[must_use]
    pub fn elapsed(&self) -> Option<&str> {
        self.elapsed.as_deref()
    }

    /// Append a parameter run.
    pub fn push(&mut self, run: ParamRun) {
        self.paramruns.push(run);
    }

    /// Record the total elapsed time in whole seconds.
    pub fn finish(&mut self, elapsed: Duration) {
        self.elapsed = Some(format!("{}s", elapsed.as_secs()));
    }

    /// Cluster count of every parameter run, in sweep order.
    #[must_use]
    pub fn cluster_counts(&self) -> Vec<usize> {
        self.paramruns
            .iter()
            .map(|run| run.results().n_clusters())
            .collect()
    }
}

impl Default for SweepRecord {
    fn default() -> Self {
        Self::new()
    }
}

/// Cumulative results document: `{"runs": [<SweepRecord>, ...]}`.
///
/// Updated by read-modify-write. Only one process may update a given
/// document at a time.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResultsDocument {
    runs: Vec<SweepRecord>,
}

impl ResultsDocument {
    /// Create an empty document.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the recorded sweeps.
    #[must_use]
    pub fn runs(&self) -> &[SweepRecord] {
        &self.runs
    }

    /// Load a document from disk.
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be read or is not a results document
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }

    /// Write the document as pretty JSON.
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be written
    pub fn save(&self, path: &Path) -> Result<()> {
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    /// Add a sweep to the end of the document.
    pub fn push(&mut self, record: SweepRecord) {
        self.runs.push(record);
    }

    /// Append `record` to the document at `path`, creating it if missing.
    ///
    /// # Errors
    ///
    /// Returns error if the existing document is unreadable or the write fails
    pub fn append(path: &Path, record: SweepRecord) -> Result<()> {
        let mut doc = if path.exists() {
            Self::load(path)?
        } else {
            Self::new()
        };
        doc.push(record);
        doc.save(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_param_run_json_shape() {
        let run = ParamRun::new(3.0, ClusterResult::from_labels(vec![0, 0, -1]));
        let json = serde_json::to_value(&run).unwrap();
        assert_eq!(json["min"], 3.0);
        assert_eq!(json["results"]["n_clusters"], 1);
    }

    #[test]
    fn test_sweep_record_counts_and_elapsed() {
        let mut record = SweepRecord::new();
        record.push(ParamRun::new(1.0, ClusterResult::from_labels(vec![0, 1, 2])));
        record.push(ParamRun::new(2.0, ClusterResult::from_labels(vec![0, 0, -1])));
        assert!(record.elapsed().is_none());
        record.finish(Duration::from_millis(12_700));
        assert_eq!(record.elapsed(), Some("12s"));
        assert_eq!(record.cluster_counts(), vec![3, 1]);
    }

    #[test]
    fn test_results_document_append_creates_and_extends() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("results.json");

        ResultsDocument::append(&path, SweepRecord::new()).unwrap();
        ResultsDocument::append(&path, SweepRecord::new()).unwrap();

        let doc = ResultsDocument::load(&path).unwrap();
        assert_eq!(doc.runs().len(), 2);
    }

    #[test]
    fn test_results_document_empty_shape() {
        let json = serde_json::to_string(&ResultsDocument::new()).unwrap();
        assert_eq!(json, r#"{"runs":[]}"#);
    }
}

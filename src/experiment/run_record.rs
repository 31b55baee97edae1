//! Repetition Record - lifecycle of one suite subprocess

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Status of a repetition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunStatus {
    /// Repetition is scheduled but its process has not been spawned.
    Pending,
    /// Repetition process is running.
    Running,
    /// Process exited with status 0.
    Success,
    /// Process could not be spawned or exited unsuccessfully.
    Failed,
}

/// Record of one repetition spawned by the top-level runner.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RepetitionRecord {
    run: usize,
    status: RunStatus,
    started_at: Option<DateTime<Utc>>,
    ended_at: Option<DateTime<Utc>>,
    exit_code: Option<i32>,
    summary: Option<String>,
}

impl RepetitionRecord {
    /// Create a new record in Pending status.
    ///
    /// # Arguments
    ///
    /// * `run` - 1-based repetition number
    #[must_use]
    pub const fn new(run: usize) -> Self {
        Self {
            run,
            status: RunStatus::Pending,
            started_at: None,
            ended_at: None,
            exit_code: None,
            summary: None,
        }
    }

    /// Get the repetition number.
    #[must_use]
    pub const fn run(&self) -> usize {
        self.run
    }

    /// Get the current status.
    #[must_use]
    pub const fn status(&self) -> RunStatus {
        self.status
    }

    /// Get the start timestamp, if the process was spawned.
    #[must_use]
    pub const fn started_at(&self) -> Option<DateTime<Utc>> {
        self.started_at
    }

    /// Get the end timestamp, if the process finished.
    #[must_use]
    pub const fn ended_at(&self) -> Option<DateTime<Utc>> {
        self.ended_at
    }

    /// Get the process exit code, if it exited normally.
    #[must_use]
    pub const fn exit_code(&self) -> Option<i32> {
        self.exit_code
    }

    /// First line the suite printed on stdout (its cluster counts).
    #[must_use]
    pub fn summary(&self) -> Option<&str> {
        self.summary.as_deref()
    }

    /// Whether the repetition finished successfully.
    #[must_use]
    pub fn succeeded(&self) -> bool {
        self.status == RunStatus::Success
    }

    /// Mark the process as spawned.
    pub fn start(&mut self) {
        self.status = RunStatus::Running;
        self.started_at = Some(Utc::now());
    }

    /// Record the process outcome.
    ///
    /// # Arguments
    ///
    /// * `success` - whether the process exited with status 0
    /// * `exit_code` - exit code, `None` if killed by a signal
    /// * `summary` - captured stdout summary line
    pub fn complete(&mut self, success: bool, exit_code: Option<i32>, summary: Option<String>) {
        self.status = if success {
            RunStatus::Success
        } else {
            RunStatus::Failed
        };
        self.exit_code = exit_code;
        self.summary = summary;
        self.ended_at = Some(Utc::now());
    }

    /// Mark the repetition failed without an exit code (spawn error).
    pub fn fail(&mut self) {
        self.complete(false, None, None);
    }

    /// Human-readable exit status.
    #[must_use]
    pub fn status_description(&self) -> String {
        match (self.status, self.exit_code) {
            (RunStatus::Failed, Some(code)) => format!("exit code {code}"),
            (RunStatus::Failed, None) => "terminated without exit code".to_string(),
            (status, _) => format!("{status:?}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repetition_status_default() {
        let record = RepetitionRecord::new(1);
        assert_eq!(record.status(), RunStatus::Pending);
        assert!(record.started_at().is_none());
    }

    #[test]
    fn test_repetition_lifecycle() {
        let mut record = RepetitionRecord::new(2);
        record.start();
        assert_eq!(record.status(), RunStatus::Running);
        record.complete(true, Some(0), Some("[3, 2]".to_string()));
        assert!(record.succeeded());
        assert_eq!(record.summary(), Some("[3, 2]"));
        assert!(record.ended_at() >= record.started_at());
    }

    #[test]
    fn test_failed_status_description() {
        let mut record = RepetitionRecord::new(3);
        record.start();
        record.complete(false, Some(101), None);
        assert_eq!(record.status(), RunStatus::Failed);
        assert_eq!(record.status_description(), "exit code 101");

        let mut killed = RepetitionRecord::new(4);
        killed.fail();
        assert_eq!(killed.status_description(), "terminated without exit code");
    }
}

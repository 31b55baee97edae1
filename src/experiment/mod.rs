//! Experiment bookkeeping: run context, result records and the multirun table
//!
//! ## Schema Overview
//!
//! ```text
//! RunContext (session tag) ──< repetition run_<n>
//!                                  │
//!                                  └──< ParamRun (one per swept value)
//!
//! ResultsDocument { runs: [SweepRecord, ...] }     one per repetition
//! MultirunTable   header + one count row           one per repetition
//! RepetitionRecord                                 runner-side process status
//! ```
//!
//! ## Usage
//!
//! ```rust
//! use cluster_sweep::clustering::ClusterResult;
//! use cluster_sweep::experiment::{ParamRun, RunContext, SweepRecord};
//!
//! let ctx = RunContext::new("RESULTS", "2024-01-01__00-00-00", 1);
//!
//! let mut record = SweepRecord::new();
//! record.push(ParamRun::new(5.0, ClusterResult::from_labels(vec![0, 0, 1, -1])));
//! record.finish(std::time::Duration::from_secs(3));
//!
//! assert_eq!(record.cluster_counts(), vec![2]);
//! assert!(ctx.param_dir(5.0)?.ends_with("run_1/min_5"));
//! # Ok::<(), cluster_sweep::Error>(())
//! ```

mod context;
mod multirun;
mod run_record;
mod sweep_record;

pub use context::{RunContext, MULTIRUN_CSV, TIMESTAMP_FORMAT};
pub use multirun::{MultirunTable, ParamStats};
pub use run_record::{RepetitionRecord, RunStatus};
pub use sweep_record::{ParamRun, ResultsDocument, SweepRecord};

//! Drivers: single sweep, one suite repetition, and the multirun runner

pub mod runner;
pub mod suite;
pub mod sweep;

pub use runner::{run_from_config, Runner, RunnerReport};
pub use suite::{prepare, run_suite, SuiteArgs};
pub use sweep::{record_sweep, run_sweep, SweepPlan};

//! # cluster-sweep: batch HDBSCAN parameter sweeps
//!
//! cluster-sweep runs density-based clustering over a swept hyperparameter,
//! repeats the whole sweep several times as independent subprocesses, and
//! aggregates the per-repetition cluster counts into summary statistics.
//!
//! The clustering itself comes from the `hdbscan` crate. This crate owns the
//! layer around it:
//!
//! - **Data preparation** ([`dataset`]): sampling, normalization, time and
//!   column partitioning over an Arrow-backed numeric table
//! - **Clustering session** ([`clustering`]): one library call per parameter
//! - **Run / suite drivers** ([`driver`]): per-value result files, plots,
//!   cumulative results document and multirun CSV
//! - **Top-level runner** ([`driver::runner`]): repetition fan-out and
//!   mean/std aggregation
//!
//! ## Example
//!
//! ```rust
//! use cluster_sweep::clustering::cluster_count;
//! use cluster_sweep::sweep::ParameterSweep;
//!
//! let sweep = ParameterSweep::from_spec(true, &[1.0, 5.0, 1.0])?;
//! assert_eq!(sweep.values(), &[1.0, 2.0, 3.0, 4.0, 5.0]);
//!
//! assert_eq!(cluster_count(&[-1, 0, 0, 1, 1]), 2);
//! # Ok::<(), cluster_sweep::Error>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

pub mod clustering;
pub mod config;
pub mod dataset;
pub mod driver;
pub mod error;
pub mod experiment;
pub mod logging;
pub mod plot;
pub mod stats;
pub mod sweep;

pub use error::{Error, Result};

//! Run driver: one parameter sweep over a prepared dataset

use std::fs;
use std::time::Instant;

use tracing::info;

use crate::clustering::ClusteringSession;
use crate::dataset::Dataset;
use crate::experiment::{MultirunTable, ParamRun, ResultsDocument, RunContext, SweepRecord};
use crate::plot;
use crate::sweep::{ParameterSweep, SweepOption};
use crate::Result;

/// What to sweep and how.
#[derive(Debug, Clone)]
pub struct SweepPlan {
    /// Parameter values, in order
    pub sweep: ParameterSweep,
    /// Swept hyperparameter
    pub option: SweepOption,
    /// Threads per clustering call (also used for plot rendering)
    pub threads: usize,
    /// Source columns to scatter-plot pairwise; empty disables plotting
    pub plot_cols: Vec<usize>,
}

/// Run the clustering session once per parameter value.
///
/// For each value this creates `run_<n>/min_<value>/`, writes its
/// `results.json` and, if plot columns are set, its scatter plots. Values are
/// processed strictly in order.
///
/// # Errors
///
/// Returns the first clustering, IO or plotting error, including an
/// already existing value directory; files written for earlier values are
/// left in place
pub fn run_sweep(
    ctx: &RunContext,
    session: &dyn ClusteringSession,
    data: &Dataset,
    plan: &SweepPlan,
) -> Result<SweepRecord> {
    let started = Instant::now();
    let mut record = SweepRecord::new();
    info!(rows = data.num_rows(), run = ctx.run(), "starting sweep");
    fs::create_dir_all(ctx.run_dir())?;

    for &value in plan.sweep.values() {
        let param_dir = ctx.param_dir(value)?;
        fs::create_dir(&param_dir)?;

        info!(option = %plan.option, value, "HDBSCAN session started");
        let results = session.run(data, plan.option, value, plan.threads)?;

        let current = ParamRun::new(value, results);
        current.write(&param_dir.join("results.json"))?;

        if !plan.plot_cols.is_empty() {
            plot::scatter_pairs(
                data,
                &plan.plot_cols,
                current.results().labels(),
                &param_dir,
                plan.threads,
            )?;
        }

        info!(
            value,
            n_clusters = current.results().n_clusters(),
            "Session successfully completed"
        );
        record.push(current);
    }

    record.finish(started.elapsed());
    info!(
        run = ctx.run(),
        elapsed = record.elapsed().unwrap_or_default(),
        "current run completed"
    );
    Ok(record)
}

/// Persist a finished sweep.
///
/// Normally the record is appended to the session's cumulative
/// `results.json` and its cluster counts to the multirun table. With
/// `deferred` both go to files inside the run directory for the runner to
/// merge, so concurrent repetitions never share a file.
///
/// # Errors
///
/// Returns error if any file cannot be read or written
pub fn record_sweep(ctx: &RunContext, record: &SweepRecord, deferred: bool) -> Result<()> {
    let counts = record.cluster_counts();
    info!(run = ctx.run(), counts = ?counts, "clusters found for each value");

    if deferred {
        fs::create_dir_all(ctx.run_dir())?;
        fs::write(
            ctx.deferred_record_path(),
            serde_json::to_string_pretty(record)?,
        )?;
        MultirunTable::append_row(&ctx.deferred_row_path(), &counts)?;
    } else {
        fs::create_dir_all(ctx.session_dir())?;
        ResultsDocument::append(&ctx.results_path(), record.clone())?;
        MultirunTable::append_row(&ctx.multirun_csv(), &counts)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clustering::ClusterResult;

    /// Labels every row with `parameter - 1` clusters, round robin.
    struct FakeSession;

    impl ClusteringSession for FakeSession {
        #[allow(clippy::cast_possible_truncation)]
        fn run(
            &self,
            data: &Dataset,
            _option: SweepOption,
            parameter: f64,
            _threads: usize,
        ) -> Result<ClusterResult> {
            let k = (parameter as i32 - 1).max(1);
            let labels = (0..data.num_rows() as i32).map(|i| i % k).collect();
            Ok(ClusterResult::from_labels(labels))
        }
    }

    fn plan(values: &[f64], plot_cols: Vec<usize>) -> SweepPlan {
        let sweep = ParameterSweep::from_spec(false, values).unwrap();
        SweepPlan { sweep, option: SweepOption::MinSamples, threads: 1, plot_cols }
    }

    fn data() -> Dataset {
        Dataset::from_columns(vec![
            vec![0.0, 1.0, 2.0, 3.0],
            vec![3.0, 1.0, 2.0, 0.0],
        ])
        .unwrap()
    }

    #[test]
    fn test_run_sweep_writes_per_value_results() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = RunContext::new(dir.path(), "tag", 1);

        let record = run_sweep(&ctx, &FakeSession, &data(), &plan(&[2.0, 3.0], vec![])).unwrap();

        assert_eq!(record.cluster_counts(), vec![1, 2]);
        assert!(record.elapsed().is_some());
        let written: ParamRun = serde_json::from_str(
            &fs::read_to_string(ctx.param_dir(3.0).unwrap().join("results.json")).unwrap(),
        )
        .unwrap();
        assert_eq!(written, record.paramruns()[1]);
    }

    #[test]
    fn test_run_sweep_refuses_existing_value_directory() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = RunContext::new(dir.path(), "tag", 1);
        run_sweep(&ctx, &FakeSession, &data(), &plan(&[2.0], vec![])).unwrap();
        let before = fs::read_to_string(ctx.param_dir(2.0).unwrap().join("results.json")).unwrap();

        // Same run again: the existing results must survive
        assert!(run_sweep(&ctx, &FakeSession, &data(), &plan(&[2.7], vec![])).is_err());
        let after = fs::read_to_string(ctx.param_dir(2.0).unwrap().join("results.json")).unwrap();
        assert_eq!(before, after);
    }

    #[test]
    fn test_run_sweep_plots_when_requested() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = RunContext::new(dir.path(), "tag", 1);
        run_sweep(&ctx, &FakeSession, &data(), &plan(&[2.0], vec![0, 1])).unwrap();
        assert!(ctx.param_dir(2.0).unwrap().join("0_vs_1.png").exists());
    }

    #[test]
    fn test_record_sweep_shared_and_deferred() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = RunContext::new(dir.path(), "tag", 1);
        let record = run_sweep(&ctx, &FakeSession, &data(), &plan(&[2.0, 3.0], vec![])).unwrap();

        record_sweep(&ctx, &record, false).unwrap();
        assert_eq!(fs::read_to_string(ctx.multirun_csv()).unwrap(), "1,2\n");
        assert_eq!(ResultsDocument::load(&ctx.results_path()).unwrap().runs().len(), 1);

        let ctx2 = ctx.for_run(2);
        record_sweep(&ctx2, &record, true).unwrap();
        assert_eq!(
            MultirunTable::read_row(&ctx2.deferred_row_path()).unwrap(),
            vec![1, 2]
        );
        assert!(ctx2.deferred_record_path().exists());
        // Shared files untouched by the deferred write
        assert_eq!(ResultsDocument::load(&ctx.results_path()).unwrap().runs().len(), 1);
    }
}

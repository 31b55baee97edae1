//! Top-level runner: repetition fan-out and multirun aggregation
//!
//! Each repetition is a separate `suite` subprocess of the same executable.
//! Sequential by default; with `workers > 1` repetitions run concurrently in
//! deferred mode and their per-run outputs are merged in repetition order.

use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use rayon::prelude::*;
use tracing::{error, info, warn};

use super::suite::{ColumnList, NameList, SuiteArgs, ValueList};
use crate::config::RunConfig;
use crate::experiment::{
    MultirunTable, ParamStats, RepetitionRecord, ResultsDocument, RunContext, SweepRecord,
};
use crate::plot;
use crate::{Error, Result};

/// Outcome of a full multirun session.
#[derive(Debug, Clone)]
pub struct RunnerReport {
    /// One record per repetition, in repetition order
    pub repetitions: Vec<RepetitionRecord>,
    /// Per-parameter statistics over all repetitions
    pub stats: Vec<ParamStats>,
}

/// Launches repetitions of a configured sweep and aggregates them.
#[derive(Debug, Clone)]
pub struct Runner {
    config: RunConfig,
    program: PathBuf,
    ctx: RunContext,
    logs_root: PathBuf,
    verbosity: u8,
}

impl Runner {
    /// Create a runner.
    ///
    /// # Arguments
    ///
    /// * `config` - validated run configuration
    /// * `program` - executable providing the `suite` subcommand
    /// * `results_root` - root of all result sessions (usually `RESULTS`)
    /// * `tag` - session timestamp tag
    pub fn new(
        config: RunConfig,
        program: impl Into<PathBuf>,
        results_root: impl Into<PathBuf>,
        tag: impl Into<String>,
    ) -> Self {
        Self {
            config,
            program: program.into(),
            ctx: RunContext::new(results_root, tag, 0),
            logs_root: PathBuf::from("LOGS"),
            verbosity: 0,
        }
    }

    /// Log directory handed to every repetition (default `LOGS`).
    #[must_use]
    pub fn with_logs_dir(mut self, logs_root: impl Into<PathBuf>) -> Self {
        self.logs_root = logs_root.into();
        self
    }

    /// Verbosity (`-v` count) handed to every repetition.
    #[must_use]
    pub const fn with_verbosity(mut self, verbosity: u8) -> Self {
        self.verbosity = verbosity;
        self
    }

    /// Session context (run number 0).
    #[must_use]
    pub const fn context(&self) -> &RunContext {
        &self.ctx
    }

    /// Suite arguments of repetition `run`.
    #[must_use]
    pub fn suite_args(&self, run: usize, deferred: bool) -> SuiteArgs {
        let config = &self.config;
        SuiteArgs {
            data: config.data.clone(),
            sample: config.sample,
            frange: config.range,
            fplots: ColumnList(config.plot_cols.clone()),
            cnames: config.cnames.clone().map(NameList),
            norm: config.norm.clone(),
            part: config.partition.clone(),
            range: config.parameters.range,
            option: config.parameters.option,
            min: ValueList(config.parameters.min.clone()),
            threads: config.threads,
            runcount: run,
            datetime: self.ctx.tag().to_string(),
            seed: config.seed_for_run(run),
            results_dir: self.ctx.results_root().to_path_buf(),
            logs_dir: self.logs_root.clone(),
            defer_stats: deferred,
        }
    }

    /// Run every repetition, then aggregate.
    ///
    /// # Errors
    ///
    /// Returns error if the configuration is invalid (before anything is
    /// written), a repetition fails, or the session files cannot be written
    pub fn run(&self) -> Result<RunnerReport> {
        self.config.validate()?;
        let sweep = self.config.parameters.sweep()?;

        fs::create_dir_all(self.ctx.stats_dir())?;
        ResultsDocument::new().save(&self.ctx.results_path())?;
        MultirunTable::write_header(&self.ctx.multirun_csv(), sweep.values())?;
        info!(
            session = %self.ctx.session_dir().display(),
            runs = self.config.runs,
            workers = self.config.workers,
            "session started"
        );

        let repetitions = if self.config.workers > 1 {
            self.run_parallel()?
        } else {
            self.run_sequential()
        };

        if let Some(failed) = repetitions.iter().find(|r| !r.succeeded()) {
            error!(
                run = failed.run(),
                status = %failed.status_description(),
                "repetition failed, skipping aggregation"
            );
            return Err(Error::RepetitionFailed {
                run: failed.run(),
                status: failed.status_description(),
            });
        }

        let stats = self.aggregate()?;
        info!(session = %self.ctx.session_dir().display(), "session completed");
        Ok(RunnerReport { repetitions, stats })
    }

    fn run_sequential(&self) -> Vec<RepetitionRecord> {
        let mut repetitions = Vec::with_capacity(self.config.runs);
        for run in 1..=self.config.runs {
            let record = self.spawn(run, false);
            let failed = !record.succeeded();
            repetitions.push(record);
            if failed {
                break;
            }
        }
        repetitions
    }

    fn run_parallel(&self) -> Result<Vec<RepetitionRecord>> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.config.workers)
            .build()
            .map_err(|e| Error::Other(format!("worker pool: {e}")))?;

        let repetitions: Vec<RepetitionRecord> = pool.install(|| {
            (1..=self.config.runs)
                .into_par_iter()
                .map(|run| self.spawn(run, true))
                .collect()
        });

        if repetitions.iter().all(RepetitionRecord::succeeded) {
            self.merge_deferred()?;
        }
        Ok(repetitions)
    }

    /// Fold per-run deferred outputs into the shared files, in run order.
    fn merge_deferred(&self) -> Result<()> {
        let mut doc = ResultsDocument::load(&self.ctx.results_path())?;
        for run in 1..=self.config.runs {
            let ctx = self.ctx.for_run(run);
            let record: SweepRecord =
                serde_json::from_str(&fs::read_to_string(ctx.deferred_record_path())?)?;
            let counts = MultirunTable::read_row(&ctx.deferred_row_path())?;
            MultirunTable::append_row(&self.ctx.multirun_csv(), &counts)?;
            doc.push(record);
        }
        doc.save(&self.ctx.results_path())
    }

    /// Command line of repetition `run`, verbosity flags first.
    #[must_use]
    pub fn command_args(&self, run: usize, deferred: bool) -> Vec<OsString> {
        let mut args: Vec<OsString> = vec!["-v".into(); usize::from(self.verbosity)];
        args.push("suite".into());
        args.extend(self.suite_args(run, deferred).to_args());
        args
    }

    fn spawn(&self, run: usize, deferred: bool) -> RepetitionRecord {
        let mut record = RepetitionRecord::new(run);
        let args = self.command_args(run, deferred);

        info!(run, "starting repetition");
        record.start();
        let output = Command::new(&self.program)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .output();

        match output {
            Ok(output) => {
                let summary = String::from_utf8_lossy(&output.stdout)
                    .lines()
                    .next()
                    .map(str::to_string);
                record.complete(output.status.success(), output.status.code(), summary);
                if record.succeeded() {
                    info!(
                        run,
                        counts = record.summary().unwrap_or_default(),
                        "repetition completed"
                    );
                } else {
                    warn!(run, status = %record.status_description(), "repetition failed");
                }
            }
            Err(e) => {
                record.fail();
                error!(run, program = %self.program.display(), "cannot spawn repetition: {e}");
            }
        }
        record
    }

    fn aggregate(&self) -> Result<Vec<ParamStats>> {
        let table = MultirunTable::read(&self.ctx.multirun_csv())?;
        let stats = table.stats();
        MultirunTable::write_stats(&self.ctx.stats_csv(), &stats)?;
        info!(path = %self.ctx.stats_csv().display(), "statistics written");

        if self.config.runs > 1 {
            plot::errorbar(&stats, &self.ctx.stats_plot())?;
            info!(path = %self.ctx.stats_plot().display(), "error-bar plot written");
        }
        Ok(stats)
    }
}

/// Load `config_path` and run a full session.
///
/// Repetitions log to `<logs_root>/<tag>` at the given verbosity.
///
/// # Errors
///
/// Returns error if the configuration cannot be loaded or the session fails
pub fn run_from_config(
    config_path: &Path,
    program: &Path,
    results_root: &Path,
    logs_root: &Path,
    tag: &str,
    verbosity: u8,
) -> Result<RunnerReport> {
    let config = RunConfig::load(config_path).map_err(|e| {
        error!(config = %config_path.display(), "invalid configuration: {e}");
        e
    })?;
    Runner::new(config, program, results_root, tag)
        .with_logs_dir(logs_root)
        .with_verbosity(verbosity)
        .run()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ParameterSpec;
    use crate::sweep::SweepOption;

    fn config(data: &Path) -> RunConfig {
        RunConfig {
            data: data.to_path_buf(),
            sample: 0,
            partition: None,
            norm: None,
            range: Some([0, 1]),
            plot_cols: vec![],
            parameters: ParameterSpec {
                range: true,
                option: SweepOption::MinSamples,
                min: vec![1.0, 3.0, 1.0],
            },
            threads: 1,
            runs: 2,
            seed: Some(10),
            cnames: None,
            workers: 1,
        }
    }

    #[test]
    fn test_suite_args_per_run() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let runner = Runner::new(config(file.path()), "cluster-sweep", "RESULTS", "tag");
        let args = runner.suite_args(2, true);
        assert_eq!(args.runcount, 2);
        assert_eq!(args.seed, Some(12));
        assert_eq!(args.datetime, "tag");
        assert_eq!(args.frange, Some([0, 1]));
        assert!(args.defer_stats);
        assert_eq!(args.logs_dir, PathBuf::from("LOGS"));
    }

    #[test]
    fn test_command_args_forward_logs_and_verbosity() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let runner = Runner::new(config(file.path()), "cluster-sweep", "RESULTS", "tag")
            .with_logs_dir("session-logs")
            .with_verbosity(2);
        let args: Vec<String> = runner
            .command_args(1, false)
            .into_iter()
            .map(|a| a.into_string().unwrap())
            .collect();
        assert_eq!(&args[..3], &["-v", "-v", "suite"]);
        let logs = args.iter().position(|a| a == "--logs-dir").unwrap();
        assert_eq!(args[logs + 1], "session-logs");

        let quiet = Runner::new(config(file.path()), "cluster-sweep", "RESULTS", "tag");
        assert_eq!(quiet.command_args(1, false)[0], OsString::from("suite"));
    }

    #[test]
    fn test_missing_dataset_creates_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("RESULTS");
        let runner = Runner::new(
            config(Path::new("/nonexistent/protein.dat")),
            "cluster-sweep",
            &root,
            "tag",
        );
        assert!(matches!(runner.run(), Err(Error::DatasetNotFound(_))));
        assert!(!root.exists());
    }

    #[test]
    fn test_unspawnable_program_reports_failure() {
        let dir = tempfile::tempdir().unwrap();
        let file = tempfile::NamedTempFile::new().unwrap();
        let runner = Runner::new(
            config(file.path()),
            dir.path().join("no-such-binary"),
            dir.path().join("RESULTS"),
            "tag",
        );
        let err = runner.run().unwrap_err();
        assert!(matches!(err, Error::RepetitionFailed { run: 1, .. }));
        // Header and empty document were written before the failure
        assert!(runner.context().multirun_csv().exists());
        assert!(runner.context().results_path().exists());
    }
}

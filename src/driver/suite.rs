//! Suite driver: one repetition of a full sweep
//!
//! Invoked by the runner as `cluster-sweep suite ...`. The flags mirror the
//! configuration keys:
//!
//! ```text
//! -d data  -s sample  -f frange  -p fplots  -N norm  -P part  -r range
//! -o option  -m min  -t threads  -R runcount  --datetime tag
//! ```
//!
//! Lifecycle events are appended to `<logs-dir>/<datetime>`, the log file of
//! the session the repetition belongs to.

use std::ffi::OsString;
use std::fs;
use std::path::PathBuf;

use clap::{ArgAction, Args};
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{error, info};

use super::sweep::{record_sweep, run_sweep, SweepPlan};
use crate::clustering::ClusteringSession;
use crate::config::{NormSpec, PartitionSpec, DEFAULT_THREADS};
use crate::dataset::{normalize, sample, select_by_column, select_by_time, Dataset};
use crate::experiment::{RunContext, SweepRecord};
use crate::sweep::{ParameterSweep, SweepOption};
use crate::{Error, Result};

/// Command-line arguments of one suite repetition.
#[derive(Args, Debug, Clone, PartialEq)]
pub struct SuiteArgs {
    /// Data to be clustered
    #[arg(short = 'd', long)]
    pub data: PathBuf,

    /// Sample size of the dataset (0 = all rows)
    #[arg(short = 's', long, default_value_t = 0)]
    pub sample: usize,

    /// Inclusive column range to cluster, `start,end`
    #[arg(short = 'f', long, value_parser = parse_bounds)]
    pub frange: Option<[usize; 2]>,

    /// Clustered source columns to plot pairwise, `c1,c2,...`
    #[arg(short = 'p', long, value_parser = parse_column_list, default_value = "")]
    pub fplots: ColumnList,

    /// Column names, `name1,name2,...`
    #[arg(short = 'c', long, value_parser = parse_name_list)]
    pub cnames: Option<NameList>,

    /// Normalization method and columns, `method,c1,c2,...`
    #[arg(short = 'N', long, value_parser = parse_norm)]
    pub norm: Option<NormSpec>,

    /// Partition by time column and cutoff, `column,cutoff`
    #[arg(short = 'P', long, value_parser = parse_partition)]
    pub part: Option<PartitionSpec>,

    /// Treat `--min` as `start,stop,step`
    #[arg(
        short = 'r',
        long,
        action = ArgAction::Set,
        value_parser = parse_flag,
        default_value = "false"
    )]
    pub range: bool,

    /// Swept hyperparameter: `min_samples` or `min_cluster_size`
    #[arg(short = 'o', long, value_parser = parse_option, default_value = "min_samples")]
    pub option: SweepOption,

    /// Parameter values, `v1[,v2[,v3]]`
    #[arg(short = 'm', long, value_parser = parse_value_list)]
    pub min: ValueList,

    /// Threads per clustering call
    #[arg(short = 't', long, default_value_t = DEFAULT_THREADS)]
    pub threads: usize,

    /// Repetition number
    #[arg(short = 'R', long, default_value_t = 1)]
    pub runcount: usize,

    /// Session timestamp tag shared by all repetitions
    #[arg(long)]
    pub datetime: String,

    /// Sampling seed (OS entropy when absent)
    #[arg(long)]
    pub seed: Option<u64>,

    /// Results root directory
    #[arg(long, default_value = "RESULTS")]
    pub results_dir: PathBuf,

    /// Log directory; events are appended to `<logs-dir>/<datetime>`
    #[arg(long, default_value = "LOGS")]
    pub logs_dir: PathBuf,

    /// Write the sweep record and count row into the run directory for the
    /// runner to merge, instead of the shared files
    #[arg(long)]
    pub defer_stats: bool,
}

/// Comma-separated column indices.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColumnList(pub Vec<usize>);

/// Comma-separated column names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NameList(pub Vec<String>);

/// Comma-separated parameter values.
#[derive(Debug, Clone, PartialEq)]
pub struct ValueList(pub Vec<f64>);

fn split_list<T: std::str::FromStr>(s: &str, what: &str) -> std::result::Result<Vec<T>, String>
where
    T::Err: std::fmt::Display,
{
    s.split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(|part| part.parse::<T>().map_err(|e| format!("invalid {what} '{part}': {e}")))
        .collect()
}

fn parse_bounds(s: &str) -> std::result::Result<[usize; 2], String> {
    match split_list::<usize>(s, "column")?.as_slice() {
        [start, end] => Ok([*start, *end]),
        other => Err(format!("expected `start,end`, got {} values", other.len())),
    }
}

fn parse_column_list(s: &str) -> std::result::Result<ColumnList, String> {
    split_list(s, "column").map(ColumnList)
}

fn parse_name_list(s: &str) -> std::result::Result<NameList, String> {
    Ok(NameList(
        s.split(',').map(|n| n.trim().to_string()).collect(),
    ))
}

fn parse_value_list(s: &str) -> std::result::Result<ValueList, String> {
    split_list(s, "parameter value").map(ValueList)
}

fn parse_norm(s: &str) -> std::result::Result<NormSpec, String> {
    let mut parts = s.split(',');
    let method = parts
        .next()
        .map(str::trim)
        .filter(|m| !m.is_empty())
        .ok_or_else(|| "expected `method,c1,c2,...`".to_string())?
        .to_string();
    let rest: Vec<&str> = parts.collect();
    let columns = split_list(&rest.join(","), "column")?;
    Ok(NormSpec { method, columns })
}

fn parse_partition(s: &str) -> std::result::Result<PartitionSpec, String> {
    let parts: Vec<&str> = s.split(',').map(str::trim).collect();
    let [column, cutoff] = parts.as_slice() else {
        return Err(format!("expected `column,cutoff`, got '{s}'"));
    };
    Ok(PartitionSpec {
        column: column
            .parse()
            .map_err(|e| format!("invalid partition column '{column}': {e}"))?,
        range: cutoff
            .parse()
            .map_err(|e| format!("invalid partition cutoff '{cutoff}': {e}"))?,
    })
}

fn parse_flag(s: &str) -> std::result::Result<bool, String> {
    match s.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" => Ok(true),
        "false" | "0" | "no" => Ok(false),
        other => Err(format!("expected true or false, got '{other}'")),
    }
}

fn parse_option(s: &str) -> std::result::Result<SweepOption, String> {
    s.parse().map_err(|e: Error| e.to_string())
}

fn join<T: ToString>(values: &[T]) -> String {
    values
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(",")
}

impl SuiteArgs {
    /// Render these arguments as the flag list of a `suite` invocation.
    #[must_use]
    pub fn to_args(&self) -> Vec<OsString> {
        let mut args: Vec<OsString> = vec![
            "-d".into(),
            self.data.clone().into_os_string(),
            "-s".into(),
            self.sample.to_string().into(),
            "-r".into(),
            self.range.to_string().into(),
            "-o".into(),
            self.option.as_str().into(),
            "-m".into(),
            join(&self.min.0).into(),
            "-t".into(),
            self.threads.to_string().into(),
            "-R".into(),
            self.runcount.to_string().into(),
            "--datetime".into(),
            self.datetime.clone().into(),
            "--results-dir".into(),
            self.results_dir.clone().into_os_string(),
            "--logs-dir".into(),
            self.logs_dir.clone().into_os_string(),
        ];
        if let Some(bounds) = self.frange {
            args.extend(["-f".into(), join(&bounds).into()]);
        }
        if !self.fplots.0.is_empty() {
            args.extend(["-p".into(), join(&self.fplots.0).into()]);
        }
        if let Some(names) = &self.cnames {
            args.extend(["-c".into(), names.0.join(",").into()]);
        }
        if let Some(norm) = &self.norm {
            let mut spec = norm.method.clone();
            if !norm.columns.is_empty() {
                spec.push(',');
                spec.push_str(&join(&norm.columns));
            }
            args.extend(["-N".into(), spec.into()]);
        }
        if let Some(part) = &self.part {
            args.extend(["-P".into(), format!("{},{}", part.column, part.range).into()]);
        }
        if let Some(seed) = self.seed {
            args.extend(["--seed".into(), seed.to_string().into()]);
        }
        if self.defer_stats {
            args.push("--defer-stats".into());
        }
        args
    }

    /// Run context of this repetition.
    #[must_use]
    pub fn context(&self) -> RunContext {
        RunContext::new(&self.results_dir, &self.datetime, self.runcount)
    }

    /// Session log file shared with the runner.
    #[must_use]
    pub fn log_path(&self) -> PathBuf {
        self.context().log_path(&self.logs_dir)
    }
}

/// Apply the preparation pipeline: sample, normalize, partition, select
/// columns, rename.
///
/// # Errors
///
/// Returns the first preparation error
pub fn prepare(args: &SuiteArgs, data: Dataset) -> Result<Dataset> {
    let mut data = data;

    if args.sample > 0 {
        let mut rng = args
            .seed
            .map_or_else(StdRng::from_entropy, StdRng::seed_from_u64);
        data = sample(&data, args.sample, &mut rng)?;
    }
    if let Some(norm) = &args.norm {
        data = normalize(&data, norm.method()?, &norm.columns)?;
    }
    if let Some(part) = &args.part {
        data = select_by_time(&data, part.range, part.column)?;
    }
    if let Some(bounds) = args.frange {
        data = select_by_column(&data, bounds)?;
    }
    if let Some(names) = &args.cnames {
        data = data.with_column_names(&names.0)?;
    }
    Ok(data)
}

/// Run one repetition end to end.
///
/// The dataset path and parameter list are checked before anything is
/// written under the results root.
///
/// # Errors
///
/// Returns [`Error::DatasetNotFound`] for a missing dataset, otherwise the
/// first preparation, clustering or IO error
pub fn run_suite(args: &SuiteArgs, session: &dyn ClusteringSession) -> Result<SweepRecord> {
    if !args.data.exists() {
        error!(data = %args.data.display(), "dataset not found");
        return Err(Error::DatasetNotFound(args.data.clone()));
    }
    let sweep = ParameterSweep::from_spec(args.range, &args.min.0)?;

    let raw = Dataset::read_table(&args.data)?;
    info!(
        rows = raw.num_rows(),
        columns = raw.num_columns(),
        data = %args.data.display(),
        "dataset loaded"
    );
    let data = prepare(args, raw)?;
    info!(rows = data.num_rows(), columns = data.num_columns(), "dataset prepared");

    let ctx = args.context();
    fs::create_dir_all(ctx.run_dir())?;

    let plan = SweepPlan {
        sweep,
        option: args.option,
        threads: args.threads,
        plot_cols: args.fplots.0.clone(),
    };
    let record = run_sweep(&ctx, session, &data, &plan)?;
    record_sweep(&ctx, &record, args.defer_stats)?;
    Ok(record)
}

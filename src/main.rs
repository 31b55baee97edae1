//! cluster-sweep CLI
//!
//! - `cluster-sweep run`: read `config.json`, launch every repetition and
//!   aggregate the multirun statistics
//! - `cluster-sweep suite`: one repetition (spawned by `run`)

use std::path::PathBuf;

use anyhow::Context;
use chrono::Local;
use clap::{Parser, Subcommand};
use tracing::{error, info};

use cluster_sweep::clustering::HdbscanSession;
use cluster_sweep::driver::{run_from_config, run_suite, SuiteArgs};
use cluster_sweep::experiment::RunContext;
use cluster_sweep::logging;

/// Batch HDBSCAN parameter sweeps
#[derive(Parser)]
#[command(name = "cluster-sweep")]
#[command(version)]
#[command(about = "Batch HDBSCAN parameter sweeps with multirun statistics")]
struct Cli {
    /// Verbosity level (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run every configured repetition and aggregate
    Run {
        /// Run configuration
        #[arg(long, default_value = "config.json")]
        config: PathBuf,

        /// Results root directory
        #[arg(long, default_value = "RESULTS")]
        results_dir: PathBuf,

        /// Log directory; the session log is `<logs-dir>/<timestamp>`
        #[arg(long, default_value = "LOGS")]
        logs_dir: PathBuf,
    },
    /// Run a single repetition
    Suite(SuiteArgs),
}

fn run(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Commands::Run {
            config,
            results_dir,
            logs_dir,
        } => {
            let tag = RunContext::timestamp_tag(&Local::now());
            let ctx = RunContext::new(&results_dir, &tag, 0);
            logging::init(cli.verbose, Some(&ctx.log_path(&logs_dir)))
                .context("cannot initialize logging")?;
            info!(config = %config.display(), tag = %tag, "starting multirun session");

            let program =
                std::env::current_exe().context("cannot locate the cluster-sweep executable")?;
            let report =
                run_from_config(&config, &program, &results_dir, &logs_dir, &tag, cli.verbose)?;
            for stats in &report.stats {
                info!(
                    param = stats.param,
                    mean = stats.mean,
                    std = stats.std,
                    n = stats.n,
                    "cluster count"
                );
            }
        }
        Commands::Suite(args) => {
            logging::init(cli.verbose, Some(&args.log_path()))
                .context("cannot initialize logging")?;
            let record = run_suite(&args, &HdbscanSession::new())?;
            println!("{:?}", record.cluster_counts());
        }
    }
    Ok(())
}

fn main() {
    let cli = Cli::parse();
    if let Err(e) = run(cli) {
        error!("{e:#}");
        std::process::exit(1);
    }
}

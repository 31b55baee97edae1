//! Logging setup: stderr plus an optional plain-text session log file

use std::fs::{self, File, OpenOptions};
use std::path::Path;
use std::sync::Mutex;

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter, Layer};

use crate::{Error, Result};

/// Filter for a `-v` count; with no flag `RUST_LOG` wins, falling back to
/// `info`.
#[must_use]
pub fn filter_for(verbosity: u8) -> EnvFilter {
    match verbosity {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        1 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    }
}

fn open_log(path: &Path) -> Result<File> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    Ok(OpenOptions::new().create(true).append(true).open(path)?)
}

/// Install the global subscriber.
///
/// Events go to stderr; when `log_file` is given they are also appended to it
/// without ANSI colors.
///
/// # Errors
///
/// Returns error if the log file cannot be opened or a global subscriber is
/// already installed
pub fn init(verbosity: u8, log_file: Option<&Path>) -> Result<()> {
    let stderr_layer = fmt::layer()
        .with_target(false)
        .with_writer(std::io::stderr);

    let file_layer = log_file
        .map(open_log)
        .transpose()?
        .map(|file| {
            fmt::layer()
                .with_ansi(false)
                .with_target(false)
                .with_writer(Mutex::new(file))
                .boxed()
        });

    tracing_subscriber::registry()
        .with(filter_for(verbosity))
        .with(stderr_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| Error::Other(format!("logging already initialized: {e}")))
}

//! File logging.
//!
//! The TUI owns stdout, so logs go to a daily-rotated file under
//! `${CONNECTIFY_HOME}/logs`. Verbosity comes from `CONNECTIFY_LOG`
//! (an `EnvFilter` directive, default `info`).

use std::path::Path;

use anyhow::{Context, Result};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt;
use tracing_subscriber::prelude::*;

/// Environment variable holding the log filter.
pub const LOG_ENV: &str = "CONNECTIFY_LOG";

const LOG_FILE_PREFIX: &str = "connectify.log";
const DEFAULT_FILTER: &str = "info";

/// Installs the global subscriber writing to `dir`.
///
/// Keep the returned guard alive for the life of the process; dropping it
/// flushes pending lines.
///
/// # Errors
/// Returns an error if the directory cannot be created or a subscriber is already installed.
pub fn init(dir: &Path) -> Result<WorkerGuard> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("create log directory {}", dir.display()))?;

    let appender = tracing_appender::rolling::daily(dir, LOG_FILE_PREFIX);
    let (writer, guard) = tracing_appender::non_blocking(appender);

    tracing_subscriber::registry()
        .with(filter_from_env())
        .with(fmt::layer().with_writer(writer).with_ansi(false))
        .try_init()
        .context("install tracing subscriber")?;

    Ok(guard)
}

fn filter_from_env() -> EnvFilter {
    EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

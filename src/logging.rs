//! Tracing initialization
//!
//! Logs go to a daily-rolling file so the terminal stays free for the chat.

use std::path::Path;

use anyhow::{Context, Result};
use tracing::Subscriber;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

/// Filter used when `RUST_LOG` is unset
pub const DEFAULT_FILTER: &str = "triage_desk=info";

/// File name prefix; the appender adds the date
pub const LOG_FILE_NAME: &str = "triage-desk.log";

/// `RUST_LOG` if set, otherwise [`DEFAULT_FILTER`]
pub fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

/// Subscriber writing to a daily file in `dir`.
///
/// Keep the guard alive for as long as logs should be flushed.
pub fn file_subscriber(
    dir: &Path,
    filter: EnvFilter,
) -> (impl Subscriber + Send + Sync + 'static, WorkerGuard) {
    let appender = tracing_appender::rolling::daily(dir, LOG_FILE_NAME);
    let (writer, guard) = tracing_appender::non_blocking(appender);
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_ansi(false)
        .with_target(false)
        .finish();
    (subscriber, guard)
}

/// Install the global subscriber, logging under `dir`
pub fn init_logging(dir: impl AsRef<Path>) -> Result<WorkerGuard> {
    let dir = dir.as_ref();
    std::fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create log directory {}", dir.display()))?;

    let (subscriber, guard) = file_subscriber(dir, env_filter());
    tracing::subscriber::set_global_default(subscriber)
        .context("A global tracing subscriber is already installed")?;
    Ok(guard)
}

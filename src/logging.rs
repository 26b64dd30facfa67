//! File logging. The terminal belongs to the UI, so logs go to a daily file.

use color_eyre::{eyre::eyre, Result};
use std::path::PathBuf;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Checked before `RUST_LOG`
const LOG_ENV: &str = "EXEMPLAR_LOG";
const DEFAULT_FILTER: &str = "exemplar=info";

/// Directory log files are written to
pub fn log_dir() -> Result<PathBuf> {
  let data_dir = dirs::data_dir()
    .or_else(|| dirs::home_dir().map(|p| p.join(".local/share")))
    .ok_or_else(|| eyre!("Could not determine data directory"))?;

  Ok(data_dir.join("exemplar").join("logs"))
}

fn env_filter() -> EnvFilter {
  std::env::var(LOG_ENV)
    .ok()
    .and_then(|directives| EnvFilter::try_new(directives).ok())
    .or_else(|| EnvFilter::try_from_default_env().ok())
    .unwrap_or_else(|| EnvFilter::new(DEFAULT_FILTER))
}

/// Install the global subscriber.
///
/// Keep the returned guard alive for the whole run; dropping it flushes and
/// stops the writer thread.
pub fn init() -> Result<WorkerGuard> {
  let dir = log_dir()?;
  std::fs::create_dir_all(&dir)
    .map_err(|e| eyre!("Failed to create log directory {}: {}", dir.display(), e))?;

  let appender = tracing_appender::rolling::daily(&dir, "exemplar.log");
  let (writer, guard) = tracing_appender::non_blocking(appender);

  tracing_subscriber::registry()
    .with(env_filter())
    .with(fmt::layer().with_writer(writer).with_ansi(false))
    .try_init()
    .map_err(|e| eyre!("Failed to install logger: {}", e))?;

  Ok(guard)
}

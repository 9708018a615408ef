//! Log sink setup for the command line binary
//!
//! Every record goes to stdout and to `<log_directory>/<log_file_name>` (append mode), both with
//! the same `%Y-%m-%d-%H:%M:%S LEVEL message` layout. The library itself only emits `tracing`
//! events; installing the subscriber is left to the binary.

use crate::config::LoggingConfig;
use crate::error::{Error, Result};
use crate::utils::ensure_directory;
use std::fs::{File, OpenOptions};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::fmt::format::{DefaultFields, Format, Full};
use tracing_subscriber::fmt::time::ChronoLocal;
use tracing_subscriber::fmt::{self, MakeWriter};
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// chrono format of the timestamp prefix on every log line
pub const LOG_TIME_FORMAT: &str = "%Y-%m-%d-%H:%M:%S";

/// Level filter used when `RUST_LOG` is not set
pub const DEFAULT_FILTER: &str = "debug";

/// Create the log directory, open the log file and install the global subscriber
///
/// Returns the log file path.
///
/// # Errors
///
/// - [`Error::NotADirectory`] if the log directory path is an existing file
/// - [`Error::Io`] if the log file cannot be opened
/// - [`Error::Config`] if a global subscriber is already installed
pub fn init(config: &LoggingConfig) -> Result<PathBuf> {
    let (path, file) = open_log_file(config)?;

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    tracing_subscriber::registry()
        .with(filter)
        .with(format_layer(std::io::stdout))
        .with(format_layer(Arc::new(file)))
        .try_init()
        .map_err(|e| Error::Config {
            message: format!("logging could not be initiated: {}", e),
            key: None,
        })?;

    info!("logging initiated");
    Ok(path)
}

/// Create the log directory if needed and open the log file for appending
pub fn open_log_file(config: &LoggingConfig) -> Result<(PathBuf, File)> {
    ensure_directory(&config.log_directory)?;

    let path = config.log_file_path();
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .map_err(|e| {
            Error::Io(std::io::Error::new(
                e.kind(),
                format!("failed to open log file '{}': {}", path.display(), e),
            ))
        })?;

    Ok((path, file))
}

/// Plain-text formatter shared by the console and file sinks
fn format_layer<S, W>(writer: W) -> fmt::Layer<S, DefaultFields, Format<Full, ChronoLocal>, W>
where
    S: tracing::Subscriber + for<'a> LookupSpan<'a>,
    W: for<'w> MakeWriter<'w> + 'static,
{
    fmt::layer()
        .with_timer(ChronoLocal::new(LOG_TIME_FORMAT.to_string()))
        .with_target(false)
        .with_ansi(false)
        .with_writer(writer)
}

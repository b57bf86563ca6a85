#![forbid(unsafe_code)]
#![deny(
    warnings,
    dead_code,
    unused,
    unused_imports,
    unused_must_use,
    unreachable_pub,
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    rustdoc::broken_intra_doc_links,
    rustdoc::bare_urls,
    missing_docs
)]

//! Logging initialisation for the watcher daemon.
//!
//! # Design
//! - Single entry point installing the global tracing subscriber once.
//! - Console fmt layer plus a daily rolling log file under the watched root,
//!   so the log travels with the data it describes.
//! - `RUST_LOG` wins over the configured fallback level.

use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Default logging target when neither `RUST_LOG` nor config provide one.
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// File name prefix for the daily rolling log.
pub const LOG_FILE_PREFIX: &str = "vigia.log";

/// Errors produced while installing telemetry.
#[derive(Debug, Error)]
pub enum TelemetryError {
    /// The global tracing subscriber could not be installed.
    #[error("failed to install tracing subscriber")]
    SubscriberInstall {
        /// Detail from the subscriber registry.
        detail: String,
    },
}

/// Convenience alias for telemetry results.
pub type TelemetryResult<T> = Result<T, TelemetryError>;

/// Logging configuration.
#[derive(Debug, Clone)]
pub struct LoggingConfig<'a> {
    /// Fallback log level string (e.g., `info`, `debug`).
    pub level: &'a str,
    /// Directory receiving the daily rolling log file.
    pub log_dir: PathBuf,
}

impl<'a> LoggingConfig<'a> {
    /// Build a logging configuration for the given level and log directory.
    #[must_use]
    pub fn new(level: &'a str, log_dir: &Path) -> Self {
        Self {
            level,
            log_dir: log_dir.to_path_buf(),
        }
    }
}

/// Configure and install the global tracing subscriber.
///
/// The returned guard must be held for the life of the process; dropping it
/// stops the non-blocking file writer and loses buffered lines.
///
/// # Errors
///
/// Returns an error if the subscriber cannot be installed (for example,
/// because another subscriber has already been set globally).
pub fn init_logging(config: &LoggingConfig<'_>) -> TelemetryResult<WorkerGuard> {
    let file_appender = rolling::daily(&config.log_dir, LOG_FILE_PREFIX);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::registry()
        .with(build_env_filter(config.level))
        .with(fmt::layer().with_target(false).with_thread_ids(false))
        .with(
            fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(false)
                .with_target(false),
        )
        .try_init()
        .map_err(|err| TelemetryError::SubscriberInstall {
            detail: err.to_string(),
        })?;

    Ok(guard)
}

fn build_env_filter(level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level))
}

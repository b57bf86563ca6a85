//! Top-level error taxonomy for daemon startup and shutdown.

use std::io;
use std::path::PathBuf;

use thiserror::Error;
use vigia_client::UploadError;
use vigia_config::ConfigError;
use vigia_organizer::OrganizerError;
use vigia_telemetry::TelemetryError;
use vigia_watcher::WatchError;

/// Result type for daemon lifecycle operations.
pub type AppResult<T> = Result<T, AppError>;

/// Errors surfaced while bootstrapping or tearing down the daemon.
#[derive(Debug, Error)]
pub enum AppError {
    /// Configuration could not be loaded or validated.
    #[error("configuration failure")]
    Config {
        /// Underlying configuration error.
        #[from]
        source: ConfigError,
    },
    /// The tracing subscriber could not be installed.
    #[error("telemetry initialisation failure")]
    Telemetry {
        /// Underlying telemetry error.
        #[from]
        source: TelemetryError,
    },
    /// The HTTP client could not be constructed.
    #[error("ingestion client failure")]
    Client {
        /// Underlying upload error.
        #[from]
        source: UploadError,
    },
    /// The bucket layout could not be prepared.
    #[error("bucket layout failure")]
    Organizer {
        /// Underlying organizer error.
        #[from]
        source: OrganizerError,
    },
    /// The directory watch could not be started.
    #[error("directory watch failure")]
    Watch {
        /// Underlying watch error.
        #[from]
        source: WatchError,
    },
    /// A runtime directory could not be created.
    #[error("runtime directory creation failed")]
    Io {
        /// Operation that triggered the failure.
        operation: &'static str,
        /// Path involved in the failure.
        path: PathBuf,
        /// Underlying IO error.
        source: io::Error,
    },
    /// The shutdown signal handler could not be installed.
    #[error("shutdown signal handler failure")]
    Signal {
        /// Underlying IO error.
        source: io::Error,
    },
}

impl AppError {
    pub(crate) fn io(operation: &'static str, path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            operation,
            path: path.into(),
            source,
        }
    }
}

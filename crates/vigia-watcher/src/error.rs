//! Structured errors for directory observation.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Result type for watch operations.
pub type WatchResult<T> = Result<T, WatchError>;

/// Errors produced while setting up or running the directory watch.
#[derive(Debug, Error)]
pub enum WatchError {
    /// The document name pattern could not be compiled.
    #[error("document name pattern failed to compile")]
    Pattern {
        /// Underlying glob error.
        source: globset::Error,
    },
    /// The platform watcher backend failed.
    #[error("filesystem watcher backend failure")]
    Backend {
        /// Operation that triggered the failure.
        operation: &'static str,
        /// Underlying notify error.
        source: notify::Error,
    },
    /// A filesystem operation on the watch root failed.
    #[error("watch root filesystem operation failed")]
    Io {
        /// Operation that triggered the failure.
        operation: &'static str,
        /// Path involved in the failure.
        path: PathBuf,
        /// Underlying IO error.
        source: io::Error,
    },
}

impl WatchError {
    pub(crate) const fn pattern(source: globset::Error) -> Self {
        Self::Pattern { source }
    }

    pub(crate) const fn backend(operation: &'static str, source: notify::Error) -> Self {
        Self::Backend { operation, source }
    }

    pub(crate) fn io(operation: &'static str, path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            operation,
            path: path.into(),
            source,
        }
    }
}

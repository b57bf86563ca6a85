//! # Design
//!
//! - Structured, constant-message errors for the upload pipeline.
//! - Every variant knows whether it is worth another attempt, so the retry
//!   loop never inspects transport details itself.
//! - Source errors are preserved without interpolating context into
//!   messages.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Result type for Ingestion API operations.
pub type UploadResult<T> = Result<T, UploadError>;

/// Errors produced while talking to the Ingestion API.
#[derive(Debug, Error)]
pub enum UploadError {
    /// The HTTP client could not be constructed.
    #[error("http client construction failed")]
    ClientBuild {
        /// Underlying reqwest error.
        source: reqwest::Error,
    },
    /// Transport-level failure: timeout, connection reset, DNS.
    #[error("http transport failure")]
    Http {
        /// Operation that triggered the failure.
        operation: &'static str,
        /// URL used for the request.
        url: String,
        /// Underlying reqwest error.
        source: reqwest::Error,
    },
    /// The server answered with a non-success status.
    #[error("http response status error")]
    Status {
        /// Operation that triggered the failure.
        operation: &'static str,
        /// URL used for the request.
        url: String,
        /// HTTP status code returned by the server.
        status: u16,
    },
    /// The server rejected the credential twice in a row.
    #[error("authentication rejected after forced re-login")]
    AuthRejected {
        /// Operation whose retried request was rejected again.
        operation: &'static str,
    },
    /// A file exceeded the configured size ceiling.
    #[error("file exceeds configured size limit")]
    OversizedFile {
        /// Path of the oversized file.
        path: PathBuf,
        /// Observed size in bytes.
        size: u64,
        /// Configured ceiling in bytes.
        limit: u64,
    },
    /// The batch exceeded the configured maximum count.
    #[error("batch exceeds configured maximum size")]
    BatchTooLarge {
        /// Number of files in the offending batch.
        count: usize,
        /// Configured maximum batch size.
        limit: usize,
    },
    /// An empty batch was submitted.
    #[error("empty batch submitted for upload")]
    EmptyBatch,
    /// A batch file could not be read before upload.
    #[error("failed to read batch file")]
    Io {
        /// Operation that triggered the failure.
        operation: &'static str,
        /// Path involved in the failure.
        path: PathBuf,
        /// Underlying IO error.
        source: io::Error,
    },
}

impl UploadError {
    /// Whether another attempt may succeed.
    ///
    /// Transport failures and server-side (5xx) statuses are transient;
    /// everything else aborts the batch immediately.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        match self {
            Self::Http { .. } => true,
            Self::Status { status, .. } => *status >= 500,
            Self::ClientBuild { .. }
            | Self::AuthRejected { .. }
            | Self::OversizedFile { .. }
            | Self::BatchTooLarge { .. }
            | Self::EmptyBatch
            | Self::Io { .. } => false,
        }
    }

    /// Whether this error is an HTTP 401 from the server.
    #[must_use]
    pub const fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Status { status: 401, .. })
    }

    pub(crate) fn http(operation: &'static str, url: impl Into<String>, source: reqwest::Error) -> Self {
        Self::Http {
            operation,
            url: url.into(),
            source,
        }
    }

    pub(crate) fn status(operation: &'static str, url: impl Into<String>, status: u16) -> Self {
        Self::Status {
            operation,
            url: url.into(),
            status,
        }
    }

    pub(crate) fn io(operation: &'static str, path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            operation,
            path: path.into(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transport_and_server_errors_are_retryable() {
        assert!(UploadError::status("upload", "http://api", 500).is_retryable());
        assert!(UploadError::status("upload", "http://api", 503).is_retryable());
    }

    #[test]
    fn client_errors_are_fatal() {
        assert!(!UploadError::status("upload", "http://api", 400).is_retryable());
        assert!(!UploadError::status("upload", "http://api", 404).is_retryable());
        assert!(!UploadError::status("upload", "http://api", 422).is_retryable());
    }

    #[test]
    fn unauthorized_is_detected_but_not_generically_retryable() {
        let unauthorized = UploadError::status("upload", "http://api", 401);
        assert!(unauthorized.is_unauthorized());
        assert!(!unauthorized.is_retryable());
    }

    #[test]
    fn local_contract_violations_are_fatal() {
        let oversized = UploadError::OversizedFile {
            path: PathBuf::from("big.xml"),
            size: 10,
            limit: 5,
        };
        assert!(!oversized.is_retryable());

        let too_large = UploadError::BatchTooLarge {
            count: 30,
            limit: 20,
        };
        assert!(!too_large.is_retryable());
        assert!(!UploadError::EmptyBatch.is_retryable());
    }
}

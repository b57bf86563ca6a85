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
#![allow(clippy::module_name_repetitions)]

//! HTTP client for the remote Ingestion API: bearer-token session
//! management and reliable batch uploads.
//!
//! # Design
//! - `AuthSession` owns the credential and its conservative validity
//!   window; it is the only code allowed to mutate the token.
//! - `Uploader` delivers batches through the session with a doubling
//!   backoff retry loop and a retryable-vs-fatal error taxonomy.
//! - No local file mutation happens here; routing files to their terminal
//!   bucket is the organizer's job.

pub mod auth;
pub mod error;
pub mod uploader;

pub use auth::AuthSession;
pub use error::{UploadError, UploadResult};
pub use uploader::Uploader;

/// Build the shared HTTP client with the configured hard request timeout.
///
/// # Errors
///
/// Returns an error if the TLS backend cannot be initialised.
pub fn build_http_client(timeout: std::time::Duration) -> UploadResult<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|source| UploadError::ClientBuild { source })
}

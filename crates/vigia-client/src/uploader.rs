//! Reliable batch delivery to the Ingestion API.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use reqwest::multipart::{Form, Part};
use serde_json::Value;
use tokio::time::sleep;
use tracing::{info, warn};
use vigia_config::{RetrySettings, WatchSettings};

use crate::auth::AuthSession;
use crate::error::{UploadError, UploadResult};

const SINGLE_UPLOAD_PATH: &str = "/documents/upload-xml";
const BATCH_UPLOAD_PATH: &str = "/documents/upload-xml-batch";
const SINGLE_FIELD: &str = "xmlFile";
const BATCH_FIELD: &str = "xmlFiles";
const XML_MIME: &str = "text/xml";

struct FilePayload {
    name: String,
    bytes: Vec<u8>,
}

/// Delivers batches of XML files to the Ingestion API, or fails them
/// clearly after exhausting the retry budget.
pub struct Uploader {
    client: reqwest::Client,
    session: Arc<AuthSession>,
    base_url: String,
    max_batch_size: usize,
    max_file_bytes: u64,
    retry: RetrySettings,
}

impl Uploader {
    /// Construct an uploader sharing the given session and HTTP client.
    #[must_use]
    pub fn new(
        client: reqwest::Client,
        session: Arc<AuthSession>,
        base_url: &str,
        watch: &WatchSettings,
        retry: RetrySettings,
    ) -> Self {
        Self {
            client,
            session,
            base_url: base_url.trim_end_matches('/').to_string(),
            max_batch_size: watch.batch_size,
            max_file_bytes: watch.max_file_bytes(),
            retry,
        }
    }

    /// Upload a batch of 1..=`max_batch_size` files and return the server's
    /// acknowledgement payload.
    ///
    /// Oversized files and over-limit batches fail before any network
    /// call. Transient failures are retried on the configured doubling
    /// backoff schedule; the last classified error is surfaced once the
    /// attempt budget is spent. Callers must not assume partial success.
    ///
    /// # Errors
    ///
    /// Returns the last classified [`UploadError`] on failure.
    pub async fn upload(&self, batch: &[PathBuf]) -> UploadResult<Value> {
        if batch.is_empty() {
            return Err(UploadError::EmptyBatch);
        }
        if batch.len() > self.max_batch_size {
            return Err(UploadError::BatchTooLarge {
                count: batch.len(),
                limit: self.max_batch_size,
            });
        }

        let payloads = self.load_payloads(batch).await?;
        let (operation, path, field) = if payloads.len() == 1 {
            ("upload_single", SINGLE_UPLOAD_PATH, SINGLE_FIELD)
        } else {
            ("upload_batch", BATCH_UPLOAD_PATH, BATCH_FIELD)
        };
        let url = format!("{}{path}", self.base_url);

        let mut attempt = 0;
        loop {
            attempt += 1;
            let delay = self.retry.delay_before(attempt);
            if !delay.is_zero() {
                sleep(delay).await;
            }
            if attempt > 1 {
                warn!(
                    attempt,
                    attempts = self.retry.attempts,
                    operation,
                    "retrying batch upload"
                );
            }

            let result = self
                .session
                .with_auth(operation, |token| {
                    self.send(operation, &url, field, &payloads, token)
                })
                .await;

            match result {
                Ok(ack) => {
                    info!(operation, files = payloads.len(), "batch upload acknowledged");
                    return Ok(ack);
                }
                Err(error) if error.is_retryable() && attempt < self.retry.attempts => {
                    warn!(operation, attempt, error = %error, "upload attempt failed");
                }
                Err(error) => return Err(error),
            }
        }
    }

    async fn load_payloads(&self, batch: &[PathBuf]) -> UploadResult<Vec<FilePayload>> {
        let mut payloads = Vec::with_capacity(batch.len());
        for path in batch {
            let metadata = tokio::fs::metadata(path)
                .await
                .map_err(|source| UploadError::io("stat_batch_file", path, source))?;
            if metadata.len() > self.max_file_bytes {
                return Err(UploadError::OversizedFile {
                    path: path.clone(),
                    size: metadata.len(),
                    limit: self.max_file_bytes,
                });
            }
            let bytes = tokio::fs::read(path)
                .await
                .map_err(|source| UploadError::io("read_batch_file", path, source))?;
            payloads.push(FilePayload {
                name: file_name_of(path),
                bytes,
            });
        }
        Ok(payloads)
    }

    async fn send(
        &self,
        operation: &'static str,
        url: &str,
        field: &'static str,
        payloads: &[FilePayload],
        token: String,
    ) -> UploadResult<Value> {
        let mut form = Form::new();
        for payload in payloads {
            let part = Part::bytes(payload.bytes.clone())
                .file_name(payload.name.clone())
                .mime_str(XML_MIME)
                .map_err(|source| UploadError::http(operation, url, source))?;
            form = form.part(field, part);
        }

        let response = self
            .client
            .post(url)
            .bearer_auth(token)
            .multipart(form)
            .send()
            .await
            .map_err(|source| UploadError::http(operation, url, source))?;

        let status = response.status();
        if !status.is_success() {
            return Err(UploadError::status(operation, url, status.as_u16()));
        }
        response
            .json()
            .await
            .map_err(|source| UploadError::http(operation, url, source))
    }
}

fn file_name_of(path: &Path) -> String {
    path.file_name()
        .map_or_else(|| path.to_string_lossy().into_owned(), |name| {
            name.to_string_lossy().into_owned()
        })
}

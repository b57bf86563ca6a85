//! Batch pipeline: classify, upload, and file every document.

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, error, info, warn};
use vigia_client::Uploader;
use vigia_organizer::{Disposition, Organizer, classify_document};
use vigia_watcher::{BatchHandler, HandlerError};

/// Consumes stable batches from the watcher: non-invoice documents are
/// parked under `ignored/`, the rest are uploaded as one batch and then
/// committed to `processed/` or `errors/` depending on the outcome.
pub struct UploadPipeline {
    uploader: Uploader,
    organizer: Arc<Organizer>,
}

impl UploadPipeline {
    /// Wire the pipeline over a shared organizer and an uploader.
    #[must_use]
    pub const fn new(uploader: Uploader, organizer: Arc<Organizer>) -> Self {
        Self {
            uploader,
            organizer,
        }
    }

    fn park_ignored(&self, path: &PathBuf, reason: &'static str) {
        match self.organizer.ignore(path) {
            Ok(dest) => info!(
                from = %path.display(),
                to = %dest.display(),
                reason,
                "document excluded from upload"
            ),
            Err(error) => warn!(
                path = %path.display(),
                error = %error,
                "failed to park excluded document"
            ),
        }
    }
}

#[async_trait]
impl BatchHandler for UploadPipeline {
    async fn handle(&self, batch: Vec<PathBuf>) -> Result<(), HandlerError> {
        let mut uploadable = Vec::with_capacity(batch.len());
        for path in batch {
            match classify_document(&path) {
                Ok(kind) if kind.is_uploadable() => uploadable.push(path),
                Ok(_) => self.park_ignored(&path, "not an invoice"),
                Err(error) => {
                    warn!(path = %path.display(), error = %error, "document unreadable");
                    self.park_ignored(&path, "unreadable");
                }
            }
        }

        if uploadable.is_empty() {
            debug!("batch held no uploadable documents");
            return Ok(());
        }

        match self.uploader.upload(&uploadable).await {
            Ok(ack) => {
                debug!(ack = %ack, "ingestion api acknowledged batch");
                self.organizer.commit(&uploadable, Disposition::Processed)?;
            }
            Err(upload_error) => {
                error!(
                    files = uploadable.len(),
                    error = %upload_error,
                    "batch upload failed, filing under errors"
                );
                self.organizer.commit(&uploadable, Disposition::Failed)?;
            }
        }
        Ok(())
    }
}

//! Concurrency-1 processing queue between observation and delivery.

use std::error::Error;
use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::mpsc::UnboundedReceiver;
use tracing::{debug, error};

/// Boxed error surfaced by a batch handler.
pub type HandlerError = Box<dyn Error + Send + Sync>;

/// Consumer seam for stable batches leaving the watch loop.
#[async_trait]
pub trait BatchHandler: Send + Sync {
    /// Process one batch to completion before the next is dequeued.
    ///
    /// # Errors
    ///
    /// Returns the pipeline's error; the queue logs it and moves on.
    async fn handle(&self, batch: Vec<PathBuf>) -> Result<(), HandlerError>;
}

/// Drain batches strictly serially. A failed batch never stops the queue.
pub(crate) async fn run_queue(
    mut batches: UnboundedReceiver<Vec<PathBuf>>,
    handler: Arc<dyn BatchHandler>,
) {
    while let Some(batch) = batches.recv().await {
        let files = batch.len();
        debug!(files, "dequeued batch");
        if let Err(error) = handler.handle(batch).await {
            error!(files, error = %error, "batch processing failed");
        }
    }
}

//! Watch service wiring the platform watcher to the batch pipeline.

use std::fs;
use std::path::Path;
use std::sync::Arc;

use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{info, warn};
use vigia_config::WatchSettings;

use crate::batcher::run_batcher;
use crate::error::{WatchError, WatchResult};
use crate::filter::XmlFilter;
use crate::queue::{BatchHandler, run_queue};

/// Observes the watch root and feeds stable XML batches to a handler.
///
/// Dropping the service tears the event source down; [`shutdown`] does so
/// while waiting for in-flight work to finish.
///
/// [`shutdown`]: WatchService::shutdown
pub struct WatchService {
    watcher: RecommendedWatcher,
    batcher: JoinHandle<()>,
    queue: JoinHandle<()>,
}

impl WatchService {
    /// Start watching `root` (depth 1) and spawn the batching and queue
    /// tasks. Files already present in the root are picked up immediately
    /// and travel through the same stability debounce as new arrivals.
    ///
    /// # Errors
    ///
    /// Returns an error if the root cannot be scanned or the platform
    /// watcher cannot be installed.
    pub fn spawn(
        root: &Path,
        settings: &WatchSettings,
        handler: Arc<dyn BatchHandler>,
    ) -> WatchResult<Self> {
        let filter = XmlFilter::new()?;
        let (event_tx, event_rx) = mpsc::unbounded_channel();

        let entries =
            fs::read_dir(root).map_err(|source| WatchError::io("scan_watch_root", root, source))?;
        let mut preexisting = 0_usize;
        for entry in entries {
            let entry =
                entry.map_err(|source| WatchError::io("scan_watch_root", root, source))?;
            let path = entry.path();
            if path.is_file() && filter.matches(&path) {
                preexisting += 1;
                let _ = event_tx.send(path);
            }
        }

        let callback_filter = filter.clone();
        let mut watcher = RecommendedWatcher::new(
            move |observed: notify::Result<Event>| match observed {
                Ok(event) => {
                    if matches!(event.kind, EventKind::Create(_) | EventKind::Modify(_)) {
                        for path in event.paths {
                            if callback_filter.matches(&path) {
                                let _ = event_tx.send(path);
                            }
                        }
                    }
                }
                Err(error) => warn!(error = %error, "filesystem watch error"),
            },
            notify::Config::default(),
        )
        .map_err(|source| WatchError::backend("create_watcher", source))?;
        watcher
            .watch(root, RecursiveMode::NonRecursive)
            .map_err(|source| WatchError::backend("watch_root", source))?;

        let (batch_tx, batch_rx) = mpsc::unbounded_channel();
        let batcher = tokio::spawn(run_batcher(event_rx, settings.clone(), batch_tx));
        let queue = tokio::spawn(run_queue(batch_rx, handler));

        info!(
            root = %root.display(),
            preexisting,
            "watching for xml documents"
        );
        Ok(Self {
            watcher,
            batcher,
            queue,
        })
    }

    /// Stop observing and wait for queued batches to drain.
    pub async fn shutdown(self) {
        drop(self.watcher);
        let _ = self.batcher.await;
        let _ = self.queue.await;
        info!("watch service stopped");
    }
}

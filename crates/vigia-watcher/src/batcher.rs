//! Stability debounce and batch-join windowing.
//!
//! # Design
//! - Every observed write restarts that path's stability timer; a file only
//!   leaves the settling set once it has been quiet for the full window.
//! - Newly stable paths join the pending batch and restart the shared
//!   batch-join timer, so bursts of related documents travel together.
//! - When the join window closes, the pending set is snapshotted, split
//!   into upload-sized chunks and submitted downstream.

use std::collections::HashMap;
use std::path::PathBuf;

use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};
use tokio::time::Instant;
use tracing::debug;
use vigia_config::WatchSettings;

pub(crate) async fn run_batcher(
    mut events: UnboundedReceiver<PathBuf>,
    settings: WatchSettings,
    batches: UnboundedSender<Vec<PathBuf>>,
) {
    let stability = settings.stability_delay();
    let window = settings.batch_window();
    let mut settling: HashMap<PathBuf, Instant> = HashMap::new();
    let mut pending: Vec<PathBuf> = Vec::new();
    let mut window_deadline: Option<Instant> = None;

    loop {
        let next = next_deadline(&settling, window_deadline);
        tokio::select! {
            received = events.recv() => match received {
                Some(path) => {
                    debug!(path = %path.display(), "write observed, restarting stability timer");
                    settling.insert(path, Instant::now() + stability);
                }
                None => break,
            },
            () = sleep_until_deadline(next), if next.is_some() => {
                let now = Instant::now();
                let due: Vec<PathBuf> = settling
                    .iter()
                    .filter(|(_, stable_at)| **stable_at <= now)
                    .map(|(path, _)| path.clone())
                    .collect();
                if due.is_empty() {
                    if window_deadline.is_some_and(|at| at <= now) {
                        window_deadline = None;
                        if !flush(&mut pending, settings.batch_size, &batches) {
                            break;
                        }
                    }
                } else {
                    for path in due {
                        settling.remove(&path);
                        if !pending.contains(&path) {
                            debug!(path = %path.display(), "file stable, joining pending batch");
                            pending.push(path);
                        }
                    }
                    window_deadline = Some(now + window);
                }
            }
        }
    }

    // Event source gone; hand over whatever already settled.
    flush(&mut pending, settings.batch_size, &batches);
}

/// Snapshot the pending set, drop paths that vanished while settling, and
/// submit upload-sized chunks. Returns `false` once the consumer is gone.
fn flush(
    pending: &mut Vec<PathBuf>,
    batch_size: usize,
    batches: &UnboundedSender<Vec<PathBuf>>,
) -> bool {
    let ready: Vec<PathBuf> = pending.drain(..).filter(|path| path.is_file()).collect();
    for chunk in ready.chunks(batch_size.max(1)) {
        debug!(files = chunk.len(), "batch window closed, submitting");
        if batches.send(chunk.to_vec()).is_err() {
            return false;
        }
    }
    true
}

async fn sleep_until_deadline(deadline: Option<Instant>) {
    if let Some(at) = deadline {
        tokio::time::sleep_until(at).await;
    }
}

fn next_deadline(settling: &HashMap<PathBuf, Instant>, window: Option<Instant>) -> Option<Instant> {
    let settle = settling.values().min().copied();
    match (settle, window) {
        (Some(first), Some(second)) => Some(first.min(second)),
        (first, second) => first.or(second),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::{Result, anyhow};
    use std::fs;
    use std::time::Duration;
    use tempfile::TempDir;
    use tokio::sync::mpsc;
    use tokio::task::JoinHandle;

    type BatchRx = mpsc::UnboundedReceiver<Vec<PathBuf>>;

    fn touch(dir: &TempDir, name: &str) -> Result<PathBuf> {
        let path = dir.path().join(name);
        fs::write(&path, b"<factura/>")?;
        Ok(path)
    }

    fn spawn_batcher(
        settings: WatchSettings,
    ) -> (mpsc::UnboundedSender<PathBuf>, BatchRx, JoinHandle<()>) {
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let (batch_tx, batch_rx) = mpsc::unbounded_channel();
        let task = tokio::spawn(run_batcher(event_rx, settings, batch_tx));
        (event_tx, batch_rx, task)
    }

    #[tokio::test(start_paused = true)]
    async fn repeated_writes_coalesce_into_one_delivery() -> Result<()> {
        let dir = TempDir::new()?;
        let file = touch(&dir, "a.xml")?;
        let (event_tx, mut batch_rx, task) = spawn_batcher(WatchSettings::default());

        let started = Instant::now();
        event_tx.send(file.clone())?;
        tokio::time::sleep(Duration::from_secs(3)).await;
        event_tx.send(file.clone())?;

        let batch = batch_rx.recv().await.ok_or_else(|| anyhow!("no batch"))?;
        assert_eq!(batch, vec![file]);
        // 3 s of writes, then the 5 s stability window, then the 1.5 s join window.
        assert!(started.elapsed() >= Duration::from_millis(9_500));

        drop(event_tx);
        task.await?;
        assert!(batch_rx.recv().await.is_none());
        Ok(())
    }

    #[tokio::test(start_paused = true)]
    async fn files_stable_within_the_join_window_travel_together() -> Result<()> {
        let dir = TempDir::new()?;
        let first = touch(&dir, "a.xml")?;
        let second = touch(&dir, "b.xml")?;
        let (event_tx, mut batch_rx, task) = spawn_batcher(WatchSettings::default());

        event_tx.send(first.clone())?;
        tokio::time::sleep(Duration::from_secs(1)).await;
        event_tx.send(second.clone())?;

        let batch = batch_rx.recv().await.ok_or_else(|| anyhow!("no batch"))?;
        assert_eq!(batch.len(), 2);
        assert!(batch.contains(&first));
        assert!(batch.contains(&second));

        drop(event_tx);
        task.await?;
        Ok(())
    }

    #[tokio::test(start_paused = true)]
    async fn files_stable_far_apart_form_separate_batches() -> Result<()> {
        let dir = TempDir::new()?;
        let first = touch(&dir, "a.xml")?;
        let second = touch(&dir, "b.xml")?;
        let (event_tx, mut batch_rx, task) = spawn_batcher(WatchSettings::default());

        event_tx.send(first.clone())?;
        tokio::time::sleep(Duration::from_secs(8)).await;
        event_tx.send(second.clone())?;

        let batch = batch_rx.recv().await.ok_or_else(|| anyhow!("no batch"))?;
        assert_eq!(batch, vec![first]);
        let batch = batch_rx.recv().await.ok_or_else(|| anyhow!("no batch"))?;
        assert_eq!(batch, vec![second]);

        drop(event_tx);
        task.await?;
        Ok(())
    }

    #[tokio::test(start_paused = true)]
    async fn oversized_snapshots_split_into_upload_sized_chunks() -> Result<()> {
        let dir = TempDir::new()?;
        let settings = WatchSettings {
            batch_size: 2,
            ..WatchSettings::default()
        };
        let (event_tx, mut batch_rx, task) = spawn_batcher(settings);

        let mut files = Vec::new();
        for index in 0..5 {
            let file = touch(&dir, &format!("f{index}.xml"))?;
            event_tx.send(file.clone())?;
            files.push(file);
        }

        let mut delivered = Vec::new();
        let mut sizes = Vec::new();
        for _ in 0..3 {
            let batch = batch_rx.recv().await.ok_or_else(|| anyhow!("no batch"))?;
            sizes.push(batch.len());
            delivered.extend(batch);
        }
        assert_eq!(sizes, vec![2, 2, 1]);
        delivered.sort();
        files.sort();
        assert_eq!(delivered, files);

        drop(event_tx);
        task.await?;
        Ok(())
    }

    #[tokio::test(start_paused = true)]
    async fn files_removed_while_settling_are_dropped() -> Result<()> {
        let dir = TempDir::new()?;
        let kept = touch(&dir, "kept.xml")?;
        let gone = dir.path().join("gone.xml");
        let (event_tx, mut batch_rx, task) = spawn_batcher(WatchSettings::default());

        event_tx.send(kept.clone())?;
        event_tx.send(gone)?;

        let batch = batch_rx.recv().await.ok_or_else(|| anyhow!("no batch"))?;
        assert_eq!(batch, vec![kept]);

        drop(event_tx);
        task.await?;
        Ok(())
    }
}

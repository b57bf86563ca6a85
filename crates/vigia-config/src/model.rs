//! Typed configuration models for the watcher daemon.
//!
//! # Design
//! - Pure data carriers deserialised from `config.json` and env overrides.
//! - Every field carries a serde default so partial documents load cleanly.
//! - Duration/byte accessors live here so callers never re-derive units.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Root configuration document for the daemon.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Base URL of the remote Ingestion API.
    pub api_url: String,
    /// Service account credentials for the Ingestion API.
    pub credentials: Credentials,
    /// Directory layout for the durable file lifecycle.
    pub folders: Folders,
    /// Detection, batching and upload tuning knobs.
    pub watch: WatchSettings,
    /// Upload retry policy.
    pub retry: RetrySettings,
    /// Retention cleanup policy for the dated buckets.
    pub retention: RetentionPolicy,
    /// Periodic summary report schedule.
    pub report: ReportSettings,
    /// Fallback log verbosity when `RUST_LOG` is unset.
    pub log_level: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_url: "http://localhost:3001/api".to_string(),
            credentials: Credentials::default(),
            folders: Folders::default(),
            watch: WatchSettings::default(),
            retry: RetrySettings::default(),
            retention: RetentionPolicy::default(),
            report: ReportSettings::default(),
            log_level: "info".to_string(),
        }
    }
}

/// Service account credentials used by the auth session.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Credentials {
    /// Login email for the Ingestion API service account.
    pub email: String,
    /// Login password for the Ingestion API service account.
    pub password: String,
}

/// Directory layout produced and consumed by the pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Folders {
    /// Input directory observed for new XML documents.
    pub watch: PathBuf,
    /// Root for dated folders of successfully uploaded files.
    pub processed: PathBuf,
    /// Root for dated folders of files whose batch failed.
    pub errors: PathBuf,
    /// Root for dated folders of non-invoice files excluded from upload.
    pub ignored: PathBuf,
    /// Destination for compressed retention archives.
    pub archived: PathBuf,
}

impl Default for Folders {
    fn default() -> Self {
        Self {
            watch: PathBuf::from("watch"),
            processed: PathBuf::from("processed"),
            errors: PathBuf::from("errors"),
            ignored: PathBuf::from("ignored"),
            archived: PathBuf::from("archived"),
        }
    }
}

/// Detection, batching and upload tuning knobs.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WatchSettings {
    /// Quiescence window after the last write event before a file is safe to read.
    pub stability_delay_ms: u64,
    /// Window during which newly stable files join the pending batch.
    pub batch_window_ms: u64,
    /// Maximum number of files submitted in one batch upload.
    pub batch_size: usize,
    /// Per-file size ceiling enforced before any network call.
    pub max_file_size_mb: u64,
    /// Hard timeout applied to every outbound HTTP request.
    pub request_timeout_secs: u64,
}

impl Default for WatchSettings {
    fn default() -> Self {
        Self {
            stability_delay_ms: 5_000,
            batch_window_ms: 1_500,
            batch_size: 20,
            max_file_size_mb: 5,
            request_timeout_secs: 180,
        }
    }
}

impl WatchSettings {
    /// Stability window as a [`Duration`].
    #[must_use]
    pub const fn stability_delay(&self) -> Duration {
        Duration::from_millis(self.stability_delay_ms)
    }

    /// Batch-join window as a [`Duration`].
    #[must_use]
    pub const fn batch_window(&self) -> Duration {
        Duration::from_millis(self.batch_window_ms)
    }

    /// Request timeout as a [`Duration`].
    #[must_use]
    pub const fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Per-file size ceiling in bytes.
    #[must_use]
    pub const fn max_file_bytes(&self) -> u64 {
        self.max_file_size_mb * 1024 * 1024
    }
}

/// Upload retry policy with a doubling backoff schedule.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrySettings {
    /// Total attempts made before the last error is surfaced.
    pub attempts: u32,
    /// Base delay before the second attempt; doubles per further attempt.
    pub backoff_ms: u64,
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            attempts: 3,
            backoff_ms: 1_500,
        }
    }
}

/// Doubling steps after which the backoff delay stops growing.
const MAX_BACKOFF_DOUBLINGS: u32 = 16;

impl RetrySettings {
    /// Delay applied before the given one-based attempt number.
    ///
    /// Attempt 1 runs immediately; attempt `n` waits `backoff * 2^(n-2)`,
    /// capped after sixteen doublings so oversized attempt counts cannot
    /// overflow the schedule.
    #[must_use]
    pub const fn delay_before(&self, attempt: u32) -> Duration {
        if attempt <= 1 {
            return Duration::ZERO;
        }
        let mut doublings = attempt - 2;
        if doublings > MAX_BACKOFF_DOUBLINGS {
            doublings = MAX_BACKOFF_DOUBLINGS;
        }
        Duration::from_millis(self.backoff_ms.saturating_mul(1 << doublings))
    }
}

/// Retention policy driving the daily cleanup job.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetentionPolicy {
    /// Master switch for the cleanup job.
    pub enabled: bool,
    /// Days a dated `processed` folder is kept before removal.
    pub keep_processed_days: i64,
    /// Days a dated `errors` folder is kept before removal.
    pub keep_errors_days: i64,
    /// Compress expired `processed` folders into the archive root before deleting.
    pub compress_old_files: bool,
    /// Local hour (0-23) at which the daily cleanup runs.
    pub cleanup_hour: u32,
}

impl Default for RetentionPolicy {
    fn default() -> Self {
        Self {
            enabled: true,
            keep_processed_days: 30,
            keep_errors_days: 90,
            compress_old_files: true,
            cleanup_hour: 2,
        }
    }
}

/// Schedule for the periodic summary report.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportSettings {
    /// Day of week the report runs (0 = Sunday .. 6 = Saturday).
    pub weekday: u32,
    /// Local hour (0-23) at which the report runs.
    pub hour: u32,
}

impl Default for ReportSettings {
    fn default() -> Self {
        Self {
            weekday: 0,
            hour: 8,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_mirror_the_service_baseline() {
        let settings = Settings::default();
        assert_eq!(settings.watch.stability_delay_ms, 5_000);
        assert_eq!(settings.watch.batch_window_ms, 1_500);
        assert_eq!(settings.watch.batch_size, 20);
        assert_eq!(settings.retry.attempts, 3);
        assert_eq!(settings.retention.keep_processed_days, 30);
        assert_eq!(settings.retention.keep_errors_days, 90);
        assert!(settings.retention.compress_old_files);
        assert_eq!(settings.retention.cleanup_hour, 2);
        assert_eq!(settings.report.weekday, 0);
        assert_eq!(settings.report.hour, 8);
    }

    #[test]
    fn backoff_schedule_doubles_per_attempt() {
        let retry = RetrySettings {
            attempts: 3,
            backoff_ms: 5_000,
        };
        assert_eq!(retry.delay_before(1), Duration::ZERO);
        assert_eq!(retry.delay_before(2), Duration::from_secs(5));
        assert_eq!(retry.delay_before(3), Duration::from_secs(10));
        assert_eq!(retry.delay_before(4), Duration::from_secs(20));
    }

    #[test]
    fn backoff_schedule_caps_instead_of_overflowing() {
        let retry = RetrySettings {
            attempts: 200,
            backoff_ms: 1_500,
        };
        let capped = Duration::from_millis(1_500 << MAX_BACKOFF_DOUBLINGS);
        assert_eq!(retry.delay_before(2 + MAX_BACKOFF_DOUBLINGS), capped);
        assert_eq!(retry.delay_before(200), capped);
        assert_eq!(retry.delay_before(u32::MAX), capped);

        let saturating = RetrySettings {
            attempts: 3,
            backoff_ms: u64::MAX,
        };
        assert_eq!(
            saturating.delay_before(3),
            Duration::from_millis(u64::MAX)
        );
    }

    #[test]
    fn max_file_bytes_converts_megabytes() {
        let watch = WatchSettings::default();
        assert_eq!(watch.max_file_bytes(), 5 * 1024 * 1024);
    }

    #[test]
    fn partial_document_fills_missing_sections() {
        let settings: Settings =
            serde_json::from_str(r#"{"api_url": "http://example.test/api"}"#)
                .expect("partial document should deserialise");
        assert_eq!(settings.api_url, "http://example.test/api");
        assert_eq!(settings.watch.batch_size, 20);
        assert_eq!(settings.folders.watch, PathBuf::from("watch"));
    }
}

//! Read-only bucket statistics for the periodic summary report.

use std::path::Path;

use vigia_config::Folders;
use walkdir::WalkDir;

use crate::error::{OrganizerError, OrganizerResult};

/// Aggregate counts and sizes across the terminal buckets.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BucketStats {
    /// Number of files under the `processed` root.
    pub processed_count: u64,
    /// Number of files under the `errors` root.
    pub errors_count: u64,
    /// Total bytes under the `processed` root.
    pub processed_bytes: u64,
    /// Total bytes under the `errors` root.
    pub errors_bytes: u64,
}

impl BucketStats {
    /// Share of files that ended up in the error bucket, as a percentage.
    #[must_use]
    pub fn error_rate(&self) -> f64 {
        let total = self.processed_count + self.errors_count;
        if total == 0 {
            return 0.0;
        }
        #[allow(clippy::cast_precision_loss)]
        {
            self.errors_count as f64 / total as f64 * 100.0
        }
    }
}

/// Walk the processed and error buckets and aggregate counts and sizes.
///
/// # Errors
///
/// Returns an error if either bucket root cannot be traversed. Missing
/// roots count as empty.
pub fn collect_stats(folders: &Folders) -> OrganizerResult<BucketStats> {
    let (processed_count, processed_bytes) = scan(&folders.processed)?;
    let (errors_count, errors_bytes) = scan(&folders.errors)?;
    Ok(BucketStats {
        processed_count,
        errors_count,
        processed_bytes,
        errors_bytes,
    })
}

fn scan(root: &Path) -> OrganizerResult<(u64, u64)> {
    if !root.exists() {
        return Ok((0, 0));
    }
    let mut count = 0;
    let mut bytes = 0;
    for entry in WalkDir::new(root) {
        let entry = entry.map_err(|source| OrganizerError::walkdir("scan_bucket", root, source))?;
        if !entry.file_type().is_file() {
            continue;
        }
        count += 1;
        bytes += entry
            .metadata()
            .map_err(|source| OrganizerError::walkdir("scan_bucket_metadata", root, source))?
            .len();
    }
    Ok((count, bytes))
}

/// Render a byte count the way the weekly report expects (MB above one
/// megabyte, KB below).
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn format_bytes(bytes: u64) -> String {
    let mb = bytes as f64 / (1024.0 * 1024.0);
    if mb > 1.0 {
        format!("{mb:.1} MB")
    } else {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    }
}

//! Bucket moves and retention cleanup.

use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use chrono::{Local, NaiveDate, TimeDelta};
use tracing::{info, warn};
use vigia_config::{Folders, RetentionPolicy};
use walkdir::WalkDir;
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use crate::error::{OrganizerError, OrganizerResult};
use crate::stats::format_bytes;

const DATE_FORMAT: &str = "%Y-%m-%d";
const MONTH_FORMAT: &str = "%Y-%m";

/// Terminal outcome applied to every file of a batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    /// The batch upload was acknowledged; files go to `processed/<date>/`.
    Processed,
    /// The batch upload failed; files go to `errors/<date>/`.
    Failed,
}

/// Summary of a retention cleanup pass.
#[derive(Debug, Clone, Copy, Default)]
pub struct CleanupReport {
    /// Approximate bytes reclaimed by deleting expired folders.
    pub bytes_freed: u64,
    /// Number of dated folders removed.
    pub folders_removed: usize,
    /// Wall-clock duration of the pass.
    pub elapsed: Duration,
}

/// Manages the dated processed/errors/ignored buckets and their retention.
#[derive(Debug, Clone)]
pub struct Organizer {
    folders: Folders,
    retention: RetentionPolicy,
}

impl Organizer {
    /// Construct an organizer over the configured directory layout.
    #[must_use]
    pub const fn new(folders: Folders, retention: RetentionPolicy) -> Self {
        Self { folders, retention }
    }

    /// Create the bucket roots if they do not exist yet.
    ///
    /// # Errors
    ///
    /// Returns an error if any directory cannot be created.
    pub fn ensure_structure(&self) -> OrganizerResult<()> {
        for root in [
            &self.folders.processed,
            &self.folders.errors,
            &self.folders.ignored,
            &self.folders.archived,
        ] {
            fs::create_dir_all(root)
                .map_err(|source| OrganizerError::io("create_bucket_root", root, source))?;
        }
        Ok(())
    }

    /// Move every file of a batch into today's folder of the outcome bucket.
    ///
    /// A single file's move failure is logged and does not abort its
    /// siblings; files that no longer exist are skipped with a warning.
    /// Returns the number of files actually moved.
    ///
    /// # Errors
    ///
    /// Returns an error only if the dated destination folder cannot be
    /// created.
    pub fn commit(&self, batch: &[PathBuf], disposition: Disposition) -> OrganizerResult<usize> {
        let root = match disposition {
            Disposition::Processed => &self.folders.processed,
            Disposition::Failed => &self.folders.errors,
        };
        let dated = root.join(Local::now().date_naive().format(DATE_FORMAT).to_string());
        fs::create_dir_all(&dated)
            .map_err(|source| OrganizerError::io("create_dated_folder", &dated, source))?;

        let mut moved = 0;
        for source in batch {
            if !source.exists() {
                warn!(path = %source.display(), "file vanished before commit, skipping");
                continue;
            }
            match self.move_into(source, &dated) {
                Ok(dest) => {
                    moved += 1;
                    info!(
                        from = %source.display(),
                        to = %dest.display(),
                        "file committed"
                    );
                }
                Err(error) => {
                    warn!(
                        path = %source.display(),
                        error = %error,
                        "failed to move file into bucket"
                    );
                }
            }
        }
        Ok(moved)
    }

    /// Park a non-invoice document in today's `ignored` folder.
    ///
    /// # Errors
    ///
    /// Returns an error if the dated folder cannot be created or the file
    /// cannot be moved.
    pub fn ignore(&self, source: &Path) -> OrganizerResult<PathBuf> {
        let dated = self
            .folders
            .ignored
            .join(Local::now().date_naive().format(DATE_FORMAT).to_string());
        fs::create_dir_all(&dated)
            .map_err(|source| OrganizerError::io("create_ignored_folder", &dated, source))?;
        self.move_into(source, &dated)
    }

    /// Delete dated folders older than the retention window, compressing
    /// expired `processed` folders into the archive root first.
    ///
    /// Folders whose age equals the retention window survive; only strictly
    /// older folders are removed.
    ///
    /// # Errors
    ///
    /// Returns an error if a bucket root cannot be listed or an expired
    /// folder cannot be archived or removed.
    pub fn cleanup(&self) -> OrganizerResult<CleanupReport> {
        if !self.retention.enabled {
            return Ok(CleanupReport::default());
        }
        self.ensure_structure()?;
        let start = Instant::now();
        info!("retention cleanup started");

        let mut report = CleanupReport::default();
        self.sweep_bucket(
            &self.folders.processed,
            self.retention.keep_processed_days,
            self.retention.compress_old_files,
            &mut report,
        )?;
        self.sweep_bucket(
            &self.folders.errors,
            self.retention.keep_errors_days,
            false,
            &mut report,
        )?;

        report.elapsed = start.elapsed();
        info!(
            folders_removed = report.folders_removed,
            bytes_freed = %format_bytes(report.bytes_freed),
            elapsed_secs = report.elapsed.as_secs_f64(),
            "retention cleanup finished"
        );
        Ok(report)
    }

    /// Aggregate file counts and sizes across the terminal buckets.
    ///
    /// # Errors
    ///
    /// Returns an error if a bucket root cannot be traversed.
    pub fn collect_stats(&self) -> OrganizerResult<crate::stats::BucketStats> {
        crate::stats::collect_stats(&self.folders)
    }

    fn sweep_bucket(
        &self,
        root: &Path,
        keep_days: i64,
        compress: bool,
        report: &mut CleanupReport,
    ) -> OrganizerResult<()> {
        let cutoff = Local::now().date_naive() - TimeDelta::days(keep_days);
        let entries =
            fs::read_dir(root).map_err(|source| OrganizerError::io("list_bucket", root, source))?;

        for entry in entries {
            let entry =
                entry.map_err(|source| OrganizerError::io("list_bucket_entry", root, source))?;
            let path = entry.path();
            if !path.is_dir() {
                continue;
            }
            let Some(name) = path.file_name().and_then(|name| name.to_str()) else {
                continue;
            };
            let Ok(folder_date) = NaiveDate::parse_from_str(name, DATE_FORMAT) else {
                continue;
            };
            if folder_date >= cutoff {
                continue;
            }

            if compress {
                let archive_name = format!(
                    "{}_{}.zip",
                    bucket_label(root),
                    folder_date.format(MONTH_FORMAT)
                );
                let archive_path = self.folders.archived.join(archive_name);
                archive_folder(&path, &archive_path)?;
                info!(
                    folder = %path.display(),
                    archive = %archive_path.display(),
                    "expired folder archived"
                );
            }

            report.bytes_freed += folder_size(&path);
            report.folders_removed += 1;
            fs::remove_dir_all(&path)
                .map_err(|source| OrganizerError::io("remove_expired_folder", &path, source))?;
            info!(folder = %path.display(), "expired folder removed");
        }
        Ok(())
    }

    fn move_into(&self, source: &Path, dated: &Path) -> OrganizerResult<PathBuf> {
        let file_name = source
            .file_name()
            .ok_or_else(|| OrganizerError::MissingFileName {
                path: source.to_path_buf(),
            })?;
        let dest = dated.join(file_name);
        move_file(source, &dest)?;
        Ok(dest)
    }
}

/// Rename, falling back to copy+remove when the destination is on another
/// filesystem.
fn move_file(source: &Path, dest: &Path) -> OrganizerResult<()> {
    if fs::rename(source, dest).is_ok() {
        return Ok(());
    }
    fs::copy(source, dest).map_err(|err| OrganizerError::io("copy_file", source, err))?;
    fs::remove_file(source).map_err(|err| OrganizerError::io("remove_moved_file", source, err))
}

/// Compress a dated folder into the archive, preserving any entries an
/// earlier sweep already placed there for the same month.
fn archive_folder(folder: &Path, archive_path: &Path) -> OrganizerResult<()> {
    let temp_path = archive_path.with_extension("zip.tmp");
    let temp_file = File::create(&temp_path)
        .map_err(|source| OrganizerError::io("create_archive", &temp_path, source))?;
    let mut writer = ZipWriter::new(temp_file);
    let options = FileOptions::default().compression_method(CompressionMethod::Deflated);

    if archive_path.is_file() {
        let existing = File::open(archive_path)
            .map_err(|source| OrganizerError::io("open_archive", archive_path, source))?;
        let mut existing = ZipArchive::new(existing)
            .map_err(|source| OrganizerError::zip("read_archive", archive_path, source))?;
        for index in 0..existing.len() {
            let entry = existing
                .by_index(index)
                .map_err(|source| OrganizerError::zip("read_archive_entry", archive_path, source))?;
            writer
                .raw_copy_file(entry)
                .map_err(|source| OrganizerError::zip("copy_archive_entry", archive_path, source))?;
        }
    }

    let Some(folder_name) = folder.file_name().and_then(|name| name.to_str()) else {
        return Err(OrganizerError::MissingFileName {
            path: folder.to_path_buf(),
        });
    };
    for entry in WalkDir::new(folder) {
        let entry = entry.map_err(|source| OrganizerError::walkdir("walk_folder", folder, source))?;
        if !entry.file_type().is_file() {
            continue;
        }
        let relative = entry
            .path()
            .strip_prefix(folder)
            .map_err(|_| OrganizerError::MissingFileName {
                path: entry.path().to_path_buf(),
            })?;
        let entry_name = format!("{folder_name}/{}", relative.display());
        writer
            .start_file(entry_name, options)
            .map_err(|source| OrganizerError::zip("start_archive_entry", entry.path(), source))?;
        let mut input = File::open(entry.path())
            .map_err(|source| OrganizerError::io("open_archive_input", entry.path(), source))?;
        io::copy(&mut input, &mut writer)
            .map_err(|source| OrganizerError::io("write_archive_entry", entry.path(), source))?;
    }

    writer
        .finish()
        .map_err(|source| OrganizerError::zip("finish_archive", &temp_path, source))?;
    fs::rename(&temp_path, archive_path)
        .map_err(|source| OrganizerError::io("publish_archive", archive_path, source))?;
    Ok(())
}

fn folder_size(folder: &Path) -> u64 {
    WalkDir::new(folder)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|entry| entry.file_type().is_file())
        .filter_map(|entry| entry.metadata().ok())
        .map(|metadata| metadata.len())
        .sum()
}

fn bucket_label(root: &Path) -> String {
    root.file_name()
        .map_or_else(|| "bucket".to_string(), |name| name.to_string_lossy().into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;
    use tempfile::TempDir;

    fn test_layout(dir: &TempDir) -> Folders {
        Folders {
            watch: dir.path().join("watch"),
            processed: dir.path().join("processed"),
            errors: dir.path().join("errors"),
            ignored: dir.path().join("ignored"),
            archived: dir.path().join("archived"),
        }
    }

    fn organizer(dir: &TempDir, retention: RetentionPolicy) -> Organizer {
        Organizer::new(test_layout(dir), retention)
    }

    fn write_watch_file(dir: &TempDir, name: &str) -> Result<PathBuf, Box<dyn Error>> {
        let watch = dir.path().join("watch");
        fs::create_dir_all(&watch)?;
        let path = watch.join(name);
        fs::write(&path, b"<factura>contenido</factura>")?;
        Ok(path)
    }

    fn dated_folder(
        root: &Path,
        age_days: i64,
        file_name: &str,
    ) -> Result<PathBuf, Box<dyn Error>> {
        let date = Local::now().date_naive() - TimeDelta::days(age_days);
        let folder = root.join(date.format(DATE_FORMAT).to_string());
        fs::create_dir_all(&folder)?;
        fs::write(folder.join(file_name), b"payload")?;
        Ok(folder)
    }

    #[test]
    fn commit_routes_batch_to_processed_bucket() -> Result<(), Box<dyn Error>> {
        let dir = TempDir::new()?;
        let organizer = organizer(&dir, RetentionPolicy::default());
        let a = write_watch_file(&dir, "a.xml")?;
        let b = write_watch_file(&dir, "b.xml")?;

        let moved = organizer.commit(&[a.clone(), b.clone()], Disposition::Processed)?;
        assert_eq!(moved, 2);
        assert!(!a.exists());
        assert!(!b.exists());

        let today = Local::now().date_naive().format(DATE_FORMAT).to_string();
        let dated = dir.path().join("processed").join(today);
        assert!(dated.join("a.xml").is_file());
        assert!(dated.join("b.xml").is_file());
        assert!(!dir.path().join("errors").join("a.xml").exists());
        Ok(())
    }

    #[test]
    fn commit_routes_failed_batch_to_errors_bucket() -> Result<(), Box<dyn Error>> {
        let dir = TempDir::new()?;
        let organizer = organizer(&dir, RetentionPolicy::default());
        let a = write_watch_file(&dir, "a.xml")?;

        organizer.commit(&[a.clone()], Disposition::Failed)?;
        let today = Local::now().date_naive().format(DATE_FORMAT).to_string();
        assert!(dir.path().join("errors").join(today).join("a.xml").is_file());
        assert!(!a.exists());
        Ok(())
    }

    #[test]
    fn commit_skips_vanished_files_without_failing() -> Result<(), Box<dyn Error>> {
        let dir = TempDir::new()?;
        let organizer = organizer(&dir, RetentionPolicy::default());
        let a = write_watch_file(&dir, "a.xml")?;
        let ghost = dir.path().join("watch").join("ghost.xml");

        let moved = organizer.commit(&[ghost, a], Disposition::Processed)?;
        assert_eq!(moved, 1);
        Ok(())
    }

    #[test]
    fn ignore_parks_file_in_dated_ignored_folder() -> Result<(), Box<dyn Error>> {
        let dir = TempDir::new()?;
        let organizer = organizer(&dir, RetentionPolicy::default());
        let nota = write_watch_file(&dir, "nota.xml")?;

        let dest = organizer.ignore(&nota)?;
        assert!(dest.is_file());
        assert!(!nota.exists());
        let today = Local::now().date_naive().format(DATE_FORMAT).to_string();
        assert_eq!(dest, dir.path().join("ignored").join(today).join("nota.xml"));
        Ok(())
    }

    #[test]
    fn cleanup_removes_only_folders_strictly_older_than_retention() -> Result<(), Box<dyn Error>> {
        let dir = TempDir::new()?;
        let retention = RetentionPolicy {
            enabled: true,
            keep_processed_days: 30,
            keep_errors_days: 90,
            compress_old_files: false,
            cleanup_hour: 2,
        };
        let organizer = organizer(&dir, retention);
        organizer.ensure_structure()?;

        let processed = dir.path().join("processed");
        let fresh = dated_folder(&processed, 29, "fresh.xml")?;
        let boundary = dated_folder(&processed, 30, "boundary.xml")?;
        let expired = dated_folder(&processed, 31, "expired.xml")?;

        let report = organizer.cleanup()?;
        assert!(fresh.exists());
        assert!(boundary.exists());
        assert!(!expired.exists());
        assert_eq!(report.folders_removed, 1);
        assert!(report.bytes_freed > 0);
        Ok(())
    }

    #[test]
    fn cleanup_archives_processed_folders_before_deleting() -> Result<(), Box<dyn Error>> {
        let dir = TempDir::new()?;
        let retention = RetentionPolicy {
            enabled: true,
            keep_processed_days: 7,
            keep_errors_days: 7,
            compress_old_files: true,
            cleanup_hour: 2,
        };
        let organizer = organizer(&dir, retention);
        organizer.ensure_structure()?;

        let processed = dir.path().join("processed");
        let expired = dated_folder(&processed, 10, "old.xml")?;
        let date = Local::now().date_naive() - TimeDelta::days(10);

        organizer.cleanup()?;
        assert!(!expired.exists());

        let archive_path = dir
            .path()
            .join("archived")
            .join(format!("processed_{}.zip", date.format(MONTH_FORMAT)));
        assert!(archive_path.is_file());

        let mut archive = ZipArchive::new(File::open(&archive_path)?)?;
        let expected_entry = format!("{}/old.xml", date.format(DATE_FORMAT));
        assert!(archive.by_name(&expected_entry).is_ok());
        Ok(())
    }

    #[test]
    fn cleanup_merges_archives_for_the_same_month() -> Result<(), Box<dyn Error>> {
        let dir = TempDir::new()?;
        let folder_a = dir.path().join("2024-01-10");
        let folder_b = dir.path().join("2024-01-20");
        fs::create_dir_all(&folder_a)?;
        fs::create_dir_all(&folder_b)?;
        fs::write(folder_a.join("a.xml"), b"a")?;
        fs::write(folder_b.join("b.xml"), b"b")?;

        let archive_path = dir.path().join("processed_2024-01.zip");
        archive_folder(&folder_a, &archive_path)?;
        archive_folder(&folder_b, &archive_path)?;

        let mut archive = ZipArchive::new(File::open(&archive_path)?)?;
        assert!(archive.by_name("2024-01-10/a.xml").is_ok());
        drop(archive);
        let mut archive = ZipArchive::new(File::open(&archive_path)?)?;
        assert!(archive.by_name("2024-01-20/b.xml").is_ok());
        Ok(())
    }

    #[test]
    fn cleanup_never_compresses_error_folders() -> Result<(), Box<dyn Error>> {
        let dir = TempDir::new()?;
        let retention = RetentionPolicy {
            enabled: true,
            keep_processed_days: 365,
            keep_errors_days: 7,
            compress_old_files: true,
            cleanup_hour: 2,
        };
        let organizer = organizer(&dir, retention);
        organizer.ensure_structure()?;

        let errors = dir.path().join("errors");
        let expired = dated_folder(&errors, 10, "old.xml")?;
        let date = Local::now().date_naive() - TimeDelta::days(10);

        organizer.cleanup()?;
        assert!(!expired.exists());
        let archive_path = dir
            .path()
            .join("archived")
            .join(format!("errors_{}.zip", date.format(MONTH_FORMAT)));
        assert!(!archive_path.exists());
        Ok(())
    }

    #[test]
    fn cleanup_is_a_noop_when_disabled() -> Result<(), Box<dyn Error>> {
        let dir = TempDir::new()?;
        let retention = RetentionPolicy {
            enabled: false,
            ..RetentionPolicy::default()
        };
        let organizer = organizer(&dir, retention);
        organizer.ensure_structure()?;

        let processed = dir.path().join("processed");
        let expired = dated_folder(&processed, 400, "old.xml")?;

        let report = organizer.cleanup()?;
        assert!(expired.exists());
        assert_eq!(report.folders_removed, 0);
        Ok(())
    }

    #[test]
    fn cleanup_skips_non_date_folders() -> Result<(), Box<dyn Error>> {
        let dir = TempDir::new()?;
        let organizer = organizer(&dir, RetentionPolicy::default());
        organizer.ensure_structure()?;

        let stray = dir.path().join("processed").join("not-a-date");
        fs::create_dir_all(&stray)?;
        organizer.cleanup()?;
        assert!(stray.exists());
        Ok(())
    }
}

//! Fire-and-forget maintenance jobs: daily cleanup and the weekly report.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Datelike, Local, NaiveTime, TimeDelta, Timelike};
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tracing::{error, info};
use vigia_config::ReportSettings;
use vigia_organizer::{Organizer, format_bytes};

const HOURLY_TICK: Duration = Duration::from_secs(60 * 60);
const FULL_DAY: Duration = Duration::from_secs(24 * 60 * 60);

/// Run the retention cleanup at the configured local hour, every day.
/// Failures are logged and never stop the schedule.
pub(crate) fn spawn_daily_cleanup(organizer: Arc<Organizer>, hour: u32) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            let wait = until_daily(&Local::now(), hour);
            info!(in_secs = wait.as_secs(), "next retention cleanup scheduled");
            sleep(wait).await;

            let worker = Arc::clone(&organizer);
            match tokio::task::spawn_blocking(move || worker.cleanup()).await {
                Ok(Ok(_report)) => {}
                Ok(Err(cleanup_error)) => {
                    error!(error = %cleanup_error, "retention cleanup failed");
                }
                Err(join_error) => {
                    error!(error = %join_error, "retention cleanup task panicked");
                }
            }
        }
    })
}

/// Poll hourly and emit the bucket summary when the configured local
/// weekday and hour come around.
pub(crate) fn spawn_weekly_report(
    organizer: Arc<Organizer>,
    report: ReportSettings,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            sleep(HOURLY_TICK).await;
            if !report_due(&Local::now(), &report) {
                continue;
            }

            let worker = Arc::clone(&organizer);
            match tokio::task::spawn_blocking(move || worker.collect_stats()).await {
                Ok(Ok(stats)) => info!(
                    processed = stats.processed_count,
                    errors = stats.errors_count,
                    error_rate = %format!("{:.1}%", stats.error_rate()),
                    processed_size = %format_bytes(stats.processed_bytes),
                    errors_size = %format_bytes(stats.errors_bytes),
                    "weekly ingestion summary"
                ),
                Ok(Err(stats_error)) => {
                    error!(error = %stats_error, "weekly report failed");
                }
                Err(join_error) => {
                    error!(error = %join_error, "weekly report task panicked");
                }
            }
        }
    })
}

/// Time until the next occurrence of `hour` local time. A run scheduled
/// exactly now waits a full day.
fn until_daily(now: &DateTime<Local>, hour: u32) -> Duration {
    let target_time = NaiveTime::from_hms_opt(hour, 0, 0).unwrap_or(NaiveTime::MIN);
    let mut target = now.date_naive().and_time(target_time);
    if target <= now.naive_local() {
        target += TimeDelta::days(1);
    }
    (target - now.naive_local()).to_std().unwrap_or(FULL_DAY)
}

/// Whether the weekly report should run this hour (weekday 0 = Sunday).
fn report_due(now: &DateTime<Local>, report: &ReportSettings) -> bool {
    now.weekday().num_days_from_sunday() == report.weekday && now.hour() == report.hour
}

//! Daemon assembly: configuration, telemetry, services, shutdown.

use std::fs;
use std::sync::Arc;

use tracing::{info, warn};
use vigia_client::{AuthSession, Uploader, build_http_client};
use vigia_config::Settings;
use vigia_organizer::Organizer;
use vigia_telemetry::LoggingConfig;
use vigia_watcher::WatchService;

use crate::error::{AppError, AppResult};
use crate::pipeline::UploadPipeline;
use crate::scheduler::{spawn_daily_cleanup, spawn_weekly_report};

const LOG_DIR_NAME: &str = "logs";

/// Load configuration, assemble every service and run until ctrl-c.
///
/// An initial login failure is logged but does not abort startup; the
/// session retries with the first batch.
///
/// # Errors
///
/// Returns an error if configuration, telemetry, the bucket layout or the
/// directory watch cannot be brought up.
pub async fn run() -> AppResult<()> {
    let settings = vigia_config::load()?;
    prepare_directories(&settings)?;

    let log_dir = settings.folders.watch.join(LOG_DIR_NAME);
    let _log_guard =
        vigia_telemetry::init_logging(&LoggingConfig::new(&settings.log_level, &log_dir))?;

    let client = build_http_client(settings.watch.request_timeout())?;
    let session = Arc::new(AuthSession::new(
        client.clone(),
        &settings.api_url,
        settings.credentials.clone(),
    ));
    if let Err(login_error) = session.login().await {
        warn!(
            error = %login_error,
            "initial login failed, will retry with the first batch"
        );
    }

    let uploader = Uploader::new(
        client,
        Arc::clone(&session),
        &settings.api_url,
        &settings.watch,
        settings.retry.clone(),
    );
    let organizer = Arc::new(Organizer::new(
        settings.folders.clone(),
        settings.retention.clone(),
    ));
    organizer.ensure_structure()?;

    let pipeline = Arc::new(UploadPipeline::new(uploader, Arc::clone(&organizer)));
    let watcher = WatchService::spawn(&settings.folders.watch, &settings.watch, pipeline)?;
    let cleanup = spawn_daily_cleanup(Arc::clone(&organizer), settings.retention.cleanup_hour);
    let report = spawn_weekly_report(Arc::clone(&organizer), settings.report.clone());
    info!(
        watch = %settings.folders.watch.display(),
        api = %settings.api_url,
        "vigia started"
    );

    tokio::signal::ctrl_c()
        .await
        .map_err(|source| AppError::Signal { source })?;
    info!("shutdown requested");

    cleanup.abort();
    report.abort();
    watcher.shutdown().await;
    Ok(())
}

/// Create the watch root and the log directory before anything logs.
fn prepare_directories(settings: &Settings) -> AppResult<()> {
    let log_dir = settings.folders.watch.join(LOG_DIR_NAME);
    for dir in [&settings.folders.watch, &log_dir] {
        fs::create_dir_all(dir)
            .map_err(|source| AppError::io("create_runtime_dir", dir, source))?;
    }
    Ok(())
}

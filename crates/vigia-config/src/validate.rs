//! Validation for loaded configuration documents.

use crate::error::{ConfigError, ConfigResult};
use crate::model::Settings;

/// Validate a loaded settings document.
///
/// # Errors
///
/// Returns an error naming the first field that fails validation.
pub fn validate(settings: &Settings) -> ConfigResult<()> {
    if settings.api_url.trim().is_empty() {
        return Err(ConfigError::invalid("api", "api_url", "empty", None));
    }
    if settings.credentials.email.trim().is_empty() {
        return Err(ConfigError::invalid("credentials", "email", "empty", None));
    }
    if settings.credentials.password.is_empty() {
        return Err(ConfigError::invalid(
            "credentials",
            "password",
            "empty",
            None,
        ));
    }
    if settings.watch.batch_size == 0 {
        return Err(ConfigError::invalid(
            "watch",
            "batch_size",
            "must_be_positive",
            Some(settings.watch.batch_size.to_string()),
        ));
    }
    if settings.watch.max_file_size_mb == 0 {
        return Err(ConfigError::invalid(
            "watch",
            "max_file_size_mb",
            "must_be_positive",
            Some(settings.watch.max_file_size_mb.to_string()),
        ));
    }
    if settings.retry.attempts == 0 {
        return Err(ConfigError::invalid(
            "retry",
            "attempts",
            "must_be_positive",
            Some(settings.retry.attempts.to_string()),
        ));
    }
    if settings.retention.keep_processed_days < 1 {
        return Err(ConfigError::invalid(
            "retention",
            "keep_processed_days",
            "must_be_positive",
            Some(settings.retention.keep_processed_days.to_string()),
        ));
    }
    if settings.retention.keep_errors_days < 1 {
        return Err(ConfigError::invalid(
            "retention",
            "keep_errors_days",
            "must_be_positive",
            Some(settings.retention.keep_errors_days.to_string()),
        ));
    }
    if settings.retention.cleanup_hour > 23 {
        return Err(ConfigError::invalid(
            "retention",
            "cleanup_hour",
            "out_of_range",
            Some(settings.retention.cleanup_hour.to_string()),
        ));
    }
    if settings.report.weekday > 6 {
        return Err(ConfigError::invalid(
            "report",
            "weekday",
            "out_of_range",
            Some(settings.report.weekday.to_string()),
        ));
    }
    if settings.report.hour > 23 {
        return Err(ConfigError::invalid(
            "report",
            "hour",
            "out_of_range",
            Some(settings.report.hour.to_string()),
        ));
    }
    Ok(())
}

//! Configuration discovery and loading.
//!
//! # Design
//! - `config.json` is searched beside the executable first, then in the
//!   working directory; a missing file yields baked-in defaults.
//! - Credentials and the API URL may be overridden through `VIGIA_API_URL`,
//!   `VIGIA_EMAIL` and `VIGIA_PASSWORD` so deployments never need secrets
//!   on disk.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{ConfigError, ConfigResult};
use crate::model::Settings;
use crate::validate::validate;

/// Environment variable overriding the Ingestion API base URL.
pub const ENV_API_URL: &str = "VIGIA_API_URL";
/// Environment variable overriding the service account email.
pub const ENV_EMAIL: &str = "VIGIA_EMAIL";
/// Environment variable overriding the service account password.
pub const ENV_PASSWORD: &str = "VIGIA_PASSWORD";

const CONFIG_FILE_NAME: &str = "config.json";

/// Discover, load and validate the daemon configuration.
///
/// # Errors
///
/// Returns an error if a discovered file cannot be read or parsed, or if
/// the resulting document fails validation.
pub fn load() -> ConfigResult<Settings> {
    let mut settings = match discover() {
        Some(path) => load_from(&path)?,
        None => Settings::default(),
    };
    apply_env(&mut settings, |name| env::var(name).ok());
    validate(&settings)?;
    Ok(settings)
}

/// Load settings from an explicit configuration file.
///
/// # Errors
///
/// Returns an error if the file cannot be read or contains invalid JSON.
pub fn load_from(path: &Path) -> ConfigResult<Settings> {
    let raw = fs::read_to_string(path).map_err(|source| ConfigError::read(path, source))?;
    serde_json::from_str(&raw).map_err(|source| ConfigError::parse(path, source))
}

fn discover() -> Option<PathBuf> {
    let mut candidates = Vec::new();
    if let Ok(exe) = env::current_exe()
        && let Some(dir) = exe.parent()
    {
        candidates.push(dir.join(CONFIG_FILE_NAME));
    }
    if let Ok(cwd) = env::current_dir() {
        candidates.push(cwd.join(CONFIG_FILE_NAME));
    }
    candidates.into_iter().find(|path| path.is_file())
}

fn apply_env<F>(settings: &mut Settings, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(url) = lookup(ENV_API_URL) {
        settings.api_url = url;
    }
    if let Some(email) = lookup(ENV_EMAIL) {
        settings.credentials.email = email;
    }
    if let Some(password) = lookup(ENV_PASSWORD) {
        settings.credentials.password = password;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;
    use std::io::Write;
    use tempfile::TempDir;

    fn write_config(dir: &TempDir, contents: &str) -> Result<PathBuf, Box<dyn Error>> {
        let path = dir.path().join(CONFIG_FILE_NAME);
        let mut file = fs::File::create(&path)?;
        file.write_all(contents.as_bytes())?;
        Ok(path)
    }

    #[test]
    fn load_from_reads_partial_document() -> Result<(), Box<dyn Error>> {
        let dir = TempDir::new()?;
        let path = write_config(
            &dir,
            r#"{
                "api_url": "http://ingest.test/api",
                "watch": { "batch_size": 10 }
            }"#,
        )?;

        let settings = load_from(&path)?;
        assert_eq!(settings.api_url, "http://ingest.test/api");
        assert_eq!(settings.watch.batch_size, 10);
        assert_eq!(settings.retry.attempts, 3);
        Ok(())
    }

    #[test]
    fn load_from_rejects_invalid_json() -> Result<(), Box<dyn Error>> {
        let dir = TempDir::new()?;
        let path = write_config(&dir, "{ not json")?;
        let error = load_from(&path)
            .err()
            .ok_or_else(|| std::io::Error::other("invalid json should fail"))?;
        assert!(matches!(error, ConfigError::Parse { .. }));
        Ok(())
    }

    #[test]
    fn load_from_reports_missing_file() {
        let error = load_from(Path::new("does/not/exist/config.json")).err();
        assert!(matches!(error, Some(ConfigError::Read { .. })));
    }

    #[test]
    fn env_overrides_replace_credentials_and_url() {
        let mut settings = Settings::default();
        apply_env(&mut settings, |name| match name {
            ENV_API_URL => Some("http://override.test/api".to_string()),
            ENV_EMAIL => Some("svc@notaria.test".to_string()),
            ENV_PASSWORD => Some("secret".to_string()),
            _ => None,
        });
        assert_eq!(settings.api_url, "http://override.test/api");
        assert_eq!(settings.credentials.email, "svc@notaria.test");
        assert_eq!(settings.credentials.password, "secret");
    }

    #[test]
    fn env_overrides_leave_untouched_fields_alone() {
        let mut settings = Settings::default();
        let original_url = settings.api_url.clone();
        apply_env(&mut settings, |_| None);
        assert_eq!(settings.api_url, original_url);
        assert!(settings.credentials.email.is_empty());
    }
}

//! Console configuration.
//!
//! Sources, lowest precedence first: built-in defaults, an optional TOML
//! file (`steward.toml` in the working directory unless another path is
//! given), then `STEWARD_*` environment variables such as
//! `STEWARD_BASE_URL` or `STEWARD_REQUEST_TIMEOUT_SECS`.

use std::path::{Path, PathBuf};
use std::time::Duration;

use config::{Config, Environment, File};
use serde::Deserialize;
use steward_application::SessionConfig;
use url::Url;

use crate::persistence::FileKeyValueStore;

/// Backend URL used when nothing else is configured.
pub const DEFAULT_BASE_URL: &str = "http://localhost:8080/api";

/// Config file looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "steward.toml";

const ENV_PREFIX: &str = "STEWARD";

/// Errors raised while loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// A source could not be read or did not match the expected shape.
    #[error("cannot load configuration: {0}")]
    Load(#[from] config::ConfigError),

    /// `base_url` is not an absolute http(s) URL.
    #[error("invalid base URL {url:?}: {reason}")]
    InvalidBaseUrl {
        /// The configured value.
        url: String,
        /// Why it was rejected.
        reason: String,
    },

    /// No storage path was configured and the platform has no config dir.
    #[error("no storage path configured and no platform config directory")]
    NoStoragePath,
}

/// Settings of one console process.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ConsoleConfig {
    /// Backend API root, e.g. `https://console.example.com/api`.
    pub base_url: String,
    /// File holding the token and preferences.
    #[serde(default)]
    pub storage_path: Option<PathBuf>,
    /// Seconds between token expiry checks while logged in.
    pub expiry_check_secs: u64,
    /// Per-request timeout in seconds.
    pub request_timeout_secs: u64,
    /// Milliseconds between polls of the storage file for changes made by
    /// other processes.
    pub storage_poll_ms: u64,
}

impl ConsoleConfig {
    /// Loads defaults, `file` (or `steward.toml` if present) and the
    /// environment.
    ///
    /// # Errors
    ///
    /// Returns an error if an explicitly given file is missing, a source is
    /// malformed, or the base URL is invalid.
    pub fn load(file: Option<&Path>) -> Result<Self, ConfigError> {
        let file_source = match file {
            Some(path) => File::from(path).required(true),
            None => File::with_name(DEFAULT_CONFIG_FILE).required(false),
        };

        let config: Self = Config::builder()
            .set_default("base_url", DEFAULT_BASE_URL)?
            .set_default("expiry_check_secs", 60)?
            .set_default("request_timeout_secs", 30)?
            .set_default("storage_poll_ms", 1000)?
            .add_source(file_source)
            .add_source(Environment::with_prefix(ENV_PREFIX).try_parsing(true))
            .build()?
            .try_deserialize()?;

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |reason: String| ConfigError::InvalidBaseUrl {
            url: self.base_url.clone(),
            reason,
        };
        let url = Url::parse(&self.base_url).map_err(|e| invalid(e.to_string()))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(invalid(format!("unsupported scheme {}", url.scheme())));
        }
        Ok(())
    }

    /// The storage file: the configured one, else the platform default.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::NoStoragePath`] if neither is available.
    pub fn storage_path(&self) -> Result<PathBuf, ConfigError> {
        self.storage_path
            .clone()
            .or_else(FileKeyValueStore::default_path)
            .ok_or(ConfigError::NoStoragePath)
    }

    /// Per-request timeout.
    #[must_use]
    pub const fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Storage file poll interval; never below 50 ms.
    #[must_use]
    pub fn storage_poll_interval(&self) -> Duration {
        Duration::from_millis(self.storage_poll_ms.max(50))
    }

    /// Session manager settings.
    #[must_use]
    pub const fn session(&self) -> SessionConfig {
        SessionConfig {
            expiry_check_interval: Duration::from_secs(self.expiry_check_secs),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn write(dir: &TempDir, contents: &str) -> PathBuf {
        let path = dir.path().join("steward.toml");
        std::fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn file_overrides_defaults() {
        let dir = TempDir::new().unwrap();
        let path = write(
            &dir,
            r#"
base_url = "https://console.example.com/api"
storage_path = "/var/lib/steward/store.json"
expiry_check_secs = 15
"#,
        );

        let config = ConsoleConfig::load(Some(&path)).unwrap();

        assert_eq!(config.base_url, "https://console.example.com/api");
        assert_eq!(
            config.storage_path().unwrap(),
            PathBuf::from("/var/lib/steward/store.json")
        );
        assert_eq!(config.session().expiry_check_interval, Duration::from_secs(15));
        assert_eq!(config.request_timeout(), Duration::from_secs(30));
    }

    #[test]
    fn rejects_non_http_base_url() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, r#"base_url = "ftp://files.example.com""#);

        let error = ConsoleConfig::load(Some(&path)).unwrap_err();

        assert!(matches!(error, ConfigError::InvalidBaseUrl { .. }));
    }

    #[test]
    fn missing_explicit_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        let result = ConsoleConfig::load(Some(&dir.path().join("absent.toml")));
        assert!(matches!(result, Err(ConfigError::Load(_))));
    }

    #[test]
    fn poll_interval_has_a_floor() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "storage_poll_ms = 1");
        let config = ConsoleConfig::load(Some(&path)).unwrap();
        assert_eq!(config.storage_poll_interval(), Duration::from_millis(50));
    }
}

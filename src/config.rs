//! Configuration file handling.
//!
//! The configuration file is stored at `$FINSHEET_HOME/config.json`. It holds the refresh cadence,
//! request timeout and the display identity given to sessions created from a link. The resolved
//! session itself lives next to it in `session.json`.

use crate::session::{FileSessionStore, User};
use crate::sync::DEFAULT_REFRESH_INTERVAL;
use crate::view::DEFAULT_EMPTY_RETRY_DELAY;
use crate::{utils, Result};
use anyhow::{ensure, Context};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

const APP_NAME: &str = "finsheet";
const CONFIG_VERSION: u8 = 1;
const CONFIG_JSON: &str = "config.json";
const SESSION_JSON: &str = "session.json";
const REQUEST_TIMEOUT_SECS: u64 = 30;
const DEFAULT_USER_NAME: &str = "Quản trị viên";
const DEFAULT_USER_EMAIL: &str = "admin@miniapp.com";

/// The `Config` object represents the configuration of the app. You instantiate it by providing
/// the path to `$FINSHEET_HOME`; the directory and a default `config.json` are created if they do
/// not exist yet.
#[derive(Debug, Clone)]
pub struct Config {
    root: PathBuf,
    config_path: PathBuf,
    config_file: ConfigFile,
}

impl Config {
    /// This will
    /// - create `finsheet_home` if it does not exist
    /// - write a default config file if there is none
    /// - load and validate the config file
    pub async fn load(finsheet_home: impl Into<PathBuf>) -> Result<Self> {
        let maybe_relative = finsheet_home.into();
        utils::make_dir(&maybe_relative)
            .await
            .context("Unable to create the finsheet home directory")?;
        let root = utils::canonicalize(&maybe_relative).await?;

        let config_path = root.join(CONFIG_JSON);
        let config_file = if config_path.is_file() {
            ConfigFile::load(&config_path).await?
        } else {
            debug!("Writing a default config to {}", config_path.display());
            let config_file = ConfigFile::default();
            config_file.save(&config_path).await?;
            config_file
        };

        Ok(Self {
            root,
            config_path,
            config_file,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    pub fn session_path(&self) -> PathBuf {
        self.root.join(SESSION_JSON)
    }

    /// The store holding the resolved session between launches.
    pub fn session_store(&self) -> FileSessionStore {
        FileSessionStore::new(self.session_path())
    }

    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.config_file.refresh_interval_secs)
    }

    pub fn empty_retry_delay(&self) -> Duration {
        Duration::from_secs(self.config_file.empty_retry_delay_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.config_file.request_timeout_secs)
    }

    /// The identity given to sessions created from a link.
    pub fn default_user(&self) -> User {
        User::new(&self.config_file.user_name, &self.config_file.user_email)
    }
}

/// Represents the serialization and deserialization format of the configuration file.
///
/// Example configuration:
/// ```json
/// {
///   "app_name": "finsheet",
///   "config_version": 1,
///   "refresh_interval_secs": 300,
///   "empty_retry_delay_secs": 5,
///   "request_timeout_secs": 30,
///   "user_name": "Quản trị viên",
///   "user_email": "admin@miniapp.com"
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq)]
#[serde(default)]
struct ConfigFile {
    /// Application name, should always be "finsheet"
    app_name: String,

    /// Configuration file version
    config_version: u8,

    /// Seconds between scheduled refreshes of the summary
    refresh_interval_secs: u64,

    /// Seconds to wait before refreshing again when the summary has no categories
    empty_retry_delay_secs: u64,

    /// Seconds before a request to the sheet is abandoned
    request_timeout_secs: u64,

    /// Display name given to sessions created from a link
    user_name: String,

    /// Display email given to sessions created from a link
    user_email: String,
}

impl Default for ConfigFile {
    fn default() -> Self {
        Self {
            app_name: APP_NAME.to_string(),
            config_version: CONFIG_VERSION,
            refresh_interval_secs: DEFAULT_REFRESH_INTERVAL.as_secs(),
            empty_retry_delay_secs: DEFAULT_EMPTY_RETRY_DELAY.as_secs(),
            request_timeout_secs: REQUEST_TIMEOUT_SECS,
            user_name: DEFAULT_USER_NAME.to_string(),
            user_email: DEFAULT_USER_EMAIL.to_string(),
        }
    }
}

impl ConfigFile {
    /// Loads a ConfigFile asynchronously from the specified path.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or parsed, or holds invalid values
    async fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = utils::read(path).await?;

        let config: ConfigFile = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config file at {}", path.display()))?;

        ensure!(
            config.app_name == APP_NAME,
            "Invalid app_name in config file: expected '{}', got '{}'",
            APP_NAME,
            config.app_name
        );
        ensure!(
            config.refresh_interval_secs > 0,
            "refresh_interval_secs must be greater than zero"
        );
        ensure!(
            config.request_timeout_secs > 0,
            "request_timeout_secs must be greater than zero"
        );
        ensure!(
            !config.user_name.trim().is_empty(),
            "user_name must not be empty"
        );

        Ok(config)
    }

    /// Saves the ConfigFile to the specified path.
    async fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let p = path.as_ref();
        let data = serde_json::to_string_pretty(self).context("Unable to serialize config")?;
        utils::write(p, data)
            .await
            .context("Unable to write config file")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_config_load_creates_defaults() {
        let dir = TempDir::new().unwrap();
        let home = dir.path().join("finsheet_home");

        let config = Config::load(&home).await.unwrap();

        assert!(config.config_path().is_file());
        assert_eq!(config.refresh_interval(), Duration::from_secs(300));
        assert_eq!(config.empty_retry_delay(), Duration::from_secs(5));
        assert_eq!(config.request_timeout(), Duration::from_secs(30));
        assert_eq!(config.default_user().name, "Quản trị viên");
        assert_eq!(config.default_user().email, "admin@miniapp.com");
        assert_eq!(config.session_path(), config.root().join("session.json"));
    }

    #[tokio::test]
    async fn test_config_load_existing() {
        let dir = TempDir::new().unwrap();
        let json = r#"{
            "app_name": "finsheet",
            "config_version": 1,
            "refresh_interval_secs": 60,
            "user_name": "Lan"
        }"#;
        utils::write(dir.path().join("config.json"), json)
            .await
            .unwrap();

        let config = Config::load(dir.path()).await.unwrap();
        assert_eq!(config.refresh_interval(), Duration::from_secs(60));
        assert_eq!(config.empty_retry_delay(), Duration::from_secs(5));
        assert_eq!(config.default_user().name, "Lan");
    }

    #[tokio::test]
    async fn test_config_file_save_and_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        let original = ConfigFile {
            refresh_interval_secs: 120,
            user_email: "someone@example.org".to_string(),
            ..ConfigFile::default()
        };
        original.save(&path).await.unwrap();
        let loaded = ConfigFile::load(&path).await.unwrap();
        assert_eq!(original, loaded);
    }

    #[tokio::test]
    async fn test_config_file_load_invalid_app_name() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        utils::write(&path, r#"{"app_name": "budget"}"#)
            .await
            .unwrap();
        let result = ConfigFile::load(&path).await;
        assert!(result.unwrap_err().to_string().contains("Invalid app_name"));
    }

    #[tokio::test]
    async fn test_config_file_load_zero_interval() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        utils::write(&path, r#"{"refresh_interval_secs": 0}"#)
            .await
            .unwrap();
        assert!(ConfigFile::load(&path).await.is_err());
    }
}

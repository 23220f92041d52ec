//! # Sync Configuration
//!
//! Where the backup service lives and whether to push to it at all.
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Environment Variables (highest priority)                           │
//! │     TALLY_BACKUP_URL=http://10.0.0.5:3001/api                          │
//! │     TALLY_SYNC_MODE=offline                                            │
//! │     TALLY_REQUEST_TIMEOUT_SECS=10                                      │
//! │                                                                         │
//! │  2. TOML Config File                                                   │
//! │     ~/.config/books/sync.toml (Linux)                                  │
//! │     ~/Library/Application Support/com.tally.books/sync.toml (macOS)    │
//! │                                                                         │
//! │  3. Default Values (lowest priority)                                   │
//! │     http://127.0.0.1:3001/api, 30 s timeout, SyncMode::Auto            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! # sync.toml
//! [backup]
//! url = "http://127.0.0.1:3001/api"
//! mode = "auto"                # auto | offline
//! request_timeout_secs = 30
//! ```

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::error::{SyncError, SyncResult};

pub const ENV_BACKUP_URL: &str = "TALLY_BACKUP_URL";
pub const ENV_SYNC_MODE: &str = "TALLY_SYNC_MODE";
pub const ENV_REQUEST_TIMEOUT: &str = "TALLY_REQUEST_TIMEOUT_SECS";

// =============================================================================
// Sync Mode
// =============================================================================

/// Whether committed writes are pushed to the backup service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncMode {
    /// Push a snapshot after every committed write.
    #[default]
    Auto,

    /// Never push. Restore still works when asked for explicitly.
    Offline,
}

impl SyncMode {
    /// Returns true if pushes are enabled.
    pub fn is_sync_enabled(&self) -> bool {
        !matches!(self, SyncMode::Offline)
    }
}

impl std::fmt::Display for SyncMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SyncMode::Auto => write!(f, "auto"),
            SyncMode::Offline => write!(f, "offline"),
        }
    }
}

impl std::str::FromStr for SyncMode {
    type Err = SyncError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "auto" | "on" => Ok(SyncMode::Auto),
            "offline" | "disabled" | "off" => Ok(SyncMode::Offline),
            other => Err(SyncError::InvalidConfig(format!(
                "Unknown sync mode: '{}'. Valid options: auto, offline",
                other
            ))),
        }
    }
}

// =============================================================================
// Backup Settings
// =============================================================================

/// Backup service settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackupSettings {
    /// Base URL of the backup API, including the `/api` prefix.
    #[serde(default = "default_backup_url")]
    pub url: String,

    /// Push mode.
    #[serde(default)]
    pub mode: SyncMode,

    /// Per-request timeout (seconds).
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

fn default_backup_url() -> String {
    "http://127.0.0.1:3001/api".to_string()
}

fn default_request_timeout() -> u64 {
    30
}

impl Default for BackupSettings {
    fn default() -> Self {
        BackupSettings {
            url: default_backup_url(),
            mode: SyncMode::default(),
            request_timeout_secs: default_request_timeout(),
        }
    }
}

// =============================================================================
// Main Sync Configuration
// =============================================================================

/// Complete sync configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Backup service settings.
    #[serde(default)]
    pub backup: BackupSettings,
}

impl SyncConfig {
    /// Creates a config with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads configuration from file, environment, and defaults.
    ///
    /// ## Load Order (later overrides earlier)
    /// 1. Default values
    /// 2. Config file (sync.toml)
    /// 3. Environment variables
    pub fn load(config_path: Option<PathBuf>) -> SyncResult<Self> {
        let mut config = Self::default();

        if let Some(path) = config_path.or_else(Self::default_config_path) {
            if path.exists() {
                info!(?path, "Loading sync config from file");
                let contents = std::fs::read_to_string(&path)?;
                config = toml::from_str(&contents)?;
            } else {
                debug!(?path, "Config file not found, using defaults");
            }
        }

        config.apply_env_overrides();
        config.validate()?;

        Ok(config)
    }

    /// Loads config or returns default if load fails.
    pub fn load_or_default(config_path: Option<PathBuf>) -> Self {
        Self::load(config_path).unwrap_or_else(|e| {
            warn!("Failed to load sync config: {}. Using defaults.", e);
            Self::default()
        })
    }

    /// Saves configuration to file.
    pub fn save(&self, config_path: Option<PathBuf>) -> SyncResult<()> {
        let path = config_path
            .or_else(Self::default_config_path)
            .ok_or_else(|| SyncError::ConfigSaveFailed("No config path available".into()))?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)?;
        std::fs::write(&path, contents)?;

        info!(?path, "Sync config saved");
        Ok(())
    }

    /// Validates the configuration.
    pub fn validate(&self) -> SyncResult<()> {
        let url = self.backup.url.trim();
        if !url.starts_with("http://") && !url.starts_with("https://") {
            return Err(SyncError::InvalidUrl(format!(
                "Backup URL must start with http:// or https://, got: {}",
                url
            )));
        }

        if self.backup.request_timeout_secs == 0 {
            return Err(SyncError::InvalidConfig(
                "request_timeout_secs must be greater than 0".into(),
            ));
        }

        Ok(())
    }

    fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Applies overrides from `lookup`, keyed by the `TALLY_*` names.
    ///
    /// Unparseable values are logged and ignored.
    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(url) = lookup(ENV_BACKUP_URL) {
            debug!(url = %url, "Overriding backup URL from environment");
            self.backup.url = url;
        }

        if let Some(mode) = lookup(ENV_SYNC_MODE) {
            match mode.parse() {
                Ok(parsed) => {
                    debug!(mode = %mode, "Overriding sync mode from environment");
                    self.backup.mode = parsed;
                }
                Err(_) => warn!(mode = %mode, "Unknown sync mode in environment"),
            }
        }

        if let Some(timeout) = lookup(ENV_REQUEST_TIMEOUT) {
            match timeout.parse::<u64>() {
                Ok(secs) => self.backup.request_timeout_secs = secs,
                Err(_) => warn!(timeout = %timeout, "Invalid request timeout in environment"),
            }
        }
    }

    /// Returns the default config file path.
    fn default_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("com", "tally", "books")
            .map(|dirs| dirs.config_dir().join("sync.toml"))
    }

    // =========================================================================
    // Convenience Methods
    // =========================================================================

    /// Returns the backup base URL without a trailing slash.
    pub fn backup_url(&self) -> &str {
        self.backup.url.trim().trim_end_matches('/')
    }

    /// Returns the push mode.
    pub fn mode(&self) -> SyncMode {
        self.backup.mode
    }

    /// Returns true if pushes are enabled.
    pub fn is_sync_enabled(&self) -> bool {
        self.backup.mode.is_sync_enabled()
    }

    /// Returns the per-request timeout.
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.backup.request_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_sync_mode_parsing() {
        assert_eq!("auto".parse::<SyncMode>().unwrap(), SyncMode::Auto);
        assert_eq!("OFFLINE".parse::<SyncMode>().unwrap(), SyncMode::Offline);
        assert_eq!("disabled".parse::<SyncMode>().unwrap(), SyncMode::Offline);
        assert!("primary".parse::<SyncMode>().is_err());
    }

    #[test]
    fn test_default_config() {
        let config = SyncConfig::default();
        assert_eq!(config.backup_url(), "http://127.0.0.1:3001/api");
        assert_eq!(config.mode(), SyncMode::Auto);
        assert_eq!(config.request_timeout(), Duration::from_secs(30));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation() {
        let mut config = SyncConfig::default();

        config.backup.url = "ws://localhost:3001".into();
        assert!(matches!(config.validate(), Err(SyncError::InvalidUrl(_))));

        config.backup.url = "https://backup.example.com/api/".into();
        assert!(config.validate().is_ok());
        assert_eq!(config.backup_url(), "https://backup.example.com/api");

        config.backup.request_timeout_secs = 0;
        assert!(matches!(config.validate(), Err(SyncError::InvalidConfig(_))));
    }

    #[test]
    fn test_overrides() {
        let env: HashMap<&str, &str> = HashMap::from([
            (ENV_BACKUP_URL, "http://10.0.0.5:3001/api"),
            (ENV_SYNC_MODE, "offline"),
            (ENV_REQUEST_TIMEOUT, "not-a-number"),
        ]);

        let mut config = SyncConfig::default();
        config.apply_overrides(|key| env.get(key).map(|v| v.to_string()));

        assert_eq!(config.backup_url(), "http://10.0.0.5:3001/api");
        assert!(!config.is_sync_enabled());
        assert_eq!(config.backup.request_timeout_secs, 30);
    }

    #[test]
    fn test_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("sync.toml");

        let mut config = SyncConfig::default();
        config.backup.url = "http://192.168.1.20:3001/api".into();
        config.backup.request_timeout_secs = 5;
        config.save(Some(path.clone())).unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        assert!(contents.contains("[backup]"));

        let loaded: SyncConfig = toml::from_str(&contents).unwrap();
        assert_eq!(loaded.backup.url, "http://192.168.1.20:3001/api");
        assert_eq!(loaded.backup.request_timeout_secs, 5);
        assert_eq!(loaded.backup.mode, SyncMode::Auto);
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let config: SyncConfig = toml::from_str("[backup]\nmode = \"offline\"\n").unwrap();
        assert_eq!(config.backup.url, "http://127.0.0.1:3001/api");
        assert_eq!(config.mode(), SyncMode::Offline);
    }
}

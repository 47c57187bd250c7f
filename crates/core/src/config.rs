//! Configuration management
//!
//! This module handles loading, saving, and migrating the dsk configuration
//! file. The configuration file is stored in TOML format at
//! ~/.config/dsk/config.toml.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Current configuration schema version
///
/// Bumping this version requires adding a migration in `migrate` and marking
/// the change as BREAKING.
pub const SCHEMA_VERSION: u32 = 1;

/// Default transfer chunk size: 100 MiB
pub const DEFAULT_CHUNK_SIZE: u64 = 100 * 1024 * 1024;

/// Default progress update interval in seconds
pub const DEFAULT_UPDATE_INTERVAL_SECS: u64 = 3;

/// Extensions treated as leftover partial-download artifacts, never uploaded
const DEFAULT_EXCLUDED_EXTENSIONS: [&str; 2] = [".aria", ".aria2c"];

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Schema version for migration support
    pub schema_version: u32,

    /// Upload behavior settings
    #[serde(default)]
    pub upload: UploadConfig,
}

/// Settings that shape a single upload run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadConfig {
    /// Destination root folder id (None uploads to the account root)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub root_folder_id: Option<String>,

    /// Whether the destination is a shared/team drive.
    ///
    /// Team drives inherit permissions from the drive, so the explicit
    /// public-read grant is skipped.
    #[serde(default)]
    pub team_drive: bool,

    /// Rotate among pooled credentials when one exhausts its quota
    #[serde(default = "default_true")]
    pub use_account_pool: bool,

    /// Directory holding pooled credential files (*.json)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accounts_dir: Option<PathBuf>,

    /// File extensions that are deleted locally instead of uploaded
    #[serde(default = "default_excluded_extensions")]
    pub excluded_extensions: Vec<String>,

    /// Chunk size for resumable transfers, in bytes
    #[serde(default = "default_chunk_size")]
    pub chunk_size: u64,

    /// Progress update interval, in seconds
    #[serde(default = "default_update_interval")]
    pub update_interval_secs: u64,
}

fn default_true() -> bool {
    true
}

fn default_excluded_extensions() -> Vec<String> {
    DEFAULT_EXCLUDED_EXTENSIONS
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_chunk_size() -> u64 {
    DEFAULT_CHUNK_SIZE
}

fn default_update_interval() -> u64 {
    DEFAULT_UPDATE_INTERVAL_SECS
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            root_folder_id: None,
            team_drive: false,
            use_account_pool: true,
            accounts_dir: None,
            excluded_extensions: default_excluded_extensions(),
            chunk_size: default_chunk_size(),
            update_interval_secs: default_update_interval(),
        }
    }
}

impl UploadConfig {
    /// Whether a file name matches the excluded-extension set.
    ///
    /// Matching is case-insensitive on the full name suffix, so `A.ARIA2C`
    /// is filtered just like `a.aria2c`.
    pub fn is_excluded(&self, file_name: &str) -> bool {
        let lower = file_name.to_lowercase();
        self.excluded_extensions
            .iter()
            .any(|ext| lower.ends_with(&ext.to_lowercase()))
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            upload: UploadConfig::default(),
        }
    }
}

/// Configuration manager handles loading and saving config
#[derive(Debug)]
pub struct ConfigManager {
    config_path: PathBuf,
}

impl ConfigManager {
    /// Create a new ConfigManager with the default config path
    pub fn new() -> Result<Self> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| Error::Config("Could not determine config directory".into()))?;
        let config_path = config_dir.join("dsk").join("config.toml");
        Ok(Self { config_path })
    }

    /// Create a ConfigManager with a custom path (useful for testing)
    pub fn with_path(path: PathBuf) -> Self {
        Self { config_path: path }
    }

    /// Get the configuration file path
    pub fn config_path(&self) -> &PathBuf {
        &self.config_path
    }

    /// Default directory for pooled credential files, next to the config
    pub fn default_accounts_dir(&self) -> PathBuf {
        self.config_path
            .parent()
            .map(|p| p.join("accounts"))
            .unwrap_or_else(|| PathBuf::from("accounts"))
    }

    /// Default path of the single fallback credential
    pub fn fallback_token_path(&self) -> PathBuf {
        self.config_path
            .parent()
            .map(|p| p.join("token.json"))
            .unwrap_or_else(|| PathBuf::from("token.json"))
    }

    /// Load configuration from disk
    ///
    /// If the configuration file doesn't exist, returns a default
    /// configuration. If the schema version doesn't match, attempts
    /// migration.
    pub fn load(&self) -> Result<Config> {
        if !self.config_path.exists() {
            return Ok(Config::default());
        }

        let content = std::fs::read_to_string(&self.config_path)?;
        let mut config: Config = toml::from_str(&content)?;

        if config.schema_version < SCHEMA_VERSION {
            config = self.migrate(config)?;
        } else if config.schema_version > SCHEMA_VERSION {
            return Err(Error::Config(format!(
                "Configuration file version {} is newer than supported version {}. Please upgrade dsk.",
                config.schema_version, SCHEMA_VERSION
            )));
        }

        Ok(config)
    }

    /// Save configuration to disk
    ///
    /// Creates parent directories if they don't exist.
    /// Sets file permissions to 600 (owner read/write only).
    pub fn save(&self, config: &Config) -> Result<()> {
        if let Some(parent) = self.config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(config)?;
        std::fs::write(&self.config_path, content)?;

        // Set restrictive permissions on Unix systems
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let permissions = std::fs::Permissions::from_mode(0o600);
            std::fs::set_permissions(&self.config_path, permissions)?;
        }

        Ok(())
    }

    /// Migrate configuration from older schema version
    fn migrate(&self, config: Config) -> Result<Config> {
        let mut config = config;

        // Add migration logic here when schema version is bumped

        config.schema_version = SCHEMA_VERSION;
        Ok(config)
    }
}

impl Default for ConfigManager {
    fn default() -> Self {
        Self::new().expect("Failed to create default ConfigManager")
    }
}

use anyhow::{Context, Result};
use dirs::config_dir;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::export::ExportFormat;
use crate::store::SortColumn;

/// Main configuration structure for star-follower
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Config {
    /// Database connection string
    #[serde(default = "default_database")]
    pub database: String,

    /// GitHub API settings
    #[serde(default)]
    pub github: GitHubConfig,

    /// Synchronization behavior settings
    #[serde(default)]
    pub sync: SyncConfig,

    /// Report export defaults
    #[serde(default)]
    pub export: ExportConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// GitHub configuration
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct GitHubConfig {
    /// REST API base URL
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// User-Agent header sent with every request
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

/// Synchronization configuration
#[derive(Debug, Deserialize, Serialize, Clone, Default, PartialEq, Eq)]
pub struct SyncConfig {
    /// Mirror the root account's own stars before the accounts it follows
    #[serde(default)]
    pub include_root: bool,

    /// Maximum star pages per account (100 stars each), 0 for no limit
    #[serde(default)]
    pub page_limit: u32,
}

/// Export configuration
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ExportConfig {
    #[serde(default)]
    pub format: ExportFormat,

    #[serde(default)]
    pub order_by: SortColumn,

    #[serde(default = "default_true")]
    pub descending: bool,

    /// Truncate repository names longer than this, 0 to keep them whole
    #[serde(default)]
    pub name_limit: usize,

    /// Truncate descriptions longer than this, 0 to keep them whole
    #[serde(default)]
    pub description_limit: usize,
}

/// Logging configuration
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct LoggingConfig {
    /// Log level
    #[serde(default = "default_log_level")]
    pub level: String, // "info"
}

// Default value functions
fn default_database() -> String {
    "sqlite:///star_follower.db".to_string()
}
fn default_api_url() -> String {
    "https://api.github.com".to_string()
}
fn default_user_agent() -> String {
    format!("star-follower/{}", env!("CARGO_PKG_VERSION"))
}
fn default_true() -> bool {
    true
}
fn default_log_level() -> String {
    "info".to_string()
}

// Default implementations
impl Default for GitHubConfig {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            user_agent: default_user_agent(),
        }
    }
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            format: ExportFormat::default(),
            order_by: SortColumn::default(),
            descending: default_true(),
            name_limit: 0,
            description_limit: 0,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl Config {
    /// Load configuration from the default location or create a default config
    ///
    /// Returns the path of the file when it had to be created.
    pub fn load_or_create() -> Result<(Self, Option<PathBuf>)> {
        Self::load_or_create_at(&Self::default_config_path()?)
    }

    /// Load `config_path`, writing a default config there if it is missing
    pub fn load_or_create_at(config_path: &Path) -> Result<(Self, Option<PathBuf>)> {
        if config_path.exists() {
            return Ok((Self::load(config_path)?, None));
        }

        let config = Self::default();

        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create config directory: {:?}", parent))?;
        }

        config.save(config_path)?;

        Ok((config, Some(config_path.to_path_buf())))
    }

    /// Load configuration from a specific file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;

        let mut config: Config = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {:?}", path))?;

        config.expand_paths()?;

        Ok(config)
    }

    /// Save configuration to a file
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = serde_yaml::to_string(self).context("Failed to serialize configuration")?;

        std::fs::write(path, content)
            .with_context(|| format!("Failed to write config file: {:?}", path))?;

        Ok(())
    }

    /// Get the default configuration file path (XDG compliant)
    pub fn default_config_path() -> Result<PathBuf> {
        let config_dir = config_dir().context("Failed to get user config directory")?;

        Ok(config_dir.join("star-follower").join("config.yml"))
    }

    /// Expand environment variables in the database location
    pub fn expand_paths(&mut self) -> Result<()> {
        self.database = shellexpand::full(&self.database)
            .context("Failed to expand database path")?
            .into_owned();

        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database: default_database(),
            github: GitHubConfig::default(),
            sync: SyncConfig::default(),
            export: ExportConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

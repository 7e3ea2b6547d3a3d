//! tasklist configuration types and loading

use eyre::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Main tasklist configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Log level (TRACE, DEBUG, INFO, WARN, ERROR)
    #[serde(rename = "log-level")]
    pub log_level: Option<String>,

    /// Storage configuration
    pub storage: StorageConfig,

    /// Live subscription tuning
    pub subscriptions: SubscriptionConfig,
}

impl Config {
    /// Load configuration with fallback chain
    ///
    /// Explicit path, then `./.tasklist.yml`, then
    /// `~/.config/tasklist/tasklist.yml`, then defaults.
    pub fn load(config_path: Option<&PathBuf>) -> Result<Self> {
        if let Some(path) = config_path {
            return Self::load_from_file(path).context(format!("Failed to load config from {}", path.display()));
        }

        let local_config = PathBuf::from(".tasklist.yml");
        if local_config.exists() {
            match Self::load_from_file(&local_config) {
                Ok(config) => return Ok(config),
                Err(e) => {
                    tracing::warn!("Failed to load config from {}: {}", local_config.display(), e);
                }
            }
        }

        if let Some(config_dir) = dirs::config_dir() {
            let user_config = config_dir.join("tasklist").join("tasklist.yml");
            if user_config.exists() {
                match Self::load_from_file(&user_config) {
                    Ok(config) => return Ok(config),
                    Err(e) => {
                        tracing::warn!("Failed to load config from {}: {}", user_config.display(), e);
                    }
                }
            }
        }

        tracing::info!("No config file found, using defaults");
        Ok(Self::default())
    }

    fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path).context("Failed to read config file")?;

        let config: Self = serde_yaml::from_str(&content).context("Failed to parse config file")?;

        tracing::info!("Loaded config from: {}", path.as_ref().display());
        Ok(config)
    }

    /// Directory for log files
    pub fn log_dir(&self) -> PathBuf {
        self.storage.data_dir.join("logs")
    }
}

/// Storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Directory holding `tasks.db` and `user_preferences.yml`
    #[serde(rename = "data-dir")]
    pub data_dir: PathBuf,

    /// Keep tasks and preferences in memory only (nothing written to disk)
    #[serde(rename = "in-memory")]
    pub in_memory: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        // ~/.local/share/tasklist on Linux
        let data_dir = dirs::data_local_dir()
            .map(|d| d.join("tasklist"))
            .unwrap_or_else(|| PathBuf::from(".tasklist"));

        Self {
            data_dir,
            in_memory: false,
        }
    }
}

/// Live subscription tuning
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SubscriptionConfig {
    /// Buffered results per subscription and per pipeline
    #[serde(rename = "channel-capacity")]
    pub channel_capacity: usize,

    /// Buffered store change notifications before subscribers lag
    #[serde(rename = "event-capacity")]
    pub event_capacity: usize,

    /// Buffered one-shot UI events per controller
    #[serde(rename = "ui-event-capacity")]
    pub ui_event_capacity: usize,
}

impl Default for SubscriptionConfig {
    fn default() -> Self {
        Self {
            channel_capacity: 16,
            event_capacity: 64,
            ui_event_capacity: 32,
        }
    }
}

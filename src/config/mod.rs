use crate::global;
use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::info;

/// Sentinel written into a freshly generated config file; ingestion refuses
/// to start until it is replaced with a real path.
pub const STORAGE_PLACEHOLDER: &str = "YOUR_STORAGE_PATH_HERE";

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub storage: StorageConfig,
    pub server: ServerConfig,
    pub tables: TableNames,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Path of the SQLite database holding all record tables. Required;
    /// there is no default location on purpose so data never lands
    /// somewhere the operator didn't choose.
    pub path: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            path: STORAGE_PLACEHOLDER.to_string(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 6338, // MEET on a phone keypad
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TableNames {
    pub meeting: String,
    pub transcript: String,
    pub generic: String,
    pub aggregate: String,
}

impl Default for TableNames {
    fn default() -> Self {
        Self {
            meeting: "meeting_records".to_string(),
            transcript: "transcript_records".to_string(),
            generic: "generic_records".to_string(),
            aggregate: "aggregate_ledger".to_string(),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;
        if !config_path.exists() {
            info!(
                "Config file not found, creating default at {:?}",
                config_path
            );
            let config = Self::default();
            config.save()?;
            return Ok(config);
        }

        let content =
            std::fs::read_to_string(&config_path).context("Failed to read config file")?;

        let config: Self = toml::from_str(&content).context("Failed to parse config file")?;

        info!("Loaded config from {:?}", config_path);
        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        let config_path = Self::config_path()?;

        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent).context("Failed to create config directory")?;
        }

        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;

        std::fs::write(&config_path, content).context("Failed to write config file")?;

        Ok(())
    }

    /// Hard startup check: the storage path must be set to something real
    /// before any request is accepted.
    pub fn validate(&self) -> Result<()> {
        if self.storage.path.is_empty() || self.storage.path == STORAGE_PLACEHOLDER {
            bail!(
                "storage.path is not configured; set it in {:?}",
                Self::config_path()?
            );
        }
        Ok(())
    }

    fn config_path() -> Result<PathBuf> {
        global::config_file()
    }
}

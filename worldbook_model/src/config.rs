//! Engine configuration, loaded from TOML.

use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::io::ErrorKind;
use std::path::Path;
use thiserror::Error;

/// Errors raised while reading or writing the configuration file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to access config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Failed to render config: {0}")]
    Render(#[from] toml::ser::Error),
}

/// Environment variable overriding [`StorageConfig::data_dir`].
pub const DATA_DIR_ENV: &str = "WORLDBOOK_DATA_DIR";

/// Where the worldbook record is kept.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Key of the single logical record in the keyed store.
    pub key: String,
    /// Directory used by the file backend. Overridden by `WORLDBOOK_DATA_DIR`.
    pub data_dir: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            key: "worldbookData".to_string(),
            data_dir: "data".to_string(),
        }
    }
}

/// Import behaviour.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImportConfig {
    /// Text-chunk keywords that carry an embedded character card (case-sensitive).
    pub card_keywords: Vec<String>,
    /// Appended to a card's display name to name its world-info group.
    pub character_group_suffix: String,
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            card_keywords: vec![
                "chara".to_string(),
                "ccv3".to_string(),
                "character".to_string(),
            ],
            character_group_suffix: " World Info".to_string(),
        }
    }
}

/// Formatting of resolved prompt text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PromptConfig {
    pub header_open: String,
    pub header_close: String,
    /// Placed between consecutive entry blocks.
    pub block_separator: String,
}

impl Default for PromptConfig {
    fn default() -> Self {
        Self {
            header_open: "【".to_string(),
            header_close: "】".to_string(),
            block_separator: "\n\n".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub storage: StorageConfig,
    pub import: ImportConfig,
    pub prompt: PromptConfig,
}

impl EngineConfig {
    /// Load configuration from a TOML file. A missing file yields defaults.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let mut config = match fs::read_to_string(path) {
            Ok(raw) => toml::from_str(&raw)?,
            Err(err) if err.kind() == ErrorKind::NotFound => Self::default(),
            Err(err) => return Err(err.into()),
        };

        if let Ok(dir) = env::var(DATA_DIR_ENV) {
            if !dir.is_empty() {
                config.storage.data_dir = dir;
            }
        }

        Ok(config)
    }

    /// Write configuration as pretty TOML, creating parent directories.
    pub fn save_to(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        if let Some(parent) = path.as_ref().parent() {
            fs::create_dir_all(parent)?;
        }
        let rendered = toml::to_string_pretty(self)?;
        fs::write(path, rendered)?;
        Ok(())
    }
}

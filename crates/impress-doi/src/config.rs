//! Configuration for impress-doi
//!
//! Groups the source templates, metadata lookup settings and history settings
//! into one serde document, loadable from TOML or JSON.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::sources::{LinkError, SourceConfig};

const CONFIG_DIR: &str = "impress-doi";
const CONFIG_FILE: &str = "config.toml";
const HISTORY_FILE: &str = "history.json";

/// Top-level configuration
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ImdoiConfig {
    /// Where identifiers can be looked up
    pub sources: SourceConfig,
    /// Title lookup
    pub metadata: MetadataConfig,
    /// Recent lookups
    pub history: HistoryConfig,
}

/// Title lookup configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MetadataConfig {
    /// Fetch titles at all
    pub enabled: bool,
    /// Crossref works endpoint; the identifier is appended
    pub endpoint: String,
    /// Request timeout in seconds
    pub timeout_secs: u64,
    pub user_agent: String,
    /// Shown when the title cannot be fetched
    pub placeholder_title: String,
}

impl Default for MetadataConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            endpoint: "https://api.crossref.org/works/".to_string(),
            timeout_secs: 10,
            user_agent: concat!("impress-doi/", env!("CARGO_PKG_VERSION")).to_string(),
            placeholder_title: "Title not available".to_string(),
        }
    }
}

/// Recent lookup history configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HistoryConfig {
    pub max_entries: usize,
    /// History file; defaults to the platform data directory
    pub path: Option<PathBuf>,
    /// Recorded in place of a title that could not be fetched
    pub unknown_title: String,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            max_entries: 10,
            path: None,
            unknown_title: "Unknown Paper".to_string(),
        }
    }
}

impl HistoryConfig {
    pub fn resolved_path(&self) -> Option<PathBuf> {
        self.path
            .clone()
            .or_else(|| dirs::data_dir().map(|dir| dir.join(CONFIG_DIR).join(HISTORY_FILE)))
    }
}

/// Configuration loading or validation error
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error reading {path}: {message}")]
    Io { path: PathBuf, message: String },

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid source configuration: {0}")]
    Sources(#[from] LinkError),

    #[error("Value out of range: {0}")]
    OutOfRange(String),
}

impl ImdoiConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Default location: `<config dir>/impress-doi/config.toml`
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(CONFIG_DIR).join(CONFIG_FILE))
    }

    pub fn from_toml(toml_str: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(toml_str)?)
    }

    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    pub fn from_json(json_str: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json_str)?)
    }

    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Load and validate a config file. `.json` files are read as JSON,
    /// anything else as TOML. A missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::debug!(?path, "No config file, using defaults");
            return Ok(Self::default());
        }
        let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        let config = match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => Self::from_json(&contents)?,
            _ => Self::from_toml(&contents)?,
        };
        config.validate()?;
        tracing::debug!(?path, "Loaded config");
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.sources.validate()?;

        if self.metadata.timeout_secs == 0 {
            return Err(ConfigError::OutOfRange(
                "metadata.timeout_secs must be positive".to_string(),
            ));
        }

        if self.history.max_entries == 0 {
            return Err(ConfigError::OutOfRange(
                "history.max_entries must be positive".to_string(),
            ));
        }

        Ok(())
    }
}

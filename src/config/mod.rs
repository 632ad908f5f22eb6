//! statgraph configuration file handling
//!
//! Loads and manages the ~/.config/statgraph/config.yaml file.

use crate::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Remote source settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Base URL of the statistics API
    #[serde(default = "default_base_url")]
    pub base_url: String,
}

fn default_base_url() -> String {
    crate::source::datausa::DEFAULT_BASE_URL.to_string()
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
        }
    }
}

/// HTTP server settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Bind address for the query server
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    /// Transport-level Cache-Control max-age in seconds, attached to query
    /// responses. Independent of the permanent in-process caches.
    #[serde(default = "default_max_age_secs")]
    pub cache_max_age_secs: u64,
}

fn default_bind_addr() -> String {
    "127.0.0.1:4001".to_string()
}

fn default_max_age_secs() -> u64 {
    3600
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            cache_max_age_secs: default_max_age_secs(),
        }
    }
}

/// statgraph configuration
///
/// Represents the complete ~/.config/statgraph/config.yaml file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StatGraphConfig {
    /// Remote source settings
    #[serde(default)]
    pub source: SourceConfig,

    /// HTTP server settings
    #[serde(default)]
    pub server: ServerConfig,
}

impl StatGraphConfig {
    /// Load configuration from the default path, falling back to defaults if
    /// the file does not exist.
    pub fn load_default() -> Result<Self> {
        let path = Self::default_path();
        if !path.exists() {
            return Ok(Self::default());
        }
        Self::load(&path)
    }

    /// Load configuration from a specific path
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(crate::StatGraphError::Config(format!(
                "Config file not found: {}",
                path.display()
            )));
        }

        tracing::info!(path = %path.display(), "Loading statgraph configuration");

        let content = fs::read_to_string(path)?;
        let config: Self = serde_yaml::from_str(&content)?;

        Ok(config)
    }

    /// Save configuration to a specific path
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        tracing::info!(path = %path.display(), "Saving statgraph configuration");

        let yaml = serde_yaml::to_string(self)?;
        fs::write(path, yaml)?;

        Ok(())
    }

    /// Get the default config path (~/.config/statgraph/config.yaml)
    pub fn default_path() -> PathBuf {
        // Always use ~/.config for consistency across platforms (macOS, Linux)
        let mut path = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
        path.push(".config");
        path.push("statgraph");
        path.push("config.yaml");
        path
    }
}

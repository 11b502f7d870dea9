//! Configuration management for the vehicle codifier.
//!
//! Configuration is loaded from `~/.config/vehicle-codifier/config.toml` with
//! sensible defaults. The whole tree implements `Default`, and is validated
//! exactly once, at load time, per spec.md §9 ("Dynamic configuration
//! objects").

mod types;
mod validate;

pub use types::*;

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Root configuration structure for the codifier.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub catalog: CatalogConfig,
    pub extraction: ExtractionConfig,
    pub weights: WeightsConfig,
    pub thresholds: ThresholdsConfig,
    pub rerank: RerankConfig,
    pub review: ReviewConfig,
    pub limits: LimitsConfig,
    pub embedding: EmbeddingConfig,
    pub output: OutputConfig,
    pub logging: LoggingConfig,
    pub llm: LlmConfig,
}

impl Config {
    /// Load configuration from the default location. Returns the default
    /// configuration if the file doesn't exist.
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::default_path();
        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load configuration from a specific file path, validating it before
    /// returning.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Get the default config file path.
    ///
    /// Uses platform-appropriate directories:
    /// - macOS: ~/Library/Application Support/com.vehicle-codifier.vehicle-codifier/config.toml
    /// - Linux: ~/.config/vehicle-codifier/config.toml
    /// - Windows: C:\Users\<User>\AppData\Roaming\vehicle-codifier\config\config.toml
    ///
    /// Falls back to ~/.vehicle-codifier/config.toml if directory detection fails.
    pub fn default_path() -> PathBuf {
        directories::ProjectDirs::from("com", "vehicle-codifier", "vehicle-codifier")
            .map(|dirs| dirs.config_dir().to_path_buf().join("config.toml"))
            .unwrap_or_else(|| {
                let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
                PathBuf::from(home)
                    .join(".vehicle-codifier")
                    .join("config.toml")
            })
    }

    /// Serialize the config to a pretty TOML string.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::ValidationError(e.to_string()))
    }
}

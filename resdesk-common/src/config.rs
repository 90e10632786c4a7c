//! Configuration loading
//!
//! Values are resolved in priority order:
//! 1. Command-line argument (applied by the binary, highest priority)
//! 2. Environment variable
//! 3. TOML config file
//! 4. Compiled default (fallback)

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default model name sent to the Gemini `generateContent` endpoint.
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash-preview-09-2025";

/// Default base URL of the external model service.
pub const DEFAULT_ENDPOINT: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Service configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub llm: LlmConfig,
    pub pipeline: PipelineConfig,
}

/// HTTP server settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind: String,
    pub port: u16,
}

/// External model endpoint settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// API key for the model endpoint. Usually supplied via the
    /// `RESDESK_API_KEY` (or `GEMINI_API_KEY`) environment variable rather
    /// than the config file.
    pub api_key: String,
    pub model: String,
    pub endpoint: String,
}

/// Classification pipeline settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Fixed sleep between consecutive deep-analysis calls. A crude throttle
    /// against external API rate limits; not adaptive.
    pub inter_document_delay_ms: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1".to_string(),
            port: 5730,
        }
    }
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            model: DEFAULT_MODEL.to_string(),
            endpoint: DEFAULT_ENDPOINT.to_string(),
        }
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            inter_document_delay_ms: 800,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            llm: LlmConfig::default(),
            pipeline: PipelineConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration.
    ///
    /// Reads `path` when given, otherwise the default config file when it
    /// exists, otherwise compiled defaults. Environment variables for the
    /// API key are applied on top either way.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(p) => {
                tracing::debug!(path = %p.display(), "Loading config file");
                Self::from_file(p)?
            }
            None => match default_config_path() {
                Some(p) if p.exists() => {
                    tracing::debug!(path = %p.display(), "Loading default config file");
                    Self::from_file(&p)?
                }
                _ => {
                    tracing::debug!("No config file found, using compiled defaults");
                    Self::default()
                }
            },
        };
        config.apply_env();
        Ok(config)
    }

    /// Parse a TOML config file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content)
            .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))
    }

    /// Apply environment variable overrides (priority 2).
    fn apply_env(&mut self) {
        if let Ok(key) = std::env::var("RESDESK_API_KEY") {
            self.llm.api_key = key;
        } else if let Ok(key) = std::env::var("GEMINI_API_KEY") {
            self.llm.api_key = key;
        }
    }
}

/// Default configuration file path for the platform
/// (`~/.config/resdesk/config.toml` on Linux).
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("resdesk").join("config.toml"))
}

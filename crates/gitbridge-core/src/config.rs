//! Configuration management for gitbridge.
//!
//! Handles loading and saving configuration from TOML files.
//! Config files are stored in platform-specific locations:
//!
//! - **macOS/Linux**: `~/.config/gitbridge/config.toml`
//! - **Windows**: `%APPDATA%\gitbridge\config.toml`
//!
//! Secrets are never written to the file. The GitHub token and the LLM API
//! key are read from `GITHUB_TOKEN` and `OPENROUTER_API_KEY`.
//!
//! # Example
//!
//! ```ignore
//! use gitbridge_core::config::Config;
//!
//! let mut config = Config::load()?;
//! config.set("server.port", "8080")?;
//! config.save()?;
//! ```

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Config file name.
const CONFIG_FILE_NAME: &str = "config.toml";

/// Config directory name.
const CONFIG_DIR_NAME: &str = "gitbridge";

/// Environment variable holding the GitHub bearer token.
pub const GITHUB_TOKEN_ENV: &str = "GITHUB_TOKEN";

/// Environment variable holding the OpenRouter API key.
pub const LLM_API_KEY_ENV: &str = "OPENROUTER_API_KEY";

// =============================================================================
// Configuration structures
// =============================================================================

/// Main configuration structure.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// HTTP listener
    #[serde(default)]
    pub server: ServerConfig,

    /// GitHub API
    #[serde(default)]
    pub github: GitHubConfig,

    /// LLM completion API
    #[serde(default)]
    pub llm: LlmConfig,

    /// SSE session timing
    #[serde(default)]
    pub sse: SseConfig,
}

/// HTTP listener configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

/// GitHub API configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GitHubConfig {
    /// GitHub API base URL (for GitHub Enterprise)
    #[serde(default = "default_github_url")]
    pub base_url: String,
}

/// LLM completion API configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LlmConfig {
    /// OpenAI-compatible API base URL
    #[serde(default = "default_llm_url")]
    pub api_url: String,
    /// Model identifier
    #[serde(default = "default_llm_model")]
    pub model: String,
    /// Value sent as `HTTP-Referer`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub referer: Option<String>,
}

/// SSE session timing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SseConfig {
    /// Delay between the status frame and the tool catalog frame
    #[serde(default = "default_catalog_delay_ms")]
    pub catalog_delay_ms: u64,
    /// Interval between keep-alive frames
    #[serde(default = "default_keepalive_interval_ms")]
    pub keepalive_interval_ms: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl Default for GitHubConfig {
    fn default() -> Self {
        Self {
            base_url: default_github_url(),
        }
    }
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            api_url: default_llm_url(),
            model: default_llm_model(),
            referer: None,
        }
    }
}

impl Default for SseConfig {
    fn default() -> Self {
        Self {
            catalog_delay_ms: default_catalog_delay_ms(),
            keepalive_interval_ms: default_keepalive_interval_ms(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    10001
}

fn default_github_url() -> String {
    "https://api.github.com".to_string()
}

fn default_llm_url() -> String {
    "https://openrouter.ai/api/v1".to_string()
}

fn default_llm_model() -> String {
    "google/gemma-3-12b-it:free".to_string()
}

fn default_catalog_delay_ms() -> u64 {
    500
}

fn default_keepalive_interval_ms() -> u64 {
    5000
}

// =============================================================================
// Config implementation
// =============================================================================

impl Config {
    /// Get the configuration directory path.
    pub fn config_dir() -> Result<PathBuf> {
        dirs::config_dir()
            .map(|p| p.join(CONFIG_DIR_NAME))
            .ok_or_else(|| Error::Config("Could not determine config directory".to_string()))
    }

    /// Get the configuration file path.
    pub fn config_path() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join(CONFIG_FILE_NAME))
    }

    /// Load configuration from the default location.
    ///
    /// Returns a default config if the file doesn't exist.
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;
        Self::load_from(&path)
    }

    /// Load configuration from a specific path.
    ///
    /// Returns a default config if the file doesn't exist.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!(path = ?path, "Config file does not exist, using defaults");
            return Ok(Self::default());
        }

        debug!(path = ?path, "Loading config");

        let contents = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("Failed to read config file: {}", e)))?;

        let config: Config = toml::from_str(&contents)
            .map_err(|e| Error::Config(format!("Failed to parse config file: {}", e)))?;

        info!(path = ?path, "Config loaded successfully");
        Ok(config)
    }

    /// Save configuration to the default location.
    pub fn save(&self) -> Result<()> {
        let path = Self::config_path()?;
        self.save_to(&path)
    }

    /// Save configuration to a specific path.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| Error::Config(format!("Failed to create config directory: {}", e)))?;
        }

        debug!(path = ?path, "Saving config");

        let contents = toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("Failed to serialize config: {}", e)))?;

        std::fs::write(path, contents)
            .map_err(|e| Error::Config(format!("Failed to write config file: {}", e)))?;

        info!(path = ?path, "Config saved successfully");
        Ok(())
    }

    /// Apply overrides from the process environment.
    pub fn apply_env(&mut self) -> Result<()> {
        self.apply_env_with(|key| std::env::var(key).ok())
    }

    /// Apply overrides using `lookup` as the environment.
    ///
    /// Recognized variables: `PORT`, `HOST`, `GITHUB_API_URL`,
    /// `OPENROUTER_API_URL`, `OPENROUTER_MODEL`.
    pub fn apply_env_with<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        const OVERRIDES: [(&str, &str); 5] = [
            ("PORT", "server.port"),
            ("HOST", "server.host"),
            ("GITHUB_API_URL", "github.base_url"),
            ("OPENROUTER_API_URL", "llm.api_url"),
            ("OPENROUTER_MODEL", "llm.model"),
        ];

        for (var, key) in OVERRIDES {
            if let Some(value) = lookup(var).filter(|v| !v.is_empty()) {
                debug!(var = var, key = key, "Applying environment override");
                self.set(key, &value)?;
            }
        }

        Ok(())
    }

    /// GitHub bearer token from the environment, if any.
    pub fn github_token() -> Option<String> {
        std::env::var(GITHUB_TOKEN_ENV)
            .ok()
            .filter(|t| !t.is_empty())
    }

    /// LLM API key from the environment, if any.
    pub fn llm_api_key() -> Option<String> {
        std::env::var(LLM_API_KEY_ENV)
            .ok()
            .filter(|t| !t.is_empty())
    }

    /// Set a configuration value by key path.
    ///
    /// Key format: `section.field` (e.g., `server.port`, `llm.model`)
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        let (section, field) = split_key(key)?;

        match (section, field) {
            ("server", "host") => self.server.host = value.to_string(),
            ("server", "port") => self.server.port = parse_number(key, value)?,
            ("github", "base_url" | "url") => self.github.base_url = value.to_string(),
            ("llm", "api_url" | "url") => self.llm.api_url = value.to_string(),
            ("llm", "model") => self.llm.model = value.to_string(),
            ("llm", "referer") => self.llm.referer = Some(value.to_string()),
            ("sse", "catalog_delay_ms") => self.sse.catalog_delay_ms = parse_number(key, value)?,
            ("sse", "keepalive_interval_ms") => {
                self.sse.keepalive_interval_ms = parse_number(key, value)?
            }
            ("server" | "github" | "llm" | "sse", _) => {
                return Err(Error::Config(format!(
                    "Unknown {} config field: {}",
                    section, field
                )))
            }
            _ => return Err(Error::Config(format!("Unknown config section: {}", section))),
        }

        Ok(())
    }

    /// Get a configuration value by key path.
    ///
    /// Key format: `section.field` (e.g., `server.port`, `llm.model`)
    pub fn get(&self, key: &str) -> Result<Option<String>> {
        let (section, field) = split_key(key)?;

        match (section, field) {
            ("server", "host") => Ok(Some(self.server.host.clone())),
            ("server", "port") => Ok(Some(self.server.port.to_string())),
            ("github", "base_url" | "url") => Ok(Some(self.github.base_url.clone())),
            ("llm", "api_url" | "url") => Ok(Some(self.llm.api_url.clone())),
            ("llm", "model") => Ok(Some(self.llm.model.clone())),
            ("llm", "referer") => Ok(self.llm.referer.clone()),
            ("sse", "catalog_delay_ms") => Ok(Some(self.sse.catalog_delay_ms.to_string())),
            ("sse", "keepalive_interval_ms") => {
                Ok(Some(self.sse.keepalive_interval_ms.to_string()))
            }
            ("server" | "github" | "llm" | "sse", _) => Err(Error::Config(format!(
                "Unknown {} config field: {}",
                section, field
            ))),
            _ => Err(Error::Config(format!("Unknown config section: {}", section))),
        }
    }
}

fn split_key(key: &str) -> Result<(&str, &str)> {
    let parts: Vec<&str> = key.split('.').collect();
    if parts.len() != 2 {
        return Err(Error::Config(format!(
            "Invalid config key '{}'. Expected format: section.field",
            key
        )));
    }
    Ok((parts[0], parts[1]))
}

fn parse_number<T: std::str::FromStr>(key: &str, value: &str) -> Result<T> {
    value
        .parse()
        .map_err(|_| Error::Config(format!("Invalid number for '{}': {}", key, value)))
}

// =============================================================================
// Tests
// =============================================================================

//! Configuration loading and validation for KubeSentinel.
//!
//! Loads configuration from `~/.kubesentinel/config.toml` with environment
//! variable overrides. Validates all settings at startup.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// The root configuration structure.
///
/// Maps directly to `~/.kubesentinel/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Ollama endpoint configuration
    #[serde(default)]
    pub ollama: OllamaConfig,

    /// Gateway configuration
    #[serde(default)]
    pub gateway: GatewayConfig,

    /// Allowed CORS origins for the gateway
    #[serde(default = "default_cors_origins")]
    pub cors_origins: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OllamaConfig {
    /// Base URL of the Ollama server.
    #[serde(default = "default_ollama_host")]
    pub host: String,

    /// Model identifier sent with every request.
    #[serde(default = "default_model")]
    pub model: String,

    /// End-to-end request timeout in seconds, covering the entire duration
    /// of reasoning + content generation.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_ollama_host() -> String {
    "http://localhost:11434".into()
}
fn default_model() -> String {
    "gpt-oss:20b".into()
}
fn default_timeout_secs() -> u64 {
    120
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            host: default_ollama_host(),
            model: default_model(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_host")]
    pub host: String,
}

fn default_port() -> u16 {
    8000
}
fn default_host() -> String {
    "0.0.0.0".into()
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            host: default_host(),
        }
    }
}

fn default_cors_origins() -> Vec<String> {
    vec![
        "http://localhost:3000".into(),
        "http://localhost:5173".into(),
    ]
}

impl AppConfig {
    /// Load configuration from the default path (~/.kubesentinel/config.toml).
    ///
    /// Environment variable overrides (highest priority):
    /// - `KUBESENTINEL_OLLAMA_HOST` or `OLLAMA_HOST`
    /// - `KUBESENTINEL_MODEL`
    /// - `KUBESENTINEL_TIMEOUT_SECS`
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_dir().join("config.toml");
        let mut config = Self::load_from(&config_path)?;

        if let Ok(host) = std::env::var("KUBESENTINEL_OLLAMA_HOST")
            .or_else(|_| std::env::var("OLLAMA_HOST"))
        {
            config.ollama.host = host;
        }

        if let Ok(model) = std::env::var("KUBESENTINEL_MODEL") {
            config.ollama.model = model;
        }

        if let Ok(secs) = std::env::var("KUBESENTINEL_TIMEOUT_SECS") {
            config.ollama.timeout_secs = secs.parse().map_err(|_| {
                ConfigError::ValidationError(format!(
                    "KUBESENTINEL_TIMEOUT_SECS must be an integer, got '{secs}'"
                ))
            })?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!("No config file found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".kubesentinel")
    }

    /// Validate the configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.ollama.timeout_secs == 0 {
            return Err(ConfigError::ValidationError(
                "ollama.timeout_secs must be greater than 0".into(),
            ));
        }

        if !self.ollama.host.starts_with("http://") && !self.ollama.host.starts_with("https://") {
            return Err(ConfigError::ValidationError(format!(
                "ollama.host must be an http(s) URL, got '{}'",
                self.ollama.host
            )));
        }

        Ok(())
    }

    /// Generate a default config TOML string.
    pub fn default_toml() -> String {
        toml::to_string_pretty(&Self::default()).unwrap_or_default()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            ollama: OllamaConfig::default(),
            gateway: GatewayConfig::default(),
            cors_origins: default_cors_origins(),
        }
    }
}

/// Get the user's home directory.
fn dirs_home() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        std::env::var("USERPROFILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("C:\\Users\\Default"))
    }
    #[cfg(not(target_os = "windows"))]
    {
        std::env::var("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("/tmp"))
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse config file at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

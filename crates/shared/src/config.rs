//! Configuration management for the video generator.
//!
//! This module handles loading and parsing configuration from TOML files,
//! with sensible defaults for all settings.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Environment variable that overrides `api.base_url`
pub const API_URL_ENV: &str = "VIDEO_API_URL";

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Data directory settings
    pub data: DataConfig,

    /// Logging settings
    pub logging: LoggingConfig,

    /// Video backend settings
    pub api: ApiConfig,

    /// Generation/polling settings
    #[serde(default)]
    pub generation: GenerationConfig,

    /// Simulated backend timings
    #[serde(default)]
    pub simulation: SimulationConfig,

    /// Demo catalog source
    #[serde(default)]
    pub catalog: CatalogConfig,
}

/// Data directory configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataConfig {
    /// Root data directory path
    pub root_dir: String,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log directory path (relative to data directory or absolute)
    pub log_dir: String,

    /// Default log level (trace, debug, info, warn, error)
    pub default_level: String,

    /// Enable console output
    pub console: bool,

    /// Enable file output
    pub file: bool,

    /// Enable JSON formatting for file logs
    pub json_format: bool,
}

/// Which backend answers generation requests
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum BackendMode {
    /// In-process responder backed by the demo catalog
    Simulated,
    /// Remote HTTP API at `api.base_url`
    Http,
}

impl std::fmt::Display for BackendMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BackendMode::Simulated => write!(f, "simulated"),
            BackendMode::Http => write!(f, "http"),
        }
    }
}

/// Video backend configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Backend selection
    pub mode: BackendMode,

    /// Base URL of the HTTP API
    pub base_url: String,

    /// Per-request timeout in milliseconds
    pub timeout_ms: u64,

    /// Retries for analytics delivery (generation requests are never retried)
    pub retry_attempts: u32,

    /// Base retry delay in milliseconds (doubled on every attempt)
    pub retry_delay_ms: u64,
}

/// Generation state machine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationConfig {
    /// Interval between status polls in milliseconds
    pub poll_interval_ms: u64,

    /// Estimated time shown when the backend gives none, in seconds
    pub default_estimated_time_secs: f64,
}

/// Simulated backend timings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationConfig {
    /// Lower bound of the submission delay in milliseconds
    pub submit_delay_min_ms: u64,

    /// Upper bound of the submission delay in milliseconds
    pub submit_delay_max_ms: u64,

    /// Delay of each status request in milliseconds
    pub status_delay_ms: u64,

    /// Delay of the metadata request in milliseconds
    pub metadata_delay_ms: u64,

    /// Fixed RNG seed (None = seeded from entropy)
    pub seed: Option<u64>,
}

/// Catalog configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CatalogConfig {
    /// JSON file replacing the built-in catalog (relative to data directory or absolute)
    pub path: Option<String>,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: 1000,
            default_estimated_time_secs: 30.0,
        }
    }
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            submit_delay_min_ms: 200,
            submit_delay_max_ms: 800,
            status_delay_ms: 200,
            metadata_delay_ms: 300,
            seed: None,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data: DataConfig {
                root_dir: "data".to_string(),
            },
            logging: LoggingConfig {
                log_dir: "logs".to_string(),
                default_level: "info".to_string(),
                console: true,
                file: true,
                json_format: false,
            },
            api: ApiConfig {
                mode: BackendMode::Simulated,
                base_url: "http://localhost:8000/api".to_string(),
                timeout_ms: 30_000,
                retry_attempts: 3,
                retry_delay_ms: 1000,
            },
            generation: GenerationConfig::default(),
            simulation: SimulationConfig::default(),
            catalog: CatalogConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// If the file doesn't exist, returns the default configuration.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        if !path.exists() {
            tracing::warn!(
                path = %path.display(),
                "Config file not found, using defaults"
            );
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        tracing::info!(
            path = %path.display(),
            "Configuration loaded successfully"
        );

        Ok(config)
    }

    /// Save configuration to a TOML file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();

        let content = toml::to_string_pretty(self)
            .context("Failed to serialize configuration")?;

        std::fs::write(path, content)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        tracing::info!(
            path = %path.display(),
            "Configuration saved successfully"
        );

        Ok(())
    }

    /// Apply environment overrides (currently only the API base URL)
    pub fn apply_env_overrides(&mut self) {
        self.override_base_url(std::env::var(API_URL_ENV).ok());
    }

    fn override_base_url(&mut self, value: Option<String>) {
        if let Some(url) = value.filter(|url| !url.trim().is_empty()) {
            tracing::debug!(base_url = %url, "Overriding API base URL from environment");
            self.api.base_url = url;
        }
    }

    /// Get the absolute path for the data directory
    pub fn data_dir(&self) -> PathBuf {
        PathBuf::from(&self.data.root_dir)
    }

    /// Get the absolute path for the log directory
    pub fn log_dir(&self) -> PathBuf {
        self.resolve(&self.logging.log_dir)
    }

    /// Get the path of the catalog file, if one is configured
    pub fn catalog_path(&self) -> Option<PathBuf> {
        self.catalog.path.as_deref().map(|p| self.resolve(p))
    }

    fn resolve(&self, path: &str) -> PathBuf {
        let path = Path::new(path);
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.data_dir().join(path)
        }
    }
}

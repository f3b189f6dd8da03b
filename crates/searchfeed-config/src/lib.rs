//! searchfeed configuration management
//!
//! Provides configuration loading with support for:
//! - Global config: `~/.searchfeed/config.toml`
//! - Local config: `.searchfeed/config.toml` (in working directory)
//! - CLI overrides via `ConfigOverrides`
//!
//! Configuration is merged in order: global → local → CLI overrides.

mod error;
mod loader;

pub use error::ConfigError;
pub use loader::ConfigLoader;

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Known per-document wire actions.
const KNOWN_ACTIONS: [&str; 4] = ["upload", "merge", "mergeOrUpload", "delete"];

/// Root configuration for searchfeed.
///
/// Represents the fully merged configuration from all sources.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct FeedConfig {
    /// Search service connection
    pub service: ServiceSettings,

    /// Upload tuning
    pub upload: UploadSettings,

    /// Logging configuration
    pub logging: LoggingConfig,
}

/// Search service connection settings.
///
/// # Example TOML
///
/// ```toml
/// [service]
/// endpoint = "https://my-service.example.net"
/// index = "hotels"
/// api_key_env = "SEARCHFEED_API_KEY"
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceSettings {
    /// Service base URL
    pub endpoint: String,

    /// Target index name
    pub index: String,

    /// Environment variable holding the admin API key
    pub api_key_env: Option<String>,

    /// Request timeout in seconds
    pub timeout_secs: u64,

    /// REST API version sent with every request
    pub api_version: String,
}

impl Default for ServiceSettings {
    fn default() -> Self {
        Self {
            endpoint: String::new(),
            index: String::new(),
            api_key_env: Some("SEARCHFEED_API_KEY".to_string()),
            timeout_secs: 30,
            api_version: "2024-07-01".to_string(),
        }
    }
}

/// Upload tuning settings.
///
/// # Example TOML
///
/// ```toml
/// [upload]
/// batch_size = 1000
/// max_concurrent_batches = 8
/// max_retry_attempts = 5
/// initial_backoff_ms = 2000
/// key_field = "HotelId"
/// action = "mergeOrUpload"
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UploadSettings {
    /// Documents per batch
    pub batch_size: usize,

    /// Maximum batches in flight at once
    pub max_concurrent_batches: usize,

    /// Attempts per batch before it is abandoned
    pub max_retry_attempts: u32,

    /// Delay before the first retry, in milliseconds; doubles per failure
    pub initial_backoff_ms: u64,

    /// Name of the key field in input documents
    pub key_field: String,

    /// Per-document wire action (upload, merge, mergeOrUpload, delete)
    pub action: String,
}

impl Default for UploadSettings {
    fn default() -> Self {
        Self {
            batch_size: 1000,
            max_concurrent_batches: 4,
            max_retry_attempts: 5,
            initial_backoff_ms: 2000,
            key_field: "id".to_string(),
            action: "upload".to_string(),
        }
    }
}

impl UploadSettings {
    /// Validate the tuning parameters.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.batch_size == 0 {
            return Err(ConfigError::invalid_value(
                "upload.batch_size",
                "must be at least 1",
            ));
        }
        if self.max_concurrent_batches == 0 {
            return Err(ConfigError::invalid_value(
                "upload.max_concurrent_batches",
                "must be at least 1",
            ));
        }
        if self.max_retry_attempts == 0 {
            return Err(ConfigError::invalid_value(
                "upload.max_retry_attempts",
                "must be at least 1",
            ));
        }
        if self.initial_backoff_ms == 0 {
            return Err(ConfigError::invalid_value(
                "upload.initial_backoff_ms",
                "must be positive",
            ));
        }
        if self.key_field.is_empty() {
            return Err(ConfigError::invalid_value(
                "upload.key_field",
                "must not be empty",
            ));
        }
        if !KNOWN_ACTIONS.contains(&self.action.as_str()) {
            return Err(ConfigError::invalid_value(
                "upload.action",
                format!(
                    "unknown action '{}'. Valid values: {}",
                    self.action,
                    KNOWN_ACTIONS.join(", ")
                ),
            ));
        }
        Ok(())
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// Log format (text, json)
    pub format: LogFormat,

    /// Log file path (optional)
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::default(),
            file: None,
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable text format
    #[default]
    Text,
    /// JSON structured logging
    Json,
}

/// CLI overrides for configuration values.
///
/// Used to apply command-line arguments over file-based config.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    /// Override service endpoint URL
    pub endpoint: Option<String>,

    /// Override target index
    pub index: Option<String>,

    /// Override API key environment variable
    pub api_key_env: Option<String>,

    /// Override batch size
    pub batch_size: Option<usize>,

    /// Override concurrency width
    pub max_concurrent_batches: Option<usize>,

    /// Override per-batch retry budget
    pub max_retry_attempts: Option<u32>,

    /// Override key field name
    pub key_field: Option<String>,

    /// Override log level
    pub log_level: Option<String>,
}

impl FeedConfig {
    /// Apply CLI overrides to this configuration.
    pub fn apply_overrides(&mut self, overrides: &ConfigOverrides) {
        if let Some(ref endpoint) = overrides.endpoint {
            self.service.endpoint = endpoint.clone();
        }

        if let Some(ref index) = overrides.index {
            self.service.index = index.clone();
        }

        if let Some(ref var) = overrides.api_key_env {
            self.service.api_key_env = Some(var.clone());
        }

        if let Some(batch_size) = overrides.batch_size {
            self.upload.batch_size = batch_size;
        }

        if let Some(max) = overrides.max_concurrent_batches {
            self.upload.max_concurrent_batches = max;
        }

        if let Some(attempts) = overrides.max_retry_attempts {
            self.upload.max_retry_attempts = attempts;
        }

        if let Some(ref field) = overrides.key_field {
            self.upload.key_field = field.clone();
        }

        if let Some(ref level) = overrides.log_level {
            self.logging.level = level.clone();
        }
    }

    /// Validate the configuration.
    ///
    /// Checks connection settings and upload tuning; call before any
    /// command that talks to the service.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.service.endpoint.is_empty() {
            return Err(ConfigError::ValidationError(
                "service.endpoint is required".to_string(),
            ));
        }
        if self.service.index.is_empty() {
            return Err(ConfigError::ValidationError(
                "service.index is required".to_string(),
            ));
        }
        self.upload.validate()?;
        Ok(())
    }
}

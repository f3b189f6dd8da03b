//! Configuration loader with inheritance support.
//!
//! Loads configuration from multiple sources and merges them:
//! 1. Global config: `~/.searchfeed/config.toml`
//! 2. Local config: `.searchfeed/config.toml` (in working directory)
//! 3. CLI overrides
//!
//! Later sources override earlier ones.

use crate::error::ConfigError;
use crate::{ConfigOverrides, FeedConfig};
use std::path::{Path, PathBuf};
use tracing::{debug, trace};

/// Configuration file name.
const CONFIG_FILE_NAME: &str = "config.toml";

/// Global configuration directory name.
const GLOBAL_CONFIG_DIR: &str = ".searchfeed";

/// Local configuration directory name.
const LOCAL_CONFIG_DIR: &str = ".searchfeed";

/// Configuration loader with caching and inheritance support.
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    /// Global config directory (e.g., `~/.searchfeed`)
    global_config_dir: Option<PathBuf>,

    /// Cached global config
    global_config: Option<FeedConfig>,
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigLoader {
    /// Create a new configuration loader.
    ///
    /// Automatically detects the global config directory (`~/.searchfeed`).
    pub fn new() -> Self {
        let global_config_dir = dirs::home_dir().map(|h| h.join(GLOBAL_CONFIG_DIR));

        Self {
            global_config_dir,
            global_config: None,
        }
    }

    /// Create a loader with a custom global config directory.
    ///
    /// Useful for testing.
    pub fn with_global_dir(global_dir: impl Into<PathBuf>) -> Self {
        Self {
            global_config_dir: Some(global_dir.into()),
            global_config: None,
        }
    }

    /// Get the global config file path.
    pub fn global_config_path(&self) -> Option<PathBuf> {
        self.global_config_dir
            .as_ref()
            .map(|d| d.join(CONFIG_FILE_NAME))
    }

    /// Get the local config file path for a working directory.
    pub fn local_config_path(&self, working_dir: &Path) -> PathBuf {
        working_dir.join(LOCAL_CONFIG_DIR).join(CONFIG_FILE_NAME)
    }

    /// Load configuration for a working directory with optional CLI overrides.
    ///
    /// Merges config in order: global → local → overrides.
    pub fn load(
        &mut self,
        working_dir: &Path,
        overrides: Option<&ConfigOverrides>,
    ) -> Result<FeedConfig, ConfigError> {
        // Start with default config
        let mut config = FeedConfig::default();

        // Apply global config if available
        if let Some(global_config) = self.load_global()? {
            config = merge_configs(config, global_config);
        }

        // Apply local config if available
        if let Some(local_config) = self.load_local(working_dir)? {
            config = merge_configs(config, local_config);
        }

        // Apply CLI overrides
        if let Some(ovr) = overrides {
            config.apply_overrides(ovr);
        }

        Ok(config)
    }

    /// Load only the global configuration.
    pub fn load_global(&mut self) -> Result<Option<FeedConfig>, ConfigError> {
        // Return cached global config if available
        if let Some(ref config) = self.global_config {
            return Ok(Some(config.clone()));
        }

        let Some(global_path) = self.global_config_path() else {
            debug!("No home directory found, skipping global config");
            return Ok(None);
        };

        if !global_path.exists() {
            trace!("Global config not found at {:?}", global_path);
            return Ok(None);
        }

        debug!("Loading global config from {:?}", global_path);
        let config = load_config_file(&global_path)?;

        // Cache the global config
        self.global_config = Some(config.clone());

        Ok(Some(config))
    }

    /// Load only the local configuration for a working directory.
    pub fn load_local(&self, working_dir: &Path) -> Result<Option<FeedConfig>, ConfigError> {
        let local_path = self.local_config_path(working_dir);

        if !local_path.exists() {
            trace!("Local config not found at {:?}", local_path);
            return Ok(None);
        }

        debug!("Loading local config from {:?}", local_path);
        load_config_file(&local_path).map(Some)
    }

    /// Save configuration to the global config file.
    pub fn save_global(&self, config: &FeedConfig) -> Result<(), ConfigError> {
        let Some(ref global_dir) = self.global_config_dir else {
            return Err(ConfigError::NoHomeDir);
        };

        let global_path = global_dir.join(CONFIG_FILE_NAME);
        save_config_file(&global_path, config)
    }

    /// Save configuration to the local config file for a working directory.
    pub fn save_local(
        &self,
        working_dir: &Path,
        config: &FeedConfig,
    ) -> Result<(), ConfigError> {
        let local_path = self.local_config_path(working_dir);
        save_config_file(&local_path, config)
    }

    /// Initialize global configuration directory.
    ///
    /// Creates `~/.searchfeed/config.toml` with default configuration.
    pub fn init_global(&self) -> Result<PathBuf, ConfigError> {
        let Some(ref global_dir) = self.global_config_dir else {
            return Err(ConfigError::NoHomeDir);
        };

        // Create directory if it doesn't exist
        if !global_dir.exists() {
            std::fs::create_dir_all(global_dir)
                .map_err(|e| ConfigError::create_dir(global_dir, e))?;
        }

        let config_path = global_dir.join(CONFIG_FILE_NAME);
        if !config_path.exists() {
            let default_config = FeedConfig::default();
            save_config_file(&config_path, &default_config)?;
        }

        Ok(config_path)
    }

    /// Initialize local configuration for a working directory.
    ///
    /// Creates `.searchfeed/config.toml` with default configuration.
    pub fn init_local(&self, working_dir: &Path) -> Result<PathBuf, ConfigError> {
        let local_dir = working_dir.join(LOCAL_CONFIG_DIR);

        // Create directory if it doesn't exist
        if !local_dir.exists() {
            std::fs::create_dir_all(&local_dir)
                .map_err(|e| ConfigError::create_dir(&local_dir, e))?;
        }

        let config_path = local_dir.join(CONFIG_FILE_NAME);
        if !config_path.exists() {
            let default_config = FeedConfig::default();
            save_config_file(&config_path, &default_config)?;
        }

        Ok(config_path)
    }

    /// Clear cached global configuration.
    ///
    /// Forces reload on next `load_global()` call.
    pub fn clear_cache(&mut self) {
        self.global_config = None;
    }
}

/// Load a configuration file from disk.
fn load_config_file(path: &Path) -> Result<FeedConfig, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::read_file(path, e))?;

    toml::from_str(&content).map_err(|e| ConfigError::parse_toml(path, e))
}

/// Save a configuration file to disk.
fn save_config_file(path: &Path, config: &FeedConfig) -> Result<(), ConfigError> {
    // Ensure parent directory exists
    if let Some(parent) = path.parent() {
        if !parent.exists() {
            std::fs::create_dir_all(parent).map_err(|e| ConfigError::create_dir(parent, e))?;
        }
    }

    let content = toml::to_string_pretty(config)?;
    std::fs::write(path, content).map_err(|e| ConfigError::write_file(path, e))
}

/// Merge two configurations, with `overlay` taking precedence.
///
/// This performs a field-by-field merge, allowing partial configs.
fn merge_configs(base: FeedConfig, overlay: FeedConfig) -> FeedConfig {
    FeedConfig {
        service: merge_service(base.service, overlay.service),
        upload: merge_upload(base.upload, overlay.upload),
        logging: merge_logging(base.logging, overlay.logging),
    }
}

/// Merge service settings, overlay values override base.
fn merge_service(
    base: crate::ServiceSettings,
    overlay: crate::ServiceSettings,
) -> crate::ServiceSettings {
    crate::ServiceSettings {
        // Use overlay if it differs from default, otherwise keep base
        endpoint: if !overlay.endpoint.is_empty() {
            overlay.endpoint
        } else {
            base.endpoint
        },
        index: if !overlay.index.is_empty() {
            overlay.index
        } else {
            base.index
        },
        api_key_env: if overlay.api_key_env.as_deref() != Some("SEARCHFEED_API_KEY") {
            overlay.api_key_env
        } else {
            base.api_key_env
        },
        timeout_secs: if overlay.timeout_secs != 30 {
            overlay.timeout_secs
        } else {
            base.timeout_secs
        },
        api_version: if overlay.api_version != "2024-07-01" {
            overlay.api_version
        } else {
            base.api_version
        },
    }
}

/// Merge upload settings.
fn merge_upload(
    base: crate::UploadSettings,
    overlay: crate::UploadSettings,
) -> crate::UploadSettings {
    crate::UploadSettings {
        batch_size: if overlay.batch_size != 1000 {
            overlay.batch_size
        } else {
            base.batch_size
        },
        max_concurrent_batches: if overlay.max_concurrent_batches != 4 {
            overlay.max_concurrent_batches
        } else {
            base.max_concurrent_batches
        },
        max_retry_attempts: if overlay.max_retry_attempts != 5 {
            overlay.max_retry_attempts
        } else {
            base.max_retry_attempts
        },
        initial_backoff_ms: if overlay.initial_backoff_ms != 2000 {
            overlay.initial_backoff_ms
        } else {
            base.initial_backoff_ms
        },
        key_field: if overlay.key_field != "id" {
            overlay.key_field
        } else {
            base.key_field
        },
        action: if overlay.action != "upload" {
            overlay.action
        } else {
            base.action
        },
    }
}

/// Merge logging config.
fn merge_logging(
    base: crate::LoggingConfig,
    overlay: crate::LoggingConfig,
) -> crate::LoggingConfig {
    crate::LoggingConfig {
        level: if overlay.level != "info" {
            overlay.level
        } else {
            base.level
        },
        format: overlay.format,
        file: overlay.file.or(base.file),
    }
}

//! CLI command implementations

pub mod benchmark;
pub mod config;
pub mod status;
pub mod upload;
pub mod validate;

use std::time::Duration;

use anyhow::{Context, Result};
use searchfeed_client::{IndexAction, SearchIndexClient, ServiceConfig};
use searchfeed_config::{ConfigLoader, FeedConfig};
use searchfeed_core::UploadOptions;

use crate::GlobalOptions;

/// Load the merged configuration for this invocation.
pub fn load_config(global: &GlobalOptions) -> Result<FeedConfig> {
    let mut loader = ConfigLoader::new();
    let overrides = global.to_config_overrides();
    loader
        .load(&global.working_dir(), Some(&overrides))
        .context("Failed to load configuration")
}

/// Build a service client from validated configuration.
pub fn build_client(config: &FeedConfig) -> Result<SearchIndexClient> {
    config.validate().context("Invalid configuration")?;

    let mut service = ServiceConfig::new(
        config.service.endpoint.as_str(),
        config.service.index.as_str(),
    )
    .with_timeout(config.service.timeout_secs)
    .with_api_version(config.service.api_version.as_str());

    // An unset key variable means the service accepts anonymous writes.
    if let Some(var) = &config.service.api_key_env {
        if std::env::var(var).is_ok() {
            service = service.api_key_env(var.as_str());
        }
    }

    let action = parse_action(&config.upload.action)?;
    let client = SearchIndexClient::new(service)
        .context("Failed to build service client")?
        .with_action(action);
    Ok(client)
}

/// Map the configured action name to its wire action.
pub fn parse_action(name: &str) -> Result<IndexAction> {
    match name {
        "upload" => Ok(IndexAction::Upload),
        "merge" => Ok(IndexAction::Merge),
        "mergeOrUpload" => Ok(IndexAction::MergeOrUpload),
        "delete" => Ok(IndexAction::Delete),
        other => anyhow::bail!(
            "unknown action '{other}'. Valid values: upload, merge, mergeOrUpload, delete"
        ),
    }
}

/// Upload tuning from configuration.
pub fn upload_options(config: &FeedConfig) -> UploadOptions {
    UploadOptions::default()
        .with_batch_size(config.upload.batch_size)
        .with_max_concurrent_batches(config.upload.max_concurrent_batches)
        .with_max_retry_attempts(config.upload.max_retry_attempts)
        .with_initial_backoff(Duration::from_millis(config.upload.initial_backoff_ms))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_action_names() {
        assert_eq!(parse_action("upload").unwrap(), IndexAction::Upload);
        assert_eq!(
            parse_action("mergeOrUpload").unwrap(),
            IndexAction::MergeOrUpload
        );
        assert!(parse_action("replace").is_err());
    }

    #[test]
    fn test_upload_options_from_config() {
        let mut config = FeedConfig::default();
        config.upload.batch_size = 250;
        config.upload.initial_backoff_ms = 500;

        let options = upload_options(&config);
        assert_eq!(options.batch_size, 250);
        assert_eq!(options.initial_backoff, Duration::from_millis(500));
        assert!(options.validate().is_ok());
    }
}

//! Status command - show configuration and service reachability

use anyhow::Result;
use clap::Args;

use super::{build_client, load_config};
use crate::GlobalOptions;

/// Arguments for the status command
#[derive(Args, Debug)]
pub struct StatusArgs {}

/// Execute the status command
pub async fn execute(_args: StatusArgs, global: GlobalOptions) -> Result<()> {
    let config = load_config(&global)?;

    let show = |value: &str| {
        if value.is_empty() {
            "(not set)".to_string()
        } else {
            value.to_string()
        }
    };

    println!("Endpoint:      {}", show(&config.service.endpoint));
    println!("Index:         {}", show(&config.service.index));
    println!("Batch size:    {}", config.upload.batch_size);
    println!("Concurrency:   {}", config.upload.max_concurrent_batches);
    println!("Max retries:   {}", config.upload.max_retry_attempts);
    println!("Backoff:       {} ms", config.upload.initial_backoff_ms);
    println!("Key field:     {}", config.upload.key_field);
    println!("Action:        {}", config.upload.action);

    if config.validate().is_err() {
        if !global.quiet {
            eprintln!("Service connection not configured; set service.endpoint and service.index");
        }
        return Ok(());
    }

    let client = build_client(&config)?;
    match client.index_stats().await {
        Ok(stats) => {
            println!("Reachable:     yes");
            println!("Documents:     {}", stats.document_count);
            println!("Storage:       {} bytes", stats.storage_size);
        }
        Err(e) => {
            println!("Reachable:     no ({e})");
        }
    }

    Ok(())
}

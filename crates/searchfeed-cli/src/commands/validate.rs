//! Validate command - confirm the index reflects an uploaded count

use std::time::Duration;

use anyhow::{Context, Result};
use clap::Args;

use super::{build_client, load_config};
use crate::progress;
use crate::GlobalOptions;

/// Arguments for the validate command
#[derive(Args, Debug)]
pub struct ValidateArgs {
    /// Expected document count
    expected: u64,

    /// Seconds between polls
    #[arg(long, default_value = "2")]
    interval: u64,

    /// Polls before giving up
    #[arg(long, default_value = "30")]
    max_polls: u32,
}

/// Execute the validate command
pub async fn execute(args: ValidateArgs, global: GlobalOptions) -> Result<()> {
    let config = load_config(&global)?;
    let client = build_client(&config)?;

    let spinner = progress::spinner(
        &format!("Waiting for '{}' to reach {} documents", config.service.index, args.expected),
        global.quiet,
    );

    let count = client
        .wait_for_document_count(
            args.expected,
            Duration::from_secs(args.interval),
            args.max_polls,
        )
        .await
        .context("Document count did not reach the expected total")?;

    if let Some(pb) = spinner {
        pb.finish_and_clear();
    }

    println!("Document count: {count}");

    let stats = client
        .index_stats()
        .await
        .context("Failed to fetch index statistics")?;
    println!(
        "Index statistics: {} documents, {} bytes",
        stats.document_count, stats.storage_size
    );

    Ok(())
}

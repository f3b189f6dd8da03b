//! Benchmark command - sweep batch sizes against the live service
//!
//! Uploads generated sample documents one batch at a time and prints
//! throughput per batch size, to pick a batch size before a large feed.

use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use clap::Args;
use searchfeed_client::{estimate_size_mb, generate_documents, PayloadProfile};
use searchfeed_core::IndexEndpoint;

use super::{build_client, load_config};
use crate::GlobalOptions;

/// Arguments for the benchmark command
#[derive(Args, Debug)]
pub struct BenchmarkArgs {
    /// Smallest batch size to try
    #[arg(long, default_value = "100")]
    min: usize,

    /// Largest batch size to try
    #[arg(long, default_value = "1000")]
    max: usize,

    /// Step between batch sizes
    #[arg(long, default_value = "100")]
    step: usize,

    /// Uploads per batch size
    #[arg(long, default_value = "3")]
    tries: u32,

    /// Use large generated documents (roughly a kilobyte each)
    #[arg(long)]
    large: bool,
}

/// Execute the benchmark command
pub async fn execute(args: BenchmarkArgs, global: GlobalOptions) -> Result<()> {
    anyhow::ensure!(
        args.min > 0 && args.step > 0 && args.min <= args.max && args.tries > 0,
        "invalid batch size range"
    );

    let config = load_config(&global)?;
    let client = Arc::new(build_client(&config)?);
    let profile = if args.large {
        PayloadProfile::Large
    } else {
        PayloadProfile::Small
    };

    println!("Batch Size\tSize in MB\tMB / Doc\tTime (ms)\tMB / Second");

    let mut size = args.min;
    while size <= args.max {
        let documents = generate_documents(size, profile);
        let size_mb = estimate_size_mb(&documents);

        let mut durations = Vec::with_capacity(args.tries as usize);
        for attempt in 0..args.tries {
            let started = Instant::now();
            client
                .submit(&documents)
                .await
                .with_context(|| format!("batch size {size}, try {}", attempt + 1))?;
            durations.push(started.elapsed());
        }

        let avg_ms = durations.iter().map(|d| d.as_secs_f64() * 1000.0).sum::<f64>()
            / durations.len() as f64;
        let mb_per_second = if avg_ms > 0.0 {
            size_mb / (avg_ms / 1000.0)
        } else {
            0.0
        };

        println!(
            "{}\t\t{:.3}\t\t{:.3}\t\t{:.3}\t{:.3}",
            size,
            size_mb,
            size_mb / size as f64,
            avg_ms,
            mb_per_second
        );

        size += args.step;
        if size <= args.max {
            // Let the service settle between sizes.
            tokio::time::sleep(Duration::from_secs(2)).await;
        }
    }

    println!();
    Ok(())
}

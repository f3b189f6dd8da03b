//! Upload command - feed a file of documents into the index

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Args, ValueEnum};
use searchfeed_client::JsonDocument;
use searchfeed_core::{BulkUploader, IndexEndpoint, UploadReport};

use super::{build_client, load_config, upload_options};
use crate::progress;
use crate::GlobalOptions;

/// Arguments for the upload command
#[derive(Args, Debug)]
pub struct UploadArgs {
    /// File of documents to upload (JSON array or JSON Lines)
    file: PathBuf,

    /// Documents per batch
    #[arg(long, short = 'b')]
    batch_size: Option<usize>,

    /// Maximum batches in flight at once
    #[arg(long, short = 'p')]
    concurrency: Option<usize>,

    /// Attempts per batch before giving up
    #[arg(long)]
    max_retries: Option<u32>,

    /// Name of the key field in input documents
    #[arg(long, short = 'k')]
    key_field: Option<String>,

    /// Output format: text (default), json
    #[arg(long, short = 'o', default_value = "text")]
    output: OutputFormat,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text output
    Text,
    /// JSON output for scripting
    Json,
}

/// Execute the upload command
pub async fn execute(args: UploadArgs, global: GlobalOptions) -> Result<()> {
    let mut config = load_config(&global)?;
    if let Some(batch_size) = args.batch_size {
        config.upload.batch_size = batch_size;
    }
    if let Some(concurrency) = args.concurrency {
        config.upload.max_concurrent_batches = concurrency;
    }
    if let Some(max_retries) = args.max_retries {
        config.upload.max_retry_attempts = max_retries;
    }
    if let Some(ref key_field) = args.key_field {
        config.upload.key_field = key_field.clone();
    }

    let documents = read_documents(&args.file, &config.upload.key_field)?;
    let total = documents.len();

    let client: Arc<dyn IndexEndpoint<JsonDocument>> = Arc::new(build_client(&config)?);
    let uploader =
        BulkUploader::new(client, upload_options(&config)).context("Invalid upload options")?;

    let spinner = progress::spinner(
        &format!("Uploading {} documents to '{}'", total, config.service.index),
        global.quiet,
    );

    let report = uploader.upload(documents).await?;

    if let Some(pb) = spinner {
        pb.finish_and_clear();
    }

    match args.output {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
        OutputFormat::Text => print_report(&report),
    }

    if !report.is_complete() {
        anyhow::bail!(
            "{} batches abandoned (offsets {:?})",
            report.abandoned.len(),
            report.abandoned_offsets()
        );
    }
    Ok(())
}

/// Read documents from a JSON array file or JSON Lines file.
fn read_documents(path: &Path, key_field: &str) -> Result<Vec<JsonDocument>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    let values: Vec<serde_json::Value> = if content.trim_start().starts_with('[') {
        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse {} as a JSON array", path.display()))?
    } else {
        // JSON Lines: one object per non-empty line
        content
            .lines()
            .filter(|line| !line.trim().is_empty())
            .map(serde_json::from_str)
            .collect::<std::result::Result<_, _>>()
            .with_context(|| format!("Failed to parse {} as JSON Lines", path.display()))?
    };

    anyhow::ensure!(!values.is_empty(), "{} contains no documents", path.display());

    values
        .into_iter()
        .enumerate()
        .map(|(i, value)| {
            JsonDocument::from_value(value, key_field)
                .with_context(|| format!("Document {i} is invalid"))
        })
        .collect()
}

fn print_report(report: &UploadReport) {
    println!(
        "Documents indexed:  {}/{}",
        report.documents_indexed, report.total_documents
    );
    println!("Batches submitted:  {}", report.batches_submitted);
    println!("Attempts made:      {}", report.attempts_made);
    println!("Total time:         {:.2?}", report.elapsed);
    println!("Time per batch:     {:.2?}", report.mean_batch_duration());
    println!("Time per document:  {:.2?}", report.mean_document_duration());
    if !report.is_complete() {
        println!("Abandoned batches:");
        for batch in &report.abandoned {
            println!(
                "  offset {}: {} documents unacknowledged after {} attempts",
                batch.offset, batch.documents_remaining, batch.attempts
            );
        }
    }
}

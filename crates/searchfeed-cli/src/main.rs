//! searchfeed CLI - bulk document feeding for search indexes
//!
//! A command-line interface for pushing JSON documents into a remote
//! search index in batches, with bounded concurrency and per-batch
//! retry.
//!
//! # Usage
//!
//! ```bash
//! # Upload a file of documents
//! searchfeed upload documents.jsonl
//!
//! # Sweep batch sizes against the live service
//! searchfeed benchmark --min 100 --max 1000 --step 100
//!
//! # Wait until the index reflects the uploaded count
//! searchfeed validate 100000
//!
//! # Show configuration and service reachability
//! searchfeed status
//! ```

use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

mod commands;
mod progress;

/// searchfeed - batched document upload for search indexes
#[derive(Parser, Debug)]
#[command(name = "searchfeed")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[command(flatten)]
    global: GlobalOptions,
}

/// Global options available to all commands
#[derive(Args, Debug, Clone)]
struct GlobalOptions {
    /// Directory holding .searchfeed/config.toml
    #[arg(long, short = 'C', global = true)]
    working_dir: Option<PathBuf>,

    /// Service base URL
    #[arg(long, global = true, env = "SEARCHFEED_ENDPOINT")]
    endpoint: Option<String>,

    /// Target index name
    #[arg(long, short = 'i', global = true, env = "SEARCHFEED_INDEX")]
    index: Option<String>,

    /// Environment variable holding the admin API key
    #[arg(long, global = true)]
    api_key_env: Option<String>,

    /// Enable verbose output
    #[arg(long, short = 'v', global = true)]
    verbose: bool,

    /// Suppress non-essential output
    #[arg(long, short = 'q', global = true)]
    quiet: bool,
}

impl GlobalOptions {
    /// Convert global options to config overrides
    pub fn to_config_overrides(&self) -> searchfeed_config::ConfigOverrides {
        searchfeed_config::ConfigOverrides {
            endpoint: self.endpoint.clone(),
            index: self.index.clone(),
            api_key_env: self.api_key_env.clone(),
            ..Default::default()
        }
    }

    /// Directory whose local config applies to this invocation
    pub fn working_dir(&self) -> PathBuf {
        self.working_dir
            .clone()
            .unwrap_or_else(|| std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")))
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Upload documents from a JSON array or JSON Lines file
    Upload(commands::upload::UploadArgs),

    /// Sweep batch sizes against the live service
    Benchmark(commands::benchmark::BenchmarkArgs),

    /// Wait for the index document count to reach an expected total
    Validate(commands::validate::ValidateArgs),

    /// Show configuration and service reachability
    Status(commands::status::StatusArgs),

    /// View and manage configuration
    #[command(subcommand)]
    Config(commands::config::ConfigCommand),
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging based on verbosity
    let log_level = if cli.global.quiet {
        Level::ERROR
    } else if cli.global.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_writer(std::io::stderr)
        .with_ansi(true)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    // Execute the command
    match cli.command {
        Commands::Upload(args) => commands::upload::execute(args, cli.global).await,
        Commands::Benchmark(args) => commands::benchmark::execute(args, cli.global).await,
        Commands::Validate(args) => commands::validate::execute(args, cli.global).await,
        Commands::Status(args) => commands::status::execute(args, cli.global).await,
        Commands::Config(cmd) => commands::config::execute(cmd, cli.global).await,
    }
}

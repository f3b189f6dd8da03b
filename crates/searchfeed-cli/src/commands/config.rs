//! Config command - view and manage configuration files

use anyhow::{Context, Result};
use clap::Subcommand;
use searchfeed_config::ConfigLoader;

use super::load_config;
use crate::GlobalOptions;

/// Configuration subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Show the merged configuration
    Show,

    /// Print config file paths
    Path,

    /// Create a config file with defaults
    Init {
        /// Write the global config instead of the local one
        #[arg(long)]
        global: bool,
    },
}

/// Execute a config subcommand
pub async fn execute(cmd: ConfigCommand, global: GlobalOptions) -> Result<()> {
    let loader = ConfigLoader::new();

    match cmd {
        ConfigCommand::Show => {
            let config = load_config(&global)?;
            println!("{}", serde_json::to_string_pretty(&config)?);
        }
        ConfigCommand::Path => {
            if let Some(path) = loader.global_config_path() {
                println!("global: {}", path.display());
            }
            println!(
                "local:  {}",
                loader.local_config_path(&global.working_dir()).display()
            );
        }
        ConfigCommand::Init { global: to_global } => {
            let path = if to_global {
                loader
                    .init_global()
                    .context("Failed to initialize global config")?
            } else {
                loader
                    .init_local(&global.working_dir())
                    .context("Failed to initialize local config")?
            };
            println!("Config file: {}", path.display());
        }
    }

    Ok(())
}

//! Command implementations

mod browse;
mod config;
mod plan;

use crate::cli::{Cli, Commands};
use crate::output::OutputWriter;
use anyhow::Result;

/// Execute a CLI command
pub async fn execute(cli: Cli) -> Result<()> {
    let output = OutputWriter::new(cli.json);
    let config_path = cli.config.as_deref();

    match cli.command {
        Commands::Plan(args) => plan::execute(args, config_path, &output),
        Commands::Browse(args) => browse::execute(args, config_path, &output).await,
        Commands::Config(args) => config::execute(args, config_path, &output),
    }
}

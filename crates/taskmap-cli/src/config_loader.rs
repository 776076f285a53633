//! Configuration loading utilities for CLI commands

use anyhow::{Context, Result};
use std::path::Path;
use taskmap_core::config::{CliConfigOverrides, LayeredConfig};

/// Load defaults, then the optional config file, then the environment, then CLI overrides
pub fn load_config(path: Option<&Path>, overrides: CliConfigOverrides) -> Result<LayeredConfig> {
    let mut config = LayeredConfig::with_defaults();

    if let Some(path) = path {
        config = config
            .load_from_file(path)
            .with_context(|| format!("Failed to load configuration file {}", path.display()))?;
    }

    let mut config = config.load_from_env();
    config.update_from_cli(overrides);
    config.validate().context("Invalid configuration")?;

    Ok(config)
}

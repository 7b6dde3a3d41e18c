//! Configuration loading and validation

mod schema;

pub use schema::*;

use anyhow::{Context, Result};
use std::path::Path;

/// Example configuration written by `monosynth init`
pub const EXAMPLE_CONFIG: &str = include_str!("../../monosynth.example.yaml");

/// Load configuration from a YAML file
pub fn load_config(path: &Path) -> Result<SynthConfig> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config file: {:?}", path))?;
    let config = parse_config(&contents)?;
    log::debug!("loaded configuration from {:?}", path);
    Ok(config)
}

/// Parse and validate configuration from a YAML string
pub fn parse_config(contents: &str) -> Result<SynthConfig> {
    let config: SynthConfig = if contents.trim().is_empty() {
        SynthConfig::default()
    } else {
        serde_yaml::from_str(contents).context("failed to parse config")?
    };
    config.validate()?;
    Ok(config)
}

/// Load the file if it exists, otherwise fall back to defaults
pub fn load_or_default(path: &Path) -> Result<SynthConfig> {
    if path.exists() {
        load_config(path)
    } else {
        log::info!("no config at {:?}, using defaults", path);
        Ok(SynthConfig::default())
    }
}

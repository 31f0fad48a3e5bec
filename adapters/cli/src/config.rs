//! Loading of TOML configuration files.

use std::{fs, path::Path};

use anyhow::{Context, Result};
use gate_defence_core::GameConfig;
use tracing::info;

/// Reads the configuration at `path`, or the built-in one when absent.
pub(crate) fn load(path: Option<&Path>) -> Result<GameConfig> {
    let Some(path) = path else {
        info!("using built-in configuration");
        return Ok(GameConfig::default());
    };

    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read configuration {}", path.display()))?;
    let config =
        parse(&text).with_context(|| format!("invalid configuration {}", path.display()))?;
    info!(path = %path.display(), "configuration loaded");
    Ok(config)
}

/// Parses and validates a TOML document. Missing fields keep their defaults.
pub(crate) fn parse(text: &str) -> Result<GameConfig> {
    let config: GameConfig = toml::from_str(text).context("malformed TOML")?;
    config.validate().context("configuration failed validation")?;
    Ok(config)
}

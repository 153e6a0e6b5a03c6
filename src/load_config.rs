//! `load_config`: YAML configuration file → [`DocsConfig`].
//!
//! This is the only place where user-supplied YAML is parsed. The result is
//! validated before it is handed to the generator, so schema and invariant
//! problems surface before any repository is touched.
//!
//! When no file is given the configuration embedded at build time
//! (`repodocs.yml` at the workspace root) is used.

use anyhow::{Context, Result};
use repodocs_core::config::DocsConfig;
use std::fs;
use std::path::Path;
use tracing::{error, info};

/// The configuration compiled into the binary.
pub const DEFAULT_CONFIG: &str = include_str!("../repodocs.yml");

/// Reads, parses and validates a YAML configuration file.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<DocsConfig> {
    let path_ref = path.as_ref();
    info!(config_path = ?path_ref, "Loading configuration from file");

    let content = match fs::read_to_string(path_ref) {
        Ok(content) => content,
        Err(e) => {
            error!(error = ?e, config_path = ?path_ref, "Failed to read config file");
            return Err(e).with_context(|| format!("Failed to read config file {path_ref:?}"));
        }
    };
    parse_config(&content).with_context(|| format!("Invalid configuration in {path_ref:?}"))
}

/// The embedded default configuration.
pub fn default_config() -> Result<DocsConfig> {
    info!("Using embedded default configuration");
    parse_config(DEFAULT_CONFIG).context("Invalid embedded default configuration")
}

/// Parses and validates configuration text.
pub fn parse_config(content: &str) -> Result<DocsConfig> {
    let config: DocsConfig = match serde_yaml::from_str(content) {
        Ok(config) => config,
        Err(e) => {
            error!(error = %e, "Failed to parse config YAML");
            return Err(anyhow::Error::new(e).context("Failed to parse config YAML"));
        }
    };
    config.validate()?;
    config.trace_loaded();
    Ok(config)
}

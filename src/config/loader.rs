//! Configuration loading from disk.

use std::fs;
use std::path::Path;

use crate::config::schema::LogConfig;

/// Error type for configuration loading.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Load a configuration from a TOML file and apply environment overrides.
pub fn load_config(path: &Path) -> Result<LogConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    let config = parse_config(&content)?;
    Ok(config.with_env_overrides())
}

/// Parse a TOML document without consulting the environment.
pub fn parse_config(content: &str) -> Result<LogConfig, ConfigError> {
    Ok(toml::from_str(content)?)
}

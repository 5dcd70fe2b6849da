//! # Configuration Loader
//!
//! Reads a TOML file into [`AppConfig`]. Pure data loading: missing sections
//! take serde defaults and nothing is validated here.

use std::path::Path;

use anyhow::Context;
use ob_core::config::AppConfig;

/// Load configuration from a TOML file.
///
/// # Errors
///
/// Returns error if the file cannot be read or is not valid TOML for
/// [`AppConfig`].
pub fn load_config(config_path: impl AsRef<Path>) -> anyhow::Result<AppConfig> {
    let config_path = config_path.as_ref();
    let content = std::fs::read_to_string(config_path)
        .with_context(|| format!("Failed to read config file: {}", config_path.display()))?;
    toml::from_str(&content)
        .with_context(|| format!("Failed to parse config as TOML: {}", config_path.display()))
}

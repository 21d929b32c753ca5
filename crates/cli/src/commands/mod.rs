pub mod chat;
pub mod config_cmd;
pub mod personas;
pub mod serve;
pub mod tiers;

use std::path::Path;
use wrenchwise_config::AppConfig;
use wrenchwise_core::Language;

/// Load the config from `path`, or from the default location.
pub fn load_config(path: Option<&Path>) -> Result<AppConfig, Box<dyn std::error::Error>> {
    let config = match path {
        Some(path) => AppConfig::load_with_env(path),
        None => AppConfig::load(),
    };
    config.map_err(|e| format!("Failed to load config: {e}").into())
}

/// Parse a `--lang` flag, falling back to the configured default.
pub fn language(
    config: &AppConfig,
    flag: Option<&str>,
) -> Result<Language, Box<dyn std::error::Error>> {
    match flag {
        Some(code) => Ok(code.parse()?),
        None => Ok(config.cascade.default_language),
    }
}

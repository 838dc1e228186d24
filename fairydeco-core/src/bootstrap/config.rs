//! Configuration loading

use anyhow::{Context, Result};

use crate::{Config, Error};

/// Load configuration from config file or environment variables
///
/// Config file search order:
/// 1. `FAIRYDECO_CONFIG_PATH` environment variable (explicit path)
/// 2. ./config.yaml (current working directory)
/// 3. /config/config.yaml (Kubernetes mount path)
/// 4. Fall back to environment variables only
///
/// An unreadable file or an environment value that does not parse is fatal.
///
/// Runs before logging is initialised, so progress goes to stderr.
pub fn load_config() -> Result<Config> {
    let config_path = std::env::var("FAIRYDECO_CONFIG_PATH")
        .ok()
        .filter(|p| std::path::Path::new(p).exists())
        .or_else(|| existing("config.yaml"))
        .or_else(|| existing("/config/config.yaml"));

    let config = if let Some(path) = config_path {
        eprintln!("Loading config from {path}");
        Config::from_file(&path)
            .map_err(Error::from)
            .with_context(|| format!("Failed to load {path}"))?
    } else {
        eprintln!("No config file found, using environment variables");
        Config::from_env()
            .map_err(Error::from)
            .context("Failed to load configuration from environment")?
    };

    if let Err(errors) = config.validate() {
        for error in &errors {
            eprintln!("Config validation error: {error}");
        }
        return Err(Error::InvalidInput(format!(
            "configuration validation failed with {} error(s): {}",
            errors.len(),
            errors.join("; ")
        ))
        .into());
    }

    Ok(config)
}

fn existing(path: &str) -> Option<String> {
    std::path::Path::new(path)
        .exists()
        .then(|| path.to_string())
}

//! Configuration loading functionality.
//!
//! Resolves the config file location, creates a commented default on first
//! run, parses TOML, applies `geo.toml` coordinate overrides and validates.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use super::Config;
use super::validation::validate_config;
use crate::common::constants::*;
use crate::common::utils::private_path;

/// Global configuration directory, set once at startup
static CONFIG_DIR: OnceLock<Option<PathBuf>> = OnceLock::new();

/// Coordinates kept outside the main config file.
///
/// `geo.toml` sits next to `cloudcam.toml` so the main file can be shared or
/// version controlled without revealing where the camera is mounted.
#[derive(Debug, Deserialize, Clone)]
struct GeoOverride {
    latitude: Option<f64>,
    longitude: Option<f64>,
    location: Option<String>,
}

/// Set the configuration directory for the current process.
/// This can only be called once, typically at startup.
pub fn set_config_dir(dir: Option<String>) -> Result<()> {
    CONFIG_DIR
        .set(dir.map(PathBuf::from))
        .map_err(|_| anyhow::anyhow!("Configuration directory already set"))
}

/// Get the custom configuration directory if one was set.
pub fn get_custom_config_dir() -> Option<PathBuf> {
    CONFIG_DIR.get().and_then(|d| d.clone())
}

/// Path of `cloudcam.toml`, honouring a custom directory from `--config`.
pub fn get_config_path() -> Result<PathBuf> {
    if let Some(custom_dir) = get_custom_config_dir() {
        return Ok(custom_dir.join(CONFIG_FILE_NAME));
    }

    let config_dir = dirs::config_dir().context("Could not determine config directory")?;
    Ok(config_dir.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
}

/// Load configuration using automatic path detection.
///
/// Creates a default configuration file if none exists yet.
pub fn load() -> Result<Config> {
    let config_path = get_config_path()?;

    if !config_path.exists() {
        super::builder::create_default_config(&config_path)
            .context("Failed to create default config during load")?;
        log_block_start!("Created default configuration at {}", private_path(&config_path));
    }

    load_from_path(&config_path).with_context(|| {
        format!(
            "Failed to load configuration from {}",
            private_path(&config_path)
        )
    })
}

/// Load configuration from a specific path.
///
/// Unlike [`load`], a missing file is an error rather than a reason to
/// create one.
pub fn load_from_path(path: &Path) -> Result<Config> {
    if !path.exists() {
        anyhow::bail!("Configuration file not found: {}", private_path(path));
    }

    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config from {}", private_path(path)))?;

    let mut config: Config = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config from {}", private_path(path)))?;

    // geo.toml values are validated together with the main file
    load_geo_override_from_path(&mut config, path);

    validate_config(&config)?;

    Ok(config)
}

/// Merge `geo.toml` from the config file's directory into `config`.
///
/// A missing file is normal. An unreadable or malformed one is reported and
/// ignored so the main configuration still loads.
fn load_geo_override_from_path(config: &mut Config, config_path: &Path) {
    let Some(geo_path) = config_path.parent().map(|p| p.join("geo.toml")) else {
        return;
    };
    if !geo_path.exists() {
        return;
    }

    let parsed = fs::read_to_string(&geo_path)
        .map_err(|e| format!("Failed to read geo.toml: {e}"))
        .and_then(|content| {
            toml::from_str::<GeoOverride>(&content)
                .map_err(|e| format!("Failed to parse geo.toml: {e}"))
        });

    match parsed {
        Ok(geo) => {
            if geo.latitude.is_some() || geo.longitude.is_some() {
                config.latitude = geo.latitude;
                config.longitude = geo.longitude;
            }
            if let Some(location) = geo.location {
                config.location = Some(location);
            }
        }
        Err(message) => {
            log_pipe!();
            log_warning!("{message}. Using location from main config.");
        }
    }
}

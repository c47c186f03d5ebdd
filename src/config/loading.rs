//! Configuration loading: path resolution, geo.toml overrides and defaults.

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use super::validation::validate_config;
use super::{Config, GeoConfig, LocationMode};
use crate::common::constants::*;
use crate::common::utils::private_path;

/// Global configuration directory, set once at startup
static CONFIG_DIR: OnceLock<Option<PathBuf>> = OnceLock::new();

/// Set the configuration directory for the current process.
/// This can only be called once, typically at startup.
pub fn set_config_dir(dir: Option<String>) -> Result<()> {
    CONFIG_DIR
        .set(dir.map(PathBuf::from))
        .map_err(|_| anyhow::anyhow!("Configuration directory already set"))
}

/// The custom configuration directory, if one was set.
pub fn get_custom_config_dir() -> Option<PathBuf> {
    CONFIG_DIR.get().and_then(|d| d.clone())
}

/// Directory containing miqat.toml and geo.toml.
pub fn get_config_base_dir() -> Result<PathBuf> {
    let config_path = get_config_path()?;
    config_path
        .parent()
        .map(|p| p.to_path_buf())
        .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))
}

pub fn get_config_path() -> Result<PathBuf> {
    if let Some(custom_dir) = get_custom_config_dir() {
        return Ok(custom_dir.join("miqat.toml"));
    }
    let config_dir = dirs::config_dir().context("Could not determine config directory")?;
    Ok(config_dir.join("miqat").join("miqat.toml"))
}

/// Load configuration from the default location, creating it if missing.
pub fn load() -> Result<Config> {
    let config_path = get_config_path()?;

    if !config_path.exists() {
        super::builder::create_default_config(&config_path)
            .context("Failed to create default config during load")?;
        log_block_start!(
            "Created default configuration at {}",
            private_path(&config_path)
        );
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
/// Unlike [`load`], a missing file is an error here.
pub fn load_from_path(path: &PathBuf) -> Result<Config> {
    if !path.exists() {
        anyhow::bail!(
            "Configuration file not found at {}",
            private_path(path)
        );
    }

    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config from {}", private_path(path)))?;

    let mut config: Config = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config from {}", private_path(path)))?;

    // geo.toml values are validated together with the rest
    load_geo_override_from_path(&mut config, path)?;

    validate_config(&config)?;

    apply_defaults(&mut config);

    Ok(config)
}

/// Fill unset fields with their defaults.
pub(crate) fn apply_defaults(config: &mut Config) {
    if config.location.is_none() {
        config.location = Some(LocationMode::Manual);
    }
    if config.method.is_none() {
        config.method = Some(DEFAULT_METHOD);
    }
    if config.events.is_none() {
        config.events = Some(DEFAULT_EVENTS.iter().map(|s| s.to_string()).collect());
    }
    if config.provider_url.is_none() {
        config.provider_url = Some(DEFAULT_PROVIDER_URL.to_string());
    }
    if config.reverse_geocode.is_none() {
        config.reverse_geocode = Some(DEFAULT_REVERSE_GEOCODE);
    }
    if config.time_format.is_none() {
        config.time_format = Some(DEFAULT_TIME_FORMAT.to_string());
    }
}

/// Apply coordinates from a `geo.toml` next to `config_path`.
///
/// A missing file is fine. An unreadable or malformed one is reported and
/// skipped.
pub(crate) fn load_geo_override_from_path(config: &mut Config, config_path: &Path) -> Result<()> {
    let Some(parent) = config_path.parent() else {
        return Ok(());
    };
    let geo_path = parent.join("geo.toml");

    if !geo_path.exists() {
        return Ok(());
    }

    match fs::read_to_string(&geo_path) {
        Ok(content) => match toml::from_str::<GeoConfig>(&content) {
            Ok(geo_config) => {
                if let Some(lat) = geo_config.latitude {
                    config.latitude = Some(lat);
                }
                if let Some(lon) = geo_config.longitude {
                    config.longitude = Some(lon);
                }
                log_debug!("Loaded coordinates from {}", private_path(&geo_path));
            }
            Err(e) => {
                log_warning!("Failed to parse geo.toml: {e}. Using coordinates from main config.");
            }
        },
        Err(e) => {
            log_warning!("Failed to read geo.toml: {e}. Using coordinates from main config.");
        }
    }

    Ok(())
}

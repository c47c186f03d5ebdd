//! Configuration for miqat: TOML file, defaults, validation and hot reload.
//!
//! ## Configuration Sources
//!
//! The configuration lives at `$XDG_CONFIG_HOME/miqat/miqat.toml`, or in the
//! directory given with `--config`. A commented default file is written on first
//! run. Coordinates may be kept in a separate `geo.toml` next to it, which
//! overrides the main file, so the main settings can be shared without revealing
//! where the user lives.
//!
//! ## Configuration Structure
//!
//! ```toml
//! #[Location]
//! location = "manual"       # "manual" (coordinates below), "auto" (IP lookup) or "none"
//! latitude = 21.422500      # Geographic latitude (-90 to 90)
//! longitude = 39.826200     # Geographic longitude (-180 to 180)
//! reverse_geocode = true    # Resolve a place name for the header
//!
//! #[Prayer times]
//! method = 4                # Calculation method id (0-23)
//! events = ["Fajr", "Sunrise", "Dhuhr", "Asr", "Maghrib", "Isha"]
//! provider_url = "https://api.aladhan.com/v1"
//!
//! #[Display]
//! time_format = "24h"       # "24h" or "12h"
//! ```
//!
//! ## Validation
//!
//! Coordinates must be in range, the method id must be known, the event list must
//! be non-empty without duplicates, and the provider URL must be non-empty.
//! Missing coordinates in manual mode are not an error: pages report the location
//! as unavailable instead.

pub mod builder;
pub mod loading;
pub mod validation;
pub mod watcher;

use anyhow::Result;
use serde::Deserialize;
use std::path::PathBuf;

use crate::common::constants::*;
use crate::common::utils::TimeFormat;
use crate::geo::GeoPoint;

pub use builder::create_default_config;
pub use loading::{get_config_path, get_custom_config_dir, load, load_from_path, set_config_dir};
pub use watcher::start_config_watcher;

/// Coordinates stored in `geo.toml`.
#[derive(Debug, Deserialize, Clone)]
pub(crate) struct GeoConfig {
    pub(crate) latitude: Option<f64>,
    pub(crate) longitude: Option<f64>,
}

/// How the user's position is obtained.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LocationMode {
    /// Use `latitude`/`longitude` from the configuration.
    Manual,
    /// Approximate position from the public IP address.
    Auto,
    /// Never look up a location.
    None,
}

impl LocationMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            LocationMode::Manual => "manual",
            LocationMode::Auto => "auto",
            LocationMode::None => "none",
        }
    }
}

/// Settings loaded from `miqat.toml`.
///
/// Every field is optional in the file. After loading, defaults have been filled
/// in, but the accessors below still fall back to the defaults so a `Config`
/// built by hand behaves the same.
#[derive(Debug, Deserialize, Clone, PartialEq, Default)]
#[serde(deny_unknown_fields)]
pub struct Config {
    pub location: Option<LocationMode>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    /// Calculation method id passed to the timing provider.
    pub method: Option<u8>,
    /// Labels of the events shown, in display order.
    pub events: Option<Vec<String>>,
    pub provider_url: Option<String>,
    pub reverse_geocode: Option<bool>,
    pub time_format: Option<String>,
}

impl Config {
    pub fn load() -> Result<Self> {
        load()
    }

    pub fn load_from_path(path: &PathBuf) -> Result<Self> {
        load_from_path(path)
    }

    pub fn get_config_path() -> Result<PathBuf> {
        get_config_path()
    }

    /// Path of the optional `geo.toml` next to the main config.
    pub fn get_geo_path() -> Result<PathBuf> {
        Ok(loading::get_config_base_dir()?.join("geo.toml"))
    }

    pub fn location_mode(&self) -> LocationMode {
        self.location.unwrap_or(LocationMode::Manual)
    }

    /// Configured coordinates, if both are present and valid.
    pub fn coordinates(&self) -> Option<GeoPoint> {
        match (self.latitude, self.longitude) {
            (Some(lat), Some(lon)) => GeoPoint::new(lat, lon).ok(),
            _ => None,
        }
    }

    pub fn method(&self) -> u8 {
        self.method.unwrap_or(DEFAULT_METHOD)
    }

    pub fn events(&self) -> Vec<String> {
        self.events
            .clone()
            .unwrap_or_else(|| DEFAULT_EVENTS.iter().map(|s| s.to_string()).collect())
    }

    pub fn provider_url(&self) -> &str {
        self.provider_url.as_deref().unwrap_or(DEFAULT_PROVIDER_URL)
    }

    pub fn reverse_geocode(&self) -> bool {
        self.reverse_geocode.unwrap_or(DEFAULT_REVERSE_GEOCODE)
    }

    pub fn time_format(&self) -> TimeFormat {
        self.time_format
            .as_deref()
            .and_then(TimeFormat::from_config)
            .unwrap_or(TimeFormat::TwentyFourHour)
    }

    pub fn log_config(&self) {
        let source = match get_custom_config_dir() {
            Some(dir) => format!("configuration from {}", crate::common::utils::private_path(&dir)),
            None => "default configuration".to_string(),
        };
        log_block_start!("Loaded {}", source);

        match self.location_mode() {
            LocationMode::Manual => match self.coordinates() {
                Some(point) => log_indented!("Location: {point}"),
                None => log_indented!("Location: manual (no coordinates set)"),
            },
            LocationMode::Auto => log_indented!("Location: automatic (IP lookup)"),
            LocationMode::None => log_indented!("Location: disabled"),
        }

        log_indented!("Method: {}", self.method());
        log_indented!("Events: {}", self.events().join(", "));
        log_debug!("Provider: {}", self.provider_url());
    }
}

#[cfg(test)]
mod tests;

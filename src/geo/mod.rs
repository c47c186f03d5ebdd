//! Geographic coordinates, Qibla geodesy and the compass reading.
//!
//! ## Module Structure
//!
//! - [`geodesy`]: initial great-circle bearing and haversine distance
//! - [`compass`]: Qibla reading combining the bearing with an optional device heading
//!
//! Everything here is pure computation. Coordinates come in from a
//! [`crate::providers::LocationSource`] and results go out to the display layer.

pub mod compass;
pub mod geodesy;

pub use compass::{CompassReading, HeadingSensor, OrientationCapability};
pub use geodesy::{
    cardinal_direction, compute_bearing, great_circle_distance_km, qibla_bearing,
    qibla_distance_km,
};

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::common::constants::{KAABA_LATITUDE, KAABA_LONGITUDE};


/// Errors raised when constructing coordinates.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GeoError {
    #[error("latitude must be between -90 and 90 degrees (got {0})")]
    LatitudeOutOfRange(f64),
    #[error("longitude must be between -180 and 180 degrees (got {0})")]
    LongitudeOutOfRange(f64),
}

/// An immutable latitude/longitude pair in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    latitude: f64,
    longitude: f64,
}

/// The Kaaba in Makkah, destination of every Qibla calculation.
pub const KAABA: GeoPoint = GeoPoint::new_unchecked(KAABA_LATITUDE, KAABA_LONGITUDE);

impl GeoPoint {
    /// Validated constructor. NaN fails both range checks.
    pub fn new(latitude: f64, longitude: f64) -> Result<Self, GeoError> {
        if !(-90.0..=90.0).contains(&latitude) {
            return Err(GeoError::LatitudeOutOfRange(latitude));
        }
        if !(-180.0..=180.0).contains(&longitude) {
            return Err(GeoError::LongitudeOutOfRange(longitude));
        }
        Ok(Self {
            latitude,
            longitude,
        })
    }

    /// Constructor for compile-time constants and tests. Ranges are not checked.
    pub const fn new_unchecked(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    pub fn latitude(&self) -> f64 {
        self.latitude
    }

    pub fn longitude(&self) -> f64 {
        self.longitude
    }
}

impl fmt::Display for GeoPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let ns = if self.latitude >= 0.0 { 'N' } else { 'S' };
        let ew = if self.longitude >= 0.0 { 'E' } else { 'W' };
        write!(
            f,
            "{:.4}°{ns}, {:.4}°{ew}",
            self.latitude.abs(),
            self.longitude.abs()
        )
    }
}

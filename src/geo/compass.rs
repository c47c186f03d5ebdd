//! Qibla compass reading.
//!
//! Heading access is permission-gated on some devices, so the sensor is first
//! asked for a capability. Whatever the answer, the reading is built the same
//! way: with a heading the needle is relative to where the device points,
//! without one it falls back to the absolute bearing from true north.

use super::geodesy::normalize_degrees;
use super::{GeoPoint, qibla_bearing, qibla_distance_km};

/// Outcome of the heading capability check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrientationCapability {
    Granted,
    Denied,
    Unsupported,
}

impl OrientationCapability {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Granted => "granted",
            Self::Denied => "denied",
            Self::Unsupported => "unsupported",
        }
    }
}

/// A source of device compass headings.
pub trait HeadingSensor {
    /// Capability detection. Implementations that need a permission prompt
    /// perform it here.
    fn request_permission(&mut self) -> OrientationCapability;

    /// Current heading in degrees clockwise from north, if one is available.
    fn heading(&mut self) -> Option<f64>;
}

/// Everything the qibla page shows.
#[derive(Debug, Clone, PartialEq)]
pub struct CompassReading {
    pub origin: GeoPoint,
    /// Absolute Qibla bearing from true north.
    pub bearing: f64,
    pub distance_km: f64,
    pub capability: OrientationCapability,
    /// Device heading used for the needle, when the sensor supplied one.
    pub heading: Option<f64>,
    /// Needle angle relative to the device's forward direction.
    pub needle: f64,
}

impl CompassReading {
    /// Build a reading for `origin`, consulting the sensor once.
    pub fn new(origin: GeoPoint, sensor: &mut dyn HeadingSensor) -> Self {
        let capability = sensor.request_permission();
        let heading = match capability {
            OrientationCapability::Granted => sensor.heading().filter(|h| h.is_finite()),
            OrientationCapability::Denied | OrientationCapability::Unsupported => None,
        };
        Self::from_parts(origin, capability, heading)
    }

    pub fn from_parts(
        origin: GeoPoint,
        capability: OrientationCapability,
        heading: Option<f64>,
    ) -> Self {
        let bearing = qibla_bearing(origin);
        let needle = match heading {
            Some(h) => normalize_degrees(bearing - h),
            None => bearing,
        };
        Self {
            origin,
            bearing,
            distance_km: qibla_distance_km(origin),
            capability,
            heading,
            needle,
        }
    }

    /// True when the needle points within `tolerance_deg` of straight ahead.
    pub fn is_aligned(&self, tolerance_deg: f64) -> bool {
        self.heading.is_some()
            && (self.needle <= tolerance_deg || self.needle >= 360.0 - tolerance_deg)
    }
}

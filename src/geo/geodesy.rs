//! Spherical-earth bearing and distance.
//!
//! Both functions take degrees and are defined for every finite input. The only
//! degenerate case is a destination exactly at a pole, where the tangent in the
//! bearing formula diverges; the result there is whatever `atan2` makes of it.

use super::{GeoPoint, KAABA};
use crate::common::constants::EARTH_RADIUS_KM;

/// Initial great-circle bearing from `origin` to `destination`.
///
/// Returns degrees clockwise from true north in `[0, 360)`.
pub fn compute_bearing(origin: GeoPoint, destination: GeoPoint) -> f64 {
    let phi1 = origin.latitude().to_radians();
    let phi2 = destination.latitude().to_radians();
    let delta_lambda = (destination.longitude() - origin.longitude()).to_radians();

    let x = delta_lambda.sin();
    let y = phi1.cos() * phi2.tan() - phi1.sin() * delta_lambda.cos();

    normalize_degrees(x.atan2(y).to_degrees())
}

/// Haversine distance between two points in kilometers.
pub fn great_circle_distance_km(a: GeoPoint, b: GeoPoint) -> f64 {
    let phi1 = a.latitude().to_radians();
    let phi2 = b.latitude().to_radians();
    let delta_phi = phi2 - phi1;
    let delta_lambda = (b.longitude() - a.longitude()).to_radians();

    let sin_dphi = (delta_phi / 2.0).sin();
    let sin_dlambda = (delta_lambda / 2.0).sin();
    // Rounding can push h a hair outside [0, 1] for antipodal points
    let h = (sin_dphi * sin_dphi + phi1.cos() * phi2.cos() * sin_dlambda * sin_dlambda)
        .clamp(0.0, 1.0);

    2.0 * EARTH_RADIUS_KM * h.sqrt().atan2((1.0 - h).sqrt())
}

/// Qibla direction from `origin`.
pub fn qibla_bearing(origin: GeoPoint) -> f64 {
    compute_bearing(origin, KAABA)
}

/// Distance from `origin` to the Kaaba.
pub fn qibla_distance_km(origin: GeoPoint) -> f64 {
    great_circle_distance_km(origin, KAABA)
}

/// 16-point compass rose label for a bearing.
pub fn cardinal_direction(bearing: f64) -> &'static str {
    const POINTS: [&str; 16] = [
        "N", "NNE", "NE", "ENE", "E", "ESE", "SE", "SSE", "S", "SSW", "SW", "WSW", "W", "WNW",
        "NW", "NNW",
    ];
    let index = ((normalize_degrees(bearing) + 11.25) / 22.5) as usize % POINTS.len();
    POINTS[index]
}

/// Map any angle into `[0, 360)`.
pub(crate) fn normalize_degrees(degrees: f64) -> f64 {
    let normalized = degrees.rem_euclid(360.0);
    // rem_euclid of a tiny negative value rounds to exactly 360.0
    if normalized >= 360.0 { 0.0 } else { normalized }
}

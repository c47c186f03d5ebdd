//! Application-wide constants: defaults, validation limits and protocol values.

use std::time::Duration;

// # Geodesy

/// Mean Earth radius used by the haversine distance, in kilometers.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Coordinates of the Kaaba in Makkah.
pub const KAABA_LATITUDE: f64 = 21.4225;
pub const KAABA_LONGITUDE: f64 = 39.8262;

// # Countdown

/// Period of the live countdown trigger.
pub const COUNTDOWN_TICK: Duration = Duration::from_secs(1);

/// How often the main loop wakes up to check for a calendar-date change.
pub const DATE_CHECK_INTERVAL: Duration = Duration::from_secs(60);

// # Location

/// Ceiling on a single location acquisition.
pub const LOCATION_TIMEOUT: Duration = Duration::from_secs(10);

/// A previously acquired fix younger than this is reused.
pub const LOCATION_MAX_AGE: Duration = Duration::from_secs(60);

// # Providers

pub const DEFAULT_PROVIDER_URL: &str = "https://api.aladhan.com/v1";
pub const IP_LOCATION_URL: &str = "http://ip-api.com/json";
pub const NOMINATIM_URL: &str = "https://nominatim.openstreetmap.org/reverse";

/// Per-request timeout on the HTTP client.
pub const HTTP_TIMEOUT: Duration = Duration::from_secs(15);

pub const USER_AGENT: &str = concat!("miqat/", env!("CARGO_PKG_VERSION"));

// # Configuration defaults

pub const DEFAULT_LOCATION_MODE: &str = "manual";
pub const DEFAULT_METHOD: u8 = 4; // Umm al-Qura University, Makkah
pub const DEFAULT_TIME_FORMAT: &str = "24h";
pub const DEFAULT_REVERSE_GEOCODE: bool = true;
pub const DEFAULT_EVENTS: [&str; 6] = ["Fajr", "Sunrise", "Dhuhr", "Asr", "Maghrib", "Isha"];

// # Validation limits

pub const MINIMUM_METHOD: u8 = 0;
pub const MAXIMUM_METHOD: u8 = 23;

/// Debounce for config file change events.
pub const WATCH_DEBOUNCE: Duration = Duration::from_millis(500);

// # Exit codes

pub const EXIT_FAILURE: i32 = 1;

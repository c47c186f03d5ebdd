//! External collaborators: location, reverse geocoding, prayer timings, heading.
//!
//! Each collaborator is a small trait so that pages can be exercised with stubs.
//! The concrete implementations talk HTTP through a shared blocking client and
//! never retry: a failure becomes a user-visible fallback in the page that asked.
//!
//! - [`location`]: configured coordinates, IP lookup, and the bounded/cached wrapper
//! - [`geocode`]: Nominatim reverse lookup that degrades to an empty name
//! - [`aladhan`]: daily and monthly timings from the Aladhan API
//! - [`heading`]: fixed heading sensor for the qibla page

pub mod aladhan;
pub mod geocode;
pub mod heading;
pub mod location;

pub use aladhan::AladhanClient;
pub use geocode::{NoPlaceNames, NominatimResolver};
pub use heading::FixedHeading;
pub use location::{BoundedLocation, ConfiguredLocation, DisabledLocation, IpLocation};

use anyhow::{Context, Result};
use chrono::NaiveDate;
use chrono_tz::Tz;
use reqwest::blocking::Client;
use std::collections::BTreeMap;
use std::time::Duration;

use crate::common::constants::{HTTP_TIMEOUT, USER_AGENT};
use crate::geo::GeoPoint;
use crate::schedule::{DailyEvent, DailySchedule};

/// Why no location could be obtained.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum LocationError {
    #[error("location access is disabled")]
    PermissionDenied,
    #[error("no location source is configured")]
    Unsupported,
    #[error("no location fix within {} seconds", .0.as_secs())]
    Timeout(Duration),
    #[error("location unavailable: {0}")]
    Unavailable(String),
}

/// Why prayer timings could not be retrieved.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TimingsFetchError {
    #[error("timing provider returned status {0}")]
    Status(u16),
    #[error("malformed timing payload: {0}")]
    Malformed(String),
    #[error("timing provider unreachable: {0}")]
    Transport(String),
}

/// Reverse geocoding failure. Never leaves [`geocode`].
#[derive(Debug, thiserror::Error)]
pub(crate) enum GeocodeError {
    #[error("request failed: {0}")]
    Transport(String),
    #[error("status {0}")]
    Status(u16),
    #[error("unexpected payload: {0}")]
    Malformed(String),
    #[error("no place name in response")]
    NoName,
}

/// Supplies the user's position.
pub trait LocationSource: Send + Sync {
    fn acquire_location(&self) -> Result<GeoPoint, LocationError>;
}

/// Turns coordinates into a human-readable place name.
///
/// Returns an empty string when the name cannot be determined; callers then show
/// raw coordinates.
pub trait PlaceNameResolver {
    fn resolve_place_name(&self, point: GeoPoint) -> String;
}

/// Remote prayer-time calculation.
pub trait TimingsProvider {
    fn fetch_daily_timings(
        &self,
        date: NaiveDate,
        point: GeoPoint,
        method: u8,
    ) -> Result<DailyTimings, TimingsFetchError>;

    fn fetch_month_timings(
        &self,
        year: i32,
        month: u32,
        point: GeoPoint,
        method: u8,
    ) -> Result<Vec<DailyTimings>, TimingsFetchError>;
}

/// One day of timings as returned by a provider.
#[derive(Debug, Clone, PartialEq)]
pub struct DailyTimings {
    pub date: NaiveDate,
    /// Event label to `"HH:MM"`, possibly with a trailing zone tag.
    pub timings: BTreeMap<String, String>,
    /// Zone the provider computed the times in, when it said so.
    pub timezone: Option<Tz>,
    /// Hijri date for display, e.g. `"25 Rabīʿ al-thānī 1448"`.
    pub hijri: Option<String>,
    pub method_name: Option<String>,
}

impl DailyTimings {
    /// Build a schedule from the requested labels, in the order given.
    pub fn to_schedule(&self, labels: &[String]) -> Result<DailySchedule, TimingsFetchError> {
        let events = labels
            .iter()
            .map(|label| {
                let value = self.timings.get(label).ok_or_else(|| {
                    TimingsFetchError::Malformed(format!("missing time for {label}"))
                })?;
                DailyEvent::parse(label.as_str(), value)
                    .map_err(|e| TimingsFetchError::Malformed(e.to_string()))
            })
            .collect::<Result<Vec<_>, _>>()?;

        DailySchedule::new(events).map_err(|e| TimingsFetchError::Malformed(e.to_string()))
    }
}

/// Blocking HTTP client shared by the network-backed providers.
pub fn http_client() -> Result<Client> {
    Client::builder()
        .timeout(HTTP_TIMEOUT)
        .user_agent(USER_AGENT)
        .build()
        .context("Failed to build HTTP client")
}

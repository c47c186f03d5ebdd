//! Where the user is.
//!
//! [`BoundedLocation`] wraps any source with the acquisition rules the pages rely
//! on: give up after a fixed timeout, and reuse a recent fix instead of asking
//! again.

use reqwest::blocking::Client;
use serde::Deserialize;
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use super::{LocationError, LocationSource};
use crate::common::constants::{IP_LOCATION_URL, LOCATION_MAX_AGE, LOCATION_TIMEOUT};
use crate::geo::GeoPoint;

/// Coordinates written in the configuration file.
#[derive(Debug, Clone)]
pub struct ConfiguredLocation {
    point: Option<GeoPoint>,
}

impl ConfiguredLocation {
    pub fn new(point: Option<GeoPoint>) -> Self {
        Self { point }
    }
}

impl LocationSource for ConfiguredLocation {
    fn acquire_location(&self) -> Result<GeoPoint, LocationError> {
        self.point.ok_or(LocationError::Unsupported)
    }
}

/// Location access switched off by the user.
#[derive(Debug, Clone, Default)]
pub struct DisabledLocation;

impl LocationSource for DisabledLocation {
    fn acquire_location(&self) -> Result<GeoPoint, LocationError> {
        Err(LocationError::PermissionDenied)
    }
}

/// Approximate position from the public IP address.
pub struct IpLocation {
    client: Client,
    url: String,
}

#[derive(Debug, Deserialize)]
struct IpPayload {
    status: String,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    lat: Option<f64>,
    #[serde(default)]
    lon: Option<f64>,
}

impl IpLocation {
    pub fn new(client: Client) -> Self {
        Self::with_url(client, IP_LOCATION_URL)
    }

    pub fn with_url(client: Client, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
        }
    }
}

impl LocationSource for IpLocation {
    fn acquire_location(&self) -> Result<GeoPoint, LocationError> {
        let response = self
            .client
            .get(&self.url)
            .send()
            .map_err(|e| LocationError::Unavailable(e.to_string()))?;
        if !response.status().is_success() {
            return Err(LocationError::Unavailable(format!(
                "lookup returned status {}",
                response.status().as_u16()
            )));
        }
        let body = response
            .text()
            .map_err(|e| LocationError::Unavailable(e.to_string()))?;
        parse_ip_payload(&body)
    }
}

fn parse_ip_payload(body: &str) -> Result<GeoPoint, LocationError> {
    let payload: IpPayload =
        serde_json::from_str(body).map_err(|e| LocationError::Unavailable(e.to_string()))?;

    if payload.status != "success" {
        return Err(LocationError::Unavailable(
            payload.message.unwrap_or(payload.status),
        ));
    }

    match (payload.lat, payload.lon) {
        (Some(lat), Some(lon)) => {
            GeoPoint::new(lat, lon).map_err(|e| LocationError::Unavailable(e.to_string()))
        }
        _ => Err(LocationError::Unavailable(
            "lookup returned no coordinates".to_string(),
        )),
    }
}

/// Timeout and fix-age policy around another source.
///
/// The inner lookup runs on its own thread. If it does not answer in time the
/// caller gets [`LocationError::Timeout`]; a late answer is discarded.
pub struct BoundedLocation<S> {
    inner: Arc<S>,
    timeout: Duration,
    max_age: Duration,
    last_fix: Mutex<Option<(Instant, GeoPoint)>>,
}

impl<S: LocationSource + 'static> BoundedLocation<S> {
    pub fn new(inner: S) -> Self {
        Self::with_limits(inner, LOCATION_TIMEOUT, LOCATION_MAX_AGE)
    }

    pub fn with_limits(inner: S, timeout: Duration, max_age: Duration) -> Self {
        Self {
            inner: Arc::new(inner),
            timeout,
            max_age,
            last_fix: Mutex::new(None),
        }
    }

    fn cached(&self) -> Option<GeoPoint> {
        let guard = self.last_fix.lock().ok()?;
        guard
            .as_ref()
            .filter(|(at, _)| at.elapsed() <= self.max_age)
            .map(|(_, point)| *point)
    }
}

impl<S: LocationSource + 'static> LocationSource for BoundedLocation<S> {
    fn acquire_location(&self) -> Result<GeoPoint, LocationError> {
        if let Some(point) = self.cached() {
            log_debug!("Reusing location fix {point}");
            return Ok(point);
        }

        let (tx, rx) = mpsc::channel();
        let inner = Arc::clone(&self.inner);
        thread::spawn(move || {
            let _ = tx.send(inner.acquire_location());
        });

        match rx.recv_timeout(self.timeout) {
            Ok(Ok(point)) => {
                if let Ok(mut guard) = self.last_fix.lock() {
                    *guard = Some((Instant::now(), point));
                }
                Ok(point)
            }
            Ok(Err(e)) => Err(e),
            Err(RecvTimeoutError::Timeout) => Err(LocationError::Timeout(self.timeout)),
            Err(RecvTimeoutError::Disconnected) => Err(LocationError::Unavailable(
                "location lookup stopped unexpectedly".to_string(),
            )),
        }
    }
}

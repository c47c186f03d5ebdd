//! Reverse geocoding through Nominatim.

use reqwest::blocking::Client;
use serde::Deserialize;

use super::{GeocodeError, PlaceNameResolver};
use crate::common::constants::NOMINATIM_URL;
use crate::geo::GeoPoint;

pub struct NominatimResolver {
    client: Client,
    url: String,
}

#[derive(Debug, Default, Deserialize)]
struct ReversePayload {
    #[serde(default)]
    address: Option<Address>,
    #[serde(default)]
    display_name: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct Address {
    city: Option<String>,
    town: Option<String>,
    village: Option<String>,
    county: Option<String>,
    state: Option<String>,
    country: Option<String>,
}

impl NominatimResolver {
    pub fn new(client: Client) -> Self {
        Self::with_url(client, NOMINATIM_URL)
    }

    pub fn with_url(client: Client, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
        }
    }

    fn lookup(&self, point: GeoPoint) -> Result<String, GeocodeError> {
        let response = self
            .client
            .get(&self.url)
            .query(&[
                ("format", "jsonv2".to_string()),
                ("lat", point.latitude().to_string()),
                ("lon", point.longitude().to_string()),
                ("zoom", "10".to_string()),
            ])
            .send()
            .map_err(|e| GeocodeError::Transport(e.to_string()))?;

        if !response.status().is_success() {
            return Err(GeocodeError::Status(response.status().as_u16()));
        }

        let body = response
            .text()
            .map_err(|e| GeocodeError::Transport(e.to_string()))?;
        place_name_from_body(&body)
    }
}

impl PlaceNameResolver for NominatimResolver {
    fn resolve_place_name(&self, point: GeoPoint) -> String {
        match self.lookup(point) {
            Ok(name) => name,
            Err(e) => {
                log_debug!("Reverse geocoding failed: {e}");
                String::new()
            }
        }
    }
}

/// Resolver used when reverse geocoding is turned off.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoPlaceNames;

impl PlaceNameResolver for NoPlaceNames {
    fn resolve_place_name(&self, _point: GeoPoint) -> String {
        String::new()
    }
}

/// `"City, Country"`, falling back through smaller and larger areas.
fn place_name_from_body(body: &str) -> Result<String, GeocodeError> {
    let payload: ReversePayload =
        serde_json::from_str(body).map_err(|e| GeocodeError::Malformed(e.to_string()))?;

    if let Some(error) = payload.error {
        return Err(GeocodeError::Malformed(error));
    }

    if let Some(address) = payload.address {
        let locality = address
            .city
            .or(address.town)
            .or(address.village)
            .or(address.county)
            .or(address.state);
        let name = match (locality, address.country) {
            (Some(locality), Some(country)) => format!("{locality}, {country}"),
            (Some(only), None) | (None, Some(only)) => only,
            (None, None) => String::new(),
        };
        if !name.is_empty() {
            return Ok(name);
        }
    }

    payload
        .display_name
        .filter(|name| !name.is_empty())
        .ok_or(GeocodeError::NoName)
}

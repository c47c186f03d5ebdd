//! Configuration validation.

use anyhow::Result;
use std::collections::HashSet;

use super::Config;
use crate::common::constants::*;
use crate::common::utils::TimeFormat;

/// Reject configurations that cannot work.
pub fn validate_config(config: &Config) -> Result<()> {
    if let Some(lat) = config.latitude
        && !(-90.0..=90.0).contains(&lat)
    {
        anyhow::bail!("latitude must be between -90 and 90 degrees (got {})", lat);
    }

    if let Some(lon) = config.longitude
        && !(-180.0..=180.0).contains(&lon)
    {
        anyhow::bail!(
            "longitude must be between -180 and 180 degrees (got {})",
            lon
        );
    }

    if let Some(method) = config.method
        && !(MINIMUM_METHOD..=MAXIMUM_METHOD).contains(&method)
    {
        anyhow::bail!(
            "method ({}) must be between {} and {}",
            method,
            MINIMUM_METHOD,
            MAXIMUM_METHOD
        );
    }

    if let Some(ref events) = config.events {
        validate_events(events)?;
    }

    if let Some(ref url) = config.provider_url
        && url.trim().is_empty()
    {
        anyhow::bail!("provider_url must not be empty");
    }

    if let Some(ref format) = config.time_format
        && TimeFormat::from_config(format).is_none()
    {
        anyhow::bail!("time_format must be \"24h\" or \"12h\" (got \"{}\")", format);
    }

    Ok(())
}

fn validate_events(events: &[String]) -> Result<()> {
    if events.is_empty() {
        anyhow::bail!("events must list at least one prayer");
    }

    let mut seen = HashSet::new();
    for event in events {
        if event.trim().is_empty() {
            anyhow::bail!("events must not contain empty names");
        }
        if !seen.insert(event.as_str()) {
            anyhow::bail!("events lists \"{}\" more than once", event);
        }
    }

    Ok(())
}

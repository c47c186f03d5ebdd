//! Aladhan prayer-times API client.
//!
//! Daily timings come from `/timings/{DD-MM-YYYY}` and a whole month from
//! `/calendar/{year}/{month}`, both keyed by coordinates and a calculation
//! method id. Payload decoding is kept apart from the HTTP calls so it can be
//! checked against captured responses.

use chrono::NaiveDate;
use chrono_tz::Tz;
use reqwest::blocking::Client;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::collections::BTreeMap;

use super::{DailyTimings, TimingsFetchError, TimingsProvider};
use crate::common::constants::DEFAULT_PROVIDER_URL;
use crate::geo::GeoPoint;

pub struct AladhanClient {
    client: Client,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    code: u16,
    data: T,
}

#[derive(Debug, Deserialize)]
struct DayPayload {
    timings: BTreeMap<String, String>,
    date: DatePayload,
    #[serde(default)]
    meta: Option<MetaPayload>,
}

#[derive(Debug, Deserialize)]
struct DatePayload {
    gregorian: GregorianPayload,
    #[serde(default)]
    hijri: Option<HijriPayload>,
}

#[derive(Debug, Deserialize)]
struct GregorianPayload {
    date: String,
}

#[derive(Debug, Deserialize)]
struct HijriPayload {
    day: String,
    month: HijriMonth,
    year: String,
}

#[derive(Debug, Deserialize)]
struct HijriMonth {
    en: String,
}

#[derive(Debug, Deserialize)]
struct MetaPayload {
    #[serde(default)]
    timezone: Option<String>,
    #[serde(default)]
    method: Option<MethodPayload>,
}

#[derive(Debug, Deserialize)]
struct MethodPayload {
    #[serde(default)]
    name: Option<String>,
}

impl AladhanClient {
    pub fn new(client: Client) -> Self {
        Self::with_base_url(client, DEFAULT_PROVIDER_URL)
    }

    pub fn with_base_url(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    fn get(&self, path: &str, point: GeoPoint, method: u8) -> Result<String, TimingsFetchError> {
        let url = format!("{}/{}", self.base_url, path);
        log_debug!("Requesting {url}");

        let response = self
            .client
            .get(&url)
            .query(&[
                ("latitude", point.latitude().to_string()),
                ("longitude", point.longitude().to_string()),
                ("method", method.to_string()),
            ])
            .send()
            .map_err(|e| TimingsFetchError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(TimingsFetchError::Status(status.as_u16()));
        }

        response
            .text()
            .map_err(|e| TimingsFetchError::Transport(e.to_string()))
    }
}

impl TimingsProvider for AladhanClient {
    fn fetch_daily_timings(
        &self,
        date: NaiveDate,
        point: GeoPoint,
        method: u8,
    ) -> Result<DailyTimings, TimingsFetchError> {
        let path = format!("timings/{}", date.format("%d-%m-%Y"));
        let body = self.get(&path, point, method)?;
        parse_daily_payload(&body)
    }

    fn fetch_month_timings(
        &self,
        year: i32,
        month: u32,
        point: GeoPoint,
        method: u8,
    ) -> Result<Vec<DailyTimings>, TimingsFetchError> {
        let path = format!("calendar/{year}/{month}");
        let body = self.get(&path, point, method)?;
        parse_month_payload(&body)
    }
}

fn decode<T: DeserializeOwned>(body: &str) -> Result<T, TimingsFetchError> {
    let envelope: Envelope<serde_json::Value> =
        serde_json::from_str(body).map_err(|e| TimingsFetchError::Malformed(e.to_string()))?;
    if envelope.code != 200 {
        return Err(TimingsFetchError::Status(envelope.code));
    }
    serde_json::from_value(envelope.data).map_err(|e| TimingsFetchError::Malformed(e.to_string()))
}

/// Decode a `/timings` response body.
pub fn parse_daily_payload(body: &str) -> Result<DailyTimings, TimingsFetchError> {
    decode::<DayPayload>(body).and_then(into_timings)
}

/// Decode a `/calendar` response body, one entry per day of the month.
pub fn parse_month_payload(body: &str) -> Result<Vec<DailyTimings>, TimingsFetchError> {
    decode::<Vec<DayPayload>>(body)?
        .into_iter()
        .map(into_timings)
        .collect()
}

fn into_timings(day: DayPayload) -> Result<DailyTimings, TimingsFetchError> {
    let date = NaiveDate::parse_from_str(&day.date.gregorian.date, "%d-%m-%Y").map_err(|_| {
        TimingsFetchError::Malformed(format!("bad date '{}'", day.date.gregorian.date))
    })?;

    let (timezone, method_name) = match day.meta {
        Some(meta) => {
            let timezone = meta.timezone.and_then(|name| match name.parse::<Tz>() {
                Ok(tz) => Some(tz),
                Err(_) => {
                    log_debug!("Ignoring unknown timezone '{name}'");
                    None
                }
            });
            (timezone, meta.method.and_then(|m| m.name))
        }
        None => (None, None),
    };

    let hijri = day
        .date
        .hijri
        .map(|h| format!("{} {} {}", h.day, h.month.en, h.year));

    Ok(DailyTimings {
        date,
        timings: day.timings,
        timezone,
        hijri,
        method_name,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const DAILY: &str = r#"{
        "code": 200,
        "status": "OK",
        "data": {
            "timings": {
                "Fajr": "04:55", "Sunrise": "06:12", "Dhuhr": "11:52",
                "Asr": "15:12", "Sunset": "17:32", "Maghrib": "17:32",
                "Isha": "19:02", "Imsak": "04:45", "Midnight": "23:52"
            },
            "date": {
                "readable": "17 Oct 2026",
                "timestamp": "1792216800",
                "gregorian": { "date": "17-10-2026", "format": "DD-MM-YYYY", "day": "17" },
                "hijri": {
                    "date": "06-05-1448", "day": "06",
                    "month": { "number": 5, "en": "Jumādá al-ūlá", "ar": "جُمادى الأولى" },
                    "year": "1448"
                }
            },
            "meta": {
                "latitude": 21.0, "longitude": 39.0,
                "timezone": "Asia/Riyadh",
                "method": { "id": 4, "name": "Umm Al-Qura University, Makkah" }
            }
        }
    }"#;

    #[test]
    fn test_parse_daily_payload() {
        let day = parse_daily_payload(DAILY).unwrap();

        assert_eq!(day.date, NaiveDate::from_ymd_opt(2026, 10, 17).unwrap());
        assert_eq!(day.timings.get("Asr").map(String::as_str), Some("15:12"));
        assert_eq!(day.timezone, Some(chrono_tz::Asia::Riyadh));
        assert_eq!(day.hijri.as_deref(), Some("06 Jumādá al-ūlá 1448"));
        assert_eq!(
            day.method_name.as_deref(),
            Some("Umm Al-Qura University, Makkah")
        );
    }

    #[test]
    fn test_parse_month_payload() {
        let body = r#"{
            "code": 200,
            "data": [
                { "timings": { "Fajr": "05:01 (+03)" },
                  "date": { "gregorian": { "date": "01-10-2026" } },
                  "meta": { "timezone": "Asia/Riyadh" } },
                { "timings": { "Fajr": "05:02 (+03)" },
                  "date": { "gregorian": { "date": "02-10-2026" } } }
            ]
        }"#;

        let month = parse_month_payload(body).unwrap();
        assert_eq!(month.len(), 2);
        assert_eq!(month[1].date, NaiveDate::from_ymd_opt(2026, 10, 2).unwrap());
        assert_eq!(month[0].timezone, Some(chrono_tz::Asia::Riyadh));
        assert_eq!(month[1].timezone, None);
        assert_eq!(month[0].hijri, None);
    }

    #[test]
    fn test_error_code_in_body() {
        let body = r#"{ "code": 400, "status": "BAD_REQUEST", "data": "Please specify a city" }"#;
        assert_eq!(parse_daily_payload(body), Err(TimingsFetchError::Status(400)));
    }

    #[test]
    fn test_malformed_bodies() {
        assert!(matches!(
            parse_daily_payload("<html>gateway</html>"),
            Err(TimingsFetchError::Malformed(_))
        ));
        assert!(matches!(
            parse_daily_payload(r#"{ "code": 200, "data": { "timings": {} } }"#),
            Err(TimingsFetchError::Malformed(_))
        ));
        let bad_date = r#"{ "code": 200, "data": {
            "timings": {}, "date": { "gregorian": { "date": "2026-10-17" } } } }"#;
        assert_eq!(
            parse_daily_payload(bad_date),
            Err(TimingsFetchError::Malformed("bad date '2026-10-17'".into()))
        );
    }

    #[test]
    fn test_unknown_timezone_is_dropped() {
        let body = DAILY.replace("Asia/Riyadh", "Mars/Olympus");
        assert_eq!(parse_daily_payload(&body).unwrap().timezone, None);
    }

    #[test]
    fn test_base_url_trailing_slash() {
        let client = AladhanClient::with_base_url(Client::new(), "https://example.test/v1/");
        assert_eq!(client.base_url, "https://example.test/v1");
    }
}

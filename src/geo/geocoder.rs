//! Geocoding backends.
//!
//! A [`Geocoder`] turns free-form location text into raw coordinates. It does
//! not validate ranges or compute timezone data; the resolver does that so
//! every backend gets the same treatment.

use serde::Deserialize;
use std::time::Duration;

use crate::common::constants::GEOCODER_USER_AGENT;

/// Raw coordinates as reported by a geocoding backend.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

/// Failures of a geocoding backend.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GeocodeError {
    #[error("request timed out")]
    Timeout,
    #[error("{0}")]
    Service(String),
}

/// Place-name lookup capability.
///
/// `Ok(None)` means the service answered and had no match.
#[cfg_attr(test, mockall::automock)]
pub trait Geocoder: Send + Sync {
    fn geocode(&self, query: &str) -> Result<Option<Coordinates>, GeocodeError>;
}

/// OpenStreetMap Nominatim search over blocking HTTP.
pub struct NominatimGeocoder {
    client: reqwest::blocking::Client,
    url: String,
}

#[derive(Debug, Deserialize)]
struct NominatimPlace {
    lat: String,
    lon: String,
}

impl NominatimGeocoder {
    /// Build a client for `url` with a per-request timeout.
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, GeocodeError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .user_agent(GEOCODER_USER_AGENT)
            .build()
            .map_err(|e| GeocodeError::Service(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            url: url.into(),
        })
    }

    fn map_transport_error(error: reqwest::Error) -> GeocodeError {
        if error.is_timeout() {
            GeocodeError::Timeout
        } else {
            GeocodeError::Service(format!("Request failed: {error}"))
        }
    }
}

impl Geocoder for NominatimGeocoder {
    fn geocode(&self, query: &str) -> Result<Option<Coordinates>, GeocodeError> {
        let response = self
            .client
            .get(&self.url)
            .query(&[("q", query), ("format", "json"), ("limit", "1")])
            .send()
            .map_err(Self::map_transport_error)?;

        if !response.status().is_success() {
            return Err(GeocodeError::Service(format!(
                "HTTP {} from {}",
                response.status(),
                self.url
            )));
        }

        let body = response.text().map_err(Self::map_transport_error)?;
        parse_nominatim_response(&body)
    }
}

/// Parse a Nominatim JSON search response, taking the first place.
pub(crate) fn parse_nominatim_response(body: &str) -> Result<Option<Coordinates>, GeocodeError> {
    let places: Vec<NominatimPlace> = serde_json::from_str(body)
        .map_err(|e| GeocodeError::Service(format!("Malformed response: {e}")))?;

    let Some(place) = places.into_iter().next() else {
        return Ok(None);
    };

    let parse = |field: &str, value: &str| {
        value
            .trim()
            .parse::<f64>()
            .map_err(|_| GeocodeError::Service(format!("Malformed {field} '{value}'")))
    };

    Ok(Some(Coordinates {
        latitude: parse("latitude", &place.lat)?,
        longitude: parse("longitude", &place.lon)?,
    }))
}

/// Offline lookup against a small built-in gazetteer.
///
/// Matches the whole query or its first comma-separated segment,
/// case-insensitively, so "Stanford, CA, USA" and "stanford" both resolve.
#[derive(Debug, Default, Clone, Copy)]
pub struct OfflineGeocoder;

const GAZETTEER: &[(&str, f64, f64)] = &[
    ("stanford", 37.4241, -122.1661),
    ("palo alto", 37.4419, -122.1430),
    ("san francisco", 37.7749, -122.4194),
    ("los angeles", 34.0522, -118.2437),
    ("seattle", 47.6062, -122.3321),
    ("denver", 39.7392, -104.9903),
    ("phoenix", 33.4484, -112.0740),
    ("chicago", 41.8781, -87.6298),
    ("houston", 29.7604, -95.3698),
    ("new york", 40.7128, -74.0060),
    ("boston", 42.3601, -71.0589),
    ("miami", 25.7617, -80.1918),
    ("honolulu", 21.3069, -157.8583),
    ("anchorage", 61.2181, -149.9003),
    ("london", 51.5074, -0.1278),
    ("paris", 48.8566, 2.3522),
    ("berlin", 52.5200, 13.4050),
    ("tokyo", 35.6762, 139.6503),
    ("sydney", -33.8688, 151.2093),
    ("cape town", -33.9249, 18.4241),
];

impl OfflineGeocoder {
    fn lookup(name: &str) -> Option<Coordinates> {
        let name = name.trim().to_lowercase();
        GAZETTEER
            .iter()
            .find(|(entry, _, _)| *entry == name)
            .map(|&(_, latitude, longitude)| Coordinates {
                latitude,
                longitude,
            })
    }
}

impl Geocoder for OfflineGeocoder {
    fn geocode(&self, query: &str) -> Result<Option<Coordinates>, GeocodeError> {
        let first_segment = query.split(',').next().unwrap_or(query);
        Ok(Self::lookup(query).or_else(|| Self::lookup(first_segment)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_first_place() {
        let body = r#"[{"lat":"37.4241","lon":"-122.1661","display_name":"Stanford"},
                       {"lat":"0","lon":"0"}]"#;
        let coords = parse_nominatim_response(body).unwrap().unwrap();
        assert_eq!(coords.latitude, 37.4241);
        assert_eq!(coords.longitude, -122.1661);
    }

    #[test]
    fn test_parse_empty_array_is_no_match() {
        assert_eq!(parse_nominatim_response("[]").unwrap(), None);
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(matches!(
            parse_nominatim_response("<html>"),
            Err(GeocodeError::Service(_))
        ));
        assert!(matches!(
            parse_nominatim_response(r#"[{"lat":"north","lon":"1"}]"#),
            Err(GeocodeError::Service(_))
        ));
    }

    #[test]
    fn test_offline_matches_first_segment() {
        let geocoder = OfflineGeocoder;
        let full = geocoder.geocode("Stanford, CA, USA").unwrap().unwrap();
        let bare = geocoder.geocode("  STANFORD ").unwrap().unwrap();
        assert_eq!(full, bare);
        assert!((full.latitude - 37.42).abs() < 0.01);
        assert!((full.longitude + 122.17).abs() < 0.01);
    }

    #[test]
    fn test_offline_unknown_place() {
        assert_eq!(OfflineGeocoder.geocode("Atlantis").unwrap(), None);
    }
}

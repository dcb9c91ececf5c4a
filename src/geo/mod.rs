//! Geographic location resolution for the detection oracle.
//!
//! The oracle needs to know where the camera is and which meridian local clock
//! time is referenced to. This module turns a free-text location into that
//! context and shares it with the frame pipeline.
//!
//! ## Module Structure
//!
//! - [`timezone`]: Pure longitude → time-zone-center longitude estimation
//! - [`geocoder`]: Geocoding backends (Nominatim over HTTP, offline gazetteer)
//! - [`state`]: Immutable location snapshots published by atomic swap
//! - [`resolver`]: Asynchronous resolution of location text into a snapshot
//!
//! ## Consistency
//!
//! Position and timezone reference are always published together as one
//! [`GeoSnapshot`]. The pipeline thread reads the snapshot without locking and
//! can never observe a fresh latitude with a stale longitude. A failed lookup
//! leaves the previously published snapshot in place.

pub mod geocoder;
pub mod resolver;
pub mod state;
pub mod timezone;

use std::fmt;

// Re-exports for public API
pub use geocoder::{Coordinates, GeocodeError, Geocoder, NominatimGeocoder, OfflineGeocoder};
pub use resolver::{GeoResolver, ResolveHandle};
pub use state::{GeoSnapshot, GeoState};
pub use timezone::{TimezoneReference, ZoneBand, estimate_timezone_reference};


/// Errors produced while resolving a location.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GeoError {
    /// Location text was empty or whitespace; no lookup was attempted
    #[error("location text is empty")]
    InvalidInput,
    /// The geocoding service timed out or failed; a fresh request may succeed
    #[error("geocoding service error: {0}")]
    GeocodeServiceError(String),
    /// The service answered but had no match for the query
    #[error("location not found: {0}")]
    LocationNotFound(String),
}

/// A validated latitude/longitude pair in degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoPosition {
    latitude: f64,
    longitude: f64,
}

impl GeoPosition {
    /// Create a position, rejecting non-finite or out-of-range values.
    pub fn new(latitude: f64, longitude: f64) -> Option<Self> {
        let valid = latitude.is_finite()
            && longitude.is_finite()
            && (-90.0..=90.0).contains(&latitude)
            && (-180.0..=180.0).contains(&longitude);
        valid.then_some(Self {
            latitude,
            longitude,
        })
    }

    pub fn latitude(&self) -> f64 {
        self.latitude
    }

    pub fn longitude(&self) -> f64 {
        self.longitude
    }
}

impl fmt::Display for GeoPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&crate::common::utils::format_coordinates(
            self.latitude,
            self.longitude,
        ))
    }
}

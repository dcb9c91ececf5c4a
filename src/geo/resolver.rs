//! Location text → published [`GeoSnapshot`].
//!
//! Lookups run on a dedicated worker thread so the frame pipeline keeps
//! ticking while a slow geocoding service answers. Results land in the shared
//! [`GeoState`]; the pipeline picks them up on its next tick.

use std::sync::Arc;
use std::thread::JoinHandle;

use super::geocoder::{GeocodeError, Geocoder};
use super::state::{GeoSnapshot, GeoState};
use super::{GeoError, GeoPosition};

/// Resolves location text through a [`Geocoder`] into shared [`GeoState`].
#[derive(Clone)]
pub struct GeoResolver {
    geocoder: Arc<dyn Geocoder>,
    state: Arc<GeoState>,
}

/// A lookup running on a worker thread.
pub struct ResolveHandle {
    query: String,
    join: JoinHandle<Result<Arc<GeoSnapshot>, GeoError>>,
}

impl ResolveHandle {
    pub fn is_finished(&self) -> bool {
        self.join.is_finished()
    }

    /// Block until the lookup completes.
    pub fn wait(self) -> Result<Arc<GeoSnapshot>, GeoError> {
        self.join.join().unwrap_or_else(|_| {
            Err(GeoError::GeocodeServiceError(format!(
                "geocoder worker for '{}' panicked",
                self.query
            )))
        })
    }
}

impl GeoResolver {
    pub fn new(geocoder: Arc<dyn Geocoder>, state: Arc<GeoState>) -> Self {
        Self { geocoder, state }
    }

    pub fn state(&self) -> &Arc<GeoState> {
        &self.state
    }

    /// Start resolving `text` in the background.
    ///
    /// Empty or whitespace-only text is rejected here, before any thread is
    /// spawned or the geocoder is contacted.
    pub fn resolve(&self, text: &str) -> Result<ResolveHandle, GeoError> {
        let query = normalize_query(text)?;
        let resolver = self.clone();
        let worker_query = query.clone();

        let join = std::thread::Builder::new()
            .name("geo-resolver".to_string())
            .spawn(move || resolver.lookup_and_publish(&worker_query))
            .map_err(|e| GeoError::GeocodeServiceError(format!("failed to spawn worker: {e}")))?;

        Ok(ResolveHandle { query, join })
    }

    /// Resolve `text` on the calling thread.
    pub fn resolve_blocking(&self, text: &str) -> Result<Arc<GeoSnapshot>, GeoError> {
        let query = normalize_query(text)?;
        self.lookup_and_publish(&query)
    }

    /// Publish fixed coordinates without consulting the geocoder.
    pub fn publish_coordinates(
        &self,
        latitude: f64,
        longitude: f64,
        label: &str,
    ) -> Result<Arc<GeoSnapshot>, GeoError> {
        let position = GeoPosition::new(latitude, longitude).ok_or(GeoError::InvalidInput)?;
        Ok(self.publish(position, label))
    }

    fn lookup_and_publish(&self, query: &str) -> Result<Arc<GeoSnapshot>, GeoError> {
        let result = self.lookup(query);
        match &result {
            Ok(position) => log_debug!("Geocoded '{query}' to {position}"),
            Err(e) => log_warning!("Could not resolve '{query}': {e}"),
        }
        result.map(|position| self.publish(position, query))
    }

    fn lookup(&self, query: &str) -> Result<GeoPosition, GeoError> {
        let coordinates = match self.geocoder.geocode(query) {
            Ok(Some(coordinates)) => coordinates,
            Ok(None) => return Err(GeoError::LocationNotFound(query.to_string())),
            Err(GeocodeError::Timeout) => {
                return Err(GeoError::GeocodeServiceError("request timed out".to_string()));
            }
            Err(GeocodeError::Service(message)) => {
                return Err(GeoError::GeocodeServiceError(message));
            }
        };

        GeoPosition::new(coordinates.latitude, coordinates.longitude).ok_or_else(|| {
            GeoError::GeocodeServiceError(format!(
                "service returned out-of-range coordinates ({}, {})",
                coordinates.latitude, coordinates.longitude
            ))
        })
    }

    fn publish(&self, position: GeoPosition, label: &str) -> Arc<GeoSnapshot> {
        let snapshot = GeoSnapshot::new(position, label, crate::time_source::now());
        log_decorated!(
            "Location: {} → {}, timezone reference {}",
            snapshot.query,
            snapshot.position,
            snapshot.timezone_reference
        );
        self.state.publish(snapshot)
    }
}

fn normalize_query(text: &str) -> Result<String, GeoError> {
    let query = text.trim();
    if query.is_empty() {
        return Err(GeoError::InvalidInput);
    }
    Ok(query.to_string())
}

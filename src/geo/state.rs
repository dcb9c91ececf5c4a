//! Shared, lock-free location state.
//!
//! The resolver thread writes; the pipeline thread reads once per tick. Both
//! sides go through an `ArcSwapOption`, so a reader always gets a whole
//! snapshot or none at all.

use arc_swap::ArcSwapOption;
use chrono::{DateTime, Local};
use std::sync::Arc;

use super::GeoPosition;
use super::timezone::{TimezoneReference, estimate_timezone_reference};

/// Position and timezone reference resolved from one query.
#[derive(Debug, Clone, PartialEq)]
pub struct GeoSnapshot {
    pub position: GeoPosition,
    pub timezone_reference: TimezoneReference,
    /// The location text (or configuration label) this snapshot came from
    pub query: String,
    pub resolved_at: DateTime<Local>,
}

impl GeoSnapshot {
    /// Build a snapshot, deriving the timezone reference from the position.
    pub fn new(position: GeoPosition, query: impl Into<String>, resolved_at: DateTime<Local>) -> Self {
        Self {
            timezone_reference: estimate_timezone_reference(position.longitude()),
            position,
            query: query.into(),
            resolved_at,
        }
    }
}

/// Holder of the most recently published [`GeoSnapshot`].
#[derive(Debug, Default)]
pub struct GeoState {
    current: ArcSwapOption<GeoSnapshot>,
}

impl GeoState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the current snapshot in one atomic swap.
    pub fn publish(&self, snapshot: GeoSnapshot) -> Arc<GeoSnapshot> {
        let snapshot = Arc::new(snapshot);
        self.current.store(Some(Arc::clone(&snapshot)));
        snapshot
    }

    /// The current snapshot, or `None` if nothing has resolved yet.
    pub fn snapshot(&self) -> Option<Arc<GeoSnapshot>> {
        self.current.load_full()
    }

    pub fn is_resolved(&self) -> bool {
        self.current.load().is_some()
    }
}

//! Pipeline lifecycle states.

use std::fmt;

/// Lifecycle of a [`PipelineController`](super::PipelineController).
///
/// ```text
/// Idle ──start──▶ Running ──stop──▶ Stopping ──▶ Idle
/// ```
///
/// A camera handle is open exactly while the controller is `Running`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PipelineState {
    #[default]
    Idle,
    Running,
    /// Transient: the camera is being released
    Stopping,
}

impl fmt::Display for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PipelineState::Idle => "idle",
            PipelineState::Running => "running",
            PipelineState::Stopping => "stopping",
        };
        f.write_str(name)
    }
}

/// What a single tick accomplished.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// The controller was not running; nothing happened
    Idle,
    /// A frame was detected, composited and handed to the observer
    Published,
    /// No frame could be read this tick
    Skipped,
    /// A frame was read but detection failed
    DetectionFailed,
    /// A stop request arrived while the tick was in progress
    Cancelled,
}

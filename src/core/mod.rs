//! Real-time frame pipeline.
//!
//! The [`PipelineController`] owns the camera handle and turns one frame into
//! one published result per [`tick`](PipelineController::tick):
//!
//! 1. read a frame from the open [`FrameSource`]
//! 2. detect clouds with the currently published [`GeoSnapshot`]
//! 3. composite the annotated view
//! 4. resize both views for display and hand them to the observer
//!
//! Ticks are bounded: nothing in a tick waits on geocoding, and a failure in
//! any stage is reported and the next tick simply tries again. Pacing lives in
//! [`TickScheduler`], which can be replaced by any caller that invokes `tick`.
//!
//! `start`, `tick` and `stop` serialize on one mutex. `stop` additionally
//! raises a flag that an in-flight tick checks between stages, so stopping
//! never waits for more than the current stage to finish. Observers are called
//! with the mutex released and may drive the controller from a callback.

pub mod observer;
pub mod scheduler;
pub mod state;

use chrono::{DateTime, Local};
use image::RgbImage;
use image::imageops::{self, FilterType};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use crate::common::constants::{DEFAULT_DISPLAY_HEIGHT, DEFAULT_DISPLAY_WIDTH, TIMESTAMP_FORMAT};
use crate::detection::DetectionAdapter;
use crate::frame::{CameraProvider, CaptureHint, FrameSource, FrameSourceError};
use crate::geo::{GeoSnapshot, GeoState};
use crate::overlay::OverlayCompositor;

pub use observer::{
    FramePublication, LogObserver, NoticeKind, ObserverSet, PipelineObserver, SnapshotWriter,
    StatusNotice,
};
pub use scheduler::{TickReport, TickScheduler};
pub use state::{PipelineState, TickOutcome};

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PipelineError {
    #[error("pipeline is already running")]
    AlreadyRunning,
    #[error("location has not been resolved yet")]
    LocationUnresolved,
    #[error("camera {index} unavailable: {reason}")]
    DeviceUnavailable { index: u32, reason: String },
}

/// Display and capture sizing for a controller.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PipelineSettings {
    pub capture: CaptureHint,
    pub display_width: u32,
    pub display_height: u32,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            capture: CaptureHint::default(),
            display_width: DEFAULT_DISPLAY_WIDTH,
            display_height: DEFAULT_DISPLAY_HEIGHT,
        }
    }
}

/// Collaborators injected into a [`PipelineController`].
pub struct PipelineParts {
    pub camera: Arc<dyn CameraProvider>,
    pub detector: DetectionAdapter,
    pub compositor: OverlayCompositor,
    pub geo: Arc<GeoState>,
    pub observer: Arc<dyn PipelineObserver>,
    pub settings: PipelineSettings,
}

/// What a tick hands to the observer once the lock is released.
enum Emission {
    Status(StatusNotice),
    Frame(FramePublication),
}

struct Inner {
    state: PipelineState,
    source: Option<Box<dyn FrameSource>>,
    camera_index: u32,
}

/// Run/stop state machine driving the frame pipeline.
pub struct PipelineController {
    camera: Arc<dyn CameraProvider>,
    detector: DetectionAdapter,
    compositor: OverlayCompositor,
    geo: Arc<GeoState>,
    observer: Arc<dyn PipelineObserver>,
    settings: PipelineSettings,
    stop_requested: AtomicBool,
    /// Bumped by every `stop` that actually stopped the pipeline
    stop_epoch: AtomicU64,
    inner: Mutex<Inner>,
}

impl PipelineController {
    pub fn new(parts: PipelineParts) -> Self {
        Self {
            camera: parts.camera,
            detector: parts.detector,
            compositor: parts.compositor,
            geo: parts.geo,
            observer: parts.observer,
            settings: parts.settings,
            stop_requested: AtomicBool::new(false),
            stop_epoch: AtomicU64::new(0),
            inner: Mutex::new(Inner {
                state: PipelineState::Idle,
                source: None,
                camera_index: 0,
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn state(&self) -> PipelineState {
        self.lock().state
    }

    pub fn is_running(&self) -> bool {
        self.state() == PipelineState::Running
    }

    /// Open camera `camera_index` and begin accepting ticks.
    ///
    /// The device is not touched unless the controller is idle and a location
    /// has been published.
    pub fn start(&self, camera_index: u32) -> Result<(), PipelineError> {
        let mut inner = self.lock();
        if inner.state != PipelineState::Idle {
            return Err(PipelineError::AlreadyRunning);
        }
        let Some(location) = self.geo.snapshot() else {
            return Err(PipelineError::LocationUnresolved);
        };

        let source = self
            .camera
            .open(camera_index, self.settings.capture)
            .map_err(|e| PipelineError::DeviceUnavailable {
                index: camera_index,
                reason: match e {
                    FrameSourceError::DeviceUnavailable { reason, .. } => reason,
                    other => other.to_string(),
                },
            })?;

        log_block_start!("Camera started: {}", source.describe());
        log_indented!(
            "Location: {} (timezone reference {})",
            location.position,
            location.timezone_reference
        );

        self.stop_requested.store(false, Ordering::SeqCst);
        inner.source = Some(source);
        inner.camera_index = camera_index;
        inner.state = PipelineState::Running;
        Ok(())
    }

    /// Release the camera and return to `Idle`.
    ///
    /// No-op when idle. Blocks until any in-flight tick has bailed out, so the
    /// camera is released by the time this returns.
    pub fn stop(&self) {
        self.stop_requested.store(true, Ordering::SeqCst);
        let mut inner = self.lock();

        let stopped = inner.state == PipelineState::Running;
        if stopped {
            inner.state = PipelineState::Stopping;
            if let Some(mut source) = inner.source.take() {
                source.release();
            }
            inner.state = PipelineState::Idle;
            self.stop_epoch.fetch_add(1, Ordering::SeqCst);
            log_block_start!("Camera {} stopped", inner.camera_index);
        }

        self.stop_requested.store(false, Ordering::SeqCst);
        drop(inner);

        if stopped {
            self.observer.on_cleared();
        }
    }

    /// Perform one bounded unit of pipeline work.
    ///
    /// The stages run under the controller lock; the observer is notified
    /// after it is released, so callbacks may call back into the controller.
    pub fn tick(&self) -> TickOutcome {
        let mut inner = self.lock();
        let epoch = self.stop_epoch.load(Ordering::SeqCst);
        let (outcome, emission) = self.run_stages(&mut inner);
        drop(inner);

        let Some(emission) = emission else {
            return outcome;
        };
        // A stop that completed after the lock was released still wins
        if self.stop_epoch.load(Ordering::SeqCst) != epoch {
            return TickOutcome::Cancelled;
        }
        match emission {
            Emission::Status(notice) => self.observer.on_status(&notice),
            Emission::Frame(publication) => self.observer.on_frame(&publication),
        }
        outcome
    }

    fn run_stages(&self, inner: &mut Inner) -> (TickOutcome, Option<Emission>) {
        if inner.state != PipelineState::Running {
            return (TickOutcome::Idle, None);
        }
        let camera_index = inner.camera_index;
        let Some(source) = inner.source.as_mut() else {
            return (TickOutcome::Idle, None);
        };

        if self.cancel_requested() {
            return (TickOutcome::Cancelled, None);
        }

        let frame = match source.read_frame() {
            Ok(frame) => frame,
            Err(e) => {
                let notice = StatusNotice {
                    kind: NoticeKind::FrameUnavailable,
                    message: format!("Failed to read frame: {e}"),
                    raw: None,
                };
                return (TickOutcome::Skipped, Some(Emission::Status(notice)));
            }
        };
        let timestamp = crate::time_source::now();

        if self.cancel_requested() {
            return (TickOutcome::Cancelled, None);
        }

        let raw_display = self.display(&frame.to_rgb());
        let Some(location) = self.geo.snapshot() else {
            let notice = StatusNotice {
                kind: NoticeKind::DetectionFailed,
                message: "Location is not resolved".to_string(),
                raw: Some(raw_display),
            };
            return (TickOutcome::DetectionFailed, Some(Emission::Status(notice)));
        };

        let detection = match self.detector.detect(&frame, timestamp, &location) {
            Ok(detection) => detection,
            Err(e) => {
                let notice = StatusNotice {
                    kind: NoticeKind::DetectionFailed,
                    message: format!("Error in cloud detection: {e}"),
                    raw: Some(raw_display),
                };
                return (TickOutcome::DetectionFailed, Some(Emission::Status(notice)));
            }
        };

        if self.cancel_requested() {
            return (TickOutcome::Cancelled, None);
        }

        let annotated = self.compositor.composite(&frame, &detection, timestamp);

        if self.cancel_requested() {
            return (TickOutcome::Cancelled, None);
        }

        let publication = FramePublication {
            raw: raw_display,
            annotated: self.display(&annotated.frame.to_rgb()),
            composite: annotated,
            cloud_cover: detection.cloud_cover,
            timestamp_text: format_timestamp(timestamp),
            status_text: status_text(camera_index, &location),
        };
        (TickOutcome::Published, Some(Emission::Frame(publication)))
    }

    fn cancel_requested(&self) -> bool {
        self.stop_requested.load(Ordering::SeqCst)
    }

    fn display(&self, image: &RgbImage) -> RgbImage {
        imageops::resize(
            image,
            self.settings.display_width,
            self.settings.display_height,
            FilterType::Lanczos3,
        )
    }
}

impl Drop for PipelineController {
    fn drop(&mut self) {
        let inner = self.inner.get_mut().unwrap_or_else(|e| e.into_inner());
        if let Some(mut source) = inner.source.take() {
            source.release();
        }
        inner.state = PipelineState::Idle;
    }
}

fn format_timestamp(timestamp: DateTime<Local>) -> String {
    timestamp.format(TIMESTAMP_FORMAT).to_string()
}

fn status_text(camera_index: u32, location: &GeoSnapshot) -> String {
    format!("Running - camera {camera_index} at {}", location.position)
}

#[cfg(test)]
mod tests;

//! Test doubles for the pipeline's injected collaborators.
//!
//! Available to unit tests and, through the `testing-support` feature, to the
//! integration tests under `tests/`.

use anyhow::anyhow;
use image::{Rgb, RgbImage};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use crate::core::{FramePublication, PipelineObserver, StatusNotice};
use crate::detection::{CloudOracle, OracleOutput, OracleRequest};
use crate::frame::{CameraProvider, CaptureHint, ChannelOrder, Frame, FrameSource, FrameSourceError};
use crate::geo::{Coordinates, GeocodeError, Geocoder};

/// Oracle returning a fixed cover with all-zero masks, or a fixed error.
pub struct StubOracle {
    cover: f64,
    failure: Option<String>,
    calls: AtomicUsize,
}

impl StubOracle {
    pub fn constant(cover: f64) -> Self {
        Self {
            cover,
            failure: None,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing(message: &str) -> Self {
        Self {
            cover: 0.0,
            failure: Some(message.to_string()),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl CloudOracle for StubOracle {
    fn detect(&self, request: &OracleRequest) -> anyhow::Result<OracleOutput> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(message) = &self.failure {
            return Err(anyhow!("{message}"));
        }
        let (width, height) = request.image.dimensions();
        Ok(OracleOutput {
            cloud_cover: self.cover,
            cloud_mask: RgbImage::new(width, height),
            sun_mask: RgbImage::new(width, height),
        })
    }
}

/// Geocoder backed by a fixed list of places; counts lookups.
pub struct StaticGeocoder {
    places: Vec<(String, Coordinates)>,
    lookups: AtomicUsize,
}

impl StaticGeocoder {
    pub fn new() -> Self {
        Self {
            places: Vec::new(),
            lookups: AtomicUsize::new(0),
        }
    }

    pub fn with_place(mut self, name: &str, latitude: f64, longitude: f64) -> Self {
        self.places.push((name.to_string(), Coordinates { latitude, longitude }));
        self
    }

    pub fn lookups(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }
}

impl Default for StaticGeocoder {
    fn default() -> Self {
        Self::new()
    }
}

impl Geocoder for StaticGeocoder {
    fn geocode(&self, query: &str) -> Result<Option<Coordinates>, GeocodeError> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .places
            .iter()
            .find(|(name, _)| name == query)
            .map(|(_, coordinates)| *coordinates))
    }
}

/// How frames from a [`StubCamera`] behave.
#[derive(Debug, Clone)]
pub enum StubFrames {
    /// Every read returns a solid BGR frame of this size and value
    Solid { width: u32, height: u32, value: u8 },
    /// Every read fails with this error
    Failing(FrameSourceError),
}

/// Counters shared by a provider and every handle it opened.
#[derive(Debug, Default)]
pub struct CameraStats {
    pub opens: AtomicUsize,
    pub open_handles: AtomicUsize,
    pub max_open_handles: AtomicUsize,
    pub releases: AtomicUsize,
    pub reads: AtomicUsize,
}

impl CameraStats {
    pub fn open_handles(&self) -> usize {
        self.open_handles.load(Ordering::SeqCst)
    }

    pub fn opens(&self) -> usize {
        self.opens.load(Ordering::SeqCst)
    }

    pub fn max_open_handles(&self) -> usize {
        self.max_open_handles.load(Ordering::SeqCst)
    }

    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }
}

/// Camera provider with scripted frames and handle accounting.
pub struct StubCameraProvider {
    frames: StubFrames,
    available: bool,
    stats: Arc<CameraStats>,
}

impl StubCameraProvider {
    pub fn new(frames: StubFrames) -> Self {
        Self {
            frames,
            available: true,
            stats: Arc::new(CameraStats::default()),
        }
    }

    pub fn solid(width: u32, height: u32, value: u8) -> Self {
        Self::new(StubFrames::Solid {
            width,
            height,
            value,
        })
    }

    /// A provider whose devices can never be opened.
    pub fn unavailable() -> Self {
        let mut provider = Self::solid(1, 1, 0);
        provider.available = false;
        provider
    }

    pub fn stats(&self) -> Arc<CameraStats> {
        Arc::clone(&self.stats)
    }
}

impl CameraProvider for StubCameraProvider {
    fn open(&self, index: u32, _hint: CaptureHint) -> Result<Box<dyn FrameSource>, FrameSourceError> {
        if !self.available {
            return Err(FrameSourceError::DeviceUnavailable {
                index,
                reason: "no such device".to_string(),
            });
        }
        self.stats.opens.fetch_add(1, Ordering::SeqCst);
        let open = self.stats.open_handles.fetch_add(1, Ordering::SeqCst) + 1;
        self.stats.max_open_handles.fetch_max(open, Ordering::SeqCst);
        Ok(Box::new(StubCamera {
            index,
            frames: self.frames.clone(),
            stats: Arc::clone(&self.stats),
            released: false,
        }))
    }
}

pub struct StubCamera {
    index: u32,
    frames: StubFrames,
    stats: Arc<CameraStats>,
    released: bool,
}

impl FrameSource for StubCamera {
    fn read_frame(&mut self) -> Result<Frame, FrameSourceError> {
        if self.released {
            return Err(FrameSourceError::ReadError("released".to_string()));
        }
        self.stats.reads.fetch_add(1, Ordering::SeqCst);
        match &self.frames {
            StubFrames::Solid {
                width,
                height,
                value,
            } => Ok(Frame::new(
                RgbImage::from_pixel(*width, *height, Rgb([*value; 3])),
                ChannelOrder::Bgr,
            )),
            StubFrames::Failing(error) => Err(error.clone()),
        }
    }

    fn release(&mut self) {
        if !self.released {
            self.released = true;
            self.stats.releases.fetch_add(1, Ordering::SeqCst);
            self.stats.open_handles.fetch_sub(1, Ordering::SeqCst);
        }
    }

    fn describe(&self) -> String {
        format!("stub camera {}", self.index)
    }
}

impl Drop for StubCamera {
    fn drop(&mut self) {
        self.release();
    }
}

/// Observer that keeps everything it is handed.
#[derive(Default)]
pub struct RecordingObserver {
    pub frames: Mutex<Vec<FramePublication>>,
    pub notices: Mutex<Vec<StatusNotice>>,
    pub clears: AtomicUsize,
}

impl RecordingObserver {
    pub fn frames(&self) -> Vec<FramePublication> {
        self.frames.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn notices(&self) -> Vec<StatusNotice> {
        self.notices.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn clears(&self) -> usize {
        self.clears.load(Ordering::SeqCst)
    }
}

impl PipelineObserver for RecordingObserver {
    fn on_frame(&self, publication: &FramePublication) {
        self.frames
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(publication.clone());
    }

    fn on_status(&self, notice: &StatusNotice) {
        self.notices
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(notice.clone());
    }

    fn on_cleared(&self) {
        self.clears.fetch_add(1, Ordering::SeqCst);
    }
}

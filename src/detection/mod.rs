//! Bridge between camera frames and the cloud detection oracle.
//!
//! The oracle works on small square RGB images and needs the observation time
//! plus the camera's location and timezone reference to place the sun. The
//! [`DetectionAdapter`] prepares that request from a raw frame, calls the
//! oracle exactly once, and refuses to pass along output it cannot trust.

pub mod ratio;

use chrono::{DateTime, Local};
use image::RgbImage;
use image::imageops;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;

use crate::frame::Frame;
use crate::geo::GeoSnapshot;

pub use ratio::RatioOracle;

/// Everything the oracle receives for one frame.
#[derive(Debug, Clone)]
pub struct OracleRequest {
    pub timestamp: DateTime<Local>,
    /// Detection-sized square image in RGB order
    pub image: RgbImage,
    pub latitude: f64,
    pub longitude: f64,
    pub timezone_reference: f64,
}

/// Unvalidated oracle answer.
#[derive(Debug, Clone)]
pub struct OracleOutput {
    pub cloud_cover: f64,
    pub cloud_mask: RgbImage,
    pub sun_mask: RgbImage,
}

/// Cloud/sky/sun classifier.
pub trait CloudOracle: Send + Sync {
    fn detect(&self, request: &OracleRequest) -> anyhow::Result<OracleOutput>;
}

/// Validated detection output.
///
/// `cloud_cover` is a finite fraction in `[0, 1]` and both masks match the
/// detection-sized frame exactly.
#[derive(Debug, Clone, PartialEq)]
pub struct DetectionResult {
    pub cloud_cover: f64,
    pub cloud_mask: RgbImage,
    pub sun_mask: RgbImage,
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DetectionError {
    #[error("oracle failed: {0}")]
    Oracle(String),
    #[error("oracle panicked: {0}")]
    OraclePanicked(String),
    #[error("oracle reported cloud cover {0}, expected a fraction in [0, 1]")]
    InvalidCloudCover(f64),
    #[error("{mask} mask is {actual_width}x{actual_height}, expected {expected}x{expected}")]
    MaskShape {
        mask: &'static str,
        expected: u32,
        actual_width: u32,
        actual_height: u32,
    },
}

/// Prepares frames for a [`CloudOracle`] and validates what comes back.
#[derive(Clone)]
pub struct DetectionAdapter {
    oracle: Arc<dyn CloudOracle>,
    size: u32,
}

impl DetectionAdapter {
    /// `size` is the side of the square image the oracle is trained on.
    pub fn new(oracle: Arc<dyn CloudOracle>, size: u32) -> Self {
        Self {
            oracle,
            size: size.max(1),
        }
    }

    pub fn size(&self) -> u32 {
        self.size
    }

    /// Area-average `frame` down to the oracle's square input size, in RGB.
    pub fn prepare(&self, frame: &Frame) -> RgbImage {
        let small = imageops::thumbnail(frame.image(), self.size, self.size);
        Frame::new(small, frame.order()).to_rgb()
    }

    /// Run one detection for `frame` observed at `timestamp` from `location`.
    pub fn detect(
        &self,
        frame: &Frame,
        timestamp: DateTime<Local>,
        location: &GeoSnapshot,
    ) -> Result<DetectionResult, DetectionError> {
        let request = OracleRequest {
            timestamp,
            image: self.prepare(frame),
            latitude: location.position.latitude(),
            longitude: location.position.longitude(),
            timezone_reference: location.timezone_reference.longitude(),
        };

        let output = catch_unwind(AssertUnwindSafe(|| self.oracle.detect(&request)))
            .map_err(|payload| DetectionError::OraclePanicked(panic_message(payload.as_ref())))?
            .map_err(|e| DetectionError::Oracle(format!("{e:#}")))?;

        self.validate(output)
    }

    fn validate(&self, output: OracleOutput) -> Result<DetectionResult, DetectionError> {
        if !output.cloud_cover.is_finite() || !(0.0..=1.0).contains(&output.cloud_cover) {
            return Err(DetectionError::InvalidCloudCover(output.cloud_cover));
        }

        for (mask, image) in [("cloud", &output.cloud_mask), ("sun", &output.sun_mask)] {
            if image.dimensions() != (self.size, self.size) {
                return Err(DetectionError::MaskShape {
                    mask,
                    expected: self.size,
                    actual_width: image.width(),
                    actual_height: image.height(),
                });
            }
        }

        Ok(DetectionResult {
            cloud_cover: output.cloud_cover,
            cloud_mask: output.cloud_mask,
            sun_mask: output.sun_mask,
        })
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

#[cfg(test)]
mod tests;

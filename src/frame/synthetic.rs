//! Procedural sky camera.
//!
//! Produces a daytime sky test pattern so the whole pipeline can run without
//! capture hardware: a blue gradient, a saturated sun disc and a band of grey
//! clouds drifting a few pixels per frame. Frames are delivered in BGR like a
//! typical capture device.

use image::{Rgb, RgbImage};

use super::source::{CameraProvider, CaptureHint, FrameSource, FrameSourceError};
use super::{ChannelOrder, Frame};

const CLOUD_DRIFT_PER_FRAME: u32 = 4;
const CLOUD_PERIOD: u32 = 120;

/// Opens a [`SyntheticCamera`] for any index.
#[derive(Debug, Default, Clone, Copy)]
pub struct SyntheticProvider;

impl CameraProvider for SyntheticProvider {
    fn open(&self, index: u32, hint: CaptureHint) -> Result<Box<dyn FrameSource>, FrameSourceError> {
        if hint.width == 0 || hint.height == 0 {
            return Err(FrameSourceError::DeviceUnavailable {
                index,
                reason: format!("unsupported resolution {}x{}", hint.width, hint.height),
            });
        }
        Ok(Box::new(SyntheticCamera::new(index, hint)))
    }
}

pub struct SyntheticCamera {
    index: u32,
    width: u32,
    height: u32,
    frames_read: u32,
    released: bool,
}

impl SyntheticCamera {
    pub fn new(index: u32, hint: CaptureHint) -> Self {
        Self {
            index,
            width: hint.width,
            height: hint.height,
            frames_read: 0,
            released: false,
        }
    }

    fn render(&self) -> RgbImage {
        let (w, h) = (self.width, self.height);
        let sun_x = (w * 3 / 4) as i64;
        let sun_y = (h / 4) as i64;
        let sun_r = (w.min(h) / 10).max(1) as i64;
        let band_top = h * 9 / 20;
        let band_bottom = h * 13 / 20;
        let drift = self.frames_read.wrapping_mul(CLOUD_DRIFT_PER_FRAME);

        RgbImage::from_fn(w, h, |x, y| {
            let dx = x as i64 - sun_x;
            let dy = y as i64 - sun_y;
            let rgb = if dx * dx + dy * dy <= sun_r * sun_r {
                [255, 255, 250]
            } else if (band_top..band_bottom).contains(&y)
                && (x.wrapping_add(drift)) % CLOUD_PERIOD < CLOUD_PERIOD * 3 / 5
            {
                [200, 200, 205]
            } else {
                let t = y * 60 / h.max(1);
                [(70 + t) as u8, (130 + t) as u8, (235 - t / 3) as u8]
            };
            // Stored in device (BGR) order
            Rgb([rgb[2], rgb[1], rgb[0]])
        })
    }
}

impl FrameSource for SyntheticCamera {
    fn read_frame(&mut self) -> Result<Frame, FrameSourceError> {
        if self.released {
            return Err(FrameSourceError::ReadError(format!(
                "synthetic camera {} has been released",
                self.index
            )));
        }
        let image = self.render();
        self.frames_read = self.frames_read.wrapping_add(1);
        Ok(Frame::new(image, ChannelOrder::Bgr))
    }

    fn release(&mut self) {
        self.released = true;
    }

    fn describe(&self) -> String {
        format!("synthetic camera {} ({}x{})", self.index, self.width, self.height)
    }
}

impl Drop for SyntheticCamera {
    fn drop(&mut self) {
        self.release();
    }
}

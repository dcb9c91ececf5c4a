//! Camera frames and the sources that produce them.
//!
//! Frames keep the sample order the device delivered them in. Most capture
//! hardware hands out BGR; the detection oracle and the presentation layer
//! want RGB. Conversions happen at those boundaries and nowhere else.

pub mod sequence;
pub mod source;
pub mod synthetic;

use image::RgbImage;

pub use sequence::{SequenceCamera, SequenceProvider};
pub use source::{CameraProvider, CaptureHint, FrameSource, FrameSourceError};
pub use synthetic::{SyntheticCamera, SyntheticProvider};

/// Order of the three samples in each pixel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelOrder {
    Rgb,
    Bgr,
}

/// One captured image in device channel order.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    image: RgbImage,
    order: ChannelOrder,
}

impl Frame {
    pub fn new(image: RgbImage, order: ChannelOrder) -> Self {
        Self { image, order }
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn order(&self) -> ChannelOrder {
        self.order
    }

    /// Samples in device order.
    pub fn image(&self) -> &RgbImage {
        &self.image
    }

    /// A copy of the samples in RGB order.
    pub fn to_rgb(&self) -> RgbImage {
        match self.order {
            ChannelOrder::Rgb => self.image.clone(),
            ChannelOrder::Bgr => swap_red_blue(&self.image),
        }
    }

    /// Return `image` (in RGB order) converted into this frame's order.
    pub fn in_frame_order(&self, image: RgbImage) -> RgbImage {
        match self.order {
            ChannelOrder::Rgb => image,
            ChannelOrder::Bgr => swap_red_blue(&image),
        }
    }
}

/// Exchange the first and third sample of every pixel.
pub fn swap_red_blue(image: &RgbImage) -> RgbImage {
    let mut swapped = image.clone();
    for pixel in swapped.pixels_mut() {
        pixel.0.swap(0, 2);
    }
    swapped
}

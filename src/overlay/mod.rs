//! Annotated view rendering.
//!
//! Turns a raw frame and its detection result into the annotated image shown
//! next to the live feed: tinted sun and cloud regions, highlighted cloud
//! edges, and the cover fraction and timestamp burned into the top-left
//! corner.

pub mod morphology;
pub mod text;

use chrono::{DateTime, Local};
use image::imageops::{self, FilterType};
use image::{Rgb, RgbImage};

use crate::common::constants::{
    DEFAULT_BOUNDARY_OPACITY, DEFAULT_CLOUD_OPACITY, DEFAULT_SUN_OPACITY, TEXT_ANCHOR_X,
    TEXT_ANCHOR_Y, TEXT_LINE_GAP, TEXT_SCALE, TIMESTAMP_FORMAT,
};
use crate::detection::DetectionResult;
use crate::frame::Frame;

pub use text::TextRect;

const TEXT_COLOR: Rgb<u8> = Rgb([255, 255, 255]);

/// Blend weight of each overlay layer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Opacities {
    pub sun: f32,
    pub cloud: f32,
    pub boundary: f32,
}

impl Default for Opacities {
    fn default() -> Self {
        Self {
            sun: DEFAULT_SUN_OPACITY,
            cloud: DEFAULT_CLOUD_OPACITY,
            boundary: DEFAULT_BOUNDARY_OPACITY,
        }
    }
}

/// One line of burned-in text and where it landed.
#[derive(Debug, Clone, PartialEq)]
pub struct TextAnnotation {
    pub text: String,
    pub rect: TextRect,
}

/// A composited frame, in the raw frame's channel order.
#[derive(Debug, Clone, PartialEq)]
pub struct AnnotatedFrame {
    pub frame: Frame,
    pub annotations: Vec<TextAnnotation>,
}

impl AnnotatedFrame {
    /// All burned-in text, one line per annotation.
    pub fn text(&self) -> String {
        self.annotations
            .iter()
            .map(|a| a.text.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Whether `(x, y)` lies inside any text rectangle.
    pub fn is_text_pixel(&self, x: u32, y: u32) -> bool {
        self.annotations.iter().any(|a| a.rect.contains(x, y))
    }
}

#[derive(Debug, Clone, Default)]
pub struct OverlayCompositor {
    opacities: Opacities,
}

impl OverlayCompositor {
    pub fn new(opacities: Opacities) -> Self {
        Self { opacities }
    }

    pub fn opacities(&self) -> Opacities {
        self.opacities
    }

    /// Render the annotated view of `raw`. `raw` itself is left untouched.
    pub fn composite(
        &self,
        raw: &Frame,
        detection: &DetectionResult,
        timestamp: DateTime<Local>,
    ) -> AnnotatedFrame {
        let (width, height) = (raw.width(), raw.height());

        let sun = upsample_mask(&detection.sun_mask, width, height);
        let cloud = upsample_mask(&detection.cloud_mask, width, height);
        let boundary = morphology::gradient(&cloud);

        let mut canvas = raw.image().clone();
        for (layer, alpha) in [
            (sun, self.opacities.sun),
            (cloud, self.opacities.cloud),
            (boundary, self.opacities.boundary),
        ] {
            add_weighted(&mut canvas, &raw.in_frame_order(layer), alpha);
        }

        let lines = [
            format_cloud_cover(detection.cloud_cover),
            timestamp.format(TIMESTAMP_FORMAT).to_string(),
        ];
        let mut annotations = Vec::with_capacity(lines.len());
        let mut y = TEXT_ANCHOR_Y;
        for line in lines {
            let rect = text::draw_text(&mut canvas, TEXT_ANCHOR_X, y, &line, TEXT_SCALE, TEXT_COLOR);
            y += text::measure(&line, TEXT_SCALE).1 + TEXT_LINE_GAP;
            annotations.push(TextAnnotation { text: line, rect });
        }

        AnnotatedFrame {
            frame: Frame::new(canvas, raw.order()),
            annotations,
        }
    }
}

/// `Cloud Cover: NN.N%` for a fraction in `[0, 1]`.
pub fn format_cloud_cover(cover: f64) -> String {
    format!("Cloud Cover: {:.1}%", cover * 100.0)
}

/// Scale a mask to `width`×`height` without creating new mask values.
fn upsample_mask(mask: &RgbImage, width: u32, height: u32) -> RgbImage {
    imageops::resize(mask, width, height, FilterType::Nearest)
}

/// `base + layer * alpha`, rounded and saturated per sample.
fn add_weighted(base: &mut RgbImage, layer: &RgbImage, alpha: f32) {
    for (dst, src) in base.pixels_mut().zip(layer.pixels()) {
        for c in 0..3 {
            let value = dst[c] as f32 + src[c] as f32 * alpha;
            dst[c] = value.round().clamp(0.0, 255.0) as u8;
        }
    }
}

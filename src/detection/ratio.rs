//! Red/blue ratio sky classifier.
//!
//! Clear sky scatters far more blue than red, while clouds scatter both about
//! equally. A pixel whose red/blue ratio reaches the threshold is counted as
//! cloud. Saturated pixels are taken to be the sun and excluded from the cover
//! fraction.

use image::{Rgb, RgbImage};

use super::{CloudOracle, OracleOutput, OracleRequest};
use crate::common::constants::{DEFAULT_CLOUD_RATIO, SUN_BRIGHTNESS_THRESHOLD};

pub const SUN_MASK_COLOR: Rgb<u8> = Rgb([255, 0, 0]);
pub const CLOUD_MASK_COLOR: Rgb<u8> = Rgb([0, 255, 0]);

#[derive(Debug, Clone, Copy)]
pub struct RatioOracle {
    cloud_ratio: f32,
}

impl Default for RatioOracle {
    fn default() -> Self {
        Self::new(DEFAULT_CLOUD_RATIO)
    }
}

impl RatioOracle {
    pub fn new(cloud_ratio: f32) -> Self {
        Self { cloud_ratio }
    }

    fn is_sun(pixel: &Rgb<u8>) -> bool {
        pixel.0.iter().all(|&c| c >= SUN_BRIGHTNESS_THRESHOLD)
    }

    fn is_cloud(&self, pixel: &Rgb<u8>) -> bool {
        let [r, _, b] = pixel.0;
        r as f32 / (b.max(1) as f32) >= self.cloud_ratio
    }
}

impl CloudOracle for RatioOracle {
    fn detect(&self, request: &OracleRequest) -> anyhow::Result<OracleOutput> {
        let (width, height) = request.image.dimensions();
        let mut cloud_mask = RgbImage::new(width, height);
        let mut sun_mask = RgbImage::new(width, height);
        let mut sky_pixels = 0u64;
        let mut cloud_pixels = 0u64;

        for (x, y, pixel) in request.image.enumerate_pixels() {
            if Self::is_sun(pixel) {
                sun_mask.put_pixel(x, y, SUN_MASK_COLOR);
                continue;
            }
            sky_pixels += 1;
            if self.is_cloud(pixel) {
                cloud_pixels += 1;
                cloud_mask.put_pixel(x, y, CLOUD_MASK_COLOR);
            }
        }

        let cloud_cover = if sky_pixels == 0 {
            0.0
        } else {
            cloud_pixels as f64 / sky_pixels as f64
        };

        Ok(OracleOutput {
            cloud_cover,
            cloud_mask,
            sun_mask,
        })
    }
}

//! Morphological gradient for outlining mask regions.

use image::{Rgb, RgbImage};

/// Per-channel 3x3 dilation minus 3x3 erosion.
///
/// Neighbours outside the image are ignored, so a region touching the border
/// gets no artificial edge there. Flat areas (inside or outside a region)
/// come out black; only pixels on a region boundary light up.
pub fn gradient(mask: &RgbImage) -> RgbImage {
    let (width, height) = mask.dimensions();
    RgbImage::from_fn(width, height, |x, y| {
        let mut max = [u8::MIN; 3];
        let mut min = [u8::MAX; 3];

        let x_range = x.saturating_sub(1)..=(x + 1).min(width - 1);
        for ny in y.saturating_sub(1)..=(y + 1).min(height - 1) {
            for nx in x_range.clone() {
                let sample = mask.get_pixel(nx, ny).0;
                for c in 0..3 {
                    max[c] = max[c].max(sample[c]);
                    min[c] = min[c].min(sample[c]);
                }
            }
        }

        Rgb([max[0] - min[0], max[1] - min[1], max[2] - min[2]])
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flat_mask_has_no_gradient() {
        let mask = RgbImage::from_pixel(5, 4, Rgb([0, 255, 0]));
        assert!(gradient(&mask).pixels().all(|p| *p == Rgb([0, 0, 0])));
    }

    #[test]
    fn test_edge_is_two_pixels_wide() {
        // Green on the right half of a 6x3 mask
        let mask = RgbImage::from_fn(6, 3, |x, _| {
            if x >= 3 { Rgb([0, 255, 0]) } else { Rgb([0, 0, 0]) }
        });
        let edges = gradient(&mask);

        let row: Vec<u8> = (0..6).map(|x| edges.get_pixel(x, 1)[1]).collect();
        assert_eq!(row, vec![0, 0, 255, 255, 0, 0]);
        assert!(edges.pixels().all(|p| p[0] == 0 && p[2] == 0));
    }

    #[test]
    fn test_single_pixel_image() {
        let mask = RgbImage::from_pixel(1, 1, Rgb([9, 9, 9]));
        assert_eq!(gradient(&mask).get_pixel(0, 0), &Rgb([0, 0, 0]));
    }
}

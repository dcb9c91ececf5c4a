use super::*;
use crate::frame::ChannelOrder;
use crate::geo::GeoPosition;
use image::Rgb;
use std::sync::atomic::{AtomicUsize, Ordering};

struct FnOracle<F>(F);

impl<F> CloudOracle for FnOracle<F>
where
    F: Fn(&OracleRequest) -> anyhow::Result<OracleOutput> + Send + Sync,
{
    fn detect(&self, request: &OracleRequest) -> anyhow::Result<OracleOutput> {
        (self.0)(request)
    }
}

fn adapter<F>(f: F) -> DetectionAdapter
where
    F: Fn(&OracleRequest) -> anyhow::Result<OracleOutput> + Send + Sync + 'static,
{
    DetectionAdapter::new(Arc::new(FnOracle(f)), 64)
}

fn blank_output(cover: f64, size: u32) -> OracleOutput {
    OracleOutput {
        cloud_cover: cover,
        cloud_mask: RgbImage::new(size, size),
        sun_mask: RgbImage::new(size, size),
    }
}

fn stanford() -> GeoSnapshot {
    let position = GeoPosition::new(37.4241, -122.1661).unwrap();
    GeoSnapshot::new(position, "Stanford", Local::now())
}

fn bgr_frame() -> Frame {
    Frame::new(
        RgbImage::from_pixel(640, 480, Rgb([10, 20, 30])),
        ChannelOrder::Bgr,
    )
}

/// The oracle sees one 64x64 RGB image plus the snapshot's location.
#[test]
fn test_request_is_downsampled_rgb_with_location() {
    let calls = Arc::new(AtomicUsize::new(0));
    let seen = Arc::clone(&calls);
    let adapter = adapter(move |request| {
        seen.fetch_add(1, Ordering::SeqCst);
        assert_eq!(request.image.dimensions(), (64, 64));
        assert!(request.image.pixels().all(|p| *p == Rgb([30, 20, 10])));
        assert_eq!(request.timezone_reference, -120.0);
        assert!((request.latitude - 37.4241).abs() < 1e-9);
        Ok(blank_output(0.25, 64))
    });

    let result = adapter.detect(&bgr_frame(), Local::now(), &stanford()).unwrap();

    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(result.cloud_cover, 0.25);
    assert_eq!(result.cloud_mask.dimensions(), (64, 64));
}

#[test]
fn test_area_downsampling_averages_blocks() {
    // Left half black, right half white: each output pixel covers one side
    let image = RgbImage::from_fn(128, 128, |x, _| {
        if x < 64 { Rgb([0, 0, 0]) } else { Rgb([255, 255, 255]) }
    });
    let adapter = adapter(|_| Ok(blank_output(0.0, 64)));
    let small = adapter.prepare(&Frame::new(image, ChannelOrder::Rgb));

    assert_eq!(small.get_pixel(0, 10), &Rgb([0, 0, 0]));
    assert_eq!(small.get_pixel(63, 10), &Rgb([255, 255, 255]));
}

#[test]
fn test_oracle_error_is_reported() {
    let adapter = adapter(|_| Err(anyhow::anyhow!("model not loaded")));
    let err = adapter.detect(&bgr_frame(), Local::now(), &stanford()).unwrap_err();
    assert_eq!(err, DetectionError::Oracle("model not loaded".to_string()));
}

#[test]
fn test_oracle_panic_is_contained() {
    let adapter = adapter(|_| panic!("tensor shape mismatch"));
    let err = adapter.detect(&bgr_frame(), Local::now(), &stanford()).unwrap_err();
    assert_eq!(
        err,
        DetectionError::OraclePanicked("tensor shape mismatch".to_string())
    );
}

#[test]
fn test_cloud_cover_must_be_a_fraction() {
    for bad in [f64::NAN, f64::INFINITY, -0.01, 1.5] {
        let adapter = adapter(move |_| Ok(blank_output(bad, 64)));
        let result = adapter.detect(&bgr_frame(), Local::now(), &stanford());
        assert!(
            matches!(result, Err(DetectionError::InvalidCloudCover(_))),
            "cover {bad} should be rejected"
        );
    }

    for edge in [0.0, 1.0] {
        let adapter = adapter(move |_| Ok(blank_output(edge, 64)));
        assert!(adapter.detect(&bgr_frame(), Local::now(), &stanford()).is_ok());
    }
}

#[test]
fn test_mask_dimensions_must_match() {
    let adapter = adapter(|_| {
        Ok(OracleOutput {
            cloud_cover: 0.5,
            cloud_mask: RgbImage::new(64, 64),
            sun_mask: RgbImage::new(32, 64),
        })
    });
    let err = adapter.detect(&bgr_frame(), Local::now(), &stanford()).unwrap_err();
    assert_eq!(
        err,
        DetectionError::MaskShape {
            mask: "sun",
            expected: 64,
            actual_width: 32,
            actual_height: 64,
        }
    );
}

#[test]
fn test_ratio_oracle_classifies_pixels() {
    let mut image = RgbImage::from_pixel(4, 1, Rgb([80, 140, 230]));
    image.put_pixel(1, 0, Rgb([200, 200, 205]));
    image.put_pixel(2, 0, Rgb([250, 250, 250]));

    let request = OracleRequest {
        timestamp: Local::now(),
        image,
        latitude: 0.0,
        longitude: 0.0,
        timezone_reference: 0.0,
    };
    let output = RatioOracle::default().detect(&request).unwrap();

    // One cloud pixel among three non-sun pixels
    assert!((output.cloud_cover - 1.0 / 3.0).abs() < 1e-9);
    assert_eq!(output.cloud_mask.get_pixel(1, 0), &ratio::CLOUD_MASK_COLOR);
    assert_eq!(output.cloud_mask.get_pixel(0, 0), &Rgb([0, 0, 0]));
    assert_eq!(output.sun_mask.get_pixel(2, 0), &ratio::SUN_MASK_COLOR);
    assert_eq!(output.cloud_mask.get_pixel(2, 0), &Rgb([0, 0, 0]));
}

#[test]
fn test_ratio_oracle_all_sun_reports_zero_cover() {
    let request = OracleRequest {
        timestamp: Local::now(),
        image: RgbImage::from_pixel(8, 8, Rgb([255, 255, 255])),
        latitude: 0.0,
        longitude: 0.0,
        timezone_reference: 0.0,
    };
    let output = RatioOracle::default().detect(&request).unwrap();
    assert_eq!(output.cloud_cover, 0.0);
}

//! Application-wide defaults and validation limits.
//!
//! Every optional configuration field has its default here, next to the range
//! the validator enforces, so the generated default config, the validator and
//! the runtime all agree.

use crate::config::{CameraSourceKind, GeocoderKind};

// # Location
pub const DEFAULT_LOCATION: &str = "Stanford, CA, USA";
pub const DEFAULT_GEOCODER: GeocoderKind = GeocoderKind::Nominatim;
pub const DEFAULT_GEOCODER_URL: &str = "https://nominatim.openstreetmap.org/search";
pub const GEOCODER_USER_AGENT: &str = "cloud_detection_app";
pub const DEFAULT_GEOCODE_TIMEOUT: u64 = 10; // seconds
pub const MINIMUM_GEOCODE_TIMEOUT: u64 = 1;
pub const MAXIMUM_GEOCODE_TIMEOUT: u64 = 60;

// # Camera
pub const DEFAULT_CAMERA_SOURCE: CameraSourceKind = CameraSourceKind::Synthetic;
pub const DEFAULT_CAMERA_INDEX: u32 = 0;
pub const MAXIMUM_CAMERA_INDEX: u32 = 15;
pub const DEFAULT_LOOP_FRAMES: bool = true;
pub const DEFAULT_CAPTURE_WIDTH: u32 = 640;
pub const DEFAULT_CAPTURE_HEIGHT: u32 = 480;
pub const MINIMUM_CAPTURE_DIMENSION: u32 = 16;
pub const MAXIMUM_CAPTURE_WIDTH: u32 = 7680;
pub const MAXIMUM_CAPTURE_HEIGHT: u32 = 4320;

// # Pipeline pacing
pub const DEFAULT_TICK_INTERVAL: u64 = 50; // milliseconds, ~20 ticks per second
pub const MINIMUM_TICK_INTERVAL: u64 = 10;
pub const MAXIMUM_TICK_INTERVAL: u64 = 1000;

// # Detection
pub const DEFAULT_DETECTION_SIZE: u32 = 64;
pub const MINIMUM_DETECTION_SIZE: u32 = 8;
pub const MAXIMUM_DETECTION_SIZE: u32 = 512;
pub const DEFAULT_CLOUD_RATIO: f32 = 0.77;
pub const MINIMUM_CLOUD_RATIO: f32 = 0.1;
pub const MAXIMUM_CLOUD_RATIO: f32 = 2.0;
pub const SUN_BRIGHTNESS_THRESHOLD: u8 = 240;

// # Display and overlay
pub const DEFAULT_DISPLAY_WIDTH: u32 = 400;
pub const DEFAULT_DISPLAY_HEIGHT: u32 = 300;
pub const MINIMUM_DISPLAY_DIMENSION: u32 = 16;
pub const MAXIMUM_DISPLAY_WIDTH: u32 = 3840;
pub const MAXIMUM_DISPLAY_HEIGHT: u32 = 2160;
pub const DEFAULT_SUN_OPACITY: f32 = 0.15;
pub const DEFAULT_CLOUD_OPACITY: f32 = 0.10;
pub const DEFAULT_BOUNDARY_OPACITY: f32 = 0.20;
pub const TEXT_ANCHOR_X: u32 = 10;
pub const TEXT_ANCHOR_Y: u32 = 12;
pub const TEXT_LINE_GAP: u32 = 10;
pub const TEXT_SCALE: u32 = 2;
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

// # Snapshot output
pub const DEFAULT_SNAPSHOT_EVERY: u64 = 20;
pub const MINIMUM_SNAPSHOT_EVERY: u64 = 1;
pub const MAXIMUM_SNAPSHOT_EVERY: u64 = 10_000;

// # Process
pub const CONFIG_FILE_NAME: &str = "cloudcam.toml";
pub const CONFIG_DIR_NAME: &str = "cloudcam";
pub const EXIT_FAILURE: i32 = 1;

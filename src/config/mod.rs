//! Configuration system for cloudcam.
//!
//! Settings live in a single TOML file, `cloudcam.toml`, found in
//! `$XDG_CONFIG_HOME/cloudcam/` or in a directory passed with `--config`. A
//! commented default file is written on first run. Every field is optional;
//! missing values fall back to the defaults in `common::constants`.
//!
//! ```toml
//! #[Location]
//! location = "Stanford, CA, USA"  # Place name to geocode when no coordinates are set
//! geocoder = "nominatim"          # Geocoding backend: "nominatim" or "offline"
//! geocode_timeout = 10            # Geocoding request timeout (1-60) seconds
//!
//! #[Camera]
//! camera_source = "synthetic"     # Frame source: "synthetic" or "sequence"
//! camera_index = 0                # Device index to open (0-15)
//! capture_width = 640             # Requested capture width in pixels
//! capture_height = 480            # Requested capture height in pixels
//! tick_interval = 50              # Pause between frames (10-1000) milliseconds
//!
//! #[Detection]
//! detection_size = 64             # Square input size of the detector (8-512) pixels
//! cloud_ratio = 0.77              # Red/blue ratio at which a pixel counts as cloud
//!
//! #[Display]
//! display_width = 400
//! display_height = 300
//! sun_opacity = 0.15
//! cloud_opacity = 0.10
//! boundary_opacity = 0.20
//! ```
//!
//! ## Validation
//!
//! Loading validates ranges and cross-field rules (both coordinates or
//! neither, a frames directory for the sequence source). Errors name the
//! offending field and the accepted range.

pub mod builder;
pub mod loading;
pub mod validation;

use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

use crate::common::constants::*;
use crate::common::utils::{format_coordinates, private_path};
use crate::core::PipelineSettings;
use crate::frame::CaptureHint;
use crate::overlay::Opacities;

// Re-export public API
pub use builder::create_default_config;
pub use loading::{get_config_path, get_custom_config_dir, load, load_from_path, set_config_dir};

/// Geocoding backend selection.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum GeocoderKind {
    /// OpenStreetMap Nominatim search over HTTPS
    Nominatim,
    /// Built-in gazetteer of well-known places; no network access
    Offline,
}

impl GeocoderKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            GeocoderKind::Nominatim => "nominatim",
            GeocoderKind::Offline => "offline",
        }
    }
}

/// Frame source selection.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum CameraSourceKind {
    /// Procedural sky pattern, no hardware needed
    Synthetic,
    /// Recorded image files played back from `frames_dir`
    Sequence,
}

impl CameraSourceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            CameraSourceKind::Synthetic => "synthetic",
            CameraSourceKind::Sequence => "sequence",
        }
    }
}

/// Configuration loaded from `cloudcam.toml`.
#[derive(Debug, Deserialize, Clone, PartialEq, Default)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Free-text place name resolved through the geocoder.
    pub location: Option<String>,
    /// Fixed coordinates; when both are set the geocoder is skipped.
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub geocoder: Option<GeocoderKind>,
    pub geocoder_url: Option<String>,
    pub geocode_timeout: Option<u64>, // seconds

    pub camera_source: Option<CameraSourceKind>,
    pub camera_index: Option<u32>,
    /// Root of recorded frames for the sequence source.
    pub frames_dir: Option<PathBuf>,
    pub loop_frames: Option<bool>,
    pub capture_width: Option<u32>,
    pub capture_height: Option<u32>,
    pub tick_interval: Option<u64>, // milliseconds

    pub detection_size: Option<u32>,
    pub cloud_ratio: Option<f32>,

    pub display_width: Option<u32>,
    pub display_height: Option<u32>,
    pub sun_opacity: Option<f32>,
    pub cloud_opacity: Option<f32>,
    pub boundary_opacity: Option<f32>,

    /// Directory receiving `raw.png`/`annotated.png` snapshots.
    pub snapshot_dir: Option<PathBuf>,
    pub snapshot_every: Option<u64>, // published frames
}

impl Config {
    /// Load configuration using the module's load function
    pub fn load() -> anyhow::Result<Self> {
        load()
    }

    pub fn location(&self) -> &str {
        self.location.as_deref().unwrap_or(DEFAULT_LOCATION)
    }

    /// Configured coordinates, if both are present.
    pub fn coordinates(&self) -> Option<(f64, f64)> {
        self.latitude.zip(self.longitude)
    }

    pub fn geocoder(&self) -> GeocoderKind {
        self.geocoder.unwrap_or(DEFAULT_GEOCODER)
    }

    pub fn geocoder_url(&self) -> &str {
        self.geocoder_url.as_deref().unwrap_or(DEFAULT_GEOCODER_URL)
    }

    pub fn geocode_timeout(&self) -> Duration {
        Duration::from_secs(self.geocode_timeout.unwrap_or(DEFAULT_GEOCODE_TIMEOUT))
    }

    pub fn camera_source(&self) -> CameraSourceKind {
        self.camera_source.unwrap_or(DEFAULT_CAMERA_SOURCE)
    }

    pub fn camera_index(&self) -> u32 {
        self.camera_index.unwrap_or(DEFAULT_CAMERA_INDEX)
    }

    pub fn loop_frames(&self) -> bool {
        self.loop_frames.unwrap_or(DEFAULT_LOOP_FRAMES)
    }

    pub fn capture_hint(&self) -> CaptureHint {
        CaptureHint {
            width: self.capture_width.unwrap_or(DEFAULT_CAPTURE_WIDTH),
            height: self.capture_height.unwrap_or(DEFAULT_CAPTURE_HEIGHT),
        }
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval.unwrap_or(DEFAULT_TICK_INTERVAL))
    }

    pub fn detection_size(&self) -> u32 {
        self.detection_size.unwrap_or(DEFAULT_DETECTION_SIZE)
    }

    pub fn cloud_ratio(&self) -> f32 {
        self.cloud_ratio.unwrap_or(DEFAULT_CLOUD_RATIO)
    }

    pub fn opacities(&self) -> Opacities {
        Opacities {
            sun: self.sun_opacity.unwrap_or(DEFAULT_SUN_OPACITY),
            cloud: self.cloud_opacity.unwrap_or(DEFAULT_CLOUD_OPACITY),
            boundary: self.boundary_opacity.unwrap_or(DEFAULT_BOUNDARY_OPACITY),
        }
    }

    pub fn pipeline_settings(&self) -> PipelineSettings {
        PipelineSettings {
            capture: self.capture_hint(),
            display_width: self.display_width.unwrap_or(DEFAULT_DISPLAY_WIDTH),
            display_height: self.display_height.unwrap_or(DEFAULT_DISPLAY_HEIGHT),
        }
    }

    pub fn snapshot_every(&self) -> u64 {
        self.snapshot_every.unwrap_or(DEFAULT_SNAPSHOT_EVERY)
    }

    pub fn log_config(&self, source: Option<&std::path::Path>) {
        match source {
            Some(path) => log_block_start!("Loaded configuration from {}", private_path(path)),
            None => log_block_start!("Loaded default configuration"),
        }

        match self.coordinates() {
            Some((lat, lon)) => log_indented!("Location: {}", format_coordinates(lat, lon)),
            None => log_indented!(
                "Location: {} (via {})",
                self.location(),
                self.geocoder().as_str()
            ),
        }

        match (self.camera_source(), &self.frames_dir) {
            (CameraSourceKind::Sequence, Some(dir)) => log_indented!(
                "Camera: sequence {} (index {}{})",
                private_path(dir),
                self.camera_index(),
                if self.loop_frames() { ", looping" } else { "" }
            ),
            (kind, _) => {
                let hint = self.capture_hint();
                log_indented!(
                    "Camera: {} index {} at {}x{}",
                    kind.as_str(),
                    self.camera_index(),
                    hint.width,
                    hint.height
                );
            }
        }

        log_indented!(
            "Tick interval: {}ms, detection size: {}px",
            self.tick_interval().as_millis(),
            self.detection_size()
        );

        let settings = self.pipeline_settings();
        let opacities = self.opacities();
        log_indented!(
            "Display: {}x{}, opacities sun {:.2} / cloud {:.2} / boundary {:.2}",
            settings.display_width,
            settings.display_height,
            opacities.sun,
            opacities.cloud,
            opacities.boundary
        );

        if let Some(dir) = &self.snapshot_dir {
            log_indented!(
                "Snapshots: {} every {} frames",
                private_path(dir),
                self.snapshot_every()
            );
        }
    }
}

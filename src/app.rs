//! Application coordinator that manages the complete lifecycle of cloudcam.
//!
//! [`Cloudcam`] acquires every resource the pipeline needs and tears it down
//! again in reverse order:
//!
//! 1. load and log the configuration (or take one supplied by the caller)
//! 2. build the geocoder and resolve the location in the background
//! 3. open the camera through the configured provider
//! 4. tick until a shutdown signal, the tick budget or a stopped controller
//! 5. stop the controller, which releases the camera
//!
//! ```no_run
//! use cloudcam::Cloudcam;
//!
//! # fn main() -> anyhow::Result<()> {
//! // Normal startup with the config file and OS signal handling
//! Cloudcam::new(false).run()?;
//!
//! // Short smoke run against another location
//! Cloudcam::new(true)
//!     .with_location("London")
//!     .with_tick_budget(20)
//!     .run()?;
//! # Ok(())
//! # }
//! ```

use anyhow::{Context, Result};
use std::sync::Arc;
use std::time::Duration;

use crate::{
    common::utils::private_path,
    config::{self, CameraSourceKind, Config, GeocoderKind},
    core::{
        LogObserver, ObserverSet, PipelineController, PipelineParts, TickReport, TickScheduler,
    },
    detection::{CloudOracle, DetectionAdapter, RatioOracle},
    frame::{CameraProvider, SequenceProvider, SyntheticProvider},
    geo::{GeoResolver, GeoSnapshot, GeoState, Geocoder, NominatimGeocoder, OfflineGeocoder},
    io::signals::{SignalState, setup_signal_handler},
    overlay::OverlayCompositor,
};

// How often the startup wait checks for a shutdown signal
const RESOLVE_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Builder for configuring and running the cloudcam pipeline.
pub struct Cloudcam {
    debug_enabled: bool,
    config: Option<Config>,
    location: Option<String>,
    camera_index: Option<u32>,
    tick_budget: Option<u64>,
    oracle: Option<Arc<dyn CloudOracle>>,
    geocoder: Option<Arc<dyn Geocoder>>,
    camera: Option<Arc<dyn CameraProvider>>,
    signals: Option<SignalState>,
    show_headers: bool,
}

impl Cloudcam {
    /// Create a new runner with defaults matching a normal run
    pub fn new(debug_enabled: bool) -> Self {
        Self {
            debug_enabled,
            config: None,
            location: None,
            camera_index: None,
            tick_budget: None,
            oracle: None,
            geocoder: None,
            camera: None,
            signals: None,
            show_headers: true,
        }
    }

    /// Use this configuration instead of loading `cloudcam.toml`.
    pub fn with_config(mut self, config: Config) -> Self {
        self.config = Some(config);
        self
    }

    /// Resolve `location` instead of the configured place or coordinates.
    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    pub fn with_camera_index(mut self, index: u32) -> Self {
        self.camera_index = Some(index);
        self
    }

    /// Stop after `ticks` pipeline ticks.
    pub fn with_tick_budget(mut self, ticks: u64) -> Self {
        self.tick_budget = Some(ticks);
        self
    }

    /// Replace the built-in ratio classifier.
    pub fn with_oracle(mut self, oracle: Arc<dyn CloudOracle>) -> Self {
        self.oracle = Some(oracle);
        self
    }

    /// Replace the configured geocoder.
    pub fn with_geocoder(mut self, geocoder: Arc<dyn Geocoder>) -> Self {
        self.geocoder = Some(geocoder);
        self
    }

    /// Replace the configured camera provider.
    pub fn with_camera(mut self, camera: Arc<dyn CameraProvider>) -> Self {
        self.camera = Some(camera);
        self
    }

    /// Use `signals` instead of registering OS signal handlers.
    pub fn with_signal_state(mut self, signals: SignalState) -> Self {
        self.signals = Some(signals);
        self
    }

    /// Skip the version header
    pub fn without_headers(mut self) -> Self {
        self.show_headers = false;
        self
    }

    /// Execute the pipeline until shutdown and report what the ticks did.
    pub fn run(self) -> Result<TickReport> {
        if self.show_headers {
            log_version!();
        }

        let config = match &self.config {
            Some(config) => {
                config::validation::validate_config(config)?;
                config.log_config(None);
                config.clone()
            }
            None => {
                let config = Config::load()?;
                let path = config::get_config_path()?;
                config.log_config(Some(path.as_path()));
                config
            }
        };

        let signals = match self.signals {
            Some(signals) => signals,
            None => setup_signal_handler(self.debug_enabled)?,
        };

        let geo = Arc::new(GeoState::new());
        let geocoder = match self.geocoder {
            Some(geocoder) => geocoder,
            None => create_geocoder(&config)?,
        };
        let resolver = GeoResolver::new(geocoder, Arc::clone(&geo));

        let Some(location) = resolve_location(
            &resolver,
            &config,
            self.location.as_deref(),
            &signals,
        )?
        else {
            log_end!();
            return Ok(TickReport::default());
        };
        log_block_start!("Location resolved: {}", location.position);
        log_indented!("Query: {}", location.query);
        log_indented!("Timezone reference: {}", location.timezone_reference);

        let camera = match self.camera {
            Some(camera) => camera,
            None => create_camera_provider(&config)?,
        };
        let oracle = self
            .oracle
            .unwrap_or_else(|| Arc::new(RatioOracle::new(config.cloud_ratio())));

        let mut observers = ObserverSet::new().with(LogObserver::new(self.debug_enabled));
        if let Some(dir) = &config.snapshot_dir {
            let writer = crate::core::SnapshotWriter::new(dir, config.snapshot_every())?;
            log_decorated!("Writing snapshots to {}", private_path(dir));
            observers = observers.with(writer);
        }

        let controller = PipelineController::new(PipelineParts {
            camera,
            detector: DetectionAdapter::new(oracle, config.detection_size()),
            compositor: OverlayCompositor::new(config.opacities()),
            geo,
            observer: Arc::new(observers),
            settings: config.pipeline_settings(),
        });

        let camera_index = self.camera_index.unwrap_or_else(|| config.camera_index());
        controller
            .start(camera_index)
            .with_context(|| format!("Failed to start camera {camera_index}"))?;

        let mut scheduler = TickScheduler::new(config.tick_interval());
        if let Some(budget) = self.tick_budget {
            scheduler = scheduler.with_tick_budget(budget);
        }
        let report = scheduler.run(&controller, &signals.running);

        controller.stop();
        log_summary(&report);
        log_end!();

        Ok(report)
    }
}

/// Build the geocoder selected in `config`.
pub fn create_geocoder(config: &Config) -> Result<Arc<dyn Geocoder>> {
    let geocoder: Arc<dyn Geocoder> = match config.geocoder() {
        GeocoderKind::Nominatim => Arc::new(
            NominatimGeocoder::new(config.geocoder_url(), config.geocode_timeout())
                .context("Failed to create geocoding client")?,
        ),
        GeocoderKind::Offline => Arc::new(OfflineGeocoder),
    };
    Ok(geocoder)
}

/// Build the camera provider selected in `config`.
pub fn create_camera_provider(config: &Config) -> Result<Arc<dyn CameraProvider>> {
    let provider: Arc<dyn CameraProvider> = match config.camera_source() {
        CameraSourceKind::Synthetic => Arc::new(SyntheticProvider),
        CameraSourceKind::Sequence => {
            let dir = config
                .frames_dir
                .clone()
                .context("camera_source = \"sequence\" requires frames_dir")?;
            Arc::new(SequenceProvider::new(dir, config.loop_frames()))
        }
    };
    Ok(provider)
}

/// Publish the startup location.
///
/// An explicit override wins, then configured coordinates, then the
/// configured place name. Returns `None` when shutdown was requested while
/// the geocoder was still working.
fn resolve_location(
    resolver: &GeoResolver,
    config: &Config,
    override_location: Option<&str>,
    signals: &SignalState,
) -> Result<Option<Arc<GeoSnapshot>>> {
    if override_location.is_none()
        && let Some((lat, lon)) = config.coordinates()
    {
        let snapshot = resolver
            .publish_coordinates(lat, lon, "configured coordinates")
            .context("Configured coordinates are invalid")?;
        return Ok(Some(snapshot));
    }

    let query = override_location.unwrap_or_else(|| config.location());
    log_block_start!("Resolving location '{query}'...");
    let handle = resolver
        .resolve(query)
        .with_context(|| format!("Cannot resolve '{query}'"))?;

    while !handle.is_finished() {
        if !signals.is_running() {
            log_decorated!("Shutdown requested while geocoding");
            return Ok(None);
        }
        std::thread::sleep(RESOLVE_POLL_INTERVAL);
    }

    let snapshot = handle
        .wait()
        .with_context(|| format!("Failed to resolve location '{query}'"))?;
    Ok(Some(snapshot))
}

fn log_summary(report: &TickReport) {
    log_block_start!("Processed {} ticks", report.total());
    log_indented!("Published: {}", report.published);
    if report.skipped > 0 {
        log_indented!("Skipped (no frame): {}", report.skipped);
    }
    if report.detection_failed > 0 {
        log_indented!("Detection failures: {}", report.detection_failed);
    }
    if report.cancelled > 0 {
        log_indented!("Cancelled: {}", report.cancelled);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_create_geocoder_for_each_kind() {
        let config = Config {
            geocoder: Some(GeocoderKind::Offline),
            ..Default::default()
        };
        let geocoder = create_geocoder(&config).unwrap();
        let found = geocoder.geocode("London").unwrap().unwrap();
        assert!((found.latitude - 51.5).abs() < 0.1);

        assert!(create_geocoder(&Config::default()).is_ok());
    }

    #[test]
    fn test_sequence_provider_requires_frames_dir() {
        let config = Config {
            camera_source: Some(CameraSourceKind::Sequence),
            ..Default::default()
        };
        assert!(create_camera_provider(&config).is_err());

        let config = Config {
            camera_source: Some(CameraSourceKind::Sequence),
            frames_dir: Some(PathBuf::from("/nonexistent/frames")),
            ..Default::default()
        };
        assert!(create_camera_provider(&config).is_ok());
    }

    #[test]
    fn test_configured_coordinates_skip_geocoder() {
        let state = Arc::new(GeoState::new());
        let geocoder = Arc::new(crate::testing::StaticGeocoder::new());
        let resolver = GeoResolver::new(geocoder.clone(), Arc::clone(&state));
        let config = Config {
            latitude: Some(40.7128),
            longitude: Some(-74.006),
            ..Default::default()
        };

        let snapshot = resolve_location(&resolver, &config, None, &SignalState::detached())
            .unwrap()
            .unwrap();
        assert_eq!(snapshot.timezone_reference.longitude(), -75.0);
        assert_eq!(geocoder.lookups(), 0);
    }

    #[test]
    fn test_override_location_wins_over_coordinates() {
        let state = Arc::new(GeoState::new());
        let geocoder =
            Arc::new(crate::testing::StaticGeocoder::new().with_place("Tokyo", 35.6762, 139.6503));
        let resolver = GeoResolver::new(geocoder.clone(), Arc::clone(&state));
        let config = Config {
            latitude: Some(40.7128),
            longitude: Some(-74.006),
            ..Default::default()
        };

        let snapshot =
            resolve_location(&resolver, &config, Some("Tokyo"), &SignalState::detached())
                .unwrap()
                .unwrap();
        assert_eq!(snapshot.query, "Tokyo");
        assert_eq!(snapshot.timezone_reference.longitude(), 135.0);
        assert_eq!(geocoder.lookups(), 1);
    }

    #[test]
    fn test_unknown_location_is_an_error() {
        let resolver = GeoResolver::new(
            Arc::new(crate::testing::StaticGeocoder::new()),
            Arc::new(GeoState::new()),
        );
        let config = Config {
            location: Some("Atlantis".to_string()),
            ..Default::default()
        };

        let err = resolve_location(&resolver, &config, None, &SignalState::detached()).unwrap_err();
        assert!(format!("{err:#}").contains("Atlantis"));
        assert!(!resolver.state().is_resolved());
    }
}

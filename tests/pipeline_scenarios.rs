//! End-to-end pipeline scenarios using the crate's test doubles.

use cloudcam::Cloudcam;
use cloudcam::config::{CameraSourceKind, Config, GeocoderKind};
use cloudcam::core::{
    NoticeKind, PipelineController, PipelineError, PipelineObserver, PipelineParts,
    PipelineSettings, PipelineState, TickOutcome,
};
use cloudcam::detection::{DetectionAdapter, RatioOracle};
use cloudcam::frame::FrameSourceError;
use cloudcam::geo::{GeoResolver, GeoState};
use cloudcam::io::signals::SignalState;
use cloudcam::logger::Log;
use cloudcam::overlay::OverlayCompositor;
use cloudcam::testing::{
    CameraStats, RecordingObserver, StaticGeocoder, StubCameraProvider, StubFrames, StubOracle,
};
use std::sync::Arc;

struct Scenario {
    controller: PipelineController,
    resolver: GeoResolver,
    camera: Arc<CameraStats>,
    observer: Arc<RecordingObserver>,
    oracle: Arc<StubOracle>,
}

fn scenario(camera: StubCameraProvider, cover: f64) -> Scenario {
    Log::set_enabled(false);
    let geo = Arc::new(GeoState::new());
    let geocoder = StaticGeocoder::new().with_place("Stanford, CA, USA", 37.4241, -122.1661);
    let resolver = GeoResolver::new(Arc::new(geocoder), Arc::clone(&geo));
    let stats = camera.stats();
    let observer = Arc::new(RecordingObserver::default());
    let oracle = Arc::new(StubOracle::constant(cover));

    let controller = PipelineController::new(PipelineParts {
        camera: Arc::new(camera),
        detector: DetectionAdapter::new(oracle.clone(), 64),
        compositor: OverlayCompositor::default(),
        geo,
        observer: observer.clone() as Arc<dyn PipelineObserver>,
        settings: PipelineSettings::default(),
    });

    Scenario {
        controller,
        resolver,
        camera: stats,
        observer,
        oracle,
    }
}

#[test]
fn test_stanford_end_to_end() {
    let s = scenario(StubCameraProvider::solid(640, 480, 128), 0.42);

    let location = s.resolver.resolve("Stanford, CA, USA").unwrap().wait().unwrap();
    assert_eq!(location.timezone_reference.longitude(), -120.0);

    s.controller.start(0).unwrap();
    assert_eq!(s.controller.tick(), TickOutcome::Published);

    let frames = s.observer.frames();
    assert_eq!(frames.len(), 1);
    let publication = &frames[0];
    assert_eq!(publication.cloud_cover, 0.42);
    assert!(publication.composite.text().contains("Cloud Cover: 42.0%"));
    assert_eq!(publication.raw.dimensions(), (400, 300));

    // Zero masks: only the burned-in text differs from the captured frame
    let composite = publication.composite.frame.image();
    assert_eq!(composite.dimensions(), (640, 480));
    for (x, y, pixel) in composite.enumerate_pixels() {
        if !publication.composite.is_text_pixel(x, y) {
            assert_eq!(pixel.0, [128, 128, 128], "pixel ({x}, {y}) changed");
        }
    }

    s.controller.stop();
    assert_eq!(s.camera.open_handles(), 0);
    assert_eq!(s.oracle.calls(), 1);
}

#[test]
fn test_disconnected_camera_keeps_running() {
    let camera = StubCameraProvider::new(StubFrames::Failing(FrameSourceError::ReadError(
        "device disconnected".to_string(),
    )));
    let s = scenario(camera, 0.1);
    s.resolver.resolve_blocking("Stanford, CA, USA").unwrap();

    s.controller.start(0).unwrap();
    for _ in 0..10 {
        assert_eq!(s.controller.tick(), TickOutcome::Skipped);
    }

    assert_eq!(s.controller.state(), PipelineState::Running);
    let notices = s.observer.notices();
    assert_eq!(notices.len(), 10);
    assert!(notices.iter().all(|n| n.kind == NoticeKind::FrameUnavailable));
    assert!(s.observer.frames().is_empty());
    assert_eq!(s.oracle.calls(), 0);
}

#[test]
fn test_start_before_location_is_resolved() {
    let s = scenario(StubCameraProvider::solid(64, 48, 10), 0.1);

    assert_eq!(s.controller.start(0), Err(PipelineError::LocationUnresolved));
    assert_eq!(s.camera.opens(), 0);

    // A failed lookup does not unlock the pipeline either
    assert!(s.resolver.resolve_blocking("Atlantis").is_err());
    assert_eq!(s.controller.start(0), Err(PipelineError::LocationUnresolved));
}

#[test]
fn test_stop_when_idle_does_nothing() {
    let s = scenario(StubCameraProvider::solid(64, 48, 10), 0.1);

    s.controller.stop();

    assert_eq!(s.controller.state(), PipelineState::Idle);
    assert_eq!(s.observer.clears(), 0);
}

#[test]
fn test_repeated_sessions_hold_one_device() {
    let s = scenario(StubCameraProvider::solid(64, 48, 10), 0.1);
    s.resolver.resolve_blocking("Stanford, CA, USA").unwrap();

    for index in 0..4 {
        s.controller.start(index % 2).unwrap();
        assert_eq!(s.controller.start(index % 2), Err(PipelineError::AlreadyRunning));
        s.controller.tick();
        s.controller.stop();
    }

    assert_eq!(s.camera.max_open_handles(), 1);
    assert_eq!(s.camera.open_handles(), 0);
}

#[test]
fn test_location_change_applies_to_next_tick() {
    let s = scenario(StubCameraProvider::solid(64, 48, 10), 0.1);
    s.resolver.resolve_blocking("Stanford, CA, USA").unwrap();
    s.controller.start(3).unwrap();
    s.controller.tick();

    s.resolver.publish_coordinates(51.5074, -0.1278, "London").unwrap();
    s.controller.tick();

    let frames = s.observer.frames();
    assert_eq!(frames.len(), 2);
    assert!(frames[0].status_text.contains("camera 3"));
    assert!(frames[0].status_text.contains("122.166°W"));
    assert!(frames[1].status_text.contains("51.507°N"));
}

#[test]
fn test_app_runs_synthetic_camera_offline() {
    Log::set_enabled(false);
    let config = Config {
        location: Some("London".to_string()),
        geocoder: Some(GeocoderKind::Offline),
        camera_source: Some(CameraSourceKind::Synthetic),
        capture_width: Some(160),
        capture_height: Some(120),
        tick_interval: Some(10),
        ..Default::default()
    };

    let report = Cloudcam::new(false)
        .with_config(config)
        .with_signal_state(SignalState::detached())
        .with_tick_budget(3)
        .without_headers()
        .run()
        .unwrap();

    assert_eq!(report.published, 3);
    assert_eq!(report.total(), 3);
}

#[test]
fn test_app_stops_immediately_after_shutdown_signal() {
    Log::set_enabled(false);
    let config = Config {
        latitude: Some(-33.8688),
        longitude: Some(151.2093),
        capture_width: Some(64),
        capture_height: Some(48),
        ..Default::default()
    };
    let signals = SignalState::detached();
    signals.request_shutdown();

    let report = Cloudcam::new(false)
        .with_config(config)
        .with_signal_state(signals)
        .with_oracle(Arc::new(RatioOracle::default()))
        .without_headers()
        .run()
        .unwrap();

    assert_eq!(report.total(), 0);
}

#[test]
fn test_app_reports_unknown_location() {
    Log::set_enabled(false);
    let config = Config {
        location: Some("Atlantis".to_string()),
        ..Default::default()
    };

    let result = Cloudcam::new(false)
        .with_config(config)
        .with_geocoder(Arc::new(StaticGeocoder::new()))
        .with_signal_state(SignalState::detached())
        .without_headers()
        .run();

    assert!(format!("{:#}", result.unwrap_err()).contains("Atlantis"));
}

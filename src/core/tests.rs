use super::*;
use crate::detection::{CloudOracle, OracleOutput, OracleRequest};
use crate::frame::FrameSourceError;
use crate::geo::{GeoPosition, GeoSnapshot};
use crate::testing::{CameraStats, RecordingObserver, StubCameraProvider, StubFrames, StubOracle};
use std::sync::atomic::AtomicU64;
use std::sync::{OnceLock, Weak, mpsc};
use std::time::Duration;

struct Harness {
    controller: Arc<PipelineController>,
    camera: Arc<CameraStats>,
    observer: Arc<RecordingObserver>,
    geo: Arc<GeoState>,
}

fn harness(camera: StubCameraProvider, oracle: Arc<dyn CloudOracle>) -> Harness {
    let stats = camera.stats();
    let observer = Arc::new(RecordingObserver::default());
    let geo = Arc::new(GeoState::new());
    let controller = PipelineController::new(PipelineParts {
        camera: Arc::new(camera),
        detector: DetectionAdapter::new(oracle, 64),
        compositor: OverlayCompositor::default(),
        geo: Arc::clone(&geo),
        observer: Arc::clone(&observer) as Arc<dyn PipelineObserver>,
        settings: PipelineSettings::default(),
    });
    Harness {
        controller: Arc::new(controller),
        camera: stats,
        observer,
        geo,
    }
}

fn resolve_stanford(geo: &GeoState) {
    let position = GeoPosition::new(37.4241, -122.1661).unwrap();
    geo.publish(GeoSnapshot::new(position, "Stanford, CA, USA", Local::now()));
}

fn resolved_harness(camera: StubCameraProvider, oracle: Arc<dyn CloudOracle>) -> Harness {
    let h = harness(camera, oracle);
    resolve_stanford(&h.geo);
    h
}

#[test]
fn test_start_requires_resolved_location() {
    let h = harness(StubCameraProvider::solid(64, 48, 100), Arc::new(StubOracle::constant(0.1)));

    assert_eq!(h.controller.start(0), Err(PipelineError::LocationUnresolved));
    assert_eq!(h.controller.state(), PipelineState::Idle);
    assert_eq!(h.camera.opens(), 0);
}

#[test]
fn test_start_twice_is_rejected_without_second_handle() {
    let h = resolved_harness(StubCameraProvider::solid(64, 48, 100), Arc::new(StubOracle::constant(0.1)));

    h.controller.start(0).unwrap();
    assert_eq!(h.controller.start(1), Err(PipelineError::AlreadyRunning));
    assert_eq!(h.camera.opens(), 1);
    assert_eq!(h.camera.open_handles(), 1);
}

#[test]
fn test_unavailable_device_leaves_controller_idle() {
    let h = resolved_harness(StubCameraProvider::unavailable(), Arc::new(StubOracle::constant(0.1)));

    assert_eq!(
        h.controller.start(4),
        Err(PipelineError::DeviceUnavailable {
            index: 4,
            reason: "no such device".to_string(),
        })
    );
    assert_eq!(h.controller.state(), PipelineState::Idle);
    assert_eq!(h.controller.tick(), TickOutcome::Idle);
}

#[test]
fn test_stop_when_idle_is_a_no_op() {
    let h = resolved_harness(StubCameraProvider::solid(64, 48, 100), Arc::new(StubOracle::constant(0.1)));

    h.controller.stop();
    h.controller.stop();

    assert_eq!(h.controller.state(), PipelineState::Idle);
    assert_eq!(h.observer.clears(), 0);
    assert_eq!(h.camera.opens(), 0);
}

#[test]
fn test_start_stop_cycles_keep_one_handle() {
    let h = resolved_harness(StubCameraProvider::solid(64, 48, 100), Arc::new(StubOracle::constant(0.1)));

    for index in [0, 1, 0] {
        h.controller.start(index).unwrap();
        assert_eq!(h.controller.tick(), TickOutcome::Published);
        h.controller.stop();
        assert_eq!(h.camera.open_handles(), 0);
    }

    assert_eq!(h.camera.max_open_handles(), 1);
    assert_eq!(h.camera.opens(), 3);
    assert_eq!(h.observer.clears(), 3);
    assert_eq!(h.controller.tick(), TickOutcome::Idle);
}

#[test]
fn test_published_frame_is_display_sized() {
    let oracle = Arc::new(StubOracle::constant(0.42));
    let h = resolved_harness(StubCameraProvider::solid(640, 480, 128), oracle.clone());

    h.controller.start(0).unwrap();
    assert_eq!(h.controller.tick(), TickOutcome::Published);

    let frames = h.observer.frames();
    assert_eq!(frames.len(), 1);
    let publication = &frames[0];
    assert_eq!(publication.raw.dimensions(), (400, 300));
    assert_eq!(publication.annotated.dimensions(), (400, 300));
    assert_eq!(publication.composite.frame.width(), 640);
    assert_eq!(publication.cloud_cover, 0.42);
    assert!(publication.status_text.contains("camera 0"));
    assert_eq!(publication.timestamp_text.len(), "2024-06-21 12:00:00".len());
    assert_eq!(oracle.calls(), 1);
}

#[test]
fn test_read_errors_keep_running() {
    let camera = StubCameraProvider::new(StubFrames::Failing(FrameSourceError::ReadError(
        "usb disconnect".to_string(),
    )));
    let oracle = Arc::new(StubOracle::constant(0.1));
    let h = resolved_harness(camera, oracle.clone());

    h.controller.start(0).unwrap();
    for _ in 0..5 {
        assert_eq!(h.controller.tick(), TickOutcome::Skipped);
    }

    assert_eq!(h.controller.state(), PipelineState::Running);
    let notices = h.observer.notices();
    assert_eq!(notices.len(), 5);
    assert!(notices.iter().all(|n| n.kind == NoticeKind::FrameUnavailable && n.raw.is_none()));
    assert_eq!(oracle.calls(), 0);
}

#[test]
fn test_end_of_stream_is_skipped() {
    let camera = StubCameraProvider::new(StubFrames::Failing(FrameSourceError::EndOfStream));
    let h = resolved_harness(camera, Arc::new(StubOracle::constant(0.1)));

    h.controller.start(0).unwrap();
    assert_eq!(h.controller.tick(), TickOutcome::Skipped);
    assert!(h.controller.is_running());
}

#[test]
fn test_detection_failure_reports_raw_frame() {
    let h = resolved_harness(
        StubCameraProvider::solid(320, 240, 90),
        Arc::new(StubOracle::failing("weights missing")),
    );

    h.controller.start(0).unwrap();
    assert_eq!(h.controller.tick(), TickOutcome::DetectionFailed);
    assert_eq!(h.controller.state(), PipelineState::Running);

    let notices = h.observer.notices();
    assert_eq!(notices.len(), 1);
    assert_eq!(notices[0].kind, NoticeKind::DetectionFailed);
    assert!(notices[0].message.contains("weights missing"));
    let raw = notices[0].raw.as_ref().unwrap();
    assert_eq!(raw.dimensions(), (400, 300));
    assert!(h.observer.frames().is_empty());
}

/// Oracle that parks inside `detect` until the test lets it go.
struct GatedOracle {
    entered: Mutex<mpsc::Sender<()>>,
    release: Mutex<mpsc::Receiver<()>>,
}

impl CloudOracle for GatedOracle {
    fn detect(&self, request: &OracleRequest) -> anyhow::Result<OracleOutput> {
        self.entered.lock().unwrap().send(()).ok();
        self.release.lock().unwrap().recv().ok();
        let (w, h) = request.image.dimensions();
        Ok(OracleOutput {
            cloud_cover: 0.5,
            cloud_mask: RgbImage::new(w, h),
            sun_mask: RgbImage::new(w, h),
        })
    }
}

#[test]
fn test_stop_during_tick_cancels_and_releases() {
    let (entered_tx, entered_rx) = mpsc::channel();
    let (release_tx, release_rx) = mpsc::channel();
    let oracle = Arc::new(GatedOracle {
        entered: Mutex::new(entered_tx),
        release: Mutex::new(release_rx),
    });
    let h = resolved_harness(StubCameraProvider::solid(64, 48, 100), oracle);
    h.controller.start(0).unwrap();

    let ticking = Arc::clone(&h.controller);
    let tick_thread = std::thread::spawn(move || ticking.tick());
    entered_rx.recv_timeout(Duration::from_secs(5)).unwrap();

    let stopping = Arc::clone(&h.controller);
    let stop_thread = std::thread::spawn(move || stopping.stop());
    while !h.controller.stop_requested.load(Ordering::SeqCst) {
        std::thread::yield_now();
    }
    release_tx.send(()).unwrap();

    assert_eq!(tick_thread.join().unwrap(), TickOutcome::Cancelled);
    stop_thread.join().unwrap();

    assert_eq!(h.controller.state(), PipelineState::Idle);
    assert_eq!(h.camera.open_handles(), 0);
    assert!(h.observer.frames().is_empty());
    assert_eq!(h.observer.clears(), 1);
}

#[test]
fn test_scheduler_respects_tick_budget() {
    let h = resolved_harness(StubCameraProvider::solid(32, 24, 60), Arc::new(StubOracle::constant(0.2)));
    h.controller.start(0).unwrap();

    let running = AtomicBool::new(true);
    let report = TickScheduler::new(Duration::from_millis(1))
        .with_tick_budget(3)
        .run(&h.controller, &running);

    assert_eq!(report.published, 3);
    assert_eq!(report.total(), 3);
    assert_eq!(h.observer.frames().len(), 3);
}

#[test]
fn test_scheduler_exits_when_flag_clears() {
    let h = resolved_harness(StubCameraProvider::solid(32, 24, 60), Arc::new(StubOracle::constant(0.2)));
    h.controller.start(0).unwrap();

    let running = AtomicBool::new(false);
    let report = TickScheduler::new(Duration::from_millis(1)).run(&h.controller, &running);
    assert_eq!(report, TickReport::default());

    // Not running at all: the scheduler returns immediately too
    h.controller.stop();
    let running = AtomicBool::new(true);
    let report = TickScheduler::new(Duration::from_millis(1)).run(&h.controller, &running);
    assert_eq!(report.total(), 0);
}

/// Observer that stops the controller from inside its own callback.
#[derive(Default)]
struct StoppingObserver {
    controller: OnceLock<Weak<PipelineController>>,
    notices: AtomicU64,
    clears: AtomicU64,
}

impl PipelineObserver for StoppingObserver {
    fn on_frame(&self, _publication: &FramePublication) {}

    fn on_status(&self, _notice: &StatusNotice) {
        self.notices.fetch_add(1, Ordering::SeqCst);
        if let Some(controller) = self.controller.get().and_then(Weak::upgrade) {
            controller.stop();
        }
    }

    fn on_cleared(&self) {
        self.clears.fetch_add(1, Ordering::SeqCst);
    }
}

#[test]
fn test_observer_can_stop_from_callback() {
    let camera = StubCameraProvider::new(StubFrames::Failing(FrameSourceError::ReadError(
        "usb disconnect".to_string(),
    )));
    let stats = camera.stats();
    let observer = Arc::new(StoppingObserver::default());
    let geo = Arc::new(GeoState::new());
    resolve_stanford(&geo);
    let controller = Arc::new(PipelineController::new(PipelineParts {
        camera: Arc::new(camera),
        detector: DetectionAdapter::new(Arc::new(StubOracle::constant(0.1)), 64),
        compositor: OverlayCompositor::default(),
        geo,
        observer: Arc::clone(&observer) as Arc<dyn PipelineObserver>,
        settings: PipelineSettings::default(),
    }));
    observer.controller.set(Arc::downgrade(&controller)).ok();
    controller.start(0).unwrap();

    let (done_tx, done_rx) = mpsc::channel();
    let ticking = Arc::clone(&controller);
    std::thread::spawn(move || {
        done_tx.send(ticking.tick()).ok();
    });

    let outcome = done_rx.recv_timeout(Duration::from_secs(5)).unwrap();
    assert_eq!(outcome, TickOutcome::Skipped);
    assert_eq!(controller.state(), PipelineState::Idle);
    assert_eq!(stats.open_handles(), 0);
    assert_eq!(observer.notices.load(Ordering::SeqCst), 1);
    assert_eq!(observer.clears.load(Ordering::SeqCst), 1);
}

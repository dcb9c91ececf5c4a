//! Consumers of pipeline output.
//!
//! The controller never draws anything itself. Every finished frame and every
//! per-tick problem is handed to a [`PipelineObserver`], which may show it,
//! log it or write it to disk.

use anyhow::{Context, Result};
use image::RgbImage;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::common::utils::private_path;
use crate::overlay::AnnotatedFrame;

/// One successfully processed frame.
///
/// `raw` and `annotated` are sized for display and in RGB order. `composite`
/// is the full-resolution annotated frame with its text placement.
#[derive(Debug, Clone, PartialEq)]
pub struct FramePublication {
    pub raw: RgbImage,
    pub annotated: RgbImage,
    pub composite: AnnotatedFrame,
    pub cloud_cover: f64,
    pub timestamp_text: String,
    pub status_text: String,
}

/// Why a tick produced no publication.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    FrameUnavailable,
    DetectionFailed,
}

/// A per-tick problem report.
#[derive(Debug, Clone, PartialEq)]
pub struct StatusNotice {
    pub kind: NoticeKind,
    pub message: String,
    /// Display-sized raw frame, present when a frame was read before failing
    pub raw: Option<RgbImage>,
}

/// Receives pipeline output.
///
/// Callbacks run on the ticking (or stopping) thread after the controller has
/// released its lock, so a callback may call `stop` on the same controller.
pub trait PipelineObserver: Send + Sync {
    fn on_frame(&self, publication: &FramePublication);
    fn on_status(&self, notice: &StatusNotice);
    /// The pipeline stopped; previously shown output is stale.
    fn on_cleared(&self);
}

/// Fans every callback out to several observers in order.
#[derive(Default)]
pub struct ObserverSet {
    observers: Vec<Box<dyn PipelineObserver>>,
}

impl ObserverSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, observer: impl PipelineObserver + 'static) -> Self {
        self.observers.push(Box::new(observer));
        self
    }

    pub fn len(&self) -> usize {
        self.observers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observers.is_empty()
    }
}

impl PipelineObserver for ObserverSet {
    fn on_frame(&self, publication: &FramePublication) {
        self.observers.iter().for_each(|o| o.on_frame(publication));
    }

    fn on_status(&self, notice: &StatusNotice) {
        self.observers.iter().for_each(|o| o.on_status(notice));
    }

    fn on_cleared(&self) {
        self.observers.iter().for_each(|o| o.on_cleared());
    }
}

/// Reports pipeline output through the logger.
///
/// Problems are always logged; per-frame summaries only in debug mode.
pub struct LogObserver {
    debug_enabled: bool,
}

impl LogObserver {
    pub fn new(debug_enabled: bool) -> Self {
        Self { debug_enabled }
    }
}

impl PipelineObserver for LogObserver {
    fn on_frame(&self, publication: &FramePublication) {
        if self.debug_enabled {
            log_debug!(
                "{} | cover {:.1}% | {}",
                publication.timestamp_text,
                publication.cloud_cover * 100.0,
                publication.status_text
            );
        }
    }

    fn on_status(&self, notice: &StatusNotice) {
        match notice.kind {
            NoticeKind::FrameUnavailable => log_warning!("{}", notice.message),
            NoticeKind::DetectionFailed => log_error!("{}", notice.message),
        }
    }

    fn on_cleared(&self) {
        log_decorated!("Display cleared");
    }
}

/// Writes `raw.png` and `annotated.png` every `every` published frames.
///
/// The files are overwritten each time, so the directory always holds the
/// most recent pair.
pub struct SnapshotWriter {
    dir: PathBuf,
    every: u64,
    published: AtomicU64,
}

impl SnapshotWriter {
    pub fn new(dir: impl Into<PathBuf>, every: u64) -> Result<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create snapshot directory {}", private_path(&dir)))?;
        Ok(Self {
            dir,
            every: every.max(1),
            published: AtomicU64::new(0),
        })
    }

    fn write(&self, publication: &FramePublication) -> Result<()> {
        for (name, image) in [("raw.png", &publication.raw), ("annotated.png", &publication.annotated)] {
            let path = self.dir.join(name);
            image
                .save(&path)
                .with_context(|| format!("Failed to write {}", private_path(&path)))?;
        }
        Ok(())
    }
}

impl PipelineObserver for SnapshotWriter {
    fn on_frame(&self, publication: &FramePublication) {
        let count = self.published.fetch_add(1, Ordering::SeqCst) + 1;
        if count % self.every != 0 {
            return;
        }
        if let Err(e) = self.write(publication) {
            log_warning!("Snapshot skipped: {e:#}");
        }
    }

    fn on_status(&self, _notice: &StatusNotice) {}

    fn on_cleared(&self) {
        self.published.store(0, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::{ChannelOrder, Frame};
    use image::Rgb;
    use std::sync::{Arc, Mutex};
    use tempfile::tempdir;

    fn publication(value: u8) -> FramePublication {
        FramePublication {
            raw: RgbImage::from_pixel(4, 3, Rgb([value, 0, 0])),
            annotated: RgbImage::from_pixel(4, 3, Rgb([0, value, 0])),
            composite: AnnotatedFrame {
                frame: Frame::new(RgbImage::new(4, 3), ChannelOrder::Rgb),
                annotations: Vec::new(),
            },
            cloud_cover: 0.5,
            timestamp_text: "2024-06-21 12:00:00".to_string(),
            status_text: "Running".to_string(),
        }
    }

    #[derive(Clone, Default)]
    struct Counting(Arc<Mutex<Vec<&'static str>>>);

    impl PipelineObserver for Counting {
        fn on_frame(&self, _: &FramePublication) {
            self.0.lock().unwrap().push("frame");
        }
        fn on_status(&self, _: &StatusNotice) {
            self.0.lock().unwrap().push("status");
        }
        fn on_cleared(&self) {
            self.0.lock().unwrap().push("cleared");
        }
    }

    #[test]
    fn test_observer_set_fans_out() {
        let a = Counting::default();
        let b = Counting::default();
        let set = ObserverSet::new().with(a.clone()).with(b.clone());

        set.on_frame(&publication(1));
        set.on_status(&StatusNotice {
            kind: NoticeKind::FrameUnavailable,
            message: "no frame".to_string(),
            raw: None,
        });
        set.on_cleared();

        assert_eq!(set.len(), 2);
        assert_eq!(*a.0.lock().unwrap(), vec!["frame", "status", "cleared"]);
        assert_eq!(*b.0.lock().unwrap(), vec!["frame", "status", "cleared"]);
    }

    #[test]
    fn test_snapshot_writer_cadence() {
        let dir = tempdir().unwrap();
        let writer = SnapshotWriter::new(dir.path().join("out"), 2).unwrap();
        let raw_path = dir.path().join("out/raw.png");

        writer.on_frame(&publication(10));
        assert!(!raw_path.exists());

        writer.on_frame(&publication(20));
        let saved = image::open(&raw_path).unwrap().to_rgb8();
        assert_eq!(saved.get_pixel(0, 0), &Rgb([20, 0, 0]));
        let annotated = image::open(dir.path().join("out/annotated.png")).unwrap().to_rgb8();
        assert_eq!(annotated.get_pixel(3, 2), &Rgb([0, 20, 0]));
    }
}

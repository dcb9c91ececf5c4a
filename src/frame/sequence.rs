//! Recorded image sequences played back as a camera.
//!
//! Device `i` reads the image files in `frames_dir/cam<i>` in file-name order.
//! Device 0 may also read images placed directly in `frames_dir`, which is the
//! common layout for a single recorded sky camera.

use std::path::{Path, PathBuf};

use super::source::{CameraProvider, CaptureHint, FrameSource, FrameSourceError};
use super::{ChannelOrder, Frame};
use crate::common::utils::private_path;

const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "bmp"];

/// Opens [`SequenceCamera`]s rooted at one frames directory.
#[derive(Debug, Clone)]
pub struct SequenceProvider {
    frames_dir: PathBuf,
    loop_frames: bool,
}

impl SequenceProvider {
    pub fn new(frames_dir: impl Into<PathBuf>, loop_frames: bool) -> Self {
        Self {
            frames_dir: frames_dir.into(),
            loop_frames,
        }
    }

    fn device_dir(&self, index: u32) -> PathBuf {
        let camera_dir = self.frames_dir.join(format!("cam{index}"));
        if index == 0 && !camera_dir.is_dir() {
            self.frames_dir.clone()
        } else {
            camera_dir
        }
    }
}

impl CameraProvider for SequenceProvider {
    fn open(&self, index: u32, _hint: CaptureHint) -> Result<Box<dyn FrameSource>, FrameSourceError> {
        let dir = self.device_dir(index);
        let unavailable = |reason: String| FrameSourceError::DeviceUnavailable { index, reason };

        let files = list_images(&dir)
            .map_err(|e| unavailable(format!("cannot read {}: {e}", private_path(&dir))))?;
        if files.is_empty() {
            return Err(unavailable(format!("no images in {}", private_path(&dir))));
        }

        Ok(Box::new(SequenceCamera {
            index,
            dir,
            files,
            position: 0,
            loop_frames: self.loop_frames,
            released: false,
        }))
    }
}

/// Sorted image files directly inside `dir`.
fn list_images(dir: &Path) -> std::io::Result<Vec<PathBuf>> {
    let mut files: Vec<PathBuf> = std::fs::read_dir(dir)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| path.is_file() && has_image_extension(path))
        .collect();
    files.sort();
    Ok(files)
}

fn has_image_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| IMAGE_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

pub struct SequenceCamera {
    index: u32,
    dir: PathBuf,
    files: Vec<PathBuf>,
    position: usize,
    loop_frames: bool,
    released: bool,
}

impl FrameSource for SequenceCamera {
    fn read_frame(&mut self) -> Result<Frame, FrameSourceError> {
        if self.released {
            return Err(FrameSourceError::ReadError(format!(
                "sequence camera {} has been released",
                self.index
            )));
        }

        if self.position >= self.files.len() {
            if !self.loop_frames {
                return Err(FrameSourceError::EndOfStream);
            }
            self.position = 0;
        }

        let path = &self.files[self.position];
        self.position += 1;

        let decoded = image::open(path).map_err(|e| {
            FrameSourceError::ReadError(format!("{}: {e}", private_path(path)))
        })?;
        Ok(Frame::new(decoded.to_rgb8(), ChannelOrder::Rgb))
    }

    fn release(&mut self) {
        if !self.released {
            self.released = true;
            self.files.clear();
        }
    }

    fn describe(&self) -> String {
        format!(
            "image sequence {} ({} frames)",
            private_path(&self.dir),
            self.files.len()
        )
    }
}

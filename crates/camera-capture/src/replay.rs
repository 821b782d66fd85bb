//! Replay of recorded frames from a directory of image files

use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::clock::{MonotonicClock, SystemClock};
use crate::frame::VideoFrame;
use crate::{CameraConfig, CameraError, FrameSource};

const FRAME_EXTENSIONS: [&str; 4] = ["png", "jpg", "jpeg", "bmp"];

/// Frame source that decodes image files in lexical order.
///
/// Frames are stamped with the clock at the moment they are read, so closure
/// timing follows wall-clock pacing rather than the recording's frame count.
pub struct ReplaySource<C = SystemClock> {
    paths: Vec<PathBuf>,
    position: usize,
    looped: bool,
    sequence: u32,
    clock: C,
}

impl ReplaySource<SystemClock> {
    pub fn open(config: &CameraConfig) -> Result<Self, CameraError> {
        Self::with_clock(config, SystemClock::new())
    }
}

impl<C: MonotonicClock> ReplaySource<C> {
    pub fn with_clock(config: &CameraConfig, clock: C) -> Result<Self, CameraError> {
        let paths = list_frames(&config.frames_dir)?;
        if paths.is_empty() {
            return Err(CameraError::Open {
                path: config.frames_dir.clone(),
                reason: "no image files found".to_string(),
            });
        }

        info!(
            "Replaying {} frames from {}",
            paths.len(),
            config.frames_dir.display()
        );

        Ok(Self {
            paths,
            position: 0,
            looped: config.looped,
            sequence: 0,
            clock,
        })
    }

    /// Number of frames in the recording
    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }
}

impl<C: MonotonicClock> FrameSource for ReplaySource<C> {
    fn next_frame(&mut self) -> Result<Option<VideoFrame>, CameraError> {
        if self.position >= self.paths.len() {
            if !self.looped {
                return Ok(None);
            }
            self.position = 0;
        }

        let path = &self.paths[self.position];
        self.position += 1;

        let rgb = image::open(path)
            .map_err(|source| CameraError::Decode {
                path: path.clone(),
                source,
            })?
            .to_rgb8();
        let (width, height) = rgb.dimensions();

        let frame = VideoFrame::new(
            rgb.into_raw(),
            width,
            height,
            self.clock.now().as_nanos() as u64,
            self.sequence,
        )?;
        self.sequence = self.sequence.wrapping_add(1);

        debug!("Read frame {} from {}", frame.sequence, path.display());
        Ok(Some(frame))
    }
}

fn list_frames(dir: &Path) -> Result<Vec<PathBuf>, CameraError> {
    let entries = std::fs::read_dir(dir).map_err(|e| CameraError::Open {
        path: dir.to_path_buf(),
        reason: e.to_string(),
    })?;

    let mut paths: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| {
            path.extension()
                .and_then(|ext| ext.to_str())
                .map(|ext| FRAME_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
                .unwrap_or(false)
        })
        .collect();
    paths.sort();
    Ok(paths)
}

//! Camera Capture Library for Driver Monitoring
//!
//! Provides the frame acquisition side of the monitor:
//! - RGB frames and their grayscale view
//! - Image-space regions (faces, eyes)
//! - Replay of recorded frames from a directory
//! - Monotonic clock for frame timestamps

pub mod clock;
pub mod frame;
pub mod replay;

pub use clock::{MonotonicClock, SystemClock};
pub use frame::{GrayFrame, Region, VideoFrame};
pub use replay::ReplaySource;

use std::path::PathBuf;
use thiserror::Error;

/// Camera error types
#[derive(Error, Debug)]
pub enum CameraError {
    #[error("Failed to open frame source {path}: {reason}")]
    Open { path: PathBuf, reason: String },

    #[error("Failed to decode frame {path}: {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("Frame buffer size mismatch: expected {expected} bytes, got {actual}")]
    Buffer { expected: usize, actual: usize },
}

/// A producer of frames, polled once per monitoring iteration.
///
/// `Ok(None)` means the source is exhausted and the loop should stop.
pub trait FrameSource {
    fn next_frame(&mut self) -> Result<Option<VideoFrame>, CameraError>;
}

/// Frame source configuration
#[derive(Debug, Clone)]
pub struct CameraConfig {
    /// Directory holding the recorded frames
    pub frames_dir: PathBuf,
    /// Loop over the recording when it runs out
    pub looped: bool,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            frames_dir: PathBuf::from("frames"),
            looped: false,
        }
    }
}

//! Face and eye detector boundary
//!
//! The detectors themselves are external; the core only sees regions.

use std::time::Duration;

use camera_capture::{GrayFrame, Region};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Failure reported by a detector backend
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DetectorError {
    #[error("Detector backend failed: {0}")]
    Backend(String),

    #[error("Invalid detector input: {0}")]
    Input(String),
}

/// Finds faces in a full grayscale frame.
///
/// Results are ordered; only the first face is analysed.
pub trait FaceDetector {
    fn detect_faces(&mut self, image: &GrayFrame) -> Result<Vec<Region>, DetectorError>;
}

/// Finds eyes in the upper half of a face. Regions are relative to `face`.
pub trait EyeDetector {
    fn detect_eyes(&mut self, face: &GrayFrame) -> Result<Vec<Region>, DetectorError>;
}

/// Eye bounding box inside a face's upper half
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EyeRegion {
    pub bbox: Region,
}

impl EyeRegion {
    pub fn new(bbox: Region) -> Self {
        Self { bbox }
    }
}

/// Face bounding box with the eyes found inside it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FaceRegion {
    pub bbox: Region,
    pub eyes: Vec<EyeRegion>,
}

impl FaceRegion {
    pub fn new(bbox: Region) -> Self {
        Self {
            bbox,
            eyes: Vec::new(),
        }
    }

    pub fn with_eyes(mut self, eyes: impl IntoIterator<Item = Region>) -> Self {
        self.eyes = eyes.into_iter().map(EyeRegion::new).collect();
        self
    }
}

/// Everything detected in one camera frame
#[derive(Debug, Clone, PartialEq)]
pub struct DetectionFrame {
    pub sequence: u32,
    /// Monotonic capture time
    pub timestamp: Duration,
    pub faces: Vec<FaceRegion>,
}

impl DetectionFrame {
    /// The face the monitor tracks (always the first one reported)
    pub fn primary_face(&self) -> Option<&FaceRegion> {
        self.faces.first()
    }
}

/// Run both detectors over a frame: faces on the full image, eyes on the
/// upper half of the primary face only.
pub fn detect(
    faces: &mut dyn FaceDetector,
    eyes: &mut dyn EyeDetector,
    gray: &GrayFrame,
) -> Result<Vec<FaceRegion>, DetectorError> {
    let mut found: Vec<FaceRegion> = faces
        .detect_faces(gray)?
        .into_iter()
        .map(FaceRegion::new)
        .collect();

    if let Some(primary) = found.first_mut() {
        if let Some(upper) = gray.crop(&primary.bbox.upper_half()) {
            primary.eyes = eyes
                .detect_eyes(&upper)?
                .into_iter()
                .map(EyeRegion::new)
                .collect();
        }
    }

    Ok(found)
}

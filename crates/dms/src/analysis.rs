//! DMS analysis results and alerts

use serde::{Deserialize, Serialize};

use camera_capture::Region;

use crate::detector::DetectorError;
use crate::state::{EyeState, SampleRejection};

/// Drowsiness alert, raised once per qualifying closure
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DrowsinessAlert {
    /// Closure accumulated when the alert fired (seconds)
    pub closed_seconds: f64,
}

/// Read-only view of the driver state after one frame
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DmsAnalysis {
    /// Frame sequence number
    pub sequence: u32,

    /// Whether a face was detected
    pub face_detected: bool,

    /// Primary face bounding box (if detected)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub face_bbox: Option<Region>,

    /// Eye boxes of the primary face, relative to its upper half
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub eye_boxes: Vec<Region>,

    /// Mean eye height / width ratio (0.0 when no eyes were found)
    pub eye_ratio: f64,

    /// Classified eye state
    pub eye_state: EyeState,

    /// Closure accumulated in the current episode (seconds)
    pub closed_seconds: f64,

    /// Alert raised on this frame
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alert: Option<DrowsinessAlert>,

    /// Set when the frame's sample was ignored
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rejection: Option<SampleRejection>,
}

impl DmsAnalysis {
    /// Check if this frame raised an alert
    pub fn has_alert(&self) -> bool {
        self.alert.is_some()
    }
}

/// What happened to a frame handed to the pipeline
#[derive(Debug, Clone, PartialEq)]
pub enum FrameOutcome {
    /// The state machine consumed the frame
    Analyzed(DmsAnalysis),
    /// A detector failed; the driver state was left untouched
    Skipped { sequence: u32, error: DetectorError },
}

impl FrameOutcome {
    pub fn analysis(&self) -> Option<&DmsAnalysis> {
        match self {
            FrameOutcome::Analyzed(analysis) => Some(analysis),
            FrameOutcome::Skipped { .. } => None,
        }
    }
}

//! Driver Monitoring System (DMS)
//!
//! Per-frame drowsiness analysis:
//! - Face detection, then eye detection on the primary face
//! - Eye openness ratio from eye bounding boxes
//! - Eye state and closure timing against the frame clock
//! - Edge-triggered drowsiness alerts

pub mod analysis;
pub mod config;
pub mod detector;
pub mod ratio;
pub mod state;

pub use analysis::{DmsAnalysis, DrowsinessAlert, FrameOutcome};
pub use config::DmsConfig;
pub use detector::{
    DetectionFrame, DetectorError, EyeDetector, EyeRegion, FaceDetector, FaceRegion,
};
pub use ratio::estimate_ratio;
pub use state::{DrowsinessMachine, DrowsinessState, EyeState, SampleRejection, Transition};

use std::time::Duration;

use camera_capture::frame::VideoFrame;
use thiserror::Error;
use tracing::{debug, warn};

/// DMS error types
#[derive(Error, Debug)]
pub enum DmsError {
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Driver monitoring module
pub struct DmsModule {
    config: DmsConfig,
    face_detector: Box<dyn FaceDetector>,
    eye_detector: Box<dyn EyeDetector>,
    machine: DrowsinessMachine,
}

impl DmsModule {
    /// Create a new DMS module; closure timing starts at `started_at`
    pub fn new(
        config: DmsConfig,
        face_detector: Box<dyn FaceDetector>,
        eye_detector: Box<dyn EyeDetector>,
        started_at: Duration,
    ) -> Result<Self, DmsError> {
        config.validate()?;
        Ok(Self {
            machine: DrowsinessMachine::new(&config, started_at),
            face_detector,
            eye_detector,
            config,
        })
    }

    pub fn config(&self) -> &DmsConfig {
        &self.config
    }

    pub fn state(&self) -> &DrowsinessState {
        self.machine.state()
    }

    /// Detect, estimate, and advance the driver state for one frame.
    ///
    /// A detector failure skips the frame without touching the state.
    pub fn process(&mut self, frame: &VideoFrame) -> FrameOutcome {
        metrics::counter!("dms_frames_total").increment(1);

        let gray = frame.to_grayscale();
        let faces = match detector::detect(
            self.face_detector.as_mut(),
            self.eye_detector.as_mut(),
            &gray,
        ) {
            Ok(faces) => faces,
            Err(error) => {
                metrics::counter!("dms_collaborator_failures_total").increment(1);
                warn!("Skipping frame {}: {}", frame.sequence, error);
                return FrameOutcome::Skipped {
                    sequence: frame.sequence,
                    error,
                };
            }
        };

        FrameOutcome::Analyzed(self.analyze(&DetectionFrame {
            sequence: frame.sequence,
            timestamp: frame.timestamp(),
            faces,
        }))
    }

    /// Advance the driver state from detections made elsewhere
    pub fn analyze(&mut self, detection: &DetectionFrame) -> DmsAnalysis {
        let face = detection.primary_face();
        let eye_ratio = face.map(|f| estimate_ratio(&f.eyes)).unwrap_or(0.0);

        let transition = self
            .machine
            .step(face.is_some(), eye_ratio, detection.timestamp);

        if transition.rejection.is_some() {
            metrics::counter!("dms_invalid_samples_total").increment(1);
        }
        if transition.alert.is_some() {
            metrics::counter!("dms_alerts_total").increment(1);
        }

        debug!(
            "Frame {}: {:?} ratio={:.3} closed={:.2}s",
            detection.sequence, transition.eye_state, eye_ratio, transition.closed_seconds
        );

        DmsAnalysis {
            sequence: detection.sequence,
            face_detected: face.is_some(),
            face_bbox: face.map(|f| f.bbox),
            eye_boxes: face
                .map(|f| f.eyes.iter().map(|e| e.bbox).collect())
                .unwrap_or_default(),
            eye_ratio,
            eye_state: transition.eye_state,
            closed_seconds: transition.closed_seconds,
            alert: transition.alert,
            rejection: transition.rejection,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use camera_capture::{GrayFrame, Region};
    use std::collections::VecDeque;

    type Script = VecDeque<Result<Vec<Region>, DetectorError>>;

    struct ScriptedFaces(Script);

    impl FaceDetector for ScriptedFaces {
        fn detect_faces(&mut self, _image: &GrayFrame) -> Result<Vec<Region>, DetectorError> {
            self.0.pop_front().unwrap_or(Ok(vec![]))
        }
    }

    struct ScriptedEyes(Script);

    impl EyeDetector for ScriptedEyes {
        fn detect_eyes(&mut self, _face: &GrayFrame) -> Result<Vec<Region>, DetectorError> {
            self.0.pop_front().unwrap_or(Ok(vec![]))
        }
    }

    const FACE: Region = Region {
        x: 0,
        y: 0,
        width: 8,
        height: 8,
    };

    // ratio 2 / 20 = 0.1
    const SQUINT: Region = Region {
        x: 0,
        y: 0,
        width: 20,
        height: 2,
    };

    fn frame(second: u64, sequence: u32) -> VideoFrame {
        VideoFrame::new(vec![0; 8 * 8 * 3], 8, 8, second * 1_000_000_000, sequence).unwrap()
    }

    fn module(faces: Script, eyes: Script) -> DmsModule {
        DmsModule::new(
            DmsConfig::default(),
            Box::new(ScriptedFaces(faces)),
            Box::new(ScriptedEyes(eyes)),
            Duration::ZERO,
        )
        .unwrap()
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let config = DmsConfig {
            alert_seconds: -1.0,
            ..Default::default()
        };
        let result = DmsModule::new(
            config,
            Box::new(ScriptedFaces(Script::new())),
            Box::new(ScriptedEyes(Script::new())),
            Duration::ZERO,
        );
        assert!(matches!(result, Err(DmsError::Config(_))));
    }

    #[test]
    fn test_pipeline_raises_alert_on_third_closed_second() {
        let faces = (0..3).map(|_| Ok(vec![FACE])).collect();
        let eyes = (0..3).map(|_| Ok(vec![SQUINT, SQUINT])).collect();
        let mut dms = module(faces, eyes);

        let outcomes: Vec<_> = (1..=3).map(|s| dms.process(&frame(s, s as u32))).collect();

        let first = outcomes[0].analysis().unwrap();
        assert!(first.face_detected);
        assert_eq!(first.face_bbox, Some(FACE));
        assert_eq!(first.eye_boxes.len(), 2);
        assert_eq!(first.eye_state, EyeState::Closed);
        assert!((first.eye_ratio - 0.1).abs() < 1e-6);

        assert!(!outcomes[1].analysis().unwrap().has_alert());
        let third = outcomes[2].analysis().unwrap();
        assert!(third.has_alert());
        assert_eq!(third.closed_seconds, 0.0);
    }

    #[test]
    fn test_no_face_is_not_an_error() {
        let mut dms = module(Script::new(), Script::new());
        let analysis = dms.process(&frame(1, 0)).analysis().cloned().unwrap();
        assert!(!analysis.face_detected);
        assert_eq!(analysis.eye_state, EyeState::NoFace);
        assert_eq!(analysis.eye_ratio, 0.0);
    }

    #[test]
    fn test_detector_failure_skips_frame_and_keeps_state() {
        let faces = vec![
            Ok(vec![FACE]),
            Err(DetectorError::Backend("cascade crashed".into())),
            Ok(vec![FACE]),
        ]
        .into();
        let eyes = vec![Ok(vec![SQUINT]), Ok(vec![SQUINT])].into();
        let mut dms = module(faces, eyes);

        dms.process(&frame(1, 1));
        let before = dms.state().clone();

        let skipped = dms.process(&frame(2, 2));
        assert!(matches!(skipped, FrameOutcome::Skipped { sequence: 2, .. }));
        assert_eq!(*dms.state(), before);

        // The gap spans the skipped frame but is clamped
        let after = dms.process(&frame(3, 3));
        assert_eq!(after.analysis().unwrap().closed_seconds, 2.0);
    }

    #[test]
    fn test_eye_detector_failure_skips_frame() {
        let faces = vec![Ok(vec![FACE])].into();
        let eyes = vec![Err(DetectorError::Input("empty roi".into()))].into();
        let mut dms = module(faces, eyes);

        let outcome = dms.process(&frame(1, 7));
        assert!(matches!(outcome, FrameOutcome::Skipped { sequence: 7, .. }));
        assert_eq!(dms.state().eye_state(), EyeState::NoFace);
    }

    #[test]
    fn test_analyze_synthetic_detections() {
        let mut dms = module(Script::new(), Script::new());
        let detection = DetectionFrame {
            sequence: 0,
            timestamp: Duration::from_millis(500),
            faces: vec![FaceRegion::new(FACE).with_eyes([Region::new(0, 0, 20, 8)])],
        };
        let analysis = dms.analyze(&detection);
        assert_eq!(analysis.eye_state, EyeState::Open);
        assert!((analysis.eye_ratio - 0.4).abs() < 1e-6);
    }
}

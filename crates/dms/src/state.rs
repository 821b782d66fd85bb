//! Driver state tracking
//!
//! [`DrowsinessMachine`] owns the only mutable state in the monitor. It is fed
//! one sample per frame, in frame order, and decides the eye state, how long
//! the eyes have been shut, and when to raise a drowsiness alert.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::analysis::DrowsinessAlert;
use crate::config::DmsConfig;

/// Eye state of the primary face
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum EyeState {
    #[default]
    NoFace,
    Open,
    Closed,
}

/// Why a frame's sample was ignored
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum SampleRejection {
    /// Frame timestamp is earlier than the previous one
    ClockWentBackwards { by_seconds: f64 },
    /// Eye ratio is NaN, infinite or negative
    InvalidRatio(f64),
}

/// Driver state (tracked over time)
#[derive(Debug, Clone, PartialEq)]
pub struct DrowsinessState {
    eye_state: EyeState,
    closed_for: Duration,
    last_frame_at: Duration,
}

impl DrowsinessState {
    pub fn new(started_at: Duration) -> Self {
        Self {
            eye_state: EyeState::NoFace,
            closed_for: Duration::ZERO,
            last_frame_at: started_at,
        }
    }

    pub fn eye_state(&self) -> EyeState {
        self.eye_state
    }

    /// Closure accumulated in the current episode (seconds)
    pub fn closed_seconds(&self) -> f64 {
        self.closed_for.as_secs_f64()
    }

    /// Closure accumulated in the current episode
    pub fn closed_for(&self) -> Duration {
        self.closed_for
    }

    pub fn last_frame_at(&self) -> Duration {
        self.last_frame_at
    }
}

/// Result of feeding one sample to the machine
#[derive(Debug, Clone, PartialEq)]
pub struct Transition {
    pub eye_state: EyeState,
    pub closed_seconds: f64,
    /// Time credited to this frame after clamping
    pub dt_seconds: f64,
    pub alert: Option<DrowsinessAlert>,
    pub rejection: Option<SampleRejection>,
}

/// Eye state / closure timing state machine
#[derive(Debug, Clone)]
pub struct DrowsinessMachine {
    closed_threshold: f64,
    alert_after: Duration,
    max_dt: Duration,
    state: DrowsinessState,
}

/// Seconds to `Duration`, saturating instead of panicking on out of range input
fn saturating_secs(seconds: f64) -> Duration {
    Duration::try_from_secs_f64(seconds).unwrap_or(if seconds > 0.0 {
        Duration::MAX
    } else {
        Duration::ZERO
    })
}

impl DrowsinessMachine {
    pub fn new(config: &DmsConfig, started_at: Duration) -> Self {
        Self {
            closed_threshold: config.closed_threshold,
            alert_after: saturating_secs(config.alert_seconds),
            max_dt: saturating_secs(config.max_dt_clamp_seconds),
            state: DrowsinessState::new(started_at),
        }
    }

    pub fn state(&self) -> &DrowsinessState {
        &self.state
    }

    /// Advance the machine by one frame.
    ///
    /// The elapsed time since the previous frame is capped at the configured
    /// clamp. Rejected samples resynchronise the frame clock but leave the eye
    /// state and the accumulator as they were.
    pub fn step(&mut self, face_detected: bool, eye_ratio: f64, now: Duration) -> Transition {
        let previous = self.state.last_frame_at;
        self.state.last_frame_at = now;

        let Some(elapsed) = now.checked_sub(previous) else {
            let by_seconds = (previous - now).as_secs_f64();
            return self.reject(SampleRejection::ClockWentBackwards { by_seconds });
        };

        let dt = elapsed.min(self.max_dt);
        if elapsed > self.max_dt {
            debug!("Frame gap {:?} clamped to {:?}", elapsed, dt);
        }

        if !face_detected {
            self.state.eye_state = EyeState::NoFace;
            self.state.closed_for = Duration::ZERO;
        } else if !eye_ratio.is_finite() || eye_ratio < 0.0 {
            return self.reject(SampleRejection::InvalidRatio(eye_ratio));
        } else if eye_ratio < self.closed_threshold {
            self.state.eye_state = EyeState::Closed;
            self.state.closed_for = self.state.closed_for.saturating_add(dt);
        } else {
            self.state.eye_state = EyeState::Open;
            self.state.closed_for = Duration::ZERO;
        }

        let alert = if self.state.closed_for >= self.alert_after {
            let alert = DrowsinessAlert {
                closed_seconds: self.state.closed_seconds(),
            };
            info!("Eyes closed for {:.2}s, raising drowsiness alert", alert.closed_seconds);
            self.state.closed_for = Duration::ZERO;
            Some(alert)
        } else {
            None
        };

        Transition {
            eye_state: self.state.eye_state,
            closed_seconds: self.state.closed_seconds(),
            dt_seconds: dt.as_secs_f64(),
            alert,
            rejection: None,
        }
    }

    fn reject(&self, rejection: SampleRejection) -> Transition {
        warn!("Ignoring invalid sample: {:?}", rejection);
        Transition {
            eye_state: self.state.eye_state,
            closed_seconds: self.state.closed_seconds(),
            dt_seconds: 0.0,
            alert: None,
            rejection: Some(rejection),
        }
    }
}

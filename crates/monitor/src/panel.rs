//! Status panel shown alongside the video
//!
//! Drawing is left to the display; this computes what the panel says.

use std::fmt;

use dms::{DmsAnalysis, DmsConfig, EyeState};
use serde::Serialize;
use tracing::{debug, info, warn};

/// Colour band of a panel gauge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Level {
    Normal,
    Warning,
    Critical,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusPanel {
    pub status: &'static str,
    pub ratio_text: String,
    /// Ratio gauge fill in [0, 1]
    pub ratio_fill: f64,
    pub ratio_level: Level,
    pub closure_text: String,
    /// Closure gauge fill in [0, 1], full at the alert duration
    pub closure_fill: f64,
    pub closure_level: Level,
    pub face_line: &'static str,
    /// Drowsiness banner, shown on the frame that raised an alert
    pub banner: bool,
}

impl StatusPanel {
    pub fn from_analysis(analysis: &DmsAnalysis, config: &DmsConfig) -> Self {
        let status = match analysis.eye_state {
            EyeState::Open => "EYES OPEN",
            EyeState::Closed => "EYES CLOSED",
            EyeState::NoFace => "NO DETECTION",
        };

        let ratio_level = if analysis.eye_ratio >= config.closed_threshold {
            Level::Normal
        } else {
            Level::Critical
        };

        // Amber from two thirds of the alert duration
        let warning_at = config.alert_seconds * 2.0 / 3.0;
        let closure_level = if analysis.closed_seconds < warning_at {
            Level::Normal
        } else if analysis.closed_seconds < config.alert_seconds {
            Level::Warning
        } else {
            Level::Critical
        };

        Self {
            status,
            ratio_text: format!("{:.3}", analysis.eye_ratio),
            ratio_fill: gauge(analysis.eye_ratio),
            ratio_level,
            closure_text: format!("{:.2}s", analysis.closed_seconds),
            closure_fill: gauge(analysis.closed_seconds / config.alert_seconds),
            closure_level,
            face_line: if analysis.face_detected {
                "Face Detected: YES"
            } else {
                "Face Detected: NO"
            },
            banner: analysis.has_alert(),
        }
    }
}

fn gauge(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}

impl fmt::Display for StatusPanel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] ratio {} closure {} | {}",
            self.status, self.ratio_text, self.closure_text, self.face_line
        )?;
        if self.banner {
            write!(f, " | ! DROWSINESS ALERT !")?;
        }
        Ok(())
    }
}

/// Consumer of per-frame snapshots. Must not feed back into the driver state.
pub trait Presenter {
    fn present(&mut self, analysis: &DmsAnalysis);
}

/// Writes the panel to the log: every frame at debug, state changes at info
pub struct LogPresenter {
    config: DmsConfig,
    last_state: Option<EyeState>,
}

impl LogPresenter {
    pub fn new(config: DmsConfig) -> Self {
        Self {
            config,
            last_state: None,
        }
    }
}

impl Presenter for LogPresenter {
    fn present(&mut self, analysis: &DmsAnalysis) {
        let panel = StatusPanel::from_analysis(analysis, &self.config);
        if panel.banner {
            warn!("{}", panel);
        } else if self.last_state != Some(analysis.eye_state) {
            info!("{}", panel);
        } else {
            debug!("{}", panel);
        }
        self.last_state = Some(analysis.eye_state);
    }
}

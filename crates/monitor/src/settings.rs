//! Layered monitor settings: defaults, optional TOML file, then environment

use std::path::{Path, PathBuf};
use std::time::Duration;

use alerting::AlertConfig;
use config::{Config, ConfigError, Environment, File};
use dms::DmsConfig;
use serde::{Deserialize, Serialize};

/// Environment prefix, e.g. `DROWSY_DMS__ALERT_SECONDS=2.5`
pub const ENV_PREFIX: &str = "DROWSY";

/// Accepted replay pacing, frames per second
pub const FPS_RANGE: std::ops::RangeInclusive<f64> = 0.001..=1000.0;

/// Recorded session to replay
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReplaySettings {
    /// Directory of frame images, read in lexical order
    pub frames_dir: PathBuf,
    /// JSON Lines file with one detection record per frame
    pub detections_path: PathBuf,
    /// Start over when the recording ends
    pub looped: bool,
    /// Frame pacing
    pub fps: f64,
}

impl Default for ReplaySettings {
    fn default() -> Self {
        Self {
            frames_dir: PathBuf::from("frames"),
            detections_path: PathBuf::from("detections.jsonl"),
            looped: false,
            fps: 15.0,
        }
    }
}

impl ReplaySettings {
    pub fn frame_interval(&self) -> Duration {
        Duration::from_secs_f64(1.0 / self.fps)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// Default filter when `RUST_LOG` is unset
    pub level: String,
    pub json: bool,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorSettings {
    pub dms: DmsConfig,
    pub alert: AlertConfig,
    pub replay: ReplaySettings,
    pub logging: LoggingSettings,
    /// Log alerts instead of playing the alarm
    pub mute: bool,
}

impl MonitorSettings {
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        Self::load_with_env(path, ENV_PREFIX)
    }

    pub fn load_with_env(path: Option<&Path>, env_prefix: &str) -> Result<Self, ConfigError> {
        let mut builder = Config::builder().add_source(Config::try_from(&Self::default())?);
        if let Some(path) = path {
            builder = builder.add_source(File::from(path).required(true));
        }
        builder
            .add_source(
                Environment::with_prefix(env_prefix)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()
    }

    pub fn validate(&self) -> Result<(), dms::DmsError> {
        self.dms.validate()?;
        if !FPS_RANGE.contains(&self.replay.fps) {
            return Err(dms::DmsError::Config(format!(
                "replay fps must be within {}..={}, got {}",
                FPS_RANGE.start(),
                FPS_RANGE.end(),
                self.replay.fps
            )));
        }
        Ok(())
    }
}

//! Alerting System
//!
//! Hands drowsiness alerts off to an alarm player without blocking the
//! frame loop.

mod dispatcher;

pub use dispatcher::{
    spawn_sound_worker, AlertConfig, AlertDispatcher, AlertWorker, LogDispatcher, SoundDispatcher,
    WorkerStats,
};

use thiserror::Error;

/// Alarm playback errors (reported by the worker, never by `notify_alert`)
#[derive(Debug, Error)]
pub enum AlertError {
    #[error("Failed to launch alarm player {command}: {source}")]
    Launch {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Alarm player exited with {0}")]
    PlayerExit(std::process::ExitStatus),
}

//! Alarm dispatch

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::process::Stdio;
use tokio::process::Command;
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::AlertError;

/// Receives alerts from the frame loop. Must return immediately.
pub trait AlertDispatcher {
    fn notify_alert(&self);
}

/// Alarm configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AlertConfig {
    /// Alarm sound file handed to the player
    pub sound_path: PathBuf,
    /// Player executable (default: aplay)
    pub player_command: String,
    /// Extra arguments placed before the sound path
    pub player_args: Vec<String>,
    /// Alerts waiting for playback; extra alerts are dropped
    pub queue_capacity: usize,
}

impl Default for AlertConfig {
    fn default() -> Self {
        Self {
            sound_path: PathBuf::from("assets/alarm.wav"),
            player_command: "aplay".to_string(),
            player_args: vec!["-q".to_string()],
            queue_capacity: 1,
        }
    }
}

/// Dispatcher that only logs; used when the alarm is muted
#[derive(Debug, Clone, Copy, Default)]
pub struct LogDispatcher;

impl AlertDispatcher for LogDispatcher {
    fn notify_alert(&self) {
        warn!("DROWSINESS ALERT (alarm muted)");
    }
}

/// Queues alerts for the playback worker
#[derive(Debug, Clone)]
pub struct SoundDispatcher {
    tx: mpsc::Sender<()>,
}

impl AlertDispatcher for SoundDispatcher {
    fn notify_alert(&self) {
        match self.tx.try_send(()) {
            Ok(()) => debug!("Alarm queued"),
            Err(TrySendError::Full(())) => {
                metrics::counter!("alerts_coalesced_total").increment(1);
                debug!("Alarm already pending, alert coalesced");
            }
            Err(TrySendError::Closed(())) => {
                warn!("Alert worker has stopped, alert dropped");
            }
        }
    }
}

/// Playback totals reported when the worker stops
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WorkerStats {
    pub played: u64,
    pub failed: u64,
}

/// Handle to the background playback task
pub struct AlertWorker {
    handle: JoinHandle<WorkerStats>,
}

impl AlertWorker {
    /// Wait for the worker to drain; it stops once every dispatcher is dropped
    pub async fn join(self) -> WorkerStats {
        match self.handle.await {
            Ok(stats) => stats,
            Err(e) => {
                warn!("Alert worker ended abnormally: {}", e);
                WorkerStats::default()
            }
        }
    }
}

/// Start the playback worker on the current tokio runtime
pub fn spawn_sound_worker(config: AlertConfig) -> (SoundDispatcher, AlertWorker) {
    let (tx, mut rx) = mpsc::channel(config.queue_capacity.max(1));

    info!(
        "Alarm: {} {}",
        config.player_command,
        config.sound_path.display()
    );

    let handle = tokio::spawn(async move {
        let mut stats = WorkerStats::default();
        while rx.recv().await.is_some() {
            match play(&config).await {
                Ok(()) => {
                    stats.played += 1;
                    debug!("Alarm played");
                }
                Err(e) => {
                    stats.failed += 1;
                    warn!("Alarm playback failed: {}", e);
                }
            }
        }
        info!(
            "Alert worker stopped ({} played, {} failed)",
            stats.played, stats.failed
        );
        stats
    });

    (SoundDispatcher { tx }, AlertWorker { handle })
}

async fn play(config: &AlertConfig) -> Result<(), AlertError> {
    let status = Command::new(&config.player_command)
        .args(&config.player_args)
        .arg(&config.sound_path)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .await
        .map_err(|source| AlertError::Launch {
            command: config.player_command.clone(),
            source,
        })?;

    if status.success() {
        Ok(())
    } else {
        Err(AlertError::PlayerExit(status))
    }
}

//! Drowsiness Monitor - Main Entry Point

use std::path::PathBuf;

use alerting::{spawn_sound_worker, LogDispatcher};
use anyhow::Context;
use camera_capture::{CameraConfig, MonotonicClock, ReplaySource, SystemClock};
use clap::Parser;
use dms::DmsModule;
use monitor::{init_logging, LogPresenter, Monitor, MonitorSettings, TraceDetector};
use tokio::sync::watch;
use tracing::{info, warn};

#[derive(Debug, Parser)]
#[command(version, about = "Eye-closure drowsiness monitor")]
struct Args {
    /// TOML settings file
    #[arg(short, long)]
    config: Option<PathBuf>,
    /// Directory of recorded frames
    #[arg(long)]
    frames: Option<PathBuf>,
    /// Detection trace (JSON Lines, one record per frame)
    #[arg(long)]
    detections: Option<PathBuf>,
    /// Replay pacing in frames per second
    #[arg(long)]
    fps: Option<f64>,
    /// Restart the recording when it ends
    #[arg(long = "loop")]
    looped: bool,
    /// Log alerts instead of playing the alarm
    #[arg(long)]
    mute: bool,
}

impl Args {
    fn apply(&self, settings: &mut MonitorSettings) {
        if let Some(frames) = &self.frames {
            settings.replay.frames_dir = frames.clone();
        }
        if let Some(detections) = &self.detections {
            settings.replay.detections_path = detections.clone();
        }
        if let Some(fps) = self.fps {
            settings.replay.fps = fps;
        }
        settings.replay.looped |= self.looped;
        settings.mute |= self.mute;
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let mut settings = MonitorSettings::load(args.config.as_deref())
        .context("Failed to load settings")?;
    args.apply(&mut settings);

    init_logging(&settings.logging);
    info!("=== Drowsiness Monitor v{} ===", env!("CARGO_PKG_VERSION"));
    settings.validate().context("Invalid settings")?;

    let clock = SystemClock::new();
    let source = ReplaySource::with_clock(
        &CameraConfig {
            frames_dir: settings.replay.frames_dir.clone(),
            looped: settings.replay.looped,
        },
        clock,
    )
    .context("Failed to open frame source")?;

    let (faces, eyes) = TraceDetector::open(&settings.replay.detections_path, settings.replay.looped)
        .context("Failed to open detection trace")?
        .split();

    let dms = DmsModule::new(settings.dms.clone(), Box::new(faces), Box::new(eyes), clock.now())?;
    let presenter = LogPresenter::new(dms.config().clone());

    let (stop_tx, stop_rx) = watch::channel(false);
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("Ctrl-C received, stopping");
                let _ = stop_tx.send(true);
            }
            Err(e) => warn!("Ctrl-C handler unavailable: {}", e),
        }
    });

    let frame_interval = settings.replay.frame_interval();
    info!(
        "Monitoring at {} fps (closed below {}, alert after {}s)",
        settings.replay.fps, settings.dms.closed_threshold, settings.dms.alert_seconds
    );

    if settings.mute {
        let mut monitor = Monitor::new(source, dms, LogDispatcher, presenter);
        monitor.run(stop_rx, frame_interval).await;
    } else {
        let (dispatcher, worker) = spawn_sound_worker(settings.alert.clone());
        let mut monitor = Monitor::new(source, dms, dispatcher, presenter);
        monitor.run(stop_rx, frame_interval).await;

        // Closing the last dispatcher lets the worker finish any pending alarm
        drop(monitor);
        let stats = worker.join().await;
        info!("Alarm worker stopped: {} played, {} failed", stats.played, stats.failed);
    }

    Ok(())
}

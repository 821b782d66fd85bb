//! The monitoring loop

use std::time::Duration;

use alerting::AlertDispatcher;
use camera_capture::FrameSource;
use dms::{DmsModule, FrameOutcome};
use tokio::sync::watch;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{info, warn};

use crate::panel::Presenter;

/// Frame counts for one monitoring session
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionSummary {
    pub frames: u64,
    pub analyzed: u64,
    /// Frames dropped by a detector or frame source failure
    pub skipped: u64,
    pub alerts: u64,
}

/// Ties the frame source, the DMS core, and its consumers together.
///
/// Frames are handled strictly one at a time: detect, analyse, alert, present.
pub struct Monitor<S, D, P> {
    source: S,
    dms: DmsModule,
    dispatcher: D,
    presenter: P,
    summary: SessionSummary,
}

impl<S, D, P> Monitor<S, D, P>
where
    S: FrameSource,
    D: AlertDispatcher,
    P: Presenter,
{
    pub fn new(source: S, dms: DmsModule, dispatcher: D, presenter: P) -> Self {
        Self {
            source,
            dms,
            dispatcher,
            presenter,
            summary: SessionSummary::default(),
        }
    }

    /// Run until the source is exhausted or `stop` flips to `true`.
    ///
    /// The stop signal is checked between frames only.
    pub async fn run(&mut self, mut stop: watch::Receiver<bool>, frame_interval: Duration) -> SessionSummary {
        let mut ticker = interval(frame_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;
                Ok(()) = stop.changed() => {}
                _ = ticker.tick() => {}
            }
            if *stop.borrow() {
                info!("Stop requested");
                break;
            }

            match self.source.next_frame() {
                Ok(Some(frame)) => {
                    self.process(&frame);
                }
                Ok(None) => {
                    info!("Frame source exhausted");
                    break;
                }
                Err(e) => {
                    self.summary.frames += 1;
                    self.summary.skipped += 1;
                    warn!("Dropping unreadable frame: {}", e);
                }
            }
        }

        info!(
            "Session ended: {} frames, {} analyzed, {} skipped, {} alerts",
            self.summary.frames, self.summary.analyzed, self.summary.skipped, self.summary.alerts
        );
        self.summary
    }

    /// Handle a single frame
    pub fn process(&mut self, frame: &camera_capture::VideoFrame) -> FrameOutcome {
        self.summary.frames += 1;

        let outcome = self.dms.process(frame);
        match &outcome {
            FrameOutcome::Analyzed(analysis) => {
                self.summary.analyzed += 1;
                if analysis.has_alert() {
                    self.summary.alerts += 1;
                    self.dispatcher.notify_alert();
                }
                self.presenter.present(analysis);
            }
            FrameOutcome::Skipped { .. } => {
                self.summary.skipped += 1;
            }
        }
        outcome
    }

    pub fn summary(&self) -> SessionSummary {
        self.summary
    }

    /// Give back the collaborators, e.g. to close the alarm channel
    pub fn into_parts(self) -> (S, DmsModule, D, P) {
        (self.source, self.dms, self.dispatcher, self.presenter)
    }
}

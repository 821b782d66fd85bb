//! Drowsiness Monitor
//!
//! Wires the frame source, the DMS core, the alarm, and the status panel into
//! a single per-frame loop.

pub mod panel;
pub mod session;
pub mod settings;
pub mod trace;

pub use panel::{LogPresenter, Presenter, StatusPanel};
pub use session::{Monitor, SessionSummary};
pub use settings::{LoggingSettings, MonitorSettings, ReplaySettings};
pub use trace::{TraceDetector, TraceError};

use tracing_subscriber::EnvFilter;

/// Initialize logging. `RUST_LOG` wins over the configured level.
pub fn init_logging(settings: &LoggingSettings) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&settings.level));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true);

    let result = if settings.json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };

    if let Err(e) = result {
        eprintln!("Logging already initialized: {e}");
    }
}

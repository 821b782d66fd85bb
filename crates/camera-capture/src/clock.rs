//! Monotonic frame clock

use std::time::{Duration, Instant};

/// Source of monotonic timestamps, expressed as an offset from a fixed origin.
pub trait MonotonicClock {
    fn now(&self) -> Duration;
}

/// Clock backed by [`Instant`]; the origin is the moment of construction.
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl MonotonicClock for SystemClock {
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }
}

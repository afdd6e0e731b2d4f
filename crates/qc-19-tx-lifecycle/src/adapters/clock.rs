//! Clock adapters.

use crate::ports::outbound::TimeSource;
use shared_types::Timestamp;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// Clock that only moves when told to.
#[derive(Debug, Default)]
pub struct ManualTimeSource {
    time: AtomicU64,
}

impl ManualTimeSource {
    pub fn new(initial: Timestamp) -> Self {
        Self {
            time: AtomicU64::new(initial),
        }
    }

    pub fn advance(&self, ms: u64) {
        self.time.fetch_add(ms, Ordering::SeqCst);
    }

    pub fn advance_by(&self, duration: Duration) {
        self.advance(duration.as_millis() as u64);
    }

    pub fn set(&self, time: Timestamp) {
        self.time.store(time, Ordering::SeqCst);
    }
}

impl TimeSource for ManualTimeSource {
    fn now(&self) -> Timestamp {
        self.time.load(Ordering::SeqCst)
    }
}

/// Clock driven by the tokio timer, offset from a fixed epoch.
///
/// Follows `tokio::time::pause`/`advance`, so supervisor ticks and
/// transaction timeouts share one timeline in tests.
#[derive(Debug, Clone, Copy)]
pub struct TokioTimeSource {
    origin: tokio::time::Instant,
    base: Timestamp,
}

impl TokioTimeSource {
    /// Reads `base` at the moment of construction.
    pub fn starting_at(base: Timestamp) -> Self {
        Self {
            origin: tokio::time::Instant::now(),
            base,
        }
    }
}

impl TimeSource for TokioTimeSource {
    fn now(&self) -> Timestamp {
        self.base + self.origin.elapsed().as_millis() as Timestamp
    }
}

#![forbid(unsafe_code)]

//! Time sources.
//!
//! Engine time is a [`Duration`] since the clock's epoch (page start). The
//! [`SystemClock`] reads the monotonic wall clock; [`LabClock`] is advanced
//! manually so timer-driven behavior is reproducible in tests and in the
//! web runner, where the host supplies timestamps.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use web_time::{Duration, Instant};

/// A monotonic time source.
pub trait Clock {
    /// Time elapsed since the clock's epoch. Never decreases.
    fn now(&self) -> Duration;
}

/// Real monotonic time.
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    epoch: Instant,
}

impl SystemClock {
    #[must_use]
    pub fn new() -> Self {
        Self {
            epoch: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now(&self) -> Duration {
        self.epoch.elapsed()
    }
}

/// A manually-advanceable clock for deterministic runs.
///
/// Clones share the same time.
#[derive(Debug, Clone, Default)]
pub struct LabClock {
    offset_us: Arc<AtomicU64>,
}

fn micros(d: Duration) -> u64 {
    u64::try_from(d.as_micros()).unwrap_or(u64::MAX)
}

impl LabClock {
    /// Create a lab clock at time zero.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Advance by `delta`.
    pub fn advance(&self, delta: Duration) {
        let us = micros(delta);
        let _ = self
            .offset_us
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |cur| {
                Some(cur.saturating_add(us))
            });
    }

    /// Jump to `at`; earlier times are ignored so the clock stays monotonic.
    pub fn set(&self, at: Duration) {
        self.offset_us.fetch_max(micros(at), Ordering::AcqRel);
    }
}

impl Clock for LabClock {
    fn now(&self) -> Duration {
        Duration::from_micros(self.offset_us.load(Ordering::Acquire))
    }
}

impl<C: Clock + ?Sized> Clock for &C {
    fn now(&self) -> Duration {
        (**self).now()
    }
}

//! Time sources for the session engine.
//!
//! Every elapsed, delta and throttle computation reads a [`Clock`]. The
//! default [`SystemClock`] is monotonic; [`ManualClock`] only moves when told
//! to, which makes throttling and rate behaviour reproducible.

use std::{sync::Arc, time::Duration};

use parking_lot::Mutex;
use web_time::{Instant, SystemTime};

/// A monotonic source of instants.
pub trait Clock: Send {
    /// The current instant.
    fn now(&self) -> Instant;
}

/// [`Instant::now`].
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// A cloneable clock that advances only through [`advance`](Self::advance).
///
/// Clones share the same instant, so a test can keep one handle while the
/// session owns another.
#[derive(Clone, Debug)]
pub struct ManualClock {
    now: Arc<Mutex<Instant>>,
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl ManualClock {
    /// Starts at the current instant.
    #[must_use]
    pub fn new() -> Self {
        Self::starting_at(Instant::now())
    }

    /// Starts at `start`.
    #[must_use]
    pub fn starting_at(start: Instant) -> Self {
        Self {
            now: Arc::new(Mutex::new(start)),
        }
    }

    /// Moves every clone of this clock forward by `by`.
    pub fn advance(&self, by: Duration) {
        *self.now.lock() += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        *self.now.lock()
    }
}

/// Time since `earlier`, zero if the clock went backwards.
pub(crate) fn elapsed_since(now: Instant, earlier: Instant) -> Duration {
    now.checked_duration_since(earlier).unwrap_or_default()
}

/// Wall-clock time since the Unix epoch, for the timestamp tags.
pub(crate) fn wall_time() -> Duration {
    SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .unwrap_or_default()
}

//! Timestamps that serve both deadlines and the log.

use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

/// A point in time read from both the monotonic and the wall clock.
///
/// Deadlines and durations use the monotonic half; the log prints the wall
/// half as seconds since the Unix epoch.
#[derive(Clone, Copy, Debug)]
pub struct Stamp {
    instant: Instant,
    wall: SystemTime,
}

impl Stamp {
    pub fn now() -> Self {
        Stamp {
            instant: Instant::now(),
            wall: SystemTime::now(),
        }
    }

    pub fn instant(&self) -> Instant {
        self.instant
    }

    /// Wall-clock seconds since the Unix epoch.
    pub fn epoch_secs(&self) -> f64 {
        self.wall
            .duration_since(UNIX_EPOCH)
            .map_or(0.0, |d| d.as_secs_f64())
    }

    /// Monotonic time elapsed from `earlier` to `self`, zero if negative.
    pub fn since(&self, earlier: Stamp) -> Duration {
        self.instant.saturating_duration_since(earlier.instant)
    }

    /// A stamp `offset` later than `self` on both clocks.
    pub fn later_by(&self, offset: Duration) -> Self {
        Stamp {
            instant: self.instant + offset,
            wall: self.wall + offset,
        }
    }
}

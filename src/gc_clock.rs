//! Garbage-collection clock used for tombstone and TTL expiry times.

use std::{
    fmt,
    time::{Duration, SystemTime, UNIX_EPOCH},
};

/// Point in time on the gc clock, in whole seconds since the Unix epoch.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct GcTimePoint(i64);

impl GcTimePoint {
    /// The clock's epoch, also the expiry of an empty tombstone.
    pub const EPOCH: Self = Self(0);

    /// Build a time point from seconds since the epoch.
    #[inline]
    pub const fn from_secs(secs: i64) -> Self {
        Self(secs)
    }

    /// Seconds since the epoch.
    #[inline]
    pub const fn as_secs(self) -> i64 {
        self.0
    }

    /// Current wall-clock time truncated to seconds.
    pub fn now() -> Self {
        let secs = match SystemTime::now().duration_since(UNIX_EPOCH) {
            Ok(elapsed) => i64::try_from(elapsed.as_secs()).unwrap_or(i64::MAX),
            Err(before) => -i64::try_from(before.duration().as_secs()).unwrap_or(i64::MAX),
        };
        Self(secs)
    }

    /// Add a TTL, saturating at the end of the clock.
    pub fn saturating_add(self, ttl: Duration) -> Self {
        let secs = i64::try_from(ttl.as_secs()).unwrap_or(i64::MAX);
        Self(self.0.saturating_add(secs))
    }
}

impl fmt::Debug for GcTimePoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("GcTimePoint").field(&self.0).finish()
    }
}

impl fmt::Display for GcTimePoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

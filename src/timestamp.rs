//! Write timestamps and the clock that hands them out to mutation builders.

use std::fmt;

/// Logical write timestamp attached to cells and tombstones.
///
/// Values are totally ordered; the smallest representable value is reserved
/// as [`Timestamp::MISSING`] and marks "no write happened".
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timestamp(i64);

impl Timestamp {
    /// Sentinel carried by empty tombstones.
    pub const MISSING: Self = Self(i64::MIN);
    /// Least timestamp a real write may carry.
    pub const MIN: Self = Self(i64::MIN + 1);
    /// Greatest possible timestamp.
    pub const MAX: Self = Self(i64::MAX);

    /// Construct a timestamp from a raw `i64`.
    #[inline]
    pub const fn new(raw: i64) -> Self {
        Self(raw)
    }

    /// Returns the raw `i64` value backing this timestamp.
    #[inline]
    pub const fn get(self) -> i64 {
        self.0
    }

    /// Whether this is the [`Timestamp::MISSING`] sentinel.
    #[inline]
    pub const fn is_missing(self) -> bool {
        self.0 == i64::MIN
    }

    /// Returns the next timestamp after `self`, saturating on overflow.
    #[inline]
    pub const fn next(self) -> Self {
        Self(self.0.saturating_add(1))
    }
}

impl From<i64> for Timestamp {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl From<Timestamp> for i64 {
    fn from(ts: Timestamp) -> Self {
        ts.0
    }
}

impl fmt::Debug for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_missing() {
            f.write_str("Timestamp(MISSING)")
        } else {
            f.debug_tuple("Timestamp").field(&self.0).finish()
        }
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Tracks the next write timestamp to allocate.
#[derive(Debug, Clone, Copy)]
pub struct TimestampClock {
    next: Timestamp,
}

impl TimestampClock {
    /// Create a new clock that will hand out timestamps starting from `start`.
    ///
    /// A `start` below [`Timestamp::MIN`] is raised to it.
    #[inline]
    pub fn new(start: Timestamp) -> Self {
        Self {
            next: start.max(Timestamp::MIN),
        }
    }

    /// Allocate and return the next write timestamp.
    #[inline]
    pub fn next(&mut self) -> Timestamp {
        let current = self.next;
        self.next = current.next();
        current
    }

    /// Return the timestamp that will be handed out next.
    #[inline]
    pub const fn peek(&self) -> Timestamp {
        self.next
    }

    /// Advance the clock so that it will hand out at least `candidate`.
    #[inline]
    pub fn advance_to_at_least(&mut self, candidate: Timestamp) {
        if candidate > self.next {
            self.next = candidate;
        }
    }
}

impl Default for TimestampClock {
    fn default() -> Self {
        Self::new(Timestamp::MIN)
    }
}

//! Deletion markers.

use std::{cmp::Ordering, fmt};

use crate::{gc_clock::GcTimePoint, timestamp::Timestamp};

/// A deletion marker: everything written at or before `timestamp` is deleted.
///
/// `expiry` is the gc-clock time after which the marker itself may be
/// reclaimed. Tombstones merge with [`Tombstone::apply`], which keeps the
/// greater of the two, so merging is idempotent, commutative and associative.
///
/// The default tombstone carries [`Timestamp::MISSING`] and represents the
/// absence of a deletion; it compares below every real tombstone.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Tombstone {
    /// Write time of the deletion.
    pub timestamp: Timestamp,
    /// Gc-clock time after which the tombstone may be purged.
    pub expiry: GcTimePoint,
}

impl Tombstone {
    /// The "no deletion" tombstone.
    pub const NONE: Self = Self {
        timestamp: Timestamp::MISSING,
        expiry: GcTimePoint::EPOCH,
    };

    /// Build a tombstone.
    pub const fn new(timestamp: Timestamp, expiry: GcTimePoint) -> Self {
        Self { timestamp, expiry }
    }

    /// Whether this represents an actual deletion.
    pub const fn is_deletion(&self) -> bool {
        !self.timestamp.is_missing()
    }

    /// Merge `other` into `self`, keeping the greater of the two.
    pub fn apply(&mut self, other: Tombstone) {
        if *self < other {
            *self = other;
        }
    }

    /// Whether a write at `timestamp` is shadowed by this tombstone.
    pub fn deletes(&self, timestamp: Timestamp) -> bool {
        self.is_deletion() && timestamp <= self.timestamp
    }
}

impl Default for Tombstone {
    fn default() -> Self {
        Self::NONE
    }
}

impl PartialOrd for Tombstone {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Tombstone {
    fn cmp(&self, other: &Self) -> Ordering {
        self.timestamp
            .cmp(&other.timestamp)
            .then_with(|| self.expiry.cmp(&other.expiry))
    }
}

impl fmt::Debug for Tombstone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

impl fmt::Display for Tombstone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{timestamp={}, ttl={}}}", self.timestamp, self.expiry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(ts: i64, expiry: i64) -> Tombstone {
        Tombstone::new(Timestamp::new(ts), GcTimePoint::from_secs(expiry))
    }

    #[test]
    fn orders_by_timestamp_then_expiry() {
        assert!(t(1, 100) < t(2, 0));
        assert!(t(2, 0) < t(2, 1));
        assert_eq!(t(3, 3).cmp(&t(3, 3)), Ordering::Equal);
        assert!(Tombstone::NONE < t(i64::MIN + 1, 0));
    }

    #[test]
    fn apply_keeps_the_greater_tombstone() {
        let (a, b) = (t(5, 10), t(7, 1));

        let mut ab = a;
        ab.apply(b);
        let mut ba = b;
        ba.apply(a);
        assert_eq!(ab, b);
        assert_eq!(ab, ba);

        let mut aa = a;
        aa.apply(a);
        assert_eq!(aa, a);

        let mut older = b;
        older.apply(a);
        assert_eq!(older, b);
    }

    #[test]
    fn empty_tombstone_is_not_a_deletion() {
        assert!(!Tombstone::default().is_deletion());
        assert!(t(0, 0).is_deletion());
        assert!(!Tombstone::NONE.deletes(Timestamp::MIN));
    }

    #[test]
    fn deletes_writes_at_or_before_its_timestamp() {
        let tomb = t(10, 0);
        assert!(tomb.deletes(Timestamp::new(9)));
        assert!(tomb.deletes(Timestamp::new(10)));
        assert!(!tomb.deletes(Timestamp::new(11)));
    }

    #[test]
    fn renders_timestamp_and_ttl() {
        assert_eq!(t(10, 42).to_string(), "{timestamp=10, ttl=42}");
    }
}

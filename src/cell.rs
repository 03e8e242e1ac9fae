//! Atomic cells: one column's value or deletion marker at one write time.

use std::{cmp::Ordering, fmt};

use bytes::Bytes;

use crate::{gc_clock::GcTimePoint, timestamp::Timestamp, tombstone::Tombstone};

/// Payload of a live cell.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct LiveCell {
    /// TTL expiry. `None` means the cell never expires on its own.
    pub expiry: Option<GcTimePoint>,
    /// Opaque, schema-encoded value.
    pub value: Bytes,
}

/// Payload of a dead (deleted) cell.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct DeadCell {
    /// Gc-clock time after which the marker may be purged.
    pub expiry: GcTimePoint,
}

/// State of an [`AtomicCell`].
#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub enum CellState {
    /// The column was deleted.
    Dead(DeadCell),
    /// The column holds a value.
    Live(LiveCell),
}

/// Smallest versioned unit of data.
#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub struct AtomicCell {
    /// Write time used for reconciliation.
    pub timestamp: Timestamp,
    /// Live payload or deletion marker.
    pub state: CellState,
}

impl AtomicCell {
    /// Build a live cell.
    pub fn live(timestamp: Timestamp, expiry: Option<GcTimePoint>, value: impl Into<Bytes>) -> Self {
        Self {
            timestamp,
            state: CellState::Live(LiveCell {
                expiry,
                value: value.into(),
            }),
        }
    }

    /// Build a dead cell.
    pub fn dead(timestamp: Timestamp, expiry: GcTimePoint) -> Self {
        Self {
            timestamp,
            state: CellState::Dead(DeadCell { expiry }),
        }
    }

    /// Whether the cell holds a value.
    pub fn is_live(&self) -> bool {
        matches!(self.state, CellState::Live(_))
    }

    /// Live payload of the cell.
    ///
    /// # Panics
    ///
    /// Panics if the cell is dead. Callers must check [`AtomicCell::is_live`].
    pub fn as_live(&self) -> &LiveCell {
        match &self.state {
            CellState::Live(live) => live,
            CellState::Dead(_) => panic!("as_live called on a dead cell at {:?}", self.timestamp),
        }
    }

    /// Deletion marker of the cell.
    ///
    /// # Panics
    ///
    /// Panics if the cell is live. Callers must check [`AtomicCell::is_live`].
    pub fn as_dead(&self) -> &DeadCell {
        match &self.state {
            CellState::Dead(dead) => dead,
            CellState::Live(_) => panic!("as_dead called on a live cell at {:?}", self.timestamp),
        }
    }

    /// Live payload, if the cell holds a value that is not shadowed by
    /// `tombstone` and has not reached its TTL at `now`.
    pub fn visible(&self, tombstone: &Tombstone, now: GcTimePoint) -> Option<&LiveCell> {
        if tombstone.deletes(self.timestamp) {
            return None;
        }
        match &self.state {
            CellState::Live(live) if live.expiry.map_or(true, |expiry| expiry > now) => Some(live),
            _ => None,
        }
    }

    /// Total order used by [`AtomicCell::reconcile`]; the greater cell wins.
    ///
    /// Timestamp first. On a tie a dead cell beats a live one. Two dead cells
    /// compare by expiry. Two live cells compare by value bytes, then an
    /// expiring cell beats a non-expiring one, then the later expiry wins.
    pub fn compare_for_merge(&self, other: &AtomicCell) -> Ordering {
        self.timestamp
            .cmp(&other.timestamp)
            .then_with(|| match (&self.state, &other.state) {
                (CellState::Dead(_), CellState::Live(_)) => Ordering::Greater,
                (CellState::Live(_), CellState::Dead(_)) => Ordering::Less,
                (CellState::Dead(lhs), CellState::Dead(rhs)) => lhs.expiry.cmp(&rhs.expiry),
                (CellState::Live(lhs), CellState::Live(rhs)) => lhs
                    .value
                    .cmp(&rhs.value)
                    .then_with(|| lhs.expiry.cmp(&rhs.expiry)),
            })
    }

    /// Merge `other` into `self`, keeping the greater cell under
    /// [`AtomicCell::compare_for_merge`].
    ///
    /// Returns `true` when `self` was replaced.
    pub fn reconcile(&mut self, other: &AtomicCell) -> bool {
        if self.compare_for_merge(other) == Ordering::Less {
            *self = other.clone();
            true
        } else {
            false
        }
    }
}

impl fmt::Debug for LiveCell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LiveCell")
            .field("expiry", &self.expiry)
            .field("value_len", &self.value.len())
            .finish()
    }
}

impl fmt::Display for AtomicCell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.state {
            CellState::Live(live) => match live.expiry {
                Some(expiry) => write!(
                    f,
                    "{{live, timestamp={}, ttl={}, len={}}}",
                    self.timestamp,
                    expiry,
                    live.value.len()
                ),
                None => write!(
                    f,
                    "{{live, timestamp={}, len={}}}",
                    self.timestamp,
                    live.value.len()
                ),
            },
            CellState::Dead(dead) => {
                write!(f, "{{dead, timestamp={}, ttl={}}}", self.timestamp, dead.expiry)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn live(ts: i64, value: &'static str) -> AtomicCell {
        AtomicCell::live(Timestamp::new(ts), None, value)
    }

    fn dead(ts: i64) -> AtomicCell {
        AtomicCell::dead(Timestamp::new(ts), GcTimePoint::from_secs(0))
    }

    fn merged(a: &AtomicCell, b: &AtomicCell) -> AtomicCell {
        let mut out = a.clone();
        out.reconcile(b);
        out
    }

    #[test]
    fn discriminates_live_and_dead() {
        assert!(live(1, "x").is_live());
        assert!(!dead(1).is_live());
        assert_eq!(live(1, "x").as_live().value, Bytes::from_static(b"x"));
        assert_eq!(dead(1).as_dead().expiry, GcTimePoint::EPOCH);
    }

    #[test]
    #[should_panic(expected = "as_live called on a dead cell")]
    fn live_payload_of_dead_cell_panics() {
        let _ = dead(1).as_live();
    }

    #[test]
    #[should_panic(expected = "as_dead called on a live cell")]
    fn dead_payload_of_live_cell_panics() {
        let _ = live(1, "x").as_dead();
    }

    #[test]
    fn higher_timestamp_wins_both_ways() {
        assert_eq!(merged(&live(100, "1"), &dead(50)), live(100, "1"));
        assert_eq!(merged(&dead(50), &live(100, "1")), live(100, "1"));
        assert_eq!(merged(&dead(100), &live(50, "1")), dead(100));
        assert_eq!(merged(&live(50, "1"), &dead(100)), dead(100));
    }

    #[test]
    fn timestamp_ties_resolve_independently_of_order() {
        let a = live(7, "a");
        let b = live(7, "b");
        let d = dead(7);

        assert_eq!(merged(&a, &b), b);
        assert_eq!(merged(&b, &a), b);
        assert_eq!(merged(&a, &d), d);
        assert_eq!(merged(&d, &a), d);

        let expiring = AtomicCell::live(Timestamp::new(7), Some(GcTimePoint::from_secs(9)), "a");
        assert_eq!(merged(&a, &expiring), expiring);
        assert_eq!(merged(&expiring, &a), expiring);
    }

    #[test]
    fn reconcile_is_idempotent() {
        let mut cell = live(3, "v");
        assert!(!cell.reconcile(&live(3, "v")));
        assert_eq!(cell, live(3, "v"));
    }

    #[test]
    fn visibility_honours_tombstone_and_ttl() {
        let now = GcTimePoint::from_secs(100);
        let tomb = Tombstone::new(Timestamp::new(10), GcTimePoint::EPOCH);

        assert!(live(10, "x").visible(&tomb, now).is_none());
        assert!(live(11, "x").visible(&tomb, now).is_some());
        assert!(dead(11).visible(&tomb, now).is_none());

        let expired = AtomicCell::live(Timestamp::new(20), Some(GcTimePoint::from_secs(100)), "x");
        assert!(expired.visible(&Tombstone::NONE, now).is_none());
        let fresh = AtomicCell::live(Timestamp::new(20), Some(GcTimePoint::from_secs(101)), "x");
        assert!(fresh.visible(&Tombstone::NONE, now).is_some());
    }
}

//! Ordered map over serialized keys with an explicit comparator.
//!
//! Keys are opaque byte strings whose order is defined by a schema-supplied
//! [`KeyComparator`] rather than by byte order. Every key stored in a map
//! carries a handle to the map's comparator so the underlying `BTreeMap` can
//! order it.

use std::{
    cmp::Ordering,
    collections::{btree_map, BTreeMap},
    fmt,
    sync::Arc,
};

use bytes::Bytes;

use crate::types::KeyComparator;

/// Shared comparator handle.
pub type ComparatorRef = Arc<dyn KeyComparator>;

#[derive(Clone)]
struct OrderedKey {
    bytes: Bytes,
    comparator: ComparatorRef,
}

impl PartialEq for OrderedKey {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for OrderedKey {}

impl PartialOrd for OrderedKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for OrderedKey {
    fn cmp(&self, other: &Self) -> Ordering {
        self.comparator.compare(&self.bytes, &other.bytes)
    }
}

/// Ordered map keyed by serialized keys under a caller-supplied comparator.
#[derive(Clone)]
pub struct ComparatorMap<V> {
    comparator: ComparatorRef,
    entries: BTreeMap<OrderedKey, V>,
}

impl<V> ComparatorMap<V> {
    /// Create an empty map ordered by `comparator`.
    pub fn new(comparator: ComparatorRef) -> Self {
        Self {
            comparator,
            entries: BTreeMap::new(),
        }
    }

    fn key(&self, bytes: &Bytes) -> OrderedKey {
        OrderedKey {
            bytes: bytes.clone(),
            comparator: Arc::clone(&self.comparator),
        }
    }

    /// Value stored under `key`.
    pub fn get(&self, key: &Bytes) -> Option<&V> {
        self.entries.get(&self.key(key))
    }

    /// Mutable value stored under `key`.
    pub fn get_mut(&mut self, key: &Bytes) -> Option<&mut V> {
        let key = self.key(key);
        self.entries.get_mut(&key)
    }

    /// Insert `value`, returning the previous value for an equal key.
    pub fn insert(&mut self, key: Bytes, value: V) -> Option<V> {
        let key = self.key(&key);
        self.entries.insert(key, value)
    }

    /// Value under `key`, inserting `make()` first when absent.
    pub fn entry_or_insert_with(&mut self, key: Bytes, make: impl FnOnce() -> V) -> &mut V {
        let key = self.key(&key);
        self.entries.entry(key).or_insert_with(make)
    }

    /// Entries in comparator order.
    pub fn iter(&self) -> Iter<'_, V> {
        Iter {
            inner: self.entries.iter(),
        }
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the map is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<V: fmt::Debug> fmt::Debug for ComparatorMap<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(self.entries.iter().map(|(k, v)| (&k.bytes, v)))
            .finish()
    }
}

/// Iterator over a [`ComparatorMap`] in key order.
pub struct Iter<'a, V> {
    inner: btree_map::Iter<'a, OrderedKey, V>,
}

impl<'a, V> Iterator for Iter<'a, V> {
    type Item = (&'a Bytes, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(key, value)| (&key.bytes, value))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{DataType, TupleType, Value};

    fn int_map() -> (TupleType, ComparatorMap<&'static str>) {
        let ty = TupleType::new(vec![DataType::Int32]);
        let map = ComparatorMap::new(Arc::new(ty.clone()));
        (ty, map)
    }

    fn int_key(ty: &TupleType, v: i32) -> Bytes {
        ty.serialize(&[Value::from(v)]).expect("serialize")
    }

    #[test]
    fn iterates_in_comparator_order() {
        let (ty, mut map) = int_map();
        map.insert(int_key(&ty, 3), "three");
        map.insert(int_key(&ty, -1), "minus one");
        map.insert(int_key(&ty, 1), "one");

        let values: Vec<_> = map.iter().map(|(_, v)| *v).collect();
        assert_eq!(values, vec!["minus one", "one", "three"]);
    }

    #[test]
    fn equal_keys_replace() {
        let (ty, mut map) = int_map();
        assert!(map.insert(int_key(&ty, 1), "a").is_none());
        assert_eq!(map.insert(int_key(&ty, 1), "b"), Some("a"));
        assert_eq!(map.len(), 1);
        assert_eq!(map.get(&int_key(&ty, 1)), Some(&"b"));
        assert!(map.get(&int_key(&ty, 2)).is_none());
    }

    #[test]
    fn entry_or_insert_with_only_creates_once() {
        let (ty, mut map) = int_map();
        *map.entry_or_insert_with(int_key(&ty, 5), || "first") = "edited";
        let value = map.entry_or_insert_with(int_key(&ty, 5), || "second");
        assert_eq!(*value, "edited");
    }
}

//! Partition state and the merge algebra over it.
//!
//! A [`MutationPartition`] holds every kind of state a partition can carry:
//! a partition tombstone, the static row, clustering rows with their own
//! tombstones, and range tombstones keyed by serialized clustering prefixes.
//! Merging two partitions is the pointwise merge of these parts, each of
//! which is a max under a total order, so the merge converges regardless of
//! the order or grouping in which replicas combine updates.
//!
//! Deletions never purge data. Reads compute the effective tombstone for a
//! row and mask cells it shadows.

use std::fmt;

use bytes::Bytes;

use crate::{
    cell::{AtomicCell, LiveCell},
    gc_clock::GcTimePoint,
    observability::log_trace,
    ordered::{ComparatorMap, Iter},
    row::{ColumnId, DeletableRow, Row},
    schema::{Schema, SchemaError},
    tombstone::Tombstone,
    types::Value,
};

/// Serialized full clustering key.
pub type ClusteringKey = Bytes;

/// Serialized clustering prefix, possibly shorter than a full key.
pub type ClusteringPrefix = Bytes;

/// All state of one partition.
#[derive(Clone)]
pub struct MutationPartition {
    tombstone: Tombstone,
    static_row: Row,
    rows: ComparatorMap<DeletableRow>,
    row_tombstones: ComparatorMap<Tombstone>,
}

impl MutationPartition {
    /// Create an empty partition ordered by `schema`'s clustering comparators.
    pub fn new(schema: &Schema) -> Self {
        Self {
            tombstone: Tombstone::NONE,
            static_row: Row::new(),
            rows: ComparatorMap::new(schema.clustering_key_type().clone()),
            row_tombstones: ComparatorMap::new(schema.clustering_key_prefix_type().clone()),
        }
    }

    /// Partition-level tombstone.
    pub fn tombstone(&self) -> Tombstone {
        self.tombstone
    }

    /// Merge a partition-level tombstone.
    pub fn apply_tombstone(&mut self, tombstone: Tombstone) {
        self.tombstone.apply(tombstone);
    }

    /// Record a deletion over a clustering prefix.
    ///
    /// An empty prefix deletes the partition, a full clustering key deletes
    /// one row, and anything in between becomes a range tombstone.
    pub fn apply_delete(
        &mut self,
        schema: &Schema,
        prefix: &[Value],
        tombstone: Tombstone,
    ) -> Result<(), SchemaError> {
        if prefix.is_empty() {
            self.apply_tombstone(tombstone);
        } else if prefix.len() == schema.clustering_key_size() {
            let key = schema.clustering_key(prefix)?;
            self.rows
                .entry_or_insert_with(key, DeletableRow::default)
                .tombstone
                .apply(tombstone);
        } else {
            let prefix = schema.clustering_prefix(prefix)?;
            self.apply_row_tombstone(prefix, tombstone);
        }
        Ok(())
    }

    /// Merge a range tombstone keyed by a serialized clustering prefix.
    pub fn apply_row_tombstone(&mut self, prefix: ClusteringPrefix, tombstone: Tombstone) {
        self.row_tombstones
            .entry_or_insert_with(prefix, || Tombstone::NONE)
            .apply(tombstone);
    }

    /// Merge `other` into `self`.
    pub fn apply(&mut self, schema: &Schema, other: &MutationPartition) {
        log_trace!(
            event = "partition_merge",
            table = %schema,
            rows = other.rows.len(),
            row_tombstones = other.row_tombstones.len(),
            static_cells = other.static_row.len(),
        );
        self.tombstone.apply(other.tombstone);
        self.static_row.apply(&other.static_row);
        for (prefix, tombstone) in other.row_tombstones.iter() {
            self.apply_row_tombstone(prefix.clone(), *tombstone);
        }
        for (key, row) in other.rows.iter() {
            match self.rows.get_mut(key) {
                Some(existing) => existing.apply(row),
                None => {
                    self.rows.insert(key.clone(), row.clone());
                }
            }
        }
    }

    /// Range tombstones in prefix order.
    pub fn row_tombstones(&self) -> &ComparatorMap<Tombstone> {
        &self.row_tombstones
    }

    /// Static row.
    pub fn static_row(&self) -> &Row {
        &self.static_row
    }

    /// Mutable static row.
    pub fn static_row_mut(&mut self) -> &mut Row {
        &mut self.static_row
    }

    /// Cells of the clustering row at `key`, creating an empty row if needed.
    pub fn clustered_row(&mut self, key: ClusteringKey) -> &mut Row {
        &mut self
            .rows
            .entry_or_insert_with(key, DeletableRow::default)
            .cells
    }

    /// Cells stored for `key`. `None` means no explicit row state, which is
    /// not the same as deleted.
    pub fn find_row(&self, key: &ClusteringKey) -> Option<&Row> {
        self.rows.get(key).map(|row| &row.cells)
    }

    /// Row state, including its own tombstone, stored for `key`.
    pub fn find_deletable_row(&self, key: &ClusteringKey) -> Option<&DeletableRow> {
        self.rows.get(key)
    }

    /// Clustering rows in clustering order.
    pub fn rows(&self) -> Iter<'_, DeletableRow> {
        self.rows.iter()
    }

    /// Effective tombstone deleting the row at `key`: the greatest of the
    /// partition tombstone, every range tombstone whose prefix matches `key`,
    /// and the row's own tombstone.
    pub fn tombstone_for_row(&self, schema: &Schema, key: &ClusteringKey) -> Tombstone {
        let mut tombstone = self.tombstone;
        if !self.row_tombstones.is_empty() {
            let prefix_type = schema.clustering_key_prefix_type();
            let candidates = std::iter::once(Bytes::new())
                .chain(prefix_type.strict_prefixes(key))
                .chain(std::iter::once(key.clone()));
            for prefix in candidates {
                if let Some(range) = self.row_tombstones.get(&prefix) {
                    tombstone.apply(*range);
                }
            }
        }
        if let Some(row) = self.rows.get(key) {
            tombstone.apply(row.tombstone);
        }
        tombstone
    }

    /// Live cell at (`key`, `column`) as seen by a read at `now`.
    ///
    /// Returns `None` when the column is unset, dead, past its TTL, or
    /// shadowed by the row's effective tombstone.
    pub fn live_cell(
        &self,
        schema: &Schema,
        key: &ClusteringKey,
        column: ColumnId,
        now: GcTimePoint,
    ) -> Option<&LiveCell> {
        let cell = self.rows.get(key)?.cells.cell(column)?;
        cell.visible(&self.tombstone_for_row(schema, key), now)
    }

    /// Live static cell for `column` as seen by a read at `now`.
    pub fn static_live_cell(&self, column: ColumnId, now: GcTimePoint) -> Option<&LiveCell> {
        self.static_row.cell(column)?.visible(&self.tombstone, now)
    }

    /// Raw cell stored at (`key`, `column`), ignoring tombstones.
    pub fn raw_cell(&self, key: &ClusteringKey, column: ColumnId) -> Option<&AtomicCell> {
        self.rows.get(key)?.cells.cell(column)
    }

    /// Whether the partition carries no state at all.
    pub fn is_empty(&self) -> bool {
        !self.tombstone.is_deletion()
            && self.static_row.is_empty()
            && self.rows.is_empty()
            && self.row_tombstones.is_empty()
    }
}

impl fmt::Debug for MutationPartition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

impl fmt::Display for MutationPartition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{{mutation_partition: tombstone={}, static={}, rows=[",
            self.tombstone, self.static_row
        )?;
        for (idx, (key, row)) in self.rows.iter().enumerate() {
            if idx > 0 {
                f.write_str(", ")?;
            }
            write!(
                f,
                "{{key={}, tombstone={}, cells={}}}",
                HexKey(key),
                row.tombstone,
                row.cells
            )?;
        }
        f.write_str("], row_tombstones=[")?;
        for (idx, (prefix, tombstone)) in self.row_tombstones.iter().enumerate() {
            if idx > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{{prefix={}, tombstone={}}}", HexKey(prefix), tombstone)?;
        }
        f.write_str("]}")
    }
}

pub(crate) struct HexKey<'a>(pub(crate) &'a [u8]);

impl fmt::Display for HexKey<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in self.0 {
            write!(f, "{byte:02x}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        schema::{ColumnKind, SchemaBuilder, SchemaRef},
        timestamp::Timestamp,
        types::DataType,
    };

    const NOW: GcTimePoint = GcTimePoint::from_secs(1_000);

    fn schema() -> SchemaRef {
        SchemaBuilder::new("ks", "t")
            .with_column("pk", DataType::Utf8, ColumnKind::PartitionKey)
            .with_column("a", DataType::Utf8, ColumnKind::ClusteringKey)
            .with_column("b", DataType::Int32, ColumnKind::ClusteringKey)
            .with_column("s", DataType::Utf8, ColumnKind::Static)
            .with_column("v", DataType::Utf8, ColumnKind::Regular)
            .build()
            .expect("schema")
    }

    fn key(schema: &Schema, a: &str, b: i32) -> ClusteringKey {
        schema
            .clustering_key(&[Value::from(a), Value::from(b)])
            .expect("key")
    }

    fn tomb(ts: i64) -> Tombstone {
        Tombstone::new(Timestamp::new(ts), GcTimePoint::EPOCH)
    }

    fn live(ts: i64, value: &'static str) -> AtomicCell {
        AtomicCell::live(Timestamp::new(ts), None, value)
    }

    #[test]
    fn partition_tombstone_masks_without_purging() {
        let schema = schema();
        let mut p = MutationPartition::new(&schema);
        let k1 = key(&schema, "k", 1);
        p.clustered_row(k1.clone()).set_cell(0, live(5, "x"));

        p.apply_tombstone(tomb(10));

        assert_eq!(p.tombstone_for_row(&schema, &k1).timestamp, Timestamp::new(10));
        assert!(p.live_cell(&schema, &k1, 0, NOW).is_none());
        assert_eq!(p.raw_cell(&k1, 0), Some(&live(5, "x")));
    }

    #[test]
    fn partition_tombstone_covers_rows_that_do_not_exist() {
        let schema = schema();
        let mut p = MutationPartition::new(&schema);
        p.apply_tombstone(tomb(3));
        let missing = key(&schema, "nobody", 0);
        assert!(p.find_row(&missing).is_none());
        assert!(p.tombstone_for_row(&schema, &missing) >= tomb(3));
    }

    #[test]
    fn full_key_delete_lands_on_the_row() {
        let schema = schema();
        let mut p = MutationPartition::new(&schema);
        p.apply_delete(&schema, &[Value::from("k"), Value::from(2_i32)], tomb(7))
            .expect("delete");

        let k = key(&schema, "k", 2);
        assert!(p.row_tombstones().is_empty());
        assert_eq!(
            p.find_deletable_row(&k).map(DeletableRow::tombstone),
            Some(tomb(7))
        );
        assert_eq!(p.tombstone_for_row(&schema, &k), tomb(7));
        assert_eq!(p.tombstone_for_row(&schema, &key(&schema, "k", 3)), Tombstone::NONE);
    }

    #[test]
    fn empty_prefix_delete_is_a_partition_delete() {
        let schema = schema();
        let mut p = MutationPartition::new(&schema);
        p.apply_delete(&schema, &[], tomb(4)).expect("delete");
        assert_eq!(p.tombstone(), tomb(4));
    }

    #[test]
    fn range_delete_covers_matching_rows_only() {
        let schema = schema();
        let mut p = MutationPartition::new(&schema);
        let a1 = key(&schema, "a", 1);
        let a2 = key(&schema, "a", 2);
        let b1 = key(&schema, "b", 1);
        p.clustered_row(a1.clone()).set_cell(0, live(5, "old"));
        p.clustered_row(a2.clone()).set_cell(0, live(20, "new"));
        p.clustered_row(b1.clone()).set_cell(0, live(5, "other"));

        p.apply_delete(&schema, &[Value::from("a")], tomb(10))
            .expect("delete");

        assert_eq!(p.row_tombstones().len(), 1);
        assert!(p.live_cell(&schema, &a1, 0, NOW).is_none());
        assert!(p.live_cell(&schema, &a2, 0, NOW).is_some());
        assert!(p.live_cell(&schema, &b1, 0, NOW).is_some());
        assert_eq!(p.tombstone_for_row(&schema, &b1), Tombstone::NONE);

        // Lookup by serialized prefix matches component-wise prefix tests.
        let prefix_type = schema.clustering_key_prefix_type();
        for (prefix, _) in p.row_tombstones().iter() {
            for row in [&a1, &a2, &b1] {
                let covered = p.tombstone_for_row(&schema, row) == tomb(10);
                assert_eq!(prefix_type.is_prefix_of(prefix, row), covered, "{row:?}");
            }
        }
    }

    #[test]
    fn row_tombstones_merge_per_prefix() {
        let schema = schema();
        let prefix = schema.clustering_prefix(&[Value::from("a")]).expect("prefix");
        let mut p = MutationPartition::new(&schema);
        p.apply_row_tombstone(prefix.clone(), tomb(10));
        p.apply_row_tombstone(prefix.clone(), tomb(4));
        assert_eq!(p.row_tombstones().get(&prefix), Some(&tomb(10)));
    }

    #[test]
    fn effective_tombstone_is_the_greatest_layer() {
        let schema = schema();
        let k = key(&schema, "a", 1);
        let mut p = MutationPartition::new(&schema);
        p.apply_tombstone(tomb(3));
        p.apply_delete(&schema, &[Value::from("a")], tomb(8))
            .expect("range");
        p.apply_delete(&schema, &[Value::from("a"), Value::from(1_i32)], tomb(6))
            .expect("row");
        assert_eq!(p.tombstone_for_row(&schema, &k), tomb(8));
    }

    #[test]
    fn merge_combines_every_layer() {
        let schema = schema();
        let k = key(&schema, "a", 1);

        let mut left = MutationPartition::new(&schema);
        left.static_row_mut().set_cell(0, live(1, "s1"));
        left.clustered_row(k.clone()).set_cell(0, live(100, "1"));

        let mut right = MutationPartition::new(&schema);
        right.static_row_mut().set_cell(0, live(2, "s2"));
        right
            .clustered_row(k.clone())
            .set_cell(0, AtomicCell::dead(Timestamp::new(50), GcTimePoint::EPOCH));
        right.apply_tombstone(tomb(1));
        right.apply_row_tombstone(
            schema.clustering_prefix(&[Value::from("z")]).expect("prefix"),
            tomb(9),
        );

        left.apply(&schema, &right);

        assert_eq!(left.tombstone(), tomb(1));
        assert_eq!(left.static_row().cell(0), Some(&live(2, "s2")));
        assert_eq!(left.raw_cell(&k, 0), Some(&live(100, "1")));
        assert_eq!(left.row_tombstones().len(), 1);
        assert_eq!(
            left.live_cell(&schema, &k, 0, NOW).map(|c| c.value.clone()),
            Some(Bytes::from_static(b"1"))
        );
    }

    #[test]
    fn static_cells_are_masked_by_the_partition_tombstone() {
        let schema = schema();
        let mut p = MutationPartition::new(&schema);
        p.static_row_mut().set_cell(0, live(5, "s"));
        assert!(p.static_live_cell(0, NOW).is_some());
        p.apply_tombstone(tomb(5));
        assert!(p.static_live_cell(0, NOW).is_none());
        assert!(p.static_row().cell(0).is_some());
    }

    #[test]
    fn rows_iterate_in_clustering_order() {
        let schema = schema();
        let mut p = MutationPartition::new(&schema);
        for (a, b) in [("b", 1), ("a", 10), ("a", -3)] {
            p.clustered_row(key(&schema, a, b));
        }
        let order: Vec<_> = p
            .rows()
            .map(|(k, _)| schema.clustering_key_type().deserialize(k).expect("decode"))
            .collect();
        assert_eq!(
            order,
            vec![
                vec![Value::from("a"), Value::from(-3_i32)],
                vec![Value::from("a"), Value::from(10_i32)],
                vec![Value::from("b"), Value::from(1_i32)],
            ]
        );
    }

    #[test]
    fn empty_until_written() {
        let schema = schema();
        let mut p = MutationPartition::new(&schema);
        assert!(p.is_empty());
        p.apply_tombstone(tomb(1));
        assert!(!p.is_empty());
        assert!(p.to_string().starts_with("{mutation_partition: tombstone={timestamp=1"));
    }
}

//! Tables: partitions ordered by partition key.

use std::sync::Arc;

use crate::{
    mutation::{Mutation, PartitionKey},
    observability::log_debug,
    ordered::{ComparatorMap, Iter},
    partition::{ClusteringKey, MutationPartition},
    row::Row,
    schema::SchemaRef,
};

/// In-memory table: every partition written so far, keyed by partition key.
///
/// Partitions are created on first write and never removed here; deletions
/// are tombstones inside the partition.
pub struct ColumnFamily {
    schema: SchemaRef,
    partitions: ComparatorMap<MutationPartition>,
}

impl ColumnFamily {
    /// Create an empty table for `schema`.
    pub fn new(schema: SchemaRef) -> Self {
        let partitions = ComparatorMap::new(schema.partition_key_type().clone());
        Self { schema, partitions }
    }

    /// Schema of the table.
    pub fn schema(&self) -> &SchemaRef {
        &self.schema
    }

    /// Partition at `key`, created empty if missing.
    pub fn find_or_create_partition(&mut self, key: PartitionKey) -> &mut MutationPartition {
        let schema = &self.schema;
        self.partitions
            .entry_or_insert_with(key, || MutationPartition::new(schema))
    }

    /// Cells of the row at (`partition_key`, `clustering_key`), creating the
    /// partition and row if missing.
    pub fn find_or_create_row(
        &mut self,
        partition_key: PartitionKey,
        clustering_key: ClusteringKey,
    ) -> &mut Row {
        self.find_or_create_partition(partition_key)
            .clustered_row(clustering_key)
    }

    /// Partition at `key`, if it was ever written.
    pub fn find_partition(&self, key: &PartitionKey) -> Option<&MutationPartition> {
        self.partitions.get(key)
    }

    /// Cells stored at (`partition_key`, `clustering_key`).
    pub fn find_row(
        &self,
        partition_key: &PartitionKey,
        clustering_key: &ClusteringKey,
    ) -> Option<&Row> {
        self.find_partition(partition_key)?.find_row(clustering_key)
    }

    /// Merge `mutation` into its target partition.
    pub fn apply(&mut self, mutation: &Mutation) {
        log_debug!(
            event = "mutation_apply",
            table = %self.schema,
            key_len = mutation.key().len(),
            rows = mutation.partition().rows().count(),
        );
        let schema = Arc::clone(&self.schema);
        self.find_or_create_partition(mutation.key().clone())
            .apply(&schema, mutation.partition());
    }

    /// Partitions in partition-key order.
    pub fn partitions(&self) -> Iter<'_, MutationPartition> {
        self.partitions.iter()
    }

    /// Number of partitions.
    pub fn len(&self) -> usize {
        self.partitions.len()
    }

    /// Whether no partition was written.
    pub fn is_empty(&self) -> bool {
        self.partitions.is_empty()
    }
}

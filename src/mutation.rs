//! Pending updates to a single partition.

use std::{fmt, sync::Arc};

use bytes::Bytes;

use crate::{
    cell::AtomicCell,
    partition::{ClusteringKey, HexKey, MutationPartition},
    schema::{ColumnDefinition, ColumnKind, SchemaError, SchemaRef},
    tombstone::Tombstone,
    types::Value,
};

/// Serialized partition key.
pub type PartitionKey = Bytes;

/// An update to exactly one partition, built against one schema.
///
/// Setters write into the mutation's own partition without reconciling
/// timestamps; merging happens when the mutation is applied to a
/// [`crate::column_family::ColumnFamily`]. Cloning duplicates the payload.
#[derive(Clone)]
pub struct Mutation {
    schema: SchemaRef,
    key: PartitionKey,
    partition: MutationPartition,
}

impl Mutation {
    /// Start an empty mutation for the partition at `key`.
    pub fn new(key: PartitionKey, schema: SchemaRef) -> Self {
        let partition = MutationPartition::new(&schema);
        Self {
            schema,
            key,
            partition,
        }
    }

    /// Start an empty mutation, serializing the partition key from `values`.
    pub fn for_key(schema: SchemaRef, values: &[Value]) -> Result<Self, SchemaError> {
        let key = schema.partition_key(values)?;
        Ok(Self::new(key, schema))
    }

    /// Schema the mutation was built against.
    pub fn schema(&self) -> &SchemaRef {
        &self.schema
    }

    /// Target partition key.
    pub fn key(&self) -> &PartitionKey {
        &self.key
    }

    /// Pending partition state.
    pub fn partition(&self) -> &MutationPartition {
        &self.partition
    }

    /// Set a static cell.
    pub fn set_static_cell(
        &mut self,
        column: &ColumnDefinition,
        cell: AtomicCell,
    ) -> Result<(), SchemaError> {
        self.check_column(column, ColumnKind::Static)?;
        self.partition.static_row_mut().set_cell(column.id, cell);
        Ok(())
    }

    /// Set a regular cell in the row identified by a full clustering key
    /// given as values.
    pub fn set_clustered_cell(
        &mut self,
        prefix: &[Value],
        column: &ColumnDefinition,
        cell: AtomicCell,
    ) -> Result<(), SchemaError> {
        let key = self.schema.clustering_key(prefix)?;
        self.set_clustered_cell_by_key(key, column, cell)
    }

    /// Set a regular cell in the row at an already serialized clustering key.
    pub fn set_clustered_cell_by_key(
        &mut self,
        key: ClusteringKey,
        column: &ColumnDefinition,
        cell: AtomicCell,
    ) -> Result<(), SchemaError> {
        self.check_column(column, ColumnKind::Regular)?;
        self.partition.clustered_row(key).set_cell(column.id, cell);
        Ok(())
    }

    /// Delete the whole partition.
    pub fn delete_partition(&mut self, tombstone: Tombstone) {
        self.partition.apply_tombstone(tombstone);
    }

    /// Delete every row under a clustering prefix (a single row for a full
    /// key, the partition for an empty prefix).
    pub fn delete_prefix(&mut self, prefix: &[Value], tombstone: Tombstone) -> Result<(), SchemaError> {
        let schema = Arc::clone(&self.schema);
        self.partition.apply_delete(&schema, prefix, tombstone)
    }

    fn check_column(&self, column: &ColumnDefinition, expected: ColumnKind) -> Result<(), SchemaError> {
        if self.schema.column(&column.name) != Some(column) {
            return Err(SchemaError::UnknownColumn(column.name.clone()));
        }
        if column.kind != expected {
            return Err(SchemaError::ColumnKind {
                column: column.name.clone(),
                expected,
                actual: column.kind,
            });
        }
        Ok(())
    }
}

impl fmt::Debug for Mutation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

impl fmt::Display for Mutation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{{mutation: schema={}, key={}, {}}}",
            self.schema,
            HexKey(&self.key),
            self.partition
        )
    }
}

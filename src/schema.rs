//! Table schemas: column declarations, key types and cell encoding.
//!
//! A [`Schema`] is immutable once built and shared through [`SchemaRef`] by
//! every partition, mutation and column family constructed against it.

use std::{fmt, sync::Arc};

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use ulid::Ulid;

use crate::{
    cell::{AtomicCell, CellState},
    gc_clock::GcTimePoint,
    row::ColumnId,
    timestamp::Timestamp,
    types::{DataType, TupleType, Value, ValueError},
};

/// Shared, read-only schema handle.
pub type SchemaRef = Arc<Schema>;

/// Role a column plays in the table.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnKind {
    /// Component of the partition key.
    PartitionKey,
    /// Component of the clustering key.
    ClusteringKey,
    /// Column of the per-partition static row.
    Static,
    /// Column of a clustering row.
    Regular,
}

impl fmt::Display for ColumnKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ColumnKind::PartitionKey => "partition key",
            ColumnKind::ClusteringKey => "clustering key",
            ColumnKind::Static => "static",
            ColumnKind::Regular => "regular",
        };
        f.write_str(name)
    }
}

/// A declared column.
///
/// `id` is the column's position among the columns of the same kind; for
/// static and regular columns it is the key used in [`crate::row::Row`].
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ColumnDefinition {
    /// Position within the column's kind.
    pub id: ColumnId,
    /// Column name, unique within the table.
    pub name: String,
    /// Declared value type.
    pub data_type: DataType,
    /// Role of the column.
    pub kind: ColumnKind,
}

/// Errors raised while building or using a schema.
#[derive(Debug, Error)]
pub enum SchemaError {
    /// Two columns share a name.
    #[error("duplicate column `{0}`")]
    DuplicateColumn(String),
    /// No partition key column was declared.
    #[error("table `{0}` declares no partition key column")]
    MissingPartitionKey(String),
    /// Column is not declared by the schema.
    #[error("unknown column `{0}`")]
    UnknownColumn(String),
    /// Column used in a position reserved for another kind.
    #[error("column `{column}` is a {actual} column, expected {expected}")]
    ColumnKind {
        /// Column name.
        column: String,
        /// Kind required by the operation.
        expected: ColumnKind,
        /// Declared kind.
        actual: ColumnKind,
    },
    /// Value could not be encoded or decoded.
    #[error("value error: {0}")]
    Value(#[from] ValueError),
}

/// Table metadata: columns, key types and comparators.
#[derive(Debug)]
pub struct Schema {
    id: Ulid,
    keyspace: String,
    table: String,
    partition_key: Vec<ColumnDefinition>,
    clustering_key: Vec<ColumnDefinition>,
    static_columns: Vec<ColumnDefinition>,
    regular_columns: Vec<ColumnDefinition>,
    partition_key_type: Arc<TupleType>,
    clustering_key_type: Arc<TupleType>,
}

impl Schema {
    /// Unique id assigned when the schema was built.
    pub fn id(&self) -> Ulid {
        self.id
    }

    /// Owning keyspace name.
    pub fn keyspace(&self) -> &str {
        &self.keyspace
    }

    /// Table name.
    pub fn table(&self) -> &str {
        &self.table
    }

    /// Look up any column by name.
    pub fn column(&self, name: &str) -> Option<&ColumnDefinition> {
        self.columns().find(|column| column.name == name)
    }

    /// All columns: partition key, clustering key, static, then regular.
    pub fn columns(&self) -> impl Iterator<Item = &ColumnDefinition> {
        self.partition_key
            .iter()
            .chain(&self.clustering_key)
            .chain(&self.static_columns)
            .chain(&self.regular_columns)
    }

    /// Partition key columns in key order.
    pub fn partition_key_columns(&self) -> &[ColumnDefinition] {
        &self.partition_key
    }

    /// Clustering key columns in key order.
    pub fn clustering_key_columns(&self) -> &[ColumnDefinition] {
        &self.clustering_key
    }

    /// Static column by id.
    pub fn static_column(&self, id: ColumnId) -> Option<&ColumnDefinition> {
        self.static_columns.get(id as usize)
    }

    /// Regular column by id.
    pub fn regular_column(&self, id: ColumnId) -> Option<&ColumnDefinition> {
        self.regular_columns.get(id as usize)
    }

    /// Composite type of the partition key; also the partition comparator.
    pub fn partition_key_type(&self) -> &Arc<TupleType> {
        &self.partition_key_type
    }

    /// Composite type of the clustering key; also the row comparator.
    pub fn clustering_key_type(&self) -> &Arc<TupleType> {
        &self.clustering_key_type
    }

    /// Type used for serialized clustering prefixes.
    ///
    /// Prefixes share the clustering key encoding and may carry fewer
    /// components.
    pub fn clustering_key_prefix_type(&self) -> &Arc<TupleType> {
        &self.clustering_key_type
    }

    /// Number of clustering key components.
    pub fn clustering_key_size(&self) -> usize {
        self.clustering_key.len()
    }

    /// Serialize a partition key.
    pub fn partition_key(&self, values: &[Value]) -> Result<Bytes, SchemaError> {
        Ok(self.partition_key_type.serialize(values)?)
    }

    /// Serialize a full clustering key.
    pub fn clustering_key(&self, values: &[Value]) -> Result<Bytes, SchemaError> {
        Ok(self.clustering_key_type.serialize(values)?)
    }

    /// Serialize a clustering prefix.
    pub fn clustering_prefix(&self, values: &[Value]) -> Result<Bytes, SchemaError> {
        Ok(self.clustering_key_type.serialize_prefix(values)?)
    }

    /// Build a live cell for `column`, encoding `value` with the column type.
    pub fn make_live_cell(
        &self,
        column: &ColumnDefinition,
        value: &Value,
        timestamp: Timestamp,
        expiry: Option<GcTimePoint>,
    ) -> Result<AtomicCell, SchemaError> {
        let encoded = column.data_type.encode(value)?;
        Ok(AtomicCell::live(timestamp, expiry, encoded))
    }

    /// Decode the payload of `cell` using the column type. Dead cells yield
    /// `None`.
    pub fn decode_cell(
        &self,
        column: &ColumnDefinition,
        cell: &AtomicCell,
    ) -> Result<Option<Value>, SchemaError> {
        match &cell.state {
            CellState::Live(live) => Ok(Some(column.data_type.decode(&live.value)?)),
            CellState::Dead(_) => Ok(None),
        }
    }
}

impl fmt::Display for Schema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.keyspace, self.table)
    }
}

/// Builder for declaring a table's columns.
///
/// Columns keep their declaration order within each kind; that order fixes
/// key component order and column ids.
#[derive(Clone, Debug)]
pub struct SchemaBuilder {
    keyspace: String,
    table: String,
    columns: Vec<(String, DataType, ColumnKind)>,
}

impl SchemaBuilder {
    /// Start a builder for `keyspace.table`.
    pub fn new(keyspace: impl Into<String>, table: impl Into<String>) -> Self {
        Self {
            keyspace: keyspace.into(),
            table: table.into(),
            columns: Vec::new(),
        }
    }

    /// Declare a column.
    pub fn with_column(
        mut self,
        name: impl Into<String>,
        data_type: DataType,
        kind: ColumnKind,
    ) -> Self {
        self.columns.push((name.into(), data_type, kind));
        self
    }

    /// Finalise the builder into a shared schema.
    pub fn build(self) -> Result<SchemaRef, SchemaError> {
        let mut partition_key = Vec::new();
        let mut clustering_key = Vec::new();
        let mut static_columns = Vec::new();
        let mut regular_columns = Vec::new();
        let mut seen = std::collections::HashSet::new();

        for (name, data_type, kind) in self.columns {
            if !seen.insert(name.clone()) {
                return Err(SchemaError::DuplicateColumn(name));
            }
            let target = match kind {
                ColumnKind::PartitionKey => &mut partition_key,
                ColumnKind::ClusteringKey => &mut clustering_key,
                ColumnKind::Static => &mut static_columns,
                ColumnKind::Regular => &mut regular_columns,
            };
            target.push(ColumnDefinition {
                id: target.len() as ColumnId,
                name,
                data_type,
                kind,
            });
        }

        if partition_key.is_empty() {
            return Err(SchemaError::MissingPartitionKey(self.table));
        }

        let key_type =
            |columns: &[ColumnDefinition]| TupleType::new(columns.iter().map(|c| c.data_type).collect());

        Ok(Arc::new(Schema {
            id: Ulid::new(),
            partition_key_type: Arc::new(key_type(&partition_key)),
            clustering_key_type: Arc::new(key_type(&clustering_key)),
            keyspace: self.keyspace,
            table: self.table,
            partition_key,
            clustering_key,
            static_columns,
            regular_columns,
        }))
    }
}

/// On-disk description of a table schema.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaDescriptor {
    /// Table name; defaults to the name of the directory holding the file.
    #[serde(default)]
    pub table: Option<String>,
    /// Columns in declaration order.
    pub columns: Vec<ColumnDescriptor>,
}

/// One column in a [`SchemaDescriptor`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnDescriptor {
    /// Column name.
    pub name: String,
    /// Declared type.
    #[serde(rename = "type")]
    pub data_type: DataType,
    /// Column role.
    pub kind: ColumnKind,
}

impl SchemaDescriptor {
    /// Build the schema for `keyspace`, naming the table `default_table`
    /// unless the descriptor names it.
    pub fn build(self, keyspace: &str, default_table: &str) -> Result<SchemaRef, SchemaError> {
        let table = self.table.unwrap_or_else(|| default_table.to_owned());
        self.columns
            .into_iter()
            .fold(SchemaBuilder::new(keyspace, table), |builder, column| {
                builder.with_column(column.name, column.data_type, column.kind)
            })
            .build()
    }
}

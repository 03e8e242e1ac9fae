#![deny(missing_docs)]
//! In-memory data model and merge engine for a wide-column store.
//!
//! Partitions hold versioned cells, row and range tombstones, and a
//! partition tombstone. Two updates to the same partition combine through
//! [`MutationPartition::apply`], a last-write-wins merge in which deletions
//! dominate older writes. The merge is commutative, associative and
//! idempotent, so replicas that apply the same updates in any order
//! converge.
//!
//! Key and cell encodings are driven by a shared, immutable [`Schema`].
//! Deleted data is masked at read time and never purged here.

mod observability;

/// Atomic cells and their reconciliation order.
pub mod cell;
/// Tables of partitions.
pub mod column_family;
/// Keyspace and database bookkeeping, including population from disk.
pub mod database;
/// Garbage-collection clock.
pub mod gc_clock;
/// Single-partition updates.
pub mod mutation;
/// Configuration.
pub mod option;
/// Comparator-parameterized ordered maps.
pub mod ordered;
/// Partition state and merge logic.
pub mod partition;
/// Rows and deletable rows.
pub mod row;
/// Table schemas.
pub mod schema;
/// Write timestamps.
pub mod timestamp;
/// Deletion markers.
pub mod tombstone;
/// Value types and composite key encoding.
pub mod types;

pub use crate::{
    cell::{AtomicCell, CellState, DeadCell, LiveCell},
    column_family::ColumnFamily,
    database::{Database, DatabaseError, Keyspace},
    gc_clock::GcTimePoint,
    mutation::{Mutation, PartitionKey},
    option::DatabaseOptions,
    partition::{ClusteringKey, ClusteringPrefix, MutationPartition},
    row::{ColumnId, DeletableRow, Row},
    schema::{
        ColumnDefinition, ColumnKind, Schema, SchemaBuilder, SchemaDescriptor, SchemaError,
        SchemaRef,
    },
    timestamp::{Timestamp, TimestampClock},
    tombstone::Tombstone,
    types::{DataType, TupleType, Value, ValueError},
};

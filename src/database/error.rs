use std::path::PathBuf;

use crate::schema::SchemaError;

/// Error returned by keyspace and database management.
#[derive(Debug, thiserror::Error)]
pub enum DatabaseError {
    /// Filesystem error while scanning the data directory.
    #[error("io error at {path}: {source}")]
    Io {
        /// Path being accessed.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },
    /// Schema descriptor is not valid JSON for a descriptor.
    #[error("invalid schema descriptor {path}: {source}")]
    Descriptor {
        /// Descriptor file.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: serde_json::Error,
    },
    /// Schema descriptor parsed but describes an invalid schema.
    #[error("invalid schema in {path}: {source}")]
    Schema {
        /// Descriptor file.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: SchemaError,
    },
    /// Keyspace is not known.
    #[error("unknown keyspace `{0}`")]
    UnknownKeyspace(String),
    /// Table is not known in its keyspace.
    #[error("unknown table `{keyspace}.{table}`")]
    UnknownTable {
        /// Keyspace name.
        keyspace: String,
        /// Table name.
        table: String,
    },
    /// A table with the same name already exists in the keyspace.
    #[error("table `{0}` already exists")]
    DuplicateTable(String),
}

impl DatabaseError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        DatabaseError::Io {
            path: path.into(),
            source,
        }
    }
}

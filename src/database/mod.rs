//! Keyspaces and databases: name-indexed collections of column families.
//!
//! These only route and look up; all merge logic lives in
//! [`crate::partition`]. A database can be populated from a data directory
//! laid out as `<datadir>/<keyspace>/<table>/<schema file>`. Only schemas are
//! loaded; tables start empty.

mod error;

use std::{
    collections::HashMap,
    io::ErrorKind,
    path::{Path, PathBuf},
};

pub use error::DatabaseError;

use crate::{
    column_family::ColumnFamily,
    mutation::Mutation,
    observability::{log_debug, log_info, log_warn},
    option::DatabaseOptions,
    schema::{SchemaDescriptor, SchemaRef},
};

/// Named collection of column families.
pub struct Keyspace {
    name: String,
    column_families: HashMap<String, ColumnFamily>,
}

impl Keyspace {
    /// Create an empty keyspace.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            column_families: HashMap::new(),
        }
    }

    /// Keyspace name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Register a column family under its schema's table name.
    pub fn add_column_family(&mut self, column_family: ColumnFamily) -> Result<(), DatabaseError> {
        let table = column_family.schema().table().to_owned();
        if self.column_families.contains_key(&table) {
            return Err(DatabaseError::DuplicateTable(table));
        }
        self.column_families.insert(table, column_family);
        Ok(())
    }

    /// Column family named `name`.
    pub fn find_column_family(&self, name: &str) -> Option<&ColumnFamily> {
        self.column_families.get(name)
    }

    /// Mutable column family named `name`.
    pub fn find_column_family_mut(&mut self, name: &str) -> Option<&mut ColumnFamily> {
        self.column_families.get_mut(name)
    }

    /// Schema of the column family named `name`.
    pub fn find_schema(&self, name: &str) -> Option<&SchemaRef> {
        self.find_column_family(name).map(ColumnFamily::schema)
    }

    /// Column families by table name, in no particular order.
    pub fn column_families(&self) -> impl Iterator<Item = (&str, &ColumnFamily)> {
        self.column_families
            .iter()
            .map(|(name, cf)| (name.as_str(), cf))
    }

    /// Load a keyspace from `dir`: one sub-directory per table, each holding
    /// a schema descriptor. The keyspace is named after the directory.
    pub async fn populate(
        dir: impl AsRef<Path>,
        options: &DatabaseOptions,
    ) -> Result<Self, DatabaseError> {
        let dir = dir.as_ref();
        let name = dir
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        let mut keyspace = Keyspace::new(name);

        for (table, table_dir) in list_subdirectories(dir, options).await? {
            let schema = load_schema(&table_dir, &keyspace.name, &table, options).await?;
            log_debug!(
                event = "table_loaded",
                table = %schema,
                schema_id = %schema.id(),
            );
            keyspace.add_column_family(ColumnFamily::new(schema))?;
        }
        Ok(keyspace)
    }
}

/// Named collection of keyspaces.
#[derive(Default)]
pub struct Database {
    keyspaces: HashMap<String, Keyspace>,
}

impl Database {
    /// Create an empty database.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a keyspace, returning any keyspace it replaces.
    pub fn add_keyspace(&mut self, keyspace: Keyspace) -> Option<Keyspace> {
        self.keyspaces.insert(keyspace.name.clone(), keyspace)
    }

    /// Keyspace named `name`.
    pub fn find_keyspace(&self, name: &str) -> Option<&Keyspace> {
        self.keyspaces.get(name)
    }

    /// Mutable keyspace named `name`.
    pub fn find_keyspace_mut(&mut self, name: &str) -> Option<&mut Keyspace> {
        self.keyspaces.get_mut(name)
    }

    /// Keyspaces by name, in no particular order.
    pub fn keyspaces(&self) -> impl Iterator<Item = (&str, &Keyspace)> {
        self.keyspaces
            .iter()
            .map(|(name, keyspace)| (name.as_str(), keyspace))
    }

    /// Column family `table` in `keyspace`.
    pub fn find_column_family(&self, keyspace: &str, table: &str) -> Option<&ColumnFamily> {
        self.find_keyspace(keyspace)?.find_column_family(table)
    }

    /// Route `mutation` to the column family named by its schema.
    pub fn apply(&mut self, mutation: &Mutation) -> Result<(), DatabaseError> {
        let schema = mutation.schema();
        let keyspace = self
            .keyspaces
            .get_mut(schema.keyspace())
            .ok_or_else(|| DatabaseError::UnknownKeyspace(schema.keyspace().to_owned()))?;
        let column_family = keyspace.find_column_family_mut(schema.table()).ok_or_else(|| {
            DatabaseError::UnknownTable {
                keyspace: schema.keyspace().to_owned(),
                table: schema.table().to_owned(),
            }
        })?;
        column_family.apply(mutation);
        Ok(())
    }

    /// Load every keyspace found under `datadir`.
    pub async fn populate(
        datadir: impl AsRef<Path>,
        options: &DatabaseOptions,
    ) -> Result<Self, DatabaseError> {
        let datadir = datadir.as_ref();
        match tokio::fs::metadata(datadir).await {
            Ok(_) => {}
            Err(err) if err.kind() == ErrorKind::NotFound && options.create_if_missing => {
                tokio::fs::create_dir_all(datadir)
                    .await
                    .map_err(|err| DatabaseError::io(datadir, err))?;
                log_info!(event = "data_dir_created", data_dir = %datadir.display());
            }
            Err(err) => return Err(DatabaseError::io(datadir, err)),
        }

        let mut database = Database::new();
        for (_, keyspace_dir) in list_subdirectories(datadir, options).await? {
            let keyspace = Keyspace::populate(&keyspace_dir, options).await?;
            database.add_keyspace(keyspace);
        }
        log_info!(
            event = "database_populated",
            data_dir = %datadir.display(),
            keyspaces = database.keyspaces.len(),
        );
        Ok(database)
    }
}

/// Sub-directories of `dir` as `(name, path)`, sorted by name.
async fn list_subdirectories(
    dir: &Path,
    options: &DatabaseOptions,
) -> Result<Vec<(String, PathBuf)>, DatabaseError> {
    let mut entries = tokio::fs::read_dir(dir)
        .await
        .map_err(|err| DatabaseError::io(dir, err))?;
    let mut found = Vec::new();
    while let Some(entry) = entries
        .next_entry()
        .await
        .map_err(|err| DatabaseError::io(dir, err))?
    {
        let path = entry.path();
        let file_type = entry
            .file_type()
            .await
            .map_err(|err| DatabaseError::io(&path, err))?;
        if !file_type.is_dir() {
            continue;
        }
        let Ok(name) = entry.file_name().into_string() else {
            log_warn!(
                event = "non_utf8_directory_skipped",
                path = %path.display(),
            );
            continue;
        };
        if options.is_skipped(&name) {
            continue;
        }
        found.push((name, path));
    }
    found.sort();
    Ok(found)
}

async fn load_schema(
    table_dir: &Path,
    keyspace: &str,
    table: &str,
    options: &DatabaseOptions,
) -> Result<SchemaRef, DatabaseError> {
    let path = table_dir.join(&options.schema_file_name);
    let raw = tokio::fs::read(&path)
        .await
        .map_err(|err| DatabaseError::io(&path, err))?;
    let descriptor: SchemaDescriptor =
        serde_json::from_slice(&raw).map_err(|source| DatabaseError::Descriptor {
            path: path.clone(),
            source,
        })?;
    descriptor
        .build(keyspace, table)
        .map_err(|source| DatabaseError::Schema { path, source })
}

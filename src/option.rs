/// Options controlling how a database is populated from a data directory.
#[derive(Debug, Clone)]
pub struct DatabaseOptions {
    pub(crate) schema_file_name: String,
    pub(crate) skip_hidden: bool,
    pub(crate) create_if_missing: bool,
}

impl Default for DatabaseOptions {
    fn default() -> Self {
        DatabaseOptions {
            schema_file_name: "schema.json".to_string(),
            skip_hidden: true,
            create_if_missing: false,
        }
    }
}

impl DatabaseOptions {
    /// Name of the schema descriptor expected in every table directory.
    pub fn schema_file_name(self, schema_file_name: impl Into<String>) -> Self {
        DatabaseOptions {
            schema_file_name: schema_file_name.into(),
            ..self
        }
    }

    /// Ignore directory entries whose name starts with a dot.
    pub fn skip_hidden(self, skip_hidden: bool) -> Self {
        DatabaseOptions {
            skip_hidden,
            ..self
        }
    }

    /// Create the data directory instead of failing when it does not exist.
    pub fn create_if_missing(self, create_if_missing: bool) -> Self {
        DatabaseOptions {
            create_if_missing,
            ..self
        }
    }

    pub(crate) fn is_skipped(&self, name: &str) -> bool {
        self.skip_hidden && name.starts_with('.')
    }
}

// ABOUTME: Shape of a completed load schema as handed over by the load driver
// ABOUTME: Dataset name plus its tables in the order the driver created them

use serde::{Deserialize, Serialize};

/// Column the load driver adds to every row it writes, holding a unique row id
pub const ROW_ID_COLUMN: &str = "_dlt_id";

/// Prefix of the driver's internal bookkeeping tables (`_dlt_loads`, ...)
pub const BOOKKEEPING_PREFIX: &str = "_dlt_";

/// One table of a load schema
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableSchema {
    pub name: String,
}

impl TableSchema {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    /// Internal driver tables never carry user data and are left alone
    pub fn is_bookkeeping(&self) -> bool {
        self.name.starts_with(BOOKKEEPING_PREFIX)
    }
}

/// A completed load schema: the destination dataset and its tables
///
/// Tables keep insertion order, which is the order they are processed in.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct LoadSchema {
    /// Destination schema (dataset) the tables live in
    pub dataset: String,
    pub tables: Vec<TableSchema>,
}

impl LoadSchema {
    pub fn new(dataset: impl Into<String>) -> Self {
        Self {
            dataset: dataset.into(),
            tables: Vec::new(),
        }
    }

    /// Append a table unless one with the same name is already present
    pub fn add_table(&mut self, name: impl Into<String>) -> &mut Self {
        let name = name.into();
        if !self.tables.iter().any(|t| t.name == name) {
            self.tables.push(TableSchema::new(name));
        }
        self
    }

    pub fn with_tables<I, S>(dataset: impl Into<String>, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut schema = Self::new(dataset);
        for name in names {
            schema.add_table(name);
        }
        schema
    }

    /// Tables holding user data, in order
    pub fn user_tables(&self) -> impl Iterator<Item = &TableSchema> {
        self.tables.iter().filter(|t| !t.is_bookkeeping())
    }
}

// ABOUTME: Per-table outcomes of a replica identity run
// ABOUTME: Aggregates them into a run report that can be printed or serialized

use serde::Serialize;

/// What happened to a table's row-id index
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "reason", rename_all = "snake_case")]
pub enum IndexOutcome {
    Created,
    AlreadyExists,
    Failed(String),
}

impl IndexOutcome {
    pub fn is_ready(&self) -> bool {
        !matches!(self, IndexOutcome::Failed(_))
    }
}

/// Result for one user table
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableReport {
    pub table_name: String,
    pub index_name: String,
    pub index: IndexOutcome,
    pub replica_identity_set: bool,
    /// Why `ALTER TABLE ... REPLICA IDENTITY` failed, if it was attempted and failed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub replica_identity_error: Option<String>,
}

impl TableReport {
    pub fn is_success(&self) -> bool {
        self.index.is_ready() && self.replica_identity_set
    }

    /// Human-readable reason this table is not fully prepared
    pub fn failure_reason(&self) -> Option<&str> {
        match (&self.index, &self.replica_identity_error) {
            (IndexOutcome::Failed(reason), _) => Some(reason.as_str()),
            (_, Some(reason)) => Some(reason.as_str()),
            _ => None,
        }
    }
}

/// Outcome of one run over a load schema
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct RunReport {
    pub schema: String,
    /// User tables in processing order
    pub tables: Vec<TableReport>,
    /// Bookkeeping tables that were left untouched
    pub skipped: Vec<String>,
}

impl RunReport {
    pub fn new(schema: impl Into<String>) -> Self {
        Self {
            schema: schema.into(),
            ..Default::default()
        }
    }

    pub fn succeeded(&self) -> impl Iterator<Item = &TableReport> {
        self.tables.iter().filter(|t| t.is_success())
    }

    pub fn failed(&self) -> impl Iterator<Item = &TableReport> {
        self.tables.iter().filter(|t| !t.is_success())
    }

    pub fn created_count(&self) -> usize {
        self.tables
            .iter()
            .filter(|t| t.index == IndexOutcome::Created)
            .count()
    }

    /// True when every user table ended with index and replica identity in place
    pub fn is_complete(&self) -> bool {
        self.tables.iter().all(TableReport::is_success)
    }
}

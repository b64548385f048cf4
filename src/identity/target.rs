// ABOUTME: Naming and DDL for the per-table row-id index
// ABOUTME: Derives the index name and renders CREATE INDEX / REPLICA IDENTITY statements

use crate::schema::ROW_ID_COLUMN;
use crate::utils::{quote_always, truncate_identifier};
use pg_escape::quote_identifier;

/// Index name for a table: `<lowercased-table>_dlt_id_key`
///
/// Names past PostgreSQL's identifier limit are cut the same way the server
/// cuts them.
///
/// # Examples
///
/// ```
/// # use dlt_replica_identity::identity::index_name_for;
/// assert_eq!(index_name_for("Table_1"), "table_1_dlt_id_key");
/// ```
pub fn index_name_for(table: &str) -> String {
    let full = format!("{}{}_key", table.to_lowercase(), ROW_ID_COLUMN);
    let truncated = truncate_identifier(&full);
    if truncated.len() < full.len() {
        tracing::warn!(
            "Index name '{}' exceeds 63 bytes, PostgreSQL stores it as '{}'",
            full,
            truncated
        );
    }
    truncated.to_string()
}

/// The unique row-id index of one destination table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexTarget {
    pub schema: String,
    /// Lowercased table name, cut to the identifier limit
    pub table: String,
    pub index: String,
    pub column: String,
}

impl IndexTarget {
    pub fn for_table(schema: &str, table: &str) -> Self {
        let table = truncate_identifier(&table.to_lowercase()).to_string();
        let index = index_name_for(&table);
        Self {
            schema: schema.to_string(),
            table,
            index,
            column: ROW_ID_COLUMN.to_string(),
        }
    }

    /// `schema.table` for log lines
    pub fn qualified_table(&self) -> String {
        format!("{}.{}", self.schema, self.table)
    }

    pub fn create_index_sql(&self) -> String {
        format!(
            "CREATE UNIQUE INDEX {} ON {}.{} ({});",
            quote_identifier(&self.index),
            quote_always(&self.schema),
            quote_always(&self.table),
            quote_identifier(&self.column)
        )
    }

    pub fn replica_identity_sql(&self) -> String {
        format!(
            "ALTER TABLE {}.{} REPLICA IDENTITY USING INDEX {};",
            quote_always(&self.schema),
            quote_always(&self.table),
            quote_always(&self.index)
        )
    }
}

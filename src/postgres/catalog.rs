// ABOUTME: Catalog queries against the destination database
// ABOUTME: Lists dataset tables, checks index existence, and reads replica identity

use anyhow::{Context, Result};
use serde::Serialize;
use std::fmt;
use tokio_postgres::Client;

/// Existence check for a named index on a table
pub const INDEX_EXISTS_QUERY: &str = "SELECT 1 FROM pg_indexes \
     WHERE schemaname = $1 AND tablename = $2 AND indexname = $3";

/// Replica identity of a table as recorded in `pg_class.relreplident`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "index", rename_all = "snake_case")]
pub enum ReplicaIdentity {
    /// Primary key columns (or nothing when there is no primary key)
    Default,
    /// No row identity is logged
    Nothing,
    /// Entire old row is logged
    Full,
    /// Columns of the named unique index
    Index(String),
}

impl ReplicaIdentity {
    fn from_catalog(code: &str, index: Option<String>) -> Result<Self> {
        match code {
            "d" => Ok(ReplicaIdentity::Default),
            "n" => Ok(ReplicaIdentity::Nothing),
            "f" => Ok(ReplicaIdentity::Full),
            "i" => Ok(ReplicaIdentity::Index(index.unwrap_or_default())),
            other => anyhow::bail!("Unknown relreplident value '{}'", other),
        }
    }

    /// True when the identity points at exactly `index_name`
    pub fn uses_index(&self, index_name: &str) -> bool {
        matches!(self, ReplicaIdentity::Index(name) if name == index_name)
    }
}

impl fmt::Display for ReplicaIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReplicaIdentity::Default => write!(f, "DEFAULT"),
            ReplicaIdentity::Nothing => write!(f, "NOTHING"),
            ReplicaIdentity::Full => write!(f, "FULL"),
            ReplicaIdentity::Index(name) => write!(f, "USING INDEX {}", name),
        }
    }
}

/// List base tables of `schema` in name order
pub async fn list_tables(client: &Client, schema: &str) -> Result<Vec<String>> {
    let rows = client
        .query(
            "SELECT tablename
             FROM pg_catalog.pg_tables
             WHERE schemaname = $1
             ORDER BY tablename",
            &[&schema],
        )
        .await
        .with_context(|| format!("Failed to list tables in schema '{}'", schema))?;

    Ok(rows.iter().map(|row| row.get(0)).collect())
}

/// Check whether `index` exists on `schema.table`
pub async fn index_exists(
    client: &Client,
    schema: &str,
    table: &str,
    index: &str,
) -> Result<bool> {
    let row = client
        .query_opt(INDEX_EXISTS_QUERY, &[&schema, &table, &index])
        .await
        .with_context(|| {
            format!(
                "Failed to look up index '{}' on {}.{}",
                index, schema, table
            )
        })?;

    Ok(row.is_some())
}

/// Read the current replica identity of `schema.table`
///
/// # Errors
///
/// Fails if the table does not exist or the catalog query fails.
pub async fn get_replica_identity(
    client: &Client,
    schema: &str,
    table: &str,
) -> Result<ReplicaIdentity> {
    let row = client
        .query_opt(
            "SELECT
                c.relreplident::text,
                (SELECT i.relname::text
                   FROM pg_catalog.pg_index x
                   JOIN pg_catalog.pg_class i ON i.oid = x.indexrelid
                  WHERE x.indrelid = c.oid AND x.indisreplident
                  LIMIT 1)
             FROM pg_catalog.pg_class c
             JOIN pg_catalog.pg_namespace n ON n.oid = c.relnamespace
             WHERE n.nspname = $1 AND c.relname = $2",
            &[&schema, &table],
        )
        .await
        .with_context(|| format!("Failed to read replica identity of {}.{}", schema, table))?
        .with_context(|| format!("Table {}.{} does not exist", schema, table))?;

    let code: String = row.get(0);
    let index: Option<String> = row.get(1);
    ReplicaIdentity::from_catalog(&code, index)
}

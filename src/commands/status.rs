// ABOUTME: Status command implementation - inspect replica identity of loaded tables
// ABOUTME: Reports whether each user table already uses its _dlt_id index

use crate::config::DestinationConfig;
use crate::identity::IndexTarget;
use crate::postgres::{connect, get_replica_identity, index_exists, list_tables, ReplicaIdentity};
use crate::schema::LoadSchema;
use crate::utils::sanitize_identifier;
use anyhow::{Context, Result};
use serde::Serialize;

/// Current state of one user table
#[derive(Debug, Clone, Serialize)]
pub struct TableStatus {
    pub table_name: String,
    pub expected_index: String,
    pub index_exists: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub replica_identity: Option<ReplicaIdentity>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl TableStatus {
    /// Index exists and is the table's replica identity
    pub fn is_ready(&self) -> bool {
        self.index_exists
            && self
                .replica_identity
                .as_ref()
                .is_some_and(|identity| identity.uses_index(&self.expected_index))
    }

    /// Append a catalog error, keeping any earlier one
    fn record_error(&mut self, error: &anyhow::Error) {
        let message = format!("{:#}", error);
        self.error = Some(match self.error.take() {
            Some(previous) => format!("{}; {}", previous, message),
            None => message,
        });
    }
}

/// Show replica identity for the user tables of the configured schema
///
/// Read-only: issues catalog queries only.
pub async fn status(
    config: &DestinationConfig,
    tables: Vec<String>,
    json: bool,
) -> Result<Vec<TableStatus>> {
    tracing::info!("Connecting to destination {}...", config.display_target());
    let client = connect(config)
        .await
        .context("Failed to connect to the destination database")?;

    let schema = if tables.is_empty() {
        let discovered = list_tables(&client, &config.schema)
            .await
            .context("Failed to discover destination tables")?;
        LoadSchema::with_tables(&config.schema, discovered)
    } else {
        LoadSchema::with_tables(&config.schema, tables)
    };

    let mut statuses = Vec::new();
    for table in schema.user_tables() {
        let target = IndexTarget::for_table(&schema.dataset, &table.name);
        let mut status = TableStatus {
            table_name: table.name.clone(),
            expected_index: target.index.clone(),
            index_exists: false,
            replica_identity: None,
            error: None,
        };

        match index_exists(&client, &target.schema, &target.table, &target.index).await {
            Ok(exists) => status.index_exists = exists,
            Err(e) => status.record_error(&e),
        }
        match get_replica_identity(&client, &target.schema, &target.table).await {
            Ok(identity) => status.replica_identity = Some(identity),
            Err(e) => status.record_error(&e),
        }

        statuses.push(status);
    }

    tracing::info!("");
    tracing::info!("========================================");
    tracing::info!("Replica Identity Status: {}", schema.dataset);
    tracing::info!("========================================");
    if statuses.is_empty() {
        tracing::warn!("⚠ No user tables found in schema '{}'", schema.dataset);
    }
    for status in &statuses {
        let name = sanitize_identifier(&status.table_name);
        if let Some(error) = &status.error {
            tracing::error!("  ✗ {}: {}", name, error);
        } else if status.is_ready() {
            tracing::info!("  ✓ {}: USING INDEX {}", name, status.expected_index);
        } else {
            let identity = status
                .replica_identity
                .as_ref()
                .map(ToString::to_string)
                .unwrap_or_else(|| "unknown".to_string());
            tracing::warn!(
                "  ⚠ {}: {} (expected USING INDEX {}, index {})",
                name,
                identity,
                status.expected_index,
                if status.index_exists { "present" } else { "missing" }
            );
        }
    }
    tracing::info!("========================================");

    if json {
        let out = serde_json::to_string_pretty(&statuses).context("Failed to serialize status")?;
        println!("{}", out);
    }

    Ok(statuses)
}

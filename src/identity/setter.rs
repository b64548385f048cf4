// ABOUTME: Post-load routine pinning each user table's REPLICA IDENTITY to its row-id index
// ABOUTME: Best-effort per table: failures are recorded and the loop moves on

use super::report::{IndexOutcome, RunReport, TableReport};
use super::store::{IdentityStore, PgIdentityStore};
use super::target::IndexTarget;
use crate::config::DestinationConfig;
use crate::error::IdentityError;
use crate::schema::{LoadSchema, TableSchema};
use anyhow::{Context, Result};

/// Walks the tables of a load schema and prepares each one for replication
///
/// For every user table the setter makes sure `<table>_dlt_id_key` exists as
/// a unique index on `_dlt_id`, then points the table's replica identity at
/// it. Bookkeeping tables (`_dlt_*`) are skipped. A failure on one table
/// never stops the others.
pub struct ReplicaIdentitySetter<S> {
    store: S,
    schema: String,
}

impl<S: IdentityStore> ReplicaIdentitySetter<S> {
    pub fn new(store: S, schema: impl Into<String>) -> Self {
        Self {
            store,
            schema: schema.into(),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }

    /// Process `tables` in order and collect a report
    pub async fn run<'t, I>(&mut self, tables: I) -> RunReport
    where
        I: IntoIterator<Item = &'t TableSchema>,
    {
        self.run_with(tables, |_| {}).await
    }

    /// Like [`run`](Self::run), calling `on_table` after each user table
    pub async fn run_with<'t, I, F>(&mut self, tables: I, mut on_table: F) -> RunReport
    where
        I: IntoIterator<Item = &'t TableSchema>,
        F: FnMut(&TableReport),
    {
        let mut report = RunReport::new(&self.schema);

        for table in tables {
            if table.is_bookkeeping() {
                tracing::debug!("Skipping internal table {}", table.name);
                report.skipped.push(table.name.clone());
                continue;
            }

            let table_report = self.process_table(&table.name).await;
            on_table(&table_report);
            report.tables.push(table_report);
        }

        report
    }

    /// Ensure the index and replica identity for a single table
    pub async fn process_table(&mut self, table_name: &str) -> TableReport {
        let target = IndexTarget::for_table(&self.schema, table_name);
        let mut report = TableReport {
            table_name: table_name.to_string(),
            index_name: target.index.clone(),
            index: IndexOutcome::AlreadyExists,
            replica_identity_set: false,
            replica_identity_error: None,
        };

        let exists = match self.store.index_exists(&target).await {
            Ok(exists) => exists,
            Err(e) => {
                let reason = format!("{:#}", e);
                tracing::error!(
                    "✗ Failed to check index for table {}: {}",
                    target.table,
                    reason
                );
                report.index = IndexOutcome::Failed(reason);
                return report;
            }
        };

        if exists {
            tracing::debug!(
                "Index {} already exists on {}",
                target.index,
                target.qualified_table()
            );
        } else {
            match self.store.create_unique_index(&target).await {
                Ok(()) => {
                    tracing::info!(
                        "✓ Created index {} for table {}",
                        target.index,
                        target.qualified_table()
                    );
                    report.index = IndexOutcome::Created;
                }
                Err(e) => {
                    let reason = format!("{:#}", e);
                    tracing::error!(
                        "✗ Failed to create index for table {}: {}",
                        target.table,
                        reason
                    );
                    report.index = IndexOutcome::Failed(reason);
                    return report;
                }
            }
        }

        match self.store.set_replica_identity(&target).await {
            Ok(()) => {
                tracing::info!(
                    "✓ Set REPLICA IDENTITY USING INDEX {} for table {}",
                    target.index,
                    target.qualified_table()
                );
                report.replica_identity_set = true;
            }
            Err(e) => {
                let reason = format!("{:#}", e);
                tracing::error!(
                    "✗ Failed to set replica identity for table {}: {}",
                    target.table,
                    reason
                );
                report.replica_identity_error = Some(reason);
            }
        }

        report
    }
}

/// Connect to the destination and prepare every user table of `schema`
///
/// # Errors
///
/// Only fatal conditions are returned, before any table is touched:
/// - an empty required parameter in `config` or an empty dataset name
///   ([`IdentityError::Config`])
/// - the connection cannot be established ([`IdentityError::Connection`])
///
/// Per-table failures end up in the returned [`RunReport`].
///
/// # Examples
///
/// ```no_run
/// # use anyhow::Result;
/// # use dlt_replica_identity::config::DestinationConfig;
/// # use dlt_replica_identity::identity::set_replica_identity;
/// # use dlt_replica_identity::schema::LoadSchema;
/// # async fn example() -> Result<()> {
/// let schema = LoadSchema::with_tables("my_schema_name", ["table_1", "table_2", "_dlt_loads"]);
/// let report = set_replica_identity(&DestinationConfig::default(), &schema).await?;
/// assert_eq!(report.tables.len(), 2);
/// # Ok(())
/// # }
/// ```
pub async fn set_replica_identity(
    config: &DestinationConfig,
    schema: &LoadSchema,
) -> Result<RunReport> {
    config.validate()?;
    if schema.dataset.trim().is_empty() {
        return Err(IdentityError::Config("dataset schema name is empty".to_string()).into());
    }

    let store = PgIdentityStore::connect(config)
        .await
        .context("Failed to connect to the destination database")?;
    tracing::info!("Connected to {}", config.display_target());

    let mut setter = ReplicaIdentitySetter::new(store, &schema.dataset);
    let report = setter.run(&schema.tables).await;
    setter.into_store().close();

    Ok(report)
}

// ABOUTME: Destination operations the replica identity setter needs
// ABOUTME: Trait seam plus the tokio-postgres implementation with per-statement transactions

use super::target::IndexTarget;
use crate::config::DestinationConfig;
use crate::postgres::{self, catalog};
use anyhow::{Context, Result};
use tokio_postgres::Client;

/// Statements the setter issues against the destination
///
/// Each mutating call is its own unit of work: it either commits or leaves
/// the database as it was.
#[allow(async_fn_in_trait)]
pub trait IdentityStore {
    /// Whether `target.index` already exists on `target.schema.target.table`
    async fn index_exists(&mut self, target: &IndexTarget) -> Result<bool>;

    /// `CREATE UNIQUE INDEX` on the row-id column
    async fn create_unique_index(&mut self, target: &IndexTarget) -> Result<()>;

    /// `ALTER TABLE ... REPLICA IDENTITY USING INDEX`
    async fn set_replica_identity(&mut self, target: &IndexTarget) -> Result<()>;
}

/// [`IdentityStore`] backed by a single destination connection
pub struct PgIdentityStore {
    client: Client,
}

impl PgIdentityStore {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Validate `config` and open the destination connection
    pub async fn connect(config: &DestinationConfig) -> Result<Self> {
        let client = postgres::connect(config).await?;
        Ok(Self::new(client))
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    /// Release the connection
    pub fn close(self) {
        drop(self.client);
        tracing::debug!("Destination connection released");
    }

    async fn execute_in_transaction(&mut self, sql: &str) -> Result<()> {
        let tx = self
            .client
            .transaction()
            .await
            .context("Failed to begin transaction")?;

        let result = tx.batch_execute(sql).await;
        match result {
            Ok(()) => tx.commit().await.context("Failed to commit transaction"),
            Err(e) => {
                if let Err(rollback_err) = tx.rollback().await {
                    tracing::warn!("Rollback failed: {}", rollback_err);
                }
                Err(e.into())
            }
        }
    }
}

impl IdentityStore for PgIdentityStore {
    async fn index_exists(&mut self, target: &IndexTarget) -> Result<bool> {
        catalog::index_exists(&self.client, &target.schema, &target.table, &target.index).await
    }

    async fn create_unique_index(&mut self, target: &IndexTarget) -> Result<()> {
        self.execute_in_transaction(&target.create_index_sql())
            .await
    }

    async fn set_replica_identity(&mut self, target: &IndexTarget) -> Result<()> {
        self.execute_in_transaction(&target.replica_identity_sql())
            .await
    }
}

// ABOUTME: Load job orchestration around the replica identity setter
// ABOUTME: Replace load to create the schema, fix replica identity, then merge load

use crate::config::DestinationConfig;
use crate::identity::{self, IdentityStore, ReplicaIdentitySetter, RunReport};
use crate::schema::LoadSchema;
use anyhow::{Context, Result};
use serde::Serialize;
use std::fmt;

/// How the load driver writes into existing destination tables
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum WriteDisposition {
    /// Drop and recreate destination tables
    Replace,
    /// Upsert on primary key, resuming from the incremental cursor
    Merge,
}

impl fmt::Display for WriteDisposition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WriteDisposition::Replace => write!(f, "replace"),
            WriteDisposition::Merge => write!(f, "merge"),
        }
    }
}

/// Summary of one driver run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LoadInfo {
    pub load_id: String,
    pub disposition: WriteDisposition,
    pub dataset: String,
    /// Tables the run wrote to
    pub tables: Vec<String>,
}

impl fmt::Display for LoadInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Load {} ({}) into dataset {}: {} table(s)",
            self.load_id,
            self.disposition,
            self.dataset,
            self.tables.len()
        )?;
        if !self.tables.is_empty() {
            write!(f, " [{}]", self.tables.join(", "))?;
        }
        Ok(())
    }
}

/// The extraction/load library that moves source tables into the destination
///
/// Implementations own the source configuration (selected tables, primary
/// keys, incremental cursors) and add the `_dlt_id` column to every row.
#[allow(async_fn_in_trait)]
pub trait LoadDriver {
    /// Extract, normalize and load with the given disposition
    async fn run(&mut self, disposition: WriteDisposition) -> Result<LoadInfo>;

    /// Schema as of the last completed run
    fn schema(&self) -> &LoadSchema;
}

/// Everything a full load job produced
#[derive(Debug, Clone, Serialize)]
pub struct PipelineReport {
    pub initial_load: LoadInfo,
    pub replica_identity: RunReport,
    pub merge_load: LoadInfo,
}

/// Run the load job against the destination described by `config`
///
/// 1. `replace` run so every destination table exists
/// 2. replica identity setup on the resulting schema
/// 3. `merge` run for the actual data load
///
/// The configuration is validated before the driver does anything. Per-table
/// setup failures are reported, not returned.
pub async fn load_tables<D: LoadDriver>(
    driver: &mut D,
    config: &DestinationConfig,
) -> Result<PipelineReport> {
    config.validate()?;

    let initial_load = initial_load(driver).await?;

    let replica_identity = identity::set_replica_identity(config, driver.schema())
        .await
        .context("Failed to set replica identity")?;

    let merge_load = merge_load(driver).await?;

    Ok(PipelineReport {
        initial_load,
        replica_identity,
        merge_load,
    })
}

/// Same as [`load_tables`] using an already-open destination store
pub async fn load_tables_with<D, S>(driver: &mut D, store: S) -> Result<PipelineReport>
where
    D: LoadDriver,
    S: IdentityStore,
{
    let initial_load = initial_load(driver).await?;

    let schema = driver.schema();
    let mut setter = ReplicaIdentitySetter::new(store, &schema.dataset);
    let replica_identity = setter.run(&schema.tables).await;

    let merge_load = merge_load(driver).await?;

    Ok(PipelineReport {
        initial_load,
        replica_identity,
        merge_load,
    })
}

async fn initial_load<D: LoadDriver>(driver: &mut D) -> Result<LoadInfo> {
    tracing::info!("Creating destination schema with replace write disposition...");
    let info = driver
        .run(WriteDisposition::Replace)
        .await
        .context("Initial replace load failed")?;
    tracing::info!("{}", info);
    Ok(info)
}

async fn merge_load<D: LoadDriver>(driver: &mut D) -> Result<LoadInfo> {
    tracing::info!("Starting extract and data load with merge write disposition...");
    let info = driver
        .run(WriteDisposition::Merge)
        .await
        .context("Merge load failed")?;
    tracing::info!("{}", info);
    tracing::info!("Data load complete and replica identity set.");
    Ok(info)
}

// ABOUTME: Apply command - prepare loaded tables for logical replication
// ABOUTME: Ensures the _dlt_id unique index and REPLICA IDENTITY on every user table

use crate::config::DestinationConfig;
use crate::identity::{PgIdentityStore, ReplicaIdentitySetter, RunReport};
use crate::postgres::list_tables;
use crate::schema::LoadSchema;
use crate::utils::sanitize_identifier;
use anyhow::{bail, Context, Result};
use dialoguer::{theme::ColorfulTheme, Confirm};
use indicatif::{ProgressBar, ProgressStyle};

/// Flags controlling how `apply` behaves around the setter run
#[derive(Debug, Clone, Copy, Default)]
pub struct ApplyOptions {
    /// Skip the confirmation prompt
    pub yes: bool,
    /// Fail when any table is left without replica identity
    pub strict: bool,
    /// Print the run report as JSON on stdout
    pub json: bool,
}

/// Set replica identity on the destination tables
///
/// With an empty `tables` list the tables are discovered from the configured
/// dataset schema. Bookkeeping tables are listed but never modified.
///
/// # Errors
///
/// - invalid configuration or unreachable destination
/// - table discovery fails
/// - the user declines the confirmation prompt
/// - `options.strict` is set and at least one table failed
pub async fn apply(
    config: &DestinationConfig,
    tables: Vec<String>,
    options: ApplyOptions,
) -> Result<RunReport> {
    config.validate()?;

    tracing::info!("Connecting to destination {}...", config.display_target());
    let store = PgIdentityStore::connect(config)
        .await
        .context("Failed to connect to the destination database")?;
    tracing::info!("✓ Connected to destination");

    let schema = if tables.is_empty() {
        tracing::info!("Discovering tables in schema '{}'...", config.schema);
        let discovered = list_tables(store.client(), &config.schema)
            .await
            .context("Failed to discover destination tables")?;
        LoadSchema::with_tables(&config.schema, discovered)
    } else {
        LoadSchema::with_tables(&config.schema, tables)
    };

    let user_tables = schema.user_tables().count();
    if user_tables == 0 {
        tracing::warn!("⚠ No user tables found in schema '{}'", schema.dataset);
        tracing::warn!("  Run the load job first or pass tables with --table");
        store.close();
        return Ok(RunReport::new(&schema.dataset));
    }

    if !options.yes && !confirm_plan(&schema)? {
        store.close();
        bail!("Replica identity setup cancelled by user");
    }

    let progress = ProgressBar::new(user_tables as u64);
    progress.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} {msg}")
            .context("Invalid progress bar template")?
            .progress_chars("##-"),
    );

    let mut setter = ReplicaIdentitySetter::new(store, &schema.dataset);
    let report = setter
        .run_with(&schema.tables, |table| {
            progress.inc(1);
            progress.set_message(sanitize_identifier(&table.table_name));
        })
        .await;
    progress.finish_and_clear();
    setter.into_store().close();

    print_summary(&report);

    if options.json {
        let json = serde_json::to_string_pretty(&report).context("Failed to serialize report")?;
        println!("{}", json);
    }

    if options.strict && !report.is_complete() {
        bail!(
            "{} table(s) were left without replica identity",
            report.failed().count()
        );
    }

    Ok(report)
}

fn confirm_plan(schema: &LoadSchema) -> Result<bool> {
    println!();
    println!("{:<40} {:<40}", "Table", "Index");
    println!("{}", "─".repeat(80));
    for table in &schema.tables {
        let index = if table.is_bookkeeping() {
            "(skipped)".to_string()
        } else {
            crate::identity::index_name_for(&table.name)
        };
        println!("{:<40} {:<40}", sanitize_identifier(&table.name), index);
    }
    println!("{}", "─".repeat(80));
    println!();

    Confirm::with_theme(&ColorfulTheme::default())
        .with_prompt(format!(
            "Set REPLICA IDENTITY on {} table(s) in schema '{}'?",
            schema.user_tables().count(),
            schema.dataset
        ))
        .default(false)
        .interact()
        .context("Failed to get confirmation")
}

fn print_summary(report: &RunReport) {
    tracing::info!("");
    tracing::info!("========================================");
    tracing::info!("Replica Identity Summary");
    tracing::info!("========================================");
    tracing::info!("Schema: {}", report.schema);
    tracing::info!("User tables: {}", report.tables.len());
    tracing::info!("Indexes created: {}", report.created_count());
    tracing::info!("✓ Ready: {}", report.succeeded().count());
    tracing::info!("✗ Failed: {}", report.failed().count());
    tracing::info!("Skipped internal tables: {}", report.skipped.len());
    tracing::info!("========================================");

    for table in report.failed() {
        tracing::error!(
            "  ✗ {}: {}",
            sanitize_identifier(&table.table_name),
            table.failure_reason().unwrap_or("replica identity not set")
        );
    }
    if !report.is_complete() {
        tracing::info!("Re-run the command to retry the failed tables");
    }
}

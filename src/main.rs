// ABOUTME: CLI entry point for dlt-replica-identity
// ABOUTME: Parses commands and routes to appropriate handlers

use clap::{Args, Parser, Subcommand};
use dlt_replica_identity::commands;
use dlt_replica_identity::config::{self, ConfigOverrides, DestinationConfig, SslMode};

#[derive(Parser)]
#[command(name = "dlt-replica-identity")]
#[command(
    about = "Pin REPLICA IDENTITY of dlt-loaded PostgreSQL tables to their _dlt_id index",
    long_about = None
)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args, Clone, Default)]
struct DestinationArgs {
    /// Path to a TOML file with a [destination] table
    #[arg(long = "config")]
    config_path: Option<String>,
    /// Destination database name (default: datalake_house)
    #[arg(long, env = "DESTINATION_POSTGRES_DATABASE")]
    database: Option<String>,
    /// Destination user (default: myusername)
    #[arg(long, env = "DESTINATION_POSTGRES_USER")]
    user: Option<String>,
    /// Destination password (default: changeme)
    #[arg(long, env = "DESTINATION_POSTGRES_PASSWORD", hide_env_values = true)]
    password: Option<String>,
    /// Destination host (default: myapp)
    #[arg(long, env = "DESTINATION_POSTGRES_HOST")]
    host: Option<String>,
    /// Destination port (default: 50432)
    #[arg(long, env = "DESTINATION_POSTGRES_PORT")]
    port: Option<u16>,
    /// Dataset schema holding the loaded tables (default: my_schema_name)
    #[arg(long, env = "DESTINATION_POSTGRES_SCHEMA")]
    schema: Option<String>,
    /// TLS mode: disable, prefer, require, verify-ca, verify-full (default: prefer)
    #[arg(long, env = "DESTINATION_POSTGRES_SSLMODE")]
    sslmode: Option<SslMode>,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the _dlt_id unique index and set REPLICA IDENTITY on each user table
    Apply {
        #[command(flatten)]
        destination: DestinationArgs,
        /// Tables to process (comma-separated); discovered from the schema when omitted
        #[arg(long = "table", value_delimiter = ',')]
        tables: Vec<String>,
        /// Skip confirmation prompt
        #[arg(short = 'y', long)]
        yes: bool,
        /// Exit with an error if any table is left without replica identity
        #[arg(long)]
        strict: bool,
        /// Print the run report as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show the current replica identity of each user table
    Status {
        #[command(flatten)]
        destination: DestinationArgs,
        /// Tables to inspect (comma-separated); discovered from the schema when omitted
        #[arg(long = "table", value_delimiter = ',')]
        tables: Vec<String>,
        /// Print the status as JSON
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging - default to INFO level if RUST_LOG not set
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Apply {
            destination,
            tables,
            yes,
            strict,
            json,
        } => {
            let config = build_config(destination)?;
            let options = commands::ApplyOptions { yes, strict, json };
            commands::apply(&config, tables, options).await?;
            Ok(())
        }
        Commands::Status {
            destination,
            tables,
            json,
        } => {
            let config = build_config(destination)?;
            commands::status(&config, tables, json).await?;
            Ok(())
        }
    }
}

/// Defaults, then the config file, then environment and command line
fn build_config(args: DestinationArgs) -> anyhow::Result<DestinationConfig> {
    let base = match &args.config_path {
        Some(path) => config::load_config_file(path)?,
        None => DestinationConfig::default(),
    };

    let config = base.with_overrides(ConfigOverrides {
        database: args.database,
        user: args.user,
        password: args.password,
        host: args.host,
        port: args.port,
        schema: args.schema,
        sslmode: args.sslmode,
    });
    tracing::debug!("Using destination config {:?}", config);
    Ok(config)
}

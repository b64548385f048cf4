// ABOUTME: PostgreSQL utilities module
// ABOUTME: Exports destination connection management and catalog queries

pub mod catalog;
pub mod connection;

pub use catalog::{get_replica_identity, index_exists, list_tables, ReplicaIdentity};
pub use connection::connect;

/// Destination settings for `#[ignore]` tests that need a live database
#[cfg(test)]
pub(crate) fn test_config_from_env() -> crate::config::DestinationConfig {
    use crate::config::{ConfigOverrides, DestinationConfig};

    let var = |name: &str| std::env::var(name).ok();
    DestinationConfig::default().with_overrides(ConfigOverrides {
        database: var("DESTINATION_POSTGRES_DATABASE"),
        user: var("DESTINATION_POSTGRES_USER"),
        password: var("DESTINATION_POSTGRES_PASSWORD"),
        host: var("DESTINATION_POSTGRES_HOST"),
        port: var("DESTINATION_POSTGRES_PORT").and_then(|p| p.parse().ok()),
        schema: var("DESTINATION_POSTGRES_SCHEMA"),
        sslmode: var("DESTINATION_POSTGRES_SSLMODE").and_then(|m| m.parse().ok()),
    })
}

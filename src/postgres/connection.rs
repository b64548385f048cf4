// ABOUTME: PostgreSQL connection setup for the destination database
// ABOUTME: Handles TLS negotiation, error translation, and connection lifecycle

use crate::config::{DestinationConfig, SslMode};
use crate::error::IdentityError;
use anyhow::{Context, Result};
use native_tls::TlsConnector;
use postgres_native_tls::MakeTlsConnector;
use tokio_postgres::Client;

/// Connect to the destination database described by `config`
///
/// The configuration is validated first, so a missing parameter fails without
/// touching the network. TLS follows `config.sslmode`: with the default
/// `prefer`, a server certificate that is self-signed or names another host
/// is accepted, as libpq does.
///
/// # Errors
///
/// - [`IdentityError::Config`] if a required parameter is empty
/// - [`IdentityError::Connection`] if the server cannot be reached or rejects
///   the credentials
///
/// # Examples
///
/// ```no_run
/// # use anyhow::Result;
/// # use dlt_replica_identity::config::DestinationConfig;
/// # use dlt_replica_identity::postgres::connect;
/// # async fn example() -> Result<()> {
/// let client = connect(&DestinationConfig::default()).await?;
/// client.simple_query("SELECT 1").await?;
/// # Ok(())
/// # }
/// ```
pub async fn connect(config: &DestinationConfig) -> Result<Client> {
    config.validate()?;

    let tls = make_tls_connector(config.sslmode)?;

    tracing::debug!("Connecting to {}", config.display_target());

    let (client, connection) = config
        .pg_config()
        .connect(tls)
        .await
        .map_err(|e| IdentityError::Connection(describe_connect_error(&e.to_string())))?;

    tokio::spawn(async move {
        if let Err(e) = connection.await {
            tracing::error!("Connection error: {}", e);
        }
    });

    Ok(client)
}

/// Build the TLS connector with the certificate checks `sslmode` asks for
fn make_tls_connector(sslmode: SslMode) -> Result<MakeTlsConnector> {
    let tls_connector = TlsConnector::builder()
        .danger_accept_invalid_certs(sslmode.accepts_invalid_certs())
        .danger_accept_invalid_hostnames(sslmode.accepts_invalid_hostnames())
        .build()
        .context("Failed to build TLS connector")?;
    Ok(MakeTlsConnector::new(tls_connector))
}

/// Turn a driver error message into something a user can act on
fn describe_connect_error(error_msg: &str) -> String {
    if error_msg.contains("password authentication failed") {
        "Authentication failed: Invalid username or password.\n\
         Please verify your database credentials."
            .to_string()
    } else if error_msg.contains("database") && error_msg.contains("does not exist") {
        format!(
            "Database does not exist: {}\n\
             Please create the database first or check the configured name.",
            error_msg
        )
    } else if error_msg.contains("Connection refused") || error_msg.contains("could not connect")
    {
        format!(
            "Connection refused: Unable to reach database server.\n\
             Please check:\n\
             - The host and port are correct\n\
             - The database server is running\n\
             - Firewall rules allow connections\n\
             Error: {}",
            error_msg
        )
    } else if error_msg.contains("timeout") || error_msg.contains("timed out") {
        format!(
            "Connection timeout: Database server did not respond in time.\n\
             Error: {}",
            error_msg
        )
    } else if error_msg.contains("TLS handshake") || error_msg.contains("certificate") {
        format!(
            "TLS handshake failed: The server certificate was rejected.\n\
             Use sslmode prefer or require to skip certificate checks, or\n\
             install the server's CA for verify-ca / verify-full.\n\
             Error: {}",
            error_msg
        )
    } else if error_msg.contains("no pg_hba.conf entry") {
        format!(
            "Access denied: No pg_hba.conf entry for host.\n\
             Contact your database administrator to update pg_hba.conf.\n\
             Error: {}",
            error_msg
        )
    } else {
        format!("Failed to connect to the database: {}", error_msg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConfigOverrides;

    #[tokio::test]
    async fn test_connect_with_empty_password_fails_before_connecting() {
        let config = DestinationConfig::default().with_overrides(ConfigOverrides {
            password: Some(String::new()),
            // Unroutable host: reaching the network would hang or fail differently
            host: Some("203.0.113.1".to_string()),
            ..Default::default()
        });

        let err = connect(&config).await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<IdentityError>(),
            Some(IdentityError::Config(_))
        ));
    }

    #[tokio::test]
    async fn test_connect_refused_is_connection_error() {
        let config = DestinationConfig::default().with_overrides(ConfigOverrides {
            host: Some("127.0.0.1".to_string()),
            port: Some(1),
            ..Default::default()
        });

        let err = connect(&config).await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<IdentityError>(),
            Some(IdentityError::Connection(_))
        ));
    }

    #[test]
    fn test_describe_connect_error() {
        assert!(describe_connect_error("password authentication failed for user \"x\"")
            .starts_with("Authentication failed"));
        assert!(describe_connect_error("database \"nope\" does not exist")
            .starts_with("Database does not exist"));
        assert!(describe_connect_error("error connecting to server: Connection refused")
            .starts_with("Connection refused"));
        assert!(describe_connect_error("error performing TLS handshake")
            .starts_with("TLS handshake failed"));
        assert!(describe_connect_error("something else").contains("something else"));
    }

    #[test]
    fn test_tls_connector_builds_for_every_sslmode() {
        for mode in [
            SslMode::Disable,
            SslMode::Prefer,
            SslMode::Require,
            SslMode::VerifyCa,
            SslMode::VerifyFull,
        ] {
            assert!(make_tls_connector(mode).is_ok(), "sslmode {}", mode);
        }
    }

    // Needs a destination serving TLS with a self-signed certificate
    #[tokio::test]
    #[ignore]
    async fn test_connect_prefer_accepts_self_signed_certificate() {
        let config = crate::postgres::test_config_from_env().with_overrides(ConfigOverrides {
            sslmode: Some(SslMode::Prefer),
            ..Default::default()
        });
        let client = connect(&config).await.unwrap();
        let row = client
            .query_one("SELECT ssl FROM pg_stat_ssl WHERE pid = pg_backend_pid()", &[])
            .await
            .unwrap();
        let ssl: bool = row.get(0);
        assert!(ssl, "prefer should negotiate TLS when the server offers it");
    }

    #[tokio::test]
    #[ignore]
    async fn test_connect_with_live_destination() {
        let config = crate::postgres::test_config_from_env();
        let client = connect(&config).await.unwrap();
        let rows = client.simple_query("SELECT 1").await.unwrap();
        assert!(!rows.is_empty());
    }
}

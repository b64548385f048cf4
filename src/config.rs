// ABOUTME: Destination connection settings for the replica identity run
// ABOUTME: Merges defaults, an optional TOML file and CLI/env overrides, then validates

use crate::error::IdentityError;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// Default destination database name
pub const DEFAULT_DATABASE: &str = "datalake_house";
/// Default destination user
pub const DEFAULT_USER: &str = "myusername";
/// Default destination password
pub const DEFAULT_PASSWORD: &str = "changeme";
/// Default destination host
pub const DEFAULT_HOST: &str = "myapp";
/// Default destination port
pub const DEFAULT_PORT: u16 = 50432;
/// Default dataset schema the load driver writes into
pub const DEFAULT_SCHEMA: &str = "my_schema_name";

/// Connection parameters for the destination PostgreSQL database
///
/// Every field has a default so a partially filled TOML file is accepted.
/// `database`, `user`, `password` and `schema` must be non-empty by the time
/// [`DestinationConfig::validate`] runs.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DestinationConfig {
    pub database: String,
    pub user: String,
    pub password: String,
    pub host: String,
    pub port: u16,
    /// Dataset schema holding the loaded tables
    pub schema: String,
    pub sslmode: SslMode,
}

/// TLS policy for the destination connection, named as in libpq
///
/// `prefer` and `require` encrypt without checking the server certificate,
/// like libpq. Only the `verify-*` modes validate it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SslMode {
    Disable,
    #[default]
    Prefer,
    Require,
    VerifyCa,
    VerifyFull,
}

impl SslMode {
    /// Whether the certificate chain may be untrusted (self-signed, unknown CA)
    pub fn accepts_invalid_certs(self) -> bool {
        matches!(self, SslMode::Disable | SslMode::Prefer | SslMode::Require)
    }

    /// Whether the certificate may name a different host
    pub fn accepts_invalid_hostnames(self) -> bool {
        !matches!(self, SslMode::VerifyFull)
    }

    fn pg_ssl_mode(self) -> tokio_postgres::config::SslMode {
        match self {
            SslMode::Disable => tokio_postgres::config::SslMode::Disable,
            SslMode::Prefer => tokio_postgres::config::SslMode::Prefer,
            SslMode::Require | SslMode::VerifyCa | SslMode::VerifyFull => {
                tokio_postgres::config::SslMode::Require
            }
        }
    }
}

impl fmt::Display for SslMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SslMode::Disable => "disable",
            SslMode::Prefer => "prefer",
            SslMode::Require => "require",
            SslMode::VerifyCa => "verify-ca",
            SslMode::VerifyFull => "verify-full",
        };
        f.write_str(name)
    }
}

impl FromStr for SslMode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "disable" => Ok(SslMode::Disable),
            "prefer" => Ok(SslMode::Prefer),
            "require" => Ok(SslMode::Require),
            "verify-ca" => Ok(SslMode::VerifyCa),
            "verify-full" => Ok(SslMode::VerifyFull),
            other => anyhow::bail!(
                "Invalid sslmode '{}'. Expected one of: disable, prefer, require, verify-ca, verify-full",
                other
            ),
        }
    }
}

impl Default for DestinationConfig {
    fn default() -> Self {
        Self {
            database: DEFAULT_DATABASE.to_string(),
            user: DEFAULT_USER.to_string(),
            password: DEFAULT_PASSWORD.to_string(),
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            schema: DEFAULT_SCHEMA.to_string(),
            sslmode: SslMode::default(),
        }
    }
}

impl fmt::Debug for DestinationConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DestinationConfig")
            .field("database", &self.database)
            .field("user", &self.user)
            .field("password", &"********")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("schema", &self.schema)
            .field("sslmode", &self.sslmode)
            .finish()
    }
}

/// Values supplied on the command line or through the environment
///
/// `None` leaves the underlying value untouched.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub database: Option<String>,
    pub user: Option<String>,
    pub password: Option<String>,
    pub host: Option<String>,
    pub port: Option<u16>,
    pub schema: Option<String>,
    pub sslmode: Option<SslMode>,
}

#[derive(Debug, Default, Deserialize)]
struct ConfigFile {
    #[serde(default)]
    destination: DestinationConfig,
}

impl DestinationConfig {
    /// Apply overrides on top of the current values
    pub fn with_overrides(mut self, overrides: ConfigOverrides) -> Self {
        if let Some(database) = overrides.database {
            self.database = database;
        }
        if let Some(user) = overrides.user {
            self.user = user;
        }
        if let Some(password) = overrides.password {
            self.password = password;
        }
        if let Some(host) = overrides.host {
            self.host = host;
        }
        if let Some(port) = overrides.port {
            self.port = port;
        }
        if let Some(schema) = overrides.schema {
            self.schema = schema;
        }
        if let Some(sslmode) = overrides.sslmode {
            self.sslmode = sslmode;
        }
        self
    }

    /// Check that every required parameter is present
    ///
    /// # Errors
    ///
    /// Returns an [`IdentityError::Config`] naming the first empty parameter.
    /// Nothing is sent to the database before this check passes.
    pub fn validate(&self) -> Result<()> {
        let required = [
            ("database", &self.database),
            ("user", &self.user),
            ("password", &self.password),
            ("schema", &self.schema),
        ];

        for (name, value) in required {
            if value.trim().is_empty() {
                return Err(IdentityError::Config(format!(
                    "Database connection parameters are not properly set: {} is empty",
                    name
                ))
                .into());
            }
        }

        Ok(())
    }

    /// Build the tokio-postgres connection settings
    pub fn pg_config(&self) -> tokio_postgres::Config {
        let mut config = tokio_postgres::Config::new();
        config
            .dbname(&self.database)
            .user(&self.user)
            .password(&self.password)
            .host(&self.host)
            .port(self.port)
            .ssl_mode(self.sslmode.pg_ssl_mode())
            .application_name("dlt-replica-identity");
        config
    }

    /// Host, port and database for log lines (never includes credentials)
    pub fn display_target(&self) -> String {
        format!("{}:{}/{}", self.host, self.port, self.database)
    }
}

/// Load destination settings from a TOML file
///
/// The file holds a `[destination]` table; missing keys keep their defaults:
///
/// ```toml
/// [destination]
/// database = "warehouse"
/// host = "db.internal"
/// port = 5432
/// schema = "crm_data"
/// ```
pub fn load_config_file(path: impl AsRef<Path>) -> Result<DestinationConfig> {
    let path = path.as_ref();
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file {}", path.display()))?;
    let file: ConfigFile = toml::from_str(&contents)
        .with_context(|| format!("Failed to parse config file {}", path.display()))?;

    tracing::debug!("Loaded destination config from {}", path.display());
    Ok(file.destination)
}

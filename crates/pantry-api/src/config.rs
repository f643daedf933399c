//! Service configuration read from the environment.

use std::net::SocketAddr;
use std::str::FromStr;

use crate::error::AppError;

const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 3000;
const DEFAULT_DATABASE_MAX_CONNECTIONS: u32 = 10;
const DEFAULT_COMMAND_WORKERS: usize = 4;
const DEFAULT_CHANNEL_CAPACITY: usize = 1024;

/// Runtime settings for the API server and its workers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    /// `PostgreSQL` connection string.
    pub database_url: String,
    /// Interface to bind.
    pub host: String,
    /// Port to bind.
    pub port: u16,
    /// Upper bound on pooled database connections.
    pub database_max_connections: u32,
    /// Number of command consumer tasks.
    pub command_workers: usize,
    /// Pending commands held before ingress waits.
    pub command_channel_capacity: usize,
    /// Notifications buffered per subscriber.
    pub notification_channel_capacity: usize,
    /// OTLP collector endpoint; tracing export is off when unset.
    pub otlp_endpoint: Option<String>,
}

impl AppConfig {
    /// Reads the configuration from process environment variables.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if `DATABASE_URL` is missing or any value
    /// fails to parse.
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads the configuration through `lookup`, which maps a variable name
    /// to its value.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if `DATABASE_URL` is missing or any value
    /// fails to parse.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, AppError> {
        let database_url = lookup("DATABASE_URL").ok_or_else(|| {
            AppError::Config("DATABASE_URL environment variable must be set".to_owned())
        })?;

        Ok(Self {
            database_url,
            host: lookup("HOST").unwrap_or_else(|| DEFAULT_HOST.to_owned()),
            port: parse_or(&lookup, "PORT", DEFAULT_PORT)?,
            database_max_connections: parse_or(
                &lookup,
                "DATABASE_MAX_CONNECTIONS",
                DEFAULT_DATABASE_MAX_CONNECTIONS,
            )?,
            command_workers: positive_or(&lookup, "COMMAND_WORKERS", DEFAULT_COMMAND_WORKERS)?,
            command_channel_capacity: positive_or(
                &lookup,
                "COMMAND_CHANNEL_CAPACITY",
                DEFAULT_CHANNEL_CAPACITY,
            )?,
            notification_channel_capacity: positive_or(
                &lookup,
                "NOTIFICATION_CHANNEL_CAPACITY",
                DEFAULT_CHANNEL_CAPACITY,
            )?,
            otlp_endpoint: lookup("OTEL_EXPORTER_OTLP_ENDPOINT").filter(|v| !v.is_empty()),
        })
    }

    /// The socket address to listen on.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if host and port do not form an address.
    pub fn listen_addr(&self) -> Result<SocketAddr, AppError> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|e| AppError::Config(format!("invalid HOST:PORT combination: {e}")))
    }
}

fn parse_or<T>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: T,
) -> Result<T, AppError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e| AppError::Config(format!("{key} is invalid: {e}"))),
        None => Ok(default),
    }
}

fn positive_or(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: usize,
) -> Result<usize, AppError> {
    let value = parse_or(lookup, key, default)?;
    if value == 0 {
        return Err(AppError::Config(format!("{key} must be at least 1")));
    }
    Ok(value)
}

//! Gateway configuration loaded from environment variables.
//!
//! Follows 12-factor style: all settings come from environment variables
//! (or a `.env` file via `dotenvy`).

use std::net::SocketAddr;
use std::path::PathBuf;

/// Top-level gateway configuration.
///
/// Loaded once at startup via [`RelayConfig::from_env`].
#[derive(Debug, Clone)]
pub struct RelayConfig {
    /// Socket address to bind the HTTP server to (e.g. `0.0.0.0:3000`).
    pub listen_addr: SocketAddr,

    /// Credential source selector in effect at startup (`file` or
    /// `database`).
    pub credential_source: String,

    /// Path to the listener credentials JSON file.
    pub listeners_path: PathBuf,

    /// Path to the sender credentials JSON file.
    pub senders_path: PathBuf,

    /// Path to the audit event log JSON file.
    pub event_log_path: PathBuf,

    /// PostgreSQL connection string for the database credential source.
    /// When unset, only the file source is available.
    pub database_url: Option<String>,

    /// Maximum number of database connections in the pool.
    pub database_max_connections: u32,

    /// Timeout in seconds for acquiring a database connection.
    pub database_connect_timeout_secs: u64,

    /// Capacity of the EventBus broadcast channel.
    pub event_bus_capacity: usize,
}

impl RelayConfig {
    /// Loads configuration from environment variables.
    ///
    /// Falls back to sensible defaults when a variable is not set.
    /// Calls `dotenvy::dotenv().ok()` to optionally load a `.env` file.
    ///
    /// # Errors
    ///
    /// Returns an error if `LISTEN_ADDR` is set but cannot be parsed as
    /// a [`SocketAddr`].
    pub fn from_env() -> Result<Self, Box<dyn std::error::Error>> {
        dotenvy::dotenv().ok();

        let listen_addr: SocketAddr = std::env::var("LISTEN_ADDR")
            .unwrap_or_else(|_| "0.0.0.0:3000".to_string())
            .parse()?;

        let credential_source =
            std::env::var("CREDENTIAL_SOURCE").unwrap_or_else(|_| "file".to_string());

        let listeners_path = PathBuf::from(
            std::env::var("LISTENERS_PATH").unwrap_or_else(|_| "data/listeners.json".to_string()),
        );
        let senders_path = PathBuf::from(
            std::env::var("SENDERS_PATH").unwrap_or_else(|_| "data/senders.json".to_string()),
        );
        let event_log_path = PathBuf::from(
            std::env::var("EVENT_LOG_PATH").unwrap_or_else(|_| "data/server_logs.json".to_string()),
        );

        let database_url = std::env::var("DATABASE_URL").ok();
        let database_max_connections = parse_env("DATABASE_MAX_CONNECTIONS", 10);
        let database_connect_timeout_secs = parse_env("DATABASE_CONNECT_TIMEOUT_SECS", 5);

        let event_bus_capacity = parse_env("EVENT_BUS_CAPACITY", 10_000);

        Ok(Self {
            listen_addr,
            credential_source,
            listeners_path,
            senders_path,
            event_log_path,
            database_url,
            database_max_connections,
            database_connect_timeout_secs,
            event_bus_capacity,
        })
    }
}

/// Parses an environment variable as `T`, returning `default` on missing
/// or invalid values.
fn parse_env<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

//! Server configuration read from the environment.

use std::net::SocketAddr;

use axum::http::HeaderValue;

/// Default listen address.
const DEFAULT_BIND_ADDR: &str = "127.0.0.1:8080";

/// Default front-end origin allowed by CORS.
const DEFAULT_CORS_ORIGIN: &str = "http://localhost:3000";

/// Default size of the database connection pool.
const DEFAULT_MAX_CONNECTIONS: u32 = 5;

/// Errors raised while reading configuration at startup.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    /// A required variable is not set
    #[error("{0} is not set")]
    Missing(&'static str),

    /// A variable is set but cannot be parsed
    #[error("{name} is invalid: {reason}")]
    Invalid { name: &'static str, reason: String },
}

/// Configuration for the schedule server.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Connection string of the schedule database.
    pub database_url: String,

    /// Address the HTTP listener binds to.
    pub bind_addr: SocketAddr,

    /// Maximum number of pooled database connections.
    pub max_connections: u32,

    /// Origin allowed to call the API from a browser.
    pub cors_origin: HeaderValue,
}

impl ServerConfig {
    /// Read configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read configuration through `lookup`, which maps a variable name to its value.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let database_url = lookup("DATABASE_URL")
            .filter(|v| !v.trim().is_empty())
            .ok_or(ConfigError::Missing("DATABASE_URL"))?;

        let bind_addr = lookup("BIND_ADDR")
            .unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string())
            .parse()
            .map_err(|e: std::net::AddrParseError| ConfigError::Invalid {
                name: "BIND_ADDR",
                reason: e.to_string(),
            })?;

        let max_connections = match lookup("DATABASE_MAX_CONNECTIONS") {
            Some(raw) => parse_positive("DATABASE_MAX_CONNECTIONS", &raw)?,
            None => DEFAULT_MAX_CONNECTIONS,
        };

        let cors_origin = lookup("CORS_ORIGIN").unwrap_or_else(|| DEFAULT_CORS_ORIGIN.to_string());
        let cors_origin =
            HeaderValue::from_str(cors_origin.trim()).map_err(|e| ConfigError::Invalid {
                name: "CORS_ORIGIN",
                reason: e.to_string(),
            })?;

        Ok(Self {
            database_url,
            bind_addr,
            max_connections,
            cors_origin,
        })
    }
}

fn parse_positive(name: &'static str, raw: &str) -> Result<u32, ConfigError> {
    match raw.trim().parse::<u32>() {
        Ok(0) => Err(ConfigError::Invalid {
            name,
            reason: "must be at least 1".to_string(),
        }),
        Ok(n) => Ok(n),
        Err(e) => Err(ConfigError::Invalid {
            name,
            reason: e.to_string(),
        }),
    }
}

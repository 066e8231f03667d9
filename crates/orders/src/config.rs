//! Orders service configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `ORDERS_DATABASE_URL` - `PostgreSQL` connection string
//! - `DIRECTORY_API_URL` - Base URL of the external user directory
//!   (e.g., <https://reqres.in/api/users>)
//!
//! ## Optional
//! - `ORDERS_HOST` - Bind address (default: 127.0.0.1)
//! - `ORDERS_PORT` - Listen port (default: 8080)
//! - `DIRECTORY_API_KEY` - API key sent as `x-api-key` on directory requests;
//!   omit if the directory does not require one
//! - `SENTRY_DSN` - Sentry error tracking DSN

use std::net::{IpAddr, SocketAddr};

use secrecy::SecretString;
use thiserror::Error;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Orders service configuration.
#[derive(Debug, Clone)]
pub struct OrdersConfig {
    /// `PostgreSQL` database connection URL (contains password)
    pub database_url: SecretString,
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// External user directory configuration
    pub directory: DirectoryConfig,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
}

/// External user directory configuration.
///
/// Implements `Debug` manually to redact the API key.
#[derive(Clone)]
pub struct DirectoryConfig {
    /// Base URL of the paginated users endpoint
    pub base_url: String,
    /// API key attached to every request; `None` if the directory is open
    pub api_key: Option<SecretString>,
}

impl std::fmt::Debug for DirectoryConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DirectoryConfig")
            .field("base_url", &self.base_url)
            .field(
                "api_key",
                &self.api_key.as_ref().map(|_| "[REDACTED]"),
            )
            .finish()
    }
}

impl OrdersConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let database_url = get_database_url("ORDERS_DATABASE_URL")?;
        let host = get_env_or_default("ORDERS_HOST", "127.0.0.1")
            .parse::<IpAddr>()
            .map_err(|e| ConfigError::InvalidEnvVar("ORDERS_HOST".to_string(), e.to_string()))?;
        let port = get_env_or_default("ORDERS_PORT", "8080")
            .parse::<u16>()
            .map_err(|e| ConfigError::InvalidEnvVar("ORDERS_PORT".to_string(), e.to_string()))?;

        let directory = DirectoryConfig::from_env()?;
        let sentry_dsn = get_optional_env("SENTRY_DSN");

        Ok(Self {
            database_url,
            host,
            port,
            directory,
            sentry_dsn,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

impl DirectoryConfig {
    fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            base_url: get_required_env("DIRECTORY_API_URL")?,
            api_key: get_optional_env("DIRECTORY_API_KEY").map(SecretString::from),
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get database URL with fallback to generic `DATABASE_URL`.
fn get_database_url(primary_key: &str) -> Result<SecretString, ConfigError> {
    if let Ok(value) = std::env::var(primary_key) {
        return Ok(SecretString::from(value));
    }
    if let Ok(value) = std::env::var("DATABASE_URL") {
        return Ok(SecretString::from(value));
    }
    Err(ConfigError::MissingEnvVar(primary_key.to_string()))
}

/// Get an optional environment variable.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

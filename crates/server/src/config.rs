//! Server configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Optional
//! - `JSONSHOP_HOST` - Bind address (default: 127.0.0.1)
//! - `JSONSHOP_PORT` - Listen port (default: 3001)
//! - `JSONSHOP_PRODUCTS_FILE` - Products collection (default: data/products.json)
//! - `JSONSHOP_CARTS_FILE` - Carts collection (default: data/carts.json)
//! - `JSONSHOP_STORE_TIMEOUT_MS` - Bound on each collection load/save (default: 5000)
//! - `JSONSHOP_LOG_FORMAT` - `text` or `json` (default: text)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name
//! - `SENTRY_SAMPLE_RATE` - Error sample rate, 0.0-1.0 (default: 1.0)
//! - `SENTRY_TRACES_SAMPLE_RATE` - Transaction sample rate, 0.0-1.0 (default: 0.0)

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;

use crate::db::{CollectionPaths, Database, FileStore};

const DEFAULT_PORT: u16 = 3001;
const DEFAULT_PRODUCTS_FILE: &str = "data/products.json";
const DEFAULT_CARTS_FILE: &str = "data/carts.json";
const DEFAULT_STORE_TIMEOUT_MS: u64 = 5000;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Human-readable lines.
    #[default]
    Text,
    /// One JSON object per event.
    Json,
}

impl std::str::FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "text" | "pretty" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            _ => Err(format!("expected `text` or `json`, got `{s}`")),
        }
    }
}

/// Collection storage configuration, shared by the server and CLI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    /// Products collection file
    pub products_file: PathBuf,
    /// Carts collection file
    pub carts_file: PathBuf,
    /// Bound on each collection load/save
    pub timeout: Duration,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            products_file: PathBuf::from(DEFAULT_PRODUCTS_FILE),
            carts_file: PathBuf::from(DEFAULT_CARTS_FILE),
            timeout: Duration::from_millis(DEFAULT_STORE_TIMEOUT_MS),
        }
    }
}

impl StoreConfig {
    /// Load storage configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidEnvVar` if the timeout is not a number.
    pub fn from_env() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();
        Self::from_source(&env_source)
    }

    fn from_source(source: &dyn Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let timeout_ms: u64 = parse_or_default(
            source,
            "JSONSHOP_STORE_TIMEOUT_MS",
            DEFAULT_STORE_TIMEOUT_MS,
        )?;

        Ok(Self {
            products_file: source("JSONSHOP_PRODUCTS_FILE")
                .map_or(defaults.products_file, PathBuf::from),
            carts_file: source("JSONSHOP_CARTS_FILE").map_or(defaults.carts_file, PathBuf::from),
            timeout: Duration::from_millis(timeout_ms),
        })
    }

    /// Collection locations.
    #[must_use]
    pub fn paths(&self) -> CollectionPaths {
        CollectionPaths {
            products: self.products_file.clone(),
            carts: self.carts_file.clone(),
        }
    }

    /// Open a file-backed database for these collections.
    #[must_use]
    pub fn open(&self) -> Database {
        Database::new(Arc::new(FileStore::new()), self.paths(), self.timeout)
    }
}

/// Server application configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Collection storage
    pub store: StoreConfig,
    /// Log output format
    pub log_format: LogFormat,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment name
    pub sentry_environment: Option<String>,
    /// Fraction of errors sent to Sentry
    pub sentry_sample_rate: f32,
    /// Fraction of transactions sent to Sentry
    pub sentry_traces_sample_rate: f32,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: IpAddr::V4(Ipv4Addr::LOCALHOST),
            port: DEFAULT_PORT,
            store: StoreConfig::default(),
            log_format: LogFormat::default(),
            sentry_dsn: None,
            sentry_environment: None,
            sentry_sample_rate: 1.0,
            sentry_traces_sample_rate: 0.0,
        }
    }
}

impl ServerConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is present but cannot be parsed.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();
        Self::from_source(&env_source)
    }

    fn from_source(source: &dyn Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let host = parse_or_default(source, "JSONSHOP_HOST", defaults.host)?;
        let port = parse_or_default(source, "JSONSHOP_PORT", defaults.port)?;
        let store = StoreConfig::from_source(source)?;
        let log_format = parse_or_default(source, "JSONSHOP_LOG_FORMAT", defaults.log_format)?;
        let sentry_sample_rate =
            parse_rate(source, "SENTRY_SAMPLE_RATE", defaults.sentry_sample_rate)?;
        let sentry_traces_sample_rate = parse_rate(
            source,
            "SENTRY_TRACES_SAMPLE_RATE",
            defaults.sentry_traces_sample_rate,
        )?;

        Ok(Self {
            host,
            port,
            store,
            log_format,
            sentry_dsn: source("SENTRY_DSN").filter(|dsn| !dsn.is_empty()),
            sentry_environment: source("SENTRY_ENVIRONMENT"),
            sentry_sample_rate,
            sentry_traces_sample_rate,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

fn env_source(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

/// Parse a variable if set, otherwise use the default.
fn parse_or_default<T>(
    source: &dyn Fn(&str) -> Option<String>,
    key: &str,
    default: T,
) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    source(key).map_or(Ok(default), |value| {
        value
            .trim()
            .parse::<T>()
            .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
    })
}

/// Parse a sample rate in `0.0..=1.0`.
fn parse_rate(
    source: &dyn Fn(&str) -> Option<String>,
    key: &str,
    default: f32,
) -> Result<f32, ConfigError> {
    let rate = parse_or_default(source, key, default)?;
    if (0.0..=1.0).contains(&rate) {
        Ok(rate)
    } else {
        Err(ConfigError::InvalidEnvVar(
            key.to_string(),
            format!("must be between 0.0 and 1.0 (got {rate})"),
        ))
    }
}

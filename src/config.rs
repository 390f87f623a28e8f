//! Server configuration from environment variables (a `.env` file is loaded first
//! by the binary when present).
//!
//! - `STORE_BACKEND` - `postgres` (default) or `memory`
//! - `DATABASE_URL` - PostgreSQL URL; when unset it is assembled from `DB_HOST`,
//!   `DB_PORT`, `DB_USER`, `DB_PASSWORD`, `DB_NAME` and `DB_SSLMODE` (user and
//!   password are percent-encoded)
//! - `DB_MAX_CONNECTIONS` - pool size (default 5)
//! - `BIND_ADDR` - listen address (default `0.0.0.0:8080`)
//! - `REQUEST_TIMEOUT_SECS` - per-request deadline (default 30)
//! - `SEED_CATALOG` - seed sample items into an empty catalog (default true)
//! - `ADMIN_USERNAMES` - comma-separated users allowed to list everyone's carts and orders

use crate::error::ConfigError;
use std::net::SocketAddr;
use std::time::Duration;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StoreBackend {
    Postgres,
    Memory,
}

impl std::str::FromStr for StoreBackend {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "postgres" | "postgresql" => Ok(StoreBackend::Postgres),
            "memory" => Ok(StoreBackend::Memory),
            _ => Err(ConfigError::Invalid {
                key: "STORE_BACKEND",
                value: s.to_string(),
            }),
        }
    }
}

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub store: StoreBackend,
    pub database_url: String,
    pub max_connections: u32,
    pub bind_addr: SocketAddr,
    pub request_timeout: Duration,
    pub seed_catalog: bool,
    pub admin_usernames: Vec<String>,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup; blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let or = |key: &str, default: &str| get(key).unwrap_or_else(|| default.to_string());

        let store = or("STORE_BACKEND", "postgres").parse()?;
        let database_url = get("DATABASE_URL").unwrap_or_else(|| {
            format!(
                "postgres://{}:{}@{}:{}/{}?sslmode={}",
                urlencoding::encode(&or("DB_USER", "postgres")),
                urlencoding::encode(&or("DB_PASSWORD", "postgres")),
                or("DB_HOST", "localhost"),
                or("DB_PORT", "5432"),
                or("DB_NAME", "shopping_cart"),
                or("DB_SSLMODE", "disable"),
            )
        });
        let max_connections = parse("DB_MAX_CONNECTIONS", &or("DB_MAX_CONNECTIONS", "5"))?;
        let bind_addr = parse("BIND_ADDR", &or("BIND_ADDR", "0.0.0.0:8080"))?;
        let timeout_secs: u64 = parse("REQUEST_TIMEOUT_SECS", &or("REQUEST_TIMEOUT_SECS", "30"))?;
        let seed_catalog = parse_bool("SEED_CATALOG", &or("SEED_CATALOG", "true"))?;
        let admin_usernames = get("ADMIN_USERNAMES")
            .map(|v| {
                v.split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(String::from)
                    .collect()
            })
            .unwrap_or_default();

        Ok(AppConfig {
            store,
            database_url,
            max_connections,
            bind_addr,
            request_timeout: Duration::from_secs(timeout_secs),
            seed_catalog,
            admin_usernames,
        })
    }
}

fn parse<T: std::str::FromStr>(key: &'static str, value: &str) -> Result<T, ConfigError> {
    value.parse().map_err(|_| ConfigError::Invalid {
        key,
        value: value.to_string(),
    })
}

fn parse_bool(key: &'static str, value: &str) -> Result<bool, ConfigError> {
    match value.to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::Invalid {
            key,
            value: value.to_string(),
        }),
    }
}

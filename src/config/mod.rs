use std::env;
use std::fmt::Display;
use std::path::PathBuf;
use std::str::FromStr;

use chrono::Duration;

pub mod cors;

pub use cors::create_cors_layer;

const DEFAULT_DATABASE_URL: &str = "postgres://localhost/seating";
const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3001";
pub const DEFAULT_ALLOWED_ORIGINS: &str = "http://localhost:3000,http://localhost:5173";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Postgres,
    Memory,
}

impl FromStr for StoreBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "postgres" | "postgresql" => Ok(StoreBackend::Postgres),
            "memory" => Ok(StoreBackend::Memory),
            other => Err(format!("unknown store backend '{other}'")),
        }
    }
}

/// Hold lifetime policy.
#[derive(Debug, Clone)]
pub struct HoldConfig {
    pub default_ttl_secs: i64,
    pub max_ttl_secs: i64,
    /// Refuse holds on seats that are already unavailable.
    pub exclusive: bool,
    /// `0` disables the periodic reaper.
    pub reap_interval_secs: u64,
    pub reap_grace_secs: i64,
}

impl HoldConfig {
    pub fn reap_grace(&self) -> Duration {
        Duration::seconds(self.reap_grace_secs)
    }
}

impl Default for HoldConfig {
    fn default() -> Self {
        Self {
            default_ttl_secs: 600,
            max_ttl_secs: 3600,
            exclusive: false,
            reap_interval_secs: 0,
            reap_grace_secs: 86_400,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub max_connections: u32,
    pub store_backend: StoreBackend,
    /// Fixture loaded into the memory backend at startup.
    pub store_seed_path: Option<PathBuf>,
    pub bind_addr: String,
    pub seat_catalog_path: Option<PathBuf>,
    pub cors_allowed_origins: String,
    pub holds: HoldConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_url: DEFAULT_DATABASE_URL.to_string(),
            max_connections: 5,
            store_backend: StoreBackend::Postgres,
            store_seed_path: None,
            bind_addr: DEFAULT_BIND_ADDR.to_string(),
            seat_catalog_path: None,
            cors_allowed_origins: DEFAULT_ALLOWED_ORIGINS.to_string(),
            holds: HoldConfig::default(),
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let defaults = Config::default();
        let hold_defaults = defaults.holds;
        Self {
            database_url: env::var("DATABASE_URL").unwrap_or(defaults.database_url),
            max_connections: parse_var("DATABASE_MAX_CONNECTIONS", defaults.max_connections),
            store_backend: parse_var("STORE_BACKEND", defaults.store_backend),
            store_seed_path: path_var("STORE_SEED_PATH"),
            bind_addr: env::var("BIND_ADDR").unwrap_or(defaults.bind_addr),
            seat_catalog_path: path_var("SEAT_CATALOG_PATH"),
            cors_allowed_origins: env::var("CORS_ALLOWED_ORIGINS")
                .unwrap_or(defaults.cors_allowed_origins),
            holds: HoldConfig {
                default_ttl_secs: parse_var("HOLD_DEFAULT_TTL_SECS", hold_defaults.default_ttl_secs),
                max_ttl_secs: parse_var("HOLD_MAX_TTL_SECS", hold_defaults.max_ttl_secs),
                exclusive: parse_var("HOLD_EXCLUSIVE", hold_defaults.exclusive),
                reap_interval_secs: parse_var(
                    "HOLD_REAP_INTERVAL_SECS",
                    hold_defaults.reap_interval_secs,
                ),
                reap_grace_secs: parse_var("HOLD_REAP_GRACE_SECS", hold_defaults.reap_grace_secs),
            },
        }
    }
}

fn path_var(key: &str) -> Option<PathBuf> {
    env::var(key)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .map(PathBuf::from)
}

/// Reads and parses `key`, keeping `default` when unset or malformed.
fn parse_var<T>(key: &str, default: T) -> T
where
    T: FromStr,
    T::Err: Display,
{
    match env::var(key) {
        Ok(raw) => parse_or(key, &raw, default),
        Err(_) => default,
    }
}

fn parse_or<T>(key: &str, raw: &str, default: T) -> T
where
    T: FromStr,
    T::Err: Display,
{
    match raw.trim().parse::<T>() {
        Ok(value) => value,
        Err(e) => {
            tracing::warn!("Config: ignoring invalid {}='{}': {}", key, raw, e);
            default
        }
    }
}

//! Configuration loader for the `weather-monitor` processes.
//!
//! This module centralizes all runtime configuration values and their defaults,
//! loading from environment variables (with optional `.env` file support
//! provided by the caller). Each subcommand loads exactly the values it needs
//! once at startup and passes the resulting immutable struct down; nothing
//! else in the crate calls `env::var`.
//!
//! Loading is written against a lookup function rather than the process
//! environment directly, so [`load_collector_with`] and friends can be fed a
//! plain map in tests.
use std::{env, net::SocketAddr, time::Duration};

use crate::error::ConfigError;

/// Parse an optional numeric variable with a default value.
macro_rules! parse_or {
    ($lookup:expr, $var_name:expr, $ty:ty, $default:expr) => {
        match $lookup($var_name) {
            Some(v) => v.trim().parse::<$ty>().map_err(|e| ConfigError::Invalid {
                var: $var_name,
                reason: e.to_string(),
            })?,
            None => $default,
        }
    };
}

/// Parse a required, non-empty string variable.
macro_rules! require {
    ($lookup:expr, $var_name:expr) => {
        $lookup($var_name)
            .filter(|v: &String| !v.trim().is_empty())
            .ok_or(ConfigError::Missing($var_name))?
    };
}

pub const DEFAULT_DATABASE_URL: &str = "sqlite://monitoramento.db?mode=rwc";
pub const DEFAULT_API_URL: &str = "https://api.hgbrasil.com/weather";
pub const DEFAULT_CITY: &str = "Sao Paulo,SP";
/// 2h24m, ten samples a day.
pub const DEFAULT_INTERVAL_SECS: u64 = 8640;
pub const DEFAULT_MARGIN_SECS: u64 = 5;
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_DASHBOARD_ADDR: &str = "0.0.0.0:8080";

/// Connection settings shared by every subcommand.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    // ---
    /// SQLite connection string.
    pub db_url: String,

    /// Maximum number of database connections in the pool.
    pub db_pool_max: u32,
}

/// Everything the collector loop needs. Built once, never mutated.
#[derive(Debug, Clone)]
pub struct CollectorConfig {
    // ---
    pub store: StoreConfig,

    /// Weather API endpoint, without query string.
    pub api_url: String,

    /// Weather API credential. Never logged in clear.
    pub api_key: String,

    /// City sent as `city_name`; also the location recorded for the sensors.
    pub city: String,

    /// Target period between two collections.
    pub interval: Duration,

    /// Slack added when waiting for the next slot.
    pub margin: Duration,

    /// Upper bound for a single upstream request.
    pub http_timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct DashboardConfig {
    // ---
    pub store: StoreConfig,

    /// Address the HTTP dashboard binds to.
    pub listen_addr: SocketAddr,

    /// Location shown in the page title.
    pub location: String,
}

fn env_lookup(key: &str) -> Option<String> {
    env::var(key).ok()
}

/// Load the store settings.
///
/// Optional:
/// - `DATABASE_URL` – SQLite connection string (default: `monitoramento.db` in cwd)
/// - `DB_POOL_MAX` – max DB connections (default: 5)
pub fn load_store_with<F>(lookup: F) -> Result<StoreConfig, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    // ---
    let db_url = lookup("DATABASE_URL").unwrap_or_else(|| DEFAULT_DATABASE_URL.to_string());
    let db_pool_max = parse_or!(lookup, "DB_POOL_MAX", u32, 5);

    Ok(StoreConfig {
        db_url,
        db_pool_max,
    })
}

/// Load the collector settings.
///
/// Required:
/// - `CLIMATE_API_KEY` – weather API key
///
/// Optional:
/// - `WEATHER_API_URL`, `WEATHER_CITY`
/// - `COLLECT_INTERVAL_SECS` (default: 8640), `COLLECT_MARGIN_SECS` (default: 5)
/// - `HTTP_TIMEOUT_SECS` (default: 30)
pub fn load_collector_with<F>(lookup: F) -> Result<CollectorConfig, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    // ---
    let store = load_store_with(&lookup)?;
    let api_key = require!(lookup, "CLIMATE_API_KEY");
    let api_url = lookup("WEATHER_API_URL").unwrap_or_else(|| DEFAULT_API_URL.to_string());
    let city = load_location_with(&lookup);
    let interval_secs = parse_or!(lookup, "COLLECT_INTERVAL_SECS", u64, DEFAULT_INTERVAL_SECS);
    let margin_secs = parse_or!(lookup, "COLLECT_MARGIN_SECS", u64, DEFAULT_MARGIN_SECS);
    let timeout_secs = parse_or!(lookup, "HTTP_TIMEOUT_SECS", u64, DEFAULT_HTTP_TIMEOUT_SECS);

    if interval_secs == 0 {
        return Err(ConfigError::Invalid {
            var: "COLLECT_INTERVAL_SECS",
            reason: "must be greater than zero".to_string(),
        });
    }

    Ok(CollectorConfig {
        store,
        api_url,
        api_key,
        city,
        interval: Duration::from_secs(interval_secs),
        margin: Duration::from_secs(margin_secs),
        http_timeout: Duration::from_secs(timeout_secs),
    })
}

/// Load the dashboard settings.
///
/// Optional:
/// - `DASHBOARD_ADDR` (default: `0.0.0.0:8080`)
/// - `WEATHER_CITY` – shown in the page title
pub fn load_dashboard_with<F>(lookup: F) -> Result<DashboardConfig, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    // ---
    let store = load_store_with(&lookup)?;
    let listen_addr = match lookup("DASHBOARD_ADDR") {
        Some(v) => v.trim().parse().map_err(|e: std::net::AddrParseError| {
            ConfigError::Invalid {
                var: "DASHBOARD_ADDR",
                reason: e.to_string(),
            }
        })?,
        None => DEFAULT_DASHBOARD_ADDR
            .parse()
            .map_err(|e: std::net::AddrParseError| ConfigError::Invalid {
                var: "DASHBOARD_ADDR",
                reason: e.to_string(),
            })?,
    };
    let location = load_location_with(&lookup);

    Ok(DashboardConfig {
        store,
        listen_addr,
        location,
    })
}

/// City recorded as the sensors' location: `WEATHER_CITY` or the default.
pub fn load_location_with<F>(lookup: F) -> String
where
    F: Fn(&str) -> Option<String>,
{
    lookup("WEATHER_CITY").unwrap_or_else(|| DEFAULT_CITY.to_string())
}

pub fn load_location() -> String {
    load_location_with(env_lookup)
}

pub fn load_store() -> Result<StoreConfig, ConfigError> {
    load_store_with(env_lookup)
}

pub fn load_collector() -> Result<CollectorConfig, ConfigError> {
    load_collector_with(env_lookup)
}

pub fn load_dashboard() -> Result<DashboardConfig, ConfigError> {
    load_dashboard_with(env_lookup)
}

/// Keep the last four characters of a secret, star out the rest.
pub fn mask_secret(secret: &str) -> String {
    // ---
    let chars: Vec<char> = secret.chars().collect();
    let keep = chars.len().min(4);
    let hidden = chars.len() - keep;
    let mut masked = "*".repeat(hidden);
    masked.extend(&chars[hidden..]);
    masked
}

impl StoreConfig {
    pub fn log_config(&self) {
        // ---
        tracing::info!("  DATABASE_URL          : {}", self.db_url);
        tracing::info!("  DB_POOL_MAX           : {}", self.db_pool_max);
    }
}

impl CollectorConfig {
    /// Log the loaded configuration, API key masked.
    pub fn log_config(&self) {
        // ---
        tracing::info!("Configuration loaded:");
        self.store.log_config();
        tracing::info!("  WEATHER_API_URL       : {}", self.api_url);
        tracing::info!("  CLIMATE_API_KEY       : {}", mask_secret(&self.api_key));
        tracing::info!("  WEATHER_CITY          : {}", self.city);
        tracing::info!("  COLLECT_INTERVAL_SECS : {}", self.interval.as_secs());
        tracing::info!("  COLLECT_MARGIN_SECS   : {}", self.margin.as_secs());
        tracing::info!("  HTTP_TIMEOUT_SECS     : {}", self.http_timeout.as_secs());
    }
}

impl DashboardConfig {
    pub fn log_config(&self) {
        // ---
        tracing::info!("Configuration loaded:");
        self.store.log_config();
        tracing::info!("  DASHBOARD_ADDR        : {}", self.listen_addr);
        tracing::info!("  WEATHER_CITY          : {}", self.location);
    }
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_missing_api_key_is_fatal() {
        // ---
        let err = load_collector_with(lookup_from(&[])).unwrap_err();
        assert!(matches!(err, ConfigError::Missing("CLIMATE_API_KEY")));

        let err = load_collector_with(lookup_from(&[("CLIMATE_API_KEY", "  ")])).unwrap_err();
        assert!(matches!(err, ConfigError::Missing("CLIMATE_API_KEY")));
    }

    #[test]
    fn test_collector_defaults() {
        // ---
        let cfg = load_collector_with(lookup_from(&[("CLIMATE_API_KEY", "abc123")])).unwrap();

        assert_eq!(cfg.api_key, "abc123");
        assert_eq!(cfg.api_url, DEFAULT_API_URL);
        assert_eq!(cfg.city, DEFAULT_CITY);
        assert_eq!(cfg.interval, Duration::from_secs(8640));
        assert_eq!(cfg.margin, Duration::from_secs(5));
        assert_eq!(cfg.http_timeout, Duration::from_secs(30));
        assert_eq!(cfg.store.db_url, DEFAULT_DATABASE_URL);
        assert_eq!(cfg.store.db_pool_max, 5);
    }

    #[test]
    fn test_collector_overrides() {
        // ---
        let cfg = load_collector_with(lookup_from(&[
            ("CLIMATE_API_KEY", "k"),
            ("WEATHER_CITY", "Curitiba,PR"),
            ("COLLECT_INTERVAL_SECS", "60"),
            ("COLLECT_MARGIN_SECS", "0"),
            ("DATABASE_URL", "sqlite::memory:"),
        ]))
        .unwrap();

        assert_eq!(cfg.city, "Curitiba,PR");
        assert_eq!(cfg.interval, Duration::from_secs(60));
        assert_eq!(cfg.margin, Duration::ZERO);
        assert_eq!(cfg.store.db_url, "sqlite::memory:");
    }

    #[test]
    fn test_invalid_numbers_are_rejected() {
        // ---
        let err = load_collector_with(lookup_from(&[
            ("CLIMATE_API_KEY", "k"),
            ("COLLECT_INTERVAL_SECS", "often"),
        ]))
        .unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Invalid {
                var: "COLLECT_INTERVAL_SECS",
                ..
            }
        ));

        let err = load_collector_with(lookup_from(&[
            ("CLIMATE_API_KEY", "k"),
            ("COLLECT_INTERVAL_SECS", "0"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { .. }));

        let err = load_store_with(lookup_from(&[("DB_POOL_MAX", "-1")])).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { var: "DB_POOL_MAX", .. }));
    }

    #[test]
    fn test_dashboard_does_not_need_api_key() {
        // ---
        let cfg = load_dashboard_with(lookup_from(&[("DASHBOARD_ADDR", "127.0.0.1:9000")])).unwrap();
        assert_eq!(cfg.listen_addr.port(), 9000);
        assert_eq!(cfg.location, DEFAULT_CITY);

        let err = load_dashboard_with(lookup_from(&[("DASHBOARD_ADDR", "nowhere")])).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { var: "DASHBOARD_ADDR", .. }));
    }

    #[test]
    fn test_mask_secret() {
        // ---
        assert_eq!(mask_secret("abcdef12"), "****ef12");
        assert_eq!(mask_secret("abc"), "abc");
        assert_eq!(mask_secret(""), "");
    }
}

//! Process configuration, read once from the environment at startup.
//!
//! Unset variables use their defaults quietly; values that fail to parse log a
//! warning and fall back to the default.

use std::env;
use std::fmt::Display;
use std::net::SocketAddr;
use std::str::FromStr;

use tracing::{info, warn};

use freezer_infra::ServiceSettings;
use freezer_inventory::{BEST_BEFORE_DAYS_MAX, DEFAULT_BEST_BEFORE_DAYS};

const DEFAULT_APP_ENV: &str = "dev";
const DEFAULT_EXPIRING_WINDOW_DAYS: i64 = 14;
const DEFAULT_DB_MAX_CONNECTIONS: u32 = 5;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub app_env: String,
    pub bind_addr: SocketAddr,
    /// `None` selects the in-memory store.
    pub database_url: Option<String>,
    pub db_max_connections: u32,
    pub default_best_before_days: u32,
    pub expiring_window_days: i64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self::from_lookup(|_| None)
    }
}

impl AppConfig {
    pub fn load() -> Self {
        let config = Self::from_lookup(|key| env::var(key).ok());
        info!(
            app_env = %config.app_env,
            bind_addr = %config.bind_addr,
            persistent = config.database_url.is_some(),
            "configuration loaded"
        );
        config
    }

    /// Build from an arbitrary key lookup (the environment in production).
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let app_env = lookup("APP_ENV")
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| DEFAULT_APP_ENV.to_string());

        let bind_addr = parse_or("BIND_ADDR", lookup("BIND_ADDR"), || {
            SocketAddr::from(([0, 0, 0, 0], 8080))
        });

        let database_url = lookup("DATABASE_URL")
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty());

        let db_max_connections = positive_or(
            "DB_MAX_CONNECTIONS",
            lookup("DB_MAX_CONNECTIONS"),
            DEFAULT_DB_MAX_CONNECTIONS,
        );

        let default_best_before_days = positive_or(
            "DEFAULT_BEST_BEFORE_DAYS",
            lookup("DEFAULT_BEST_BEFORE_DAYS"),
            DEFAULT_BEST_BEFORE_DAYS,
        );
        let default_best_before_days = if default_best_before_days > BEST_BEFORE_DAYS_MAX {
            warn!("DEFAULT_BEST_BEFORE_DAYS must be at most {BEST_BEFORE_DAYS_MAX}, using default: {DEFAULT_BEST_BEFORE_DAYS}");
            DEFAULT_BEST_BEFORE_DAYS
        } else {
            default_best_before_days
        };

        let expiring_window_days = parse_or(
            "EXPIRING_WINDOW_DAYS",
            lookup("EXPIRING_WINDOW_DAYS"),
            || DEFAULT_EXPIRING_WINDOW_DAYS,
        );
        let expiring_window_days = if !(0..=i64::from(BEST_BEFORE_DAYS_MAX)).contains(&expiring_window_days) {
            warn!("EXPIRING_WINDOW_DAYS must be between 0 and {BEST_BEFORE_DAYS_MAX}, using default: {DEFAULT_EXPIRING_WINDOW_DAYS}");
            DEFAULT_EXPIRING_WINDOW_DAYS
        } else {
            expiring_window_days
        };

        Self {
            app_env,
            bind_addr,
            database_url,
            db_max_connections,
            default_best_before_days,
            expiring_window_days,
        }
    }

    pub fn service_settings(&self) -> ServiceSettings {
        ServiceSettings {
            default_best_before_days: self.default_best_before_days,
            expiring_window_days: self.expiring_window_days,
        }
    }
}

/// `APP_ENV` on its own, for setting up logging before the full load.
pub fn app_env() -> String {
    env::var("APP_ENV").unwrap_or_else(|_| DEFAULT_APP_ENV.to_string())
}

fn parse_or<T>(key: &str, raw: Option<String>, default: impl FnOnce() -> T) -> T
where
    T: FromStr,
    T::Err: Display,
{
    match raw.as_deref().map(str::trim) {
        None | Some("") => default(),
        Some(value) => value.parse().unwrap_or_else(|e| {
            warn!("Invalid {key} value '{value}': {e}; using default");
            default()
        }),
    }
}

fn positive_or(key: &str, raw: Option<String>, default: u32) -> u32 {
    match parse_or(key, raw, || default) {
        0 => {
            warn!("{key} must be at least 1, using default: {default}");
            default
        }
        v => v,
    }
}

//! Application configuration loaded from environment variables.

use std::time::Duration;

use client::ClientOptions;

const DEFAULT_FLEET_TIMEOUT: Duration = Duration::from_secs(5);
const DEFAULT_PAYMENT_TIMEOUT: Duration = Duration::from_secs(10);
const DEFAULT_NOTIFICATION_TIMEOUT: Duration = Duration::from_secs(2);

/// Connection settings for one downstream integration.
///
/// An absent base URL means the integration runs against its in-memory
/// implementation, which keeps a bare `cargo run` usable.
#[derive(Debug, Clone)]
pub struct IntegrationConfig {
    pub base_url: Option<String>,
    pub timeout: Duration,
}

impl IntegrationConfig {
    fn from_env(url_var: &str, timeout_var: &str, default_timeout: Duration) -> Self {
        Self {
            base_url: non_empty_var(url_var),
            timeout: secs_var(timeout_var).unwrap_or(default_timeout),
        }
    }

    /// Client options for this integration; retry tuning uses the
    /// client-wide defaults.
    pub fn client_options(&self) -> ClientOptions {
        ClientOptions {
            timeout: self.timeout,
            ..ClientOptions::default()
        }
    }
}

/// Server configuration with sensible defaults.
///
/// Reads from environment variables:
/// - `HOST` — bind address (default: `"0.0.0.0"`)
/// - `PORT` — listen port (default: `3000`)
/// - `RUST_LOG` — tracing filter directive (default: `"info"`)
/// - `DATABASE_URL` — Postgres store (absent: in-memory store)
/// - `REDIS_URL` — lock backend (absent: in-memory lock)
/// - `FLEET_API_URL` / `PAYMENT_API_URL` / `NOTIFICATION_API_URL` —
///   downstream bases (absent: in-memory implementations)
/// - `FLEET_TIMEOUT_SECS` / `PAYMENT_TIMEOUT_SECS` /
///   `NOTIFICATION_TIMEOUT_SECS` — per-integration request deadlines
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub log_level: String,
    pub database_url: Option<String>,
    pub redis_url: Option<String>,
    pub fleet: IntegrationConfig,
    pub payment: IntegrationConfig,
    pub notification: IntegrationConfig,
}

impl Config {
    /// Loads configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self {
            host: std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: std::env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(3000),
            log_level: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            database_url: non_empty_var("DATABASE_URL"),
            redis_url: non_empty_var("REDIS_URL"),
            fleet: IntegrationConfig::from_env(
                "FLEET_API_URL",
                "FLEET_TIMEOUT_SECS",
                DEFAULT_FLEET_TIMEOUT,
            ),
            payment: IntegrationConfig::from_env(
                "PAYMENT_API_URL",
                "PAYMENT_TIMEOUT_SECS",
                DEFAULT_PAYMENT_TIMEOUT,
            ),
            notification: IntegrationConfig::from_env(
                "NOTIFICATION_API_URL",
                "NOTIFICATION_TIMEOUT_SECS",
                DEFAULT_NOTIFICATION_TIMEOUT,
            ),
        }
    }

    /// Returns the `"host:port"` bind address string.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            log_level: "info".to_string(),
            database_url: None,
            redis_url: None,
            fleet: IntegrationConfig {
                base_url: None,
                timeout: DEFAULT_FLEET_TIMEOUT,
            },
            payment: IntegrationConfig {
                base_url: None,
                timeout: DEFAULT_PAYMENT_TIMEOUT,
            },
            notification: IntegrationConfig {
                base_url: None,
                timeout: DEFAULT_NOTIFICATION_TIMEOUT,
            },
        }
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|value| !value.is_empty())
}

fn secs_var(name: &str) -> Option<Duration> {
    std::env::var(name)
        .ok()
        .and_then(|value| value.parse().ok())
        .map(Duration::from_secs)
}

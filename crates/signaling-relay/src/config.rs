//! Configuration for the signaling relay.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::fmt;
use std::path::PathBuf;

/// Relay configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Server configuration
    #[serde(default)]
    pub server: ServerConfig,

    /// Ledger storage configuration
    #[serde(default)]
    pub store: StoreConfig,

    /// Rate limiting configuration
    #[serde(default)]
    pub rate_limit: RateLimitConfig,

    /// Event feed configuration
    #[serde(default)]
    pub events: EventsConfig,

    /// Ledger bootstrap configuration
    #[serde(default)]
    pub relay: RelayConfig,

    /// Logging configuration
    #[serde(default)]
    pub log: LogConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Server listen address
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Answer CORS preflights from any origin (browser peers)
    #[serde(default)]
    pub allow_cors: bool,
}

#[derive(Clone, Deserialize)]
pub struct StoreConfig {
    /// Path to the sealed ledger file
    #[serde(default = "default_store_path")]
    pub path: PathBuf,

    /// Enable persistence (if false, the ledger is in-memory only)
    #[serde(default = "default_true")]
    pub persist: bool,

    /// Secret the sealing key is derived from
    #[serde(default)]
    pub secret: Option<String>,
}

// Keeps the sealing secret out of logs.
impl fmt::Debug for StoreConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StoreConfig")
            .field("path", &self.path)
            .field("persist", &self.persist)
            .field("secret", &self.secret.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RateLimitConfig {
    /// Global requests per minute
    #[serde(default = "default_global_rpm")]
    pub global_per_minute: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EventsConfig {
    /// Events buffered per subscriber
    #[serde(default = "default_channel_capacity")]
    pub channel_capacity: usize,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RelayConfig {
    /// Identity registered under the empty name when the ledger is created
    #[serde(default)]
    pub operator_id: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LogConfig {
    /// Log level
    #[serde(default = "default_log_level")]
    pub level: String,
}

// Default implementations
impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: default_listen_addr(),
            port: default_port(),
            allow_cors: false,
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: default_store_path(),
            persist: true,
            secret: None,
        }
    }
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            global_per_minute: default_global_rpm(),
        }
    }
}

impl Default for EventsConfig {
    fn default() -> Self {
        Self {
            channel_capacity: default_channel_capacity(),
        }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

// Default value functions
fn default_listen_addr() -> String {
    "0.0.0.0".into()
}

fn default_port() -> u16 {
    8090
}

fn default_store_path() -> PathBuf {
    PathBuf::from("/data/ledger.enc")
}

fn default_true() -> bool {
    true
}

fn default_global_rpm() -> u32 {
    120
}

fn default_channel_capacity() -> usize {
    signaling_medium::DEFAULT_EVENT_CAPACITY
}

fn default_log_level() -> String {
    "info".into()
}

impl Config {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self> {
        // Load .env file if present
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(
                config::Environment::default()
                    .separator("__")
                    .try_parsing(false),
            )
            .build()
            .context("Failed to build configuration")?;

        config
            .try_deserialize()
            .context("Failed to deserialize configuration")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config: Config = serde_json::from_str("{}").unwrap();

        assert_eq!(config.server.listen_addr, "0.0.0.0");
        assert_eq!(config.server.port, 8090);
        assert!(!config.server.allow_cors);
        assert!(config.store.persist);
        assert!(config.store.secret.is_none());
        assert_eq!(config.rate_limit.global_per_minute, 120);
        assert_eq!(config.events.channel_capacity, 256);
        assert!(config.relay.operator_id.is_none());
        assert_eq!(config.log.level, "info");
    }

    #[test]
    fn test_overrides() {
        let config: Config = config::Config::builder()
            .set_override("server.port", 9000i64)
            .unwrap()
            .set_override("store.persist", false)
            .unwrap()
            .set_override("relay.operator_id", "operator")
            .unwrap()
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();

        assert_eq!(config.server.port, 9000);
        assert!(!config.store.persist);
        assert_eq!(config.relay.operator_id.as_deref(), Some("operator"));
        assert_eq!(config.store.path, PathBuf::from("/data/ledger.enc"));
    }

    #[test]
    fn test_store_secret_redacted() {
        let store = StoreConfig {
            secret: Some("hunter2hunter2hunter2".into()),
            ..StoreConfig::default()
        };

        let debug = format!("{:?}", store);
        assert!(!debug.contains("hunter2"));
        assert!(debug.contains("[REDACTED]"));
    }
}

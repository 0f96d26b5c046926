//! Engine configuration: server binding, store connection, pools, workers.

use std::env;

use serde::{Deserialize, Serialize};

/// HTTP server binding.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Host to bind to.
    pub host: String,
    /// Port to bind to.
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_owned(),
            port: 1245,
        }
    }
}

/// Counter store connection.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Connection URL of the key/value service.
    pub url: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            url: "redis://127.0.0.1:6379".to_owned(),
        }
    }
}

/// Seat pool sizing and drain settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SeatConfig {
    /// Fixed seat pool capacity.
    pub capacity: u32,
    /// Drain concurrency for seat commits; 1 keeps the commit path serial.
    pub concurrency: u32,
}

impl Default for SeatConfig {
    fn default() -> Self {
        Self {
            capacity: 50,
            concurrency: 1,
        }
    }
}

/// Notification drain settings and the recipient blacklist.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NotificationConfig {
    /// Drain concurrency for notification delivery.
    pub concurrency: u32,
    /// Recipients rejected by the domain guard.
    pub blacklist: Vec<String>,
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            concurrency: 2,
            blacklist: vec!["4153518780".to_owned(), "4153518781".to_owned()],
        }
    }
}

/// Queue depth and drain poll tuning.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct QueueConfig {
    /// Maximum undelivered jobs before enqueues are rejected.
    pub max_depth: usize,
    /// Poll interval in milliseconds when a drain lane is empty.
    pub poll_interval_ms: u64,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            max_depth: 1024,
            poll_interval_ms: 50,
        }
    }
}

/// Root engine configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// HTTP server binding.
    pub server: ServerConfig,
    /// Counter store connection.
    pub store: StoreConfig,
    /// Seat pool settings.
    pub seats: SeatConfig,
    /// Notification settings.
    pub notifications: NotificationConfig,
    /// Queue tuning.
    pub queue: QueueConfig,
}

impl EngineConfig {
    /// Load configuration from the environment, falling back to defaults.
    ///
    /// Recognized variables: `TURNSTILE_HOST`, `TURNSTILE_PORT`,
    /// `REDIS_URL`, `TURNSTILE_SEAT_CAPACITY`, `TURNSTILE_SEAT_CONCURRENCY`,
    /// `TURNSTILE_NOTIFY_CONCURRENCY`, `TURNSTILE_BLACKLIST`
    /// (comma-separated), `TURNSTILE_QUEUE_DEPTH`,
    /// `TURNSTILE_POLL_INTERVAL_MS`.
    #[must_use]
    pub fn from_env() -> Self {
        let mut cfg = Self::default();
        if let Ok(host) = env::var("TURNSTILE_HOST") {
            cfg.server.host = host;
        }
        if let Some(port) = parse_var("TURNSTILE_PORT") {
            cfg.server.port = port;
        }
        if let Ok(url) = env::var("REDIS_URL") {
            cfg.store.url = url;
        }
        if let Some(capacity) = parse_var("TURNSTILE_SEAT_CAPACITY") {
            cfg.seats.capacity = capacity;
        }
        if let Some(concurrency) = parse_var("TURNSTILE_SEAT_CONCURRENCY") {
            cfg.seats.concurrency = concurrency;
        }
        if let Some(concurrency) = parse_var("TURNSTILE_NOTIFY_CONCURRENCY") {
            cfg.notifications.concurrency = concurrency;
        }
        if let Ok(blacklist) = env::var("TURNSTILE_BLACKLIST") {
            cfg.notifications.blacklist = blacklist
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_owned)
                .collect();
        }
        if let Some(depth) = parse_var("TURNSTILE_QUEUE_DEPTH") {
            cfg.queue.max_depth = depth;
        }
        if let Some(interval) = parse_var("TURNSTILE_POLL_INTERVAL_MS") {
            cfg.queue.poll_interval_ms = interval;
        }
        cfg
    }

    /// Validate configuration values.
    ///
    /// # Errors
    ///
    /// A human-readable description of the first invalid value.
    pub fn validate(&self) -> Result<(), String> {
        if self.seats.concurrency == 0 {
            return Err("seats.concurrency must be greater than 0".into());
        }
        if self.notifications.concurrency == 0 {
            return Err("notifications.concurrency must be greater than 0".into());
        }
        if self.queue.max_depth == 0 {
            return Err("queue.max_depth must be greater than 0".into());
        }
        if self.queue.poll_interval_ms == 0 {
            return Err("queue.poll_interval_ms must be greater than 0".into());
        }
        if self.store.url.is_empty() {
            return Err("store.url must not be empty".into());
        }
        Ok(())
    }

    /// Parse configuration from a JSON string and validate.
    ///
    /// # Errors
    ///
    /// A description of the parse or validation failure.
    pub fn from_json_str(input: &str) -> Result<Self, String> {
        let cfg: Self = serde_json::from_str(input).map_err(|e| format!("parse error: {e}"))?;
        cfg.validate()?;
        Ok(cfg)
    }
}

fn parse_var<T: std::str::FromStr>(name: &str) -> Option<T> {
    env::var(name).ok().and_then(|v| v.parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_validate() {
        assert!(EngineConfig::default().validate().is_ok());
    }

    #[test]
    fn test_zero_concurrency_rejected() {
        let mut cfg = EngineConfig::default();
        cfg.seats.concurrency = 0;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_zero_capacity_is_valid() {
        // A zero-capacity pool is legal; it simply never admits a commit.
        let mut cfg = EngineConfig::default();
        cfg.seats.capacity = 0;
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn test_from_json_str_partial_override() {
        let cfg = EngineConfig::from_json_str(
            r#"{ "seats": { "capacity": 10, "concurrency": 1 }, "server": { "port": 8080 } }"#,
        )
        .unwrap();
        assert_eq!(cfg.seats.capacity, 10);
        assert_eq!(cfg.server.port, 8080);
        assert_eq!(cfg.server.host, "127.0.0.1");
    }

    #[test]
    fn test_from_json_str_invalid() {
        assert!(EngineConfig::from_json_str("{ not json").is_err());
        assert!(EngineConfig::from_json_str(r#"{ "queue": { "max_depth": 0 } }"#).is_err());
    }
}

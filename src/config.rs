//! Configuration Module
//!
//! Handles loading and managing server configuration from environment variables.

use std::env;

/// Server configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// Default TTL in milliseconds for entries without explicit TTL, None = never expires
    pub default_ttl_ms: Option<u64>,
    /// HTTP server port
    pub server_port: u16,
    /// Whether to log every cache event through tracing
    pub log_events: bool,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `DEFAULT_TTL_MS` - Default TTL in milliseconds (default: unset, never expires)
    /// - `SERVER_PORT` - HTTP server port (default: 3000)
    /// - `LOG_EVENTS` - Log set/get/remove events (default: true)
    pub fn from_env() -> Self {
        Self {
            default_ttl_ms: env::var("DEFAULT_TTL_MS")
                .ok()
                .and_then(|v| v.parse().ok()),
            server_port: env::var("SERVER_PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(3000),
            log_events: env::var("LOG_EVENTS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(true),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_ttl_ms: None,
            server_port: 3000,
            log_events: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.default_ttl_ms, None);
        assert_eq!(config.server_port, 3000);
        assert!(config.log_events);
    }

    #[test]
    fn test_config_from_env_defaults() {
        // Clear any existing env vars to test defaults
        env::remove_var("DEFAULT_TTL_MS");
        env::remove_var("SERVER_PORT");
        env::remove_var("LOG_EVENTS");

        let config = Config::from_env();
        assert_eq!(config.default_ttl_ms, None);
        assert_eq!(config.server_port, 3000);
        assert!(config.log_events);
    }
}

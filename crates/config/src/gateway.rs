//! Gateway batch client configuration

use std::time::Duration;

use serde::Deserialize;

use crate::error::ConfigError;

/// Gateway section
///
/// # Example
///
/// ```toml
/// [gateway]
/// enabled = true
/// backend_addresses = ["10.0.0.1:30000", "10.0.0.2:30000"]
/// batch_size = 10
/// http_timeout_ms = 1000
/// channel_buffer_size = 100000
/// ```
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct GatewayConfig {
    /// Whether this service runs the gateway batch client
    pub enabled: bool,

    /// Backend replica addresses ("host:port"); every flushed batch is
    /// POSTed to all of them independently
    pub backend_addresses: Vec<String>,

    /// Accumulated updates that trigger a flush
    pub batch_size: usize,

    /// Per-request HTTP timeout, in milliseconds
    pub http_timeout_ms: u64,

    /// Intake queue capacity
    pub channel_buffer_size: usize,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            backend_addresses: Vec::new(),
            batch_size: 10,
            http_timeout_ms: 1000,
            channel_buffer_size: 100_000,
        }
    }
}

impl GatewayConfig {
    /// Per-request HTTP timeout
    pub fn http_timeout(&self) -> Duration {
        Duration::from_millis(self.http_timeout_ms)
    }

    /// Reject values the gateway cannot run with
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.enabled && self.backend_addresses.is_empty() {
            return Err(ConfigError::invalid(
                "gateway.backend_addresses",
                "must not be empty when the gateway is enabled",
            ));
        }
        if self.batch_size == 0 {
            return Err(ConfigError::invalid(
                "gateway.batch_size",
                "must be at least 1",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disabled_defaults_are_valid() {
        GatewayConfig::default().validate().unwrap();
    }

    #[test]
    fn test_enabled_requires_backends() {
        let config = GatewayConfig {
            enabled: true,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_enabled_with_backends() {
        let config = GatewayConfig {
            enabled: true,
            backend_addresses: vec!["127.0.0.1:30000".into()],
            ..Default::default()
        };
        config.validate().unwrap();
        assert_eq!(config.http_timeout(), Duration::from_secs(1));
    }
}

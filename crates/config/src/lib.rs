//! Backhaul Configuration
//!
//! TOML-based configuration loading with sensible defaults.
//! Minimal config should just work - only specify what you need to change.
//!
//! # Parsing
//!
//! Use the `FromStr` trait to parse configuration:
//!
//! ```
//! use backhaul_config::Config;
//! use std::str::FromStr;
//!
//! let config = Config::from_str("[publisher]\nclient_count = 4").unwrap();
//! assert_eq!(config.publisher.client_count, 4);
//! ```
//!
//! # Example Full Config
//!
//! ```toml
//! [log]
//! level = "info"
//! format = "console"
//!
//! [publisher]
//! client_count = 4
//! count_threshold = 100
//! min_buffer_bytes = 1024
//!
//! [forwarder]
//! max_retries = 10
//! retry_time_ms = 100
//! entry_veto = false
//!
//! [sink]
//! batch_size = 1000
//! batch_percent = 1.0
//! channel_size = 20000
//!
//! [gateway]
//! enabled = true
//! backend_addresses = ["10.0.0.1:30000", "10.0.0.2:30000"]
//! batch_size = 10
//! http_timeout_ms = 1000
//! ```

mod error;
mod forwarder;
mod gateway;
mod logging;
mod publisher;
mod sink;

use std::fs;
use std::path::Path;
use std::str::FromStr;

use serde::Deserialize;

pub use error::ConfigError;
pub use forwarder::ForwarderConfig;
pub use gateway::GatewayConfig;
pub use logging::{LogConfig, LogFormat, LogLevel, LogOutput};
pub use publisher::PublisherConfig;
pub use sink::SinkConfig;

/// Result type for configuration operations
pub type Result<T> = std::result::Result<T, ConfigError>;

/// Main configuration structure
///
/// All sections are optional with sensible defaults.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Internal logging behavior
    pub log: LogConfig,

    /// Sharded batch publisher tuning
    pub publisher: PublisherConfig,

    /// Batch forwarder tuning
    pub forwarder: ForwarderConfig,

    /// Buffering sink tuning
    pub sink: SinkConfig,

    /// Gateway batch client (relay updates over HTTP)
    pub gateway: GatewayConfig,
}

impl Config {
    /// Load configuration from a TOML file and validate it
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        contents.parse()
    }

    /// Check every section for values the pipeline cannot run with
    pub fn validate(&self) -> Result<()> {
        self.publisher.validate()?;
        self.forwarder.validate()?;
        self.sink.validate()?;
        self.gateway.validate()?;
        Ok(())
    }
}

impl FromStr for Config {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self> {
        let config: Config = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config: Config = "".parse().unwrap();
        assert_eq!(config.publisher.client_count, 1);
        assert_eq!(config.publisher.count_threshold, 100);
        assert_eq!(config.forwarder.max_retries, 10);
        assert_eq!(config.sink.batch_size, 1000);
        assert!(!config.gateway.enabled);
    }

    #[test]
    fn test_partial_config_overrides() {
        let config: Config = r#"
[publisher]
client_count = 8

[sink]
batch_size = 250
"#
        .parse()
        .unwrap();
        assert_eq!(config.publisher.client_count, 8);
        assert_eq!(config.publisher.count_threshold, 100);
        assert_eq!(config.sink.batch_size, 250);
    }

    #[test]
    fn test_unparsable_toml_is_rejected() {
        let result: std::result::Result<Config, _> = "not = [valid".parse();
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_invalid_values_are_rejected_with_field() {
        let result: std::result::Result<Config, _> = "[publisher]\nclient_count = 0".parse();
        match result {
            Err(ConfigError::Invalid { field, .. }) => {
                assert_eq!(field, "publisher.client_count");
            }
            other => panic!("expected Invalid error, got {:?}", other),
        }
    }

    #[test]
    fn test_from_file_missing_path() {
        let result = Config::from_file("/nonexistent/backhaul.toml");
        assert!(matches!(result, Err(ConfigError::Io(_))));
    }
}

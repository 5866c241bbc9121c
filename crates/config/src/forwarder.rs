//! Batch forwarder configuration

use std::time::Duration;

use serde::Deserialize;

use crate::error::ConfigError;

/// Forwarder section
///
/// # Example
///
/// ```toml
/// [forwarder]
/// max_retries = 10
/// retry_time_ms = 100
/// entry_veto = false
/// ```
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ForwarderConfig {
    /// Total sink submit attempts per entry before the bus message is
    /// nacked
    pub max_retries: usize,

    /// Sleep between submit attempts against a full sink, in
    /// milliseconds
    pub retry_time_ms: u64,

    /// Drop undecodable entries (counted) instead of nacking the whole
    /// message; used to unblock a poison message
    pub entry_veto: bool,
}

impl Default for ForwarderConfig {
    fn default() -> Self {
        Self {
            max_retries: 10,
            retry_time_ms: 100,
            entry_veto: false,
        }
    }
}

impl ForwarderConfig {
    /// Sleep between submit attempts
    pub fn retry_time(&self) -> Duration {
        Duration::from_millis(self.retry_time_ms)
    }

    /// Reject values the forwarder cannot run with
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_retries == 0 {
            return Err(ConfigError::invalid(
                "forwarder.max_retries",
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
    fn test_defaults_are_valid() {
        ForwarderConfig::default().validate().unwrap();
    }

    #[test]
    fn test_retry_time_conversion() {
        let config = ForwarderConfig {
            retry_time_ms: 250,
            ..Default::default()
        };
        assert_eq!(config.retry_time(), Duration::from_millis(250));
    }

    #[test]
    fn test_zero_retries_rejected() {
        let config = ForwarderConfig {
            max_retries: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}

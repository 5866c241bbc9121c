//! Buffering sink configuration

use serde::Deserialize;

use crate::error::ConfigError;

/// Sink section
///
/// # Example
///
/// ```toml
/// [sink]
/// batch_size = 1000
/// batch_percent = 1.0
/// channel_size = 20000
/// ```
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct SinkConfig {
    /// Target bulk-write size in entries
    pub batch_size: usize,

    /// Fraction of `batch_size` at which the writer flushes, in (0, 1]
    pub batch_percent: f64,

    /// Bounded input queue capacity
    pub channel_size: usize,
}

impl Default for SinkConfig {
    fn default() -> Self {
        Self {
            batch_size: 1000,
            batch_percent: 1.0,
            channel_size: 20_000,
        }
    }
}

impl SinkConfig {
    /// Reject values the sink cannot run with
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.batch_size == 0 {
            return Err(ConfigError::invalid(
                "sink.batch_size",
                "must be at least 1",
            ));
        }
        if !(self.batch_percent > 0.0 && self.batch_percent <= 1.0) {
            return Err(ConfigError::invalid(
                "sink.batch_percent",
                format!("must be in (0, 1], got {}", self.batch_percent),
            ));
        }
        if self.channel_size < self.batch_size {
            return Err(ConfigError::invalid(
                "sink.channel_size",
                "must be at least sink.batch_size",
            ));
        }
        Ok(())
    }
}

//! Sharded batch publisher configuration

use serde::Deserialize;

use crate::error::ConfigError;

/// Publisher section
///
/// # Example
///
/// ```toml
/// [publisher]
/// client_count = 4
/// count_threshold = 100
/// min_buffer_bytes = 1024
/// publish_queue_size = 4096
/// ```
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct PublisherConfig {
    /// Number of independent publisher shards
    pub client_count: usize,

    /// Buffered entries a shard accepts before refusing, and the first
    /// flush condition
    pub count_threshold: usize,

    /// Minimum buffered bytes before a flush fires (second flush
    /// condition; both must hold)
    pub min_buffer_bytes: usize,

    /// Capacity of each shard's outbound publish queue
    pub publish_queue_size: usize,
}

impl Default for PublisherConfig {
    fn default() -> Self {
        Self {
            client_count: 1,
            count_threshold: 100,
            min_buffer_bytes: 1024,
            publish_queue_size: 4096,
        }
    }
}

impl PublisherConfig {
    /// Reject values the publisher cannot run with
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.client_count == 0 {
            return Err(ConfigError::invalid(
                "publisher.client_count",
                "must be at least 1",
            ));
        }
        if self.count_threshold == 0 {
            return Err(ConfigError::invalid(
                "publisher.count_threshold",
                "must be at least 1",
            ));
        }
        if self.publish_queue_size == 0 {
            return Err(ConfigError::invalid(
                "publisher.publish_queue_size",
                "must be at least 1",
            ));
        }
        Ok(())
    }
}

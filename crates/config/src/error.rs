//! Configuration error types

use thiserror::Error;

/// Errors loading or validating configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file could not be read
    #[error("could not read config file: {0}")]
    Io(#[from] std::io::Error),

    /// The configuration file is not valid TOML
    #[error("could not parse config: {0}")]
    Parse(#[from] toml::de::Error),

    /// A value the pipeline cannot run with
    #[error("invalid config: {field}: {reason}")]
    Invalid {
        field: &'static str,
        reason: String,
    },
}

impl ConfigError {
    /// Create a validation error for one field
    pub fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            field,
            reason: reason.into(),
        }
    }
}

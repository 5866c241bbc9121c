//! Gateway error types

use thiserror::Error;

/// Errors constructing or feeding the gateway batch client
#[derive(Debug, Error)]
pub enum GatewayError {
    /// No backend addresses were configured
    #[error("no backend addresses configured")]
    NoBackends,

    /// The underlying HTTP client could not be built
    #[error("failed to build http client: {0}")]
    HttpClient(#[from] reqwest::Error),
}

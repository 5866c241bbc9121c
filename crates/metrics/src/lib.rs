//! Backhaul - Metrics
//!
//! Internal metrics collection for pipeline observability.
//!
//! # Design Principles
//!
//! - **Lock-free**: all counters are atomics updated with relaxed ordering
//! - **No ambient state**: every component constructs its own metrics
//!   struct and shares it via `Arc`; a freshly constructed struct is the
//!   no-op default, so tests and metrics-disabled deployments need no
//!   special wiring
//! - **Trait-based reporting**: components expose a cheap
//!   `metrics_handle()` clone implementing a provider trait, which stays
//!   valid after `run()` consumes the component
//!
//! # Metrics Handle Pattern
//!
//! ```text
//! Component (owns Arc<Metrics>)
//!     │
//!     ├──► metrics_handle() → Handle (clones Arc, implements Provider)
//!     │
//!     └──► run() [consumes self, Arc keeps metrics alive]
//! ```

mod traits;

pub use traits::{
    ForwarderMetricsProvider, ForwarderMetricsSnapshot, GatewayMetricsProvider,
    GatewayMetricsSnapshot, PublisherMetricsProvider, PublisherMetricsSnapshot,
    SinkMetricsProvider, SinkMetricsSnapshot,
};

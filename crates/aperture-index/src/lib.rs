//! Index transport for aperture
//!
//! JSON-over-HTTP access to the search cluster behind a mockable trait.
//!
//! ## Features
//!
//! - **Trait-based design**: Mockable via [`Transport`]
//! - **Retry with backoff**: transient failures (timeouts, 5xx, 429) are retried
//! - **Owned payloads**: request bodies are serialized once and resent on retry
//! - **NDJSON**: multi-search bodies for batched round trips

pub mod client;
pub mod config;
pub mod error;
pub mod middleware;

pub use client::{shared_transport, HttpTransport, Transport};
pub use config::TransportConfig;
pub use error::{Result, TransportError};
pub use middleware::{RetryConfig, RetryMiddleware};

/// Re-export commonly used types
pub use reqwest::StatusCode;

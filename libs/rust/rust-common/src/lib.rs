//! Shared library for cross-cutting concerns in certificate-platform Rust services.
//!
//! This crate provides centralized implementations for:
//! - Error types with retryability classification
//! - HTTP client configuration, building, and endpoint composition
//! - Retry policies with exponential backoff
//! - Circuit breaker pattern for resilience
//! - Tracing subscriber initialization

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod circuit_breaker;
pub mod error;
pub mod http;
pub mod retry;
pub mod tracing_config;

pub use circuit_breaker::{CircuitBreaker, CircuitBreakerConfig, CircuitState};
pub use error::{is_transient_status, PlatformError, Retryable};
pub use http::{build_http_client, endpoint_url, HttpConfig};
pub use retry::{RetryConfig, RetryPolicy};
pub use tracing_config::{init_tracing, TracingConfig};

//! Error types shared by the platform building blocks.
//!
//! [`PlatformError`] covers failures of the shared pieces (HTTP clients,
//! endpoint construction, tracing setup). Service crates keep their own error
//! enums and opt into the retry machinery through [`Retryable`].

use thiserror::Error;

/// Classification of an error as transient or permanent.
///
/// [`crate::RetryPolicy`] only retries errors that report themselves as
/// retryable, so each service decides what "transient" means for its own
/// failure modes.
pub trait Retryable {
    /// Whether the failed operation may succeed if attempted again.
    fn is_retryable(&self) -> bool;
}

/// Whether a peer answering with `status` may answer differently on retry.
///
/// Request timeouts (408), throttling (429) and server errors (5xx) are
/// transient; every other status is a final answer.
///
/// # Examples
///
/// ```
/// use rust_common::is_transient_status;
///
/// assert!(is_transient_status(503));
/// assert!(is_transient_status(429));
/// assert!(!is_transient_status(404));
/// ```
#[must_use]
pub const fn is_transient_status(status: u16) -> bool {
    matches!(status, 408 | 429 | 500..=599)
}

/// Failure of a shared platform component.
#[derive(Error, Debug)]
pub enum PlatformError {
    /// The HTTP client failed to build or to send
    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    /// A URL could not be used as requested
    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    /// A peer answered with a non-success status
    #[error("{service} answered HTTP {status}")]
    Status {
        /// Peer that answered
        service: String,
        /// HTTP status code
        status: u16,
    },

    /// Tracing subscriber could not be installed
    #[error("tracing initialization failed: {0}")]
    Tracing(String),
}

impl PlatformError {
    /// Create an invalid URL error.
    #[must_use]
    pub fn invalid_url(msg: impl Into<String>) -> Self {
        Self::InvalidUrl(msg.into())
    }

    /// Create an error for a non-success answer from `service`.
    #[must_use]
    pub fn status(service: impl Into<String>, status: u16) -> Self {
        Self::Status {
            service: service.into(),
            status,
        }
    }
}

impl Retryable for PlatformError {
    fn is_retryable(&self) -> bool {
        match self {
            Self::Status { status, .. } => is_transient_status(*status),
            Self::Http(err) => err.is_timeout() || err.is_connect(),
            Self::InvalidUrl(_) | Self::Tracing(_) => false,
        }
    }
}

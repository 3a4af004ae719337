//! Outbound HTTP plumbing.
//!
//! Services talk to their peers through a pooled reqwest client built here,
//! and compose request URLs with [`endpoint_url`] so path parameters are
//! always percent-encoded.

use crate::PlatformError;
use reqwest::{Client, ClientBuilder, Url};
use std::time::Duration;

/// Settings for a peer-facing HTTP client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpConfig {
    /// Whole-request deadline, body included
    pub timeout: Duration,
    /// Deadline for establishing the TCP/TLS connection
    pub connect_timeout: Duration,
    /// How long an unused pooled connection is kept
    pub pool_idle_timeout: Duration,
    /// Idle connections kept per peer host
    pub pool_max_idle_per_host: usize,
    /// Value of the `User-Agent` header
    pub user_agent: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(5),
            connect_timeout: Duration::from_secs(2),
            pool_idle_timeout: Duration::from_secs(90),
            pool_max_idle_per_host: 10,
            user_agent: concat!("certificate-platform-rust/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

impl HttpConfig {
    /// Replace the request deadline.
    #[must_use]
    pub const fn with_timeout(mut self, request: Duration) -> Self {
        self.timeout = request;
        self
    }

    /// Replace the connect deadline.
    #[must_use]
    pub const fn with_connect_timeout(mut self, connect: Duration) -> Self {
        self.connect_timeout = connect;
        self
    }

    /// Replace the idle pool settings.
    #[must_use]
    pub const fn with_pool(mut self, idle_timeout: Duration, max_idle_per_host: usize) -> Self {
        self.pool_idle_timeout = idle_timeout;
        self.pool_max_idle_per_host = max_idle_per_host;
        self
    }

    /// Replace the user agent.
    #[must_use]
    pub fn with_user_agent(mut self, agent: impl Into<String>) -> Self {
        self.user_agent = agent.into();
        self
    }
}

/// Build a pooled rustls client from `config`.
///
/// # Errors
///
/// Returns [`PlatformError::Http`] if the TLS backend cannot be initialized.
pub fn build_http_client(config: &HttpConfig) -> Result<Client, PlatformError> {
    let client = ClientBuilder::new()
        .use_rustls_tls()
        .user_agent(config.user_agent.as_str())
        .connect_timeout(config.connect_timeout)
        .timeout(config.timeout)
        .pool_idle_timeout(config.pool_idle_timeout)
        .pool_max_idle_per_host(config.pool_max_idle_per_host)
        .build()?;
    Ok(client)
}

/// Append path segments to `base`, percent-encoding each one.
///
/// A trailing slash on the base is ignored, so `http://svc/` and `http://svc`
/// produce the same endpoint.
///
/// # Errors
///
/// Returns [`PlatformError::InvalidUrl`] if `base` cannot carry a path
/// (e.g. a `mailto:` URL).
///
/// # Examples
///
/// ```
/// use reqwest::Url;
/// use rust_common::endpoint_url;
///
/// let base = Url::parse("http://skills.local/").unwrap();
/// let url = endpoint_url(&base, &["api", "skills", "c#/1"]).unwrap();
/// assert_eq!(url.as_str(), "http://skills.local/api/skills/c%23%2F1");
/// ```
pub fn endpoint_url(base: &Url, segments: &[&str]) -> Result<Url, PlatformError> {
    let mut url = base.clone();
    {
        let mut path = url
            .path_segments_mut()
            .map_err(|()| PlatformError::invalid_url(format!("{base} cannot be a base URL")))?;
        path.pop_if_empty().extend(segments);
    }
    Ok(url)
}

//! HTTP client for the peer skill service.

use crate::config::SkillServiceConfig;
use crate::error::{CertificateError, SkillLookupError};
use crate::models::SkillReference;
use async_trait::async_trait;
use reqwest::Url;
use rust_common::{build_http_client, endpoint_url};
use std::time::Instant;
use tracing::{debug, instrument};

/// Resolves skill identifiers against the skill service.
///
/// One call is one lookup; implementations neither retry nor cache.
#[async_trait]
pub trait SkillDataClient: Send + Sync {
    /// Fetch the skill with the given identifier.
    async fn fetch_skill(&self, id: &str) -> Result<SkillReference, SkillLookupError>;
}

/// [`SkillDataClient`] backed by `GET {base}/api/skills/{id}`.
pub struct HttpSkillDataClient {
    client: reqwest::Client,
    base_url: Url,
}

impl HttpSkillDataClient {
    /// Build a client with its own connection pool.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the HTTP client cannot be built.
    pub fn new(config: &SkillServiceConfig) -> Result<Self, CertificateError> {
        let client = build_http_client(&config.http)
            .map_err(|e| CertificateError::config(format!("skill service client: {e}")))?;
        Ok(Self::with_client(client, config.base_url.clone()))
    }

    /// Use an existing reqwest client.
    #[must_use]
    pub const fn with_client(client: reqwest::Client, base_url: Url) -> Self {
        Self { client, base_url }
    }

    /// Base URL of the skill service.
    #[must_use]
    pub const fn base_url(&self) -> &Url {
        &self.base_url
    }
}

#[async_trait]
impl SkillDataClient for HttpSkillDataClient {
    #[instrument(skip(self), fields(skill_id = %id))]
    async fn fetch_skill(&self, id: &str) -> Result<SkillReference, SkillLookupError> {
        if id.trim().is_empty() {
            return Err(SkillLookupError::InvalidId(id.to_string()));
        }

        let url = endpoint_url(&self.base_url, &["api", "skills", id]).map_err(|source| {
            SkillLookupError::Endpoint {
                id: id.to_string(),
                source,
            }
        })?;

        let start = Instant::now();
        let response = self
            .client
            .get(url)
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(|source| SkillLookupError::Transport {
                id: id.to_string(),
                source,
            })?;

        let status = response.status();
        debug!(
            status = status.as_u16(),
            elapsed_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX),
            "Skill service responded"
        );
        if !status.is_success() {
            return Err(SkillLookupError::Status {
                id: id.to_string(),
                status: status.as_u16(),
            });
        }

        let body = response
            .bytes()
            .await
            .map_err(|source| SkillLookupError::Transport {
                id: id.to_string(),
                source,
            })?;

        let skill: SkillReference =
            serde_json::from_slice(&body).map_err(|e| SkillLookupError::MalformedBody {
                id: id.to_string(),
                reason: e.to_string(),
            })?;

        if skill.id != id {
            return Err(SkillLookupError::MalformedBody {
                id: id.to_string(),
                reason: format!("response describes skill {}", skill.id),
            });
        }

        Ok(skill)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_creation() {
        let client = HttpSkillDataClient::with_client(
            reqwest::Client::new(),
            Url::parse("http://localhost:6000").unwrap(),
        );
        assert_eq!(client.base_url().as_str(), "http://localhost:6000/");
    }

    #[tokio::test]
    async fn test_blank_id_rejected_without_request() {
        // Port 9 is discard; nothing is sent for a blank id anyway.
        let client = HttpSkillDataClient::with_client(
            reqwest::Client::new(),
            Url::parse("http://127.0.0.1:9").unwrap(),
        );
        let err = client.fetch_skill("  ").await.unwrap_err();
        assert!(matches!(err, SkillLookupError::InvalidId(_)));
    }
}

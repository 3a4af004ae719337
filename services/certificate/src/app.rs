//! Startup wiring.

use crate::config::Config;
use crate::error::CertificateError;
use crate::messaging::{BusConnection, MessageBusPublisher, RedisBusPublisher};
use crate::skills::{HttpSkillDataClient, SkillDataClient};
use crate::storage::{open_repository, seed_if_empty, CertificateRepository};
use crate::sync::CertificateSyncService;
use rust_common::RetryPolicy;
use std::sync::Arc;
use tracing::info;

/// A fully wired certificate service.
pub struct CertificateApp {
    service: Arc<CertificateSyncService>,
    repository: Arc<dyn CertificateRepository>,
    bus: Arc<BusConnection>,
}

impl CertificateApp {
    /// Build every collaborator from `config`.
    ///
    /// Opens (and, when configured, seeds) the store. The broker is not
    /// contacted until the first publish.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the store cannot be opened, the
    /// HTTP client cannot be built, or the broker URL is invalid.
    pub async fn build(config: &Config) -> Result<Self, CertificateError> {
        info!(
            environment = config.environment.as_str(),
            store = config.store.name(),
            "Building certificate service"
        );

        let repository = open_repository(&config.store)
            .map_err(|e| CertificateError::config(format!("certificate store: {e}")))?;
        if config.seed_database {
            let seeded = seed_if_empty(repository.as_ref()).await?;
            info!(seeded, "Seed step finished");
        }

        let skills: Arc<dyn SkillDataClient> =
            Arc::new(HttpSkillDataClient::new(&config.skill_service)?);

        let bus = Arc::new(
            BusConnection::new(&config.bus.url)
                .map_err(|e| CertificateError::config(format!("message bus: {e}")))?,
        );
        let publisher: Arc<dyn MessageBusPublisher> =
            Arc::new(RedisBusPublisher::new(Arc::clone(&bus), &config.bus));

        let service = Arc::new(CertificateSyncService::new(
            skills,
            Arc::clone(&repository),
            publisher,
            RetryPolicy::new(config.skill_service.retry.clone()),
        )
        .with_publish_timeout(config.bus.publish_timeout));

        Ok(Self {
            service,
            repository,
            bus,
        })
    }

    /// The creation service, shareable across tasks.
    #[must_use]
    pub fn service(&self) -> Arc<CertificateSyncService> {
        Arc::clone(&self.service)
    }

    /// Number of certificates currently stored.
    ///
    /// # Errors
    ///
    /// Propagates storage failures.
    pub async fn stored_certificates(&self) -> Result<usize, CertificateError> {
        Ok(self.repository.count().await?)
    }

    /// Whether the broker connection has been opened.
    #[must_use]
    pub fn bus_connected(&self) -> bool {
        self.bus.is_open()
    }
}

//! Certificate synchronization service.

use super::state::SyncState;
use crate::error::{CertificateError, PersistenceError, PublishError};
use crate::messaging::{CertificateCreatedEvent, MessageBusPublisher};
use crate::metrics::{record_creation, record_publish, record_skill_lookup, record_stage_latency};
use crate::models::{
    Certificate, CertificateId, CertificateStatus, CreateCertificateRequest, SkillReference,
};
use crate::skills::SkillDataClient;
use crate::storage::CertificateRepository;
use rust_common::RetryPolicy;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, instrument, warn, Instrument};

/// Upper bound on the publish step unless configured otherwise.
pub const DEFAULT_PUBLISH_TIMEOUT: Duration = Duration::from_secs(2);

/// Creates certificates and keeps the rest of the platform informed.
///
/// For every request: resolve skills, store the certificate, announce it.
/// A failed announcement does not fail the request; the certificate is
/// returned with [`CertificateStatus::PublishFailed`].
///
/// Shares no per-request state, so one instance serves concurrent requests
/// through an `Arc`.
pub struct CertificateSyncService {
    pipeline: Arc<Pipeline>,
}

#[derive(Clone)]
struct Pipeline {
    skills: Arc<dyn SkillDataClient>,
    repository: Arc<dyn CertificateRepository>,
    publisher: Arc<dyn MessageBusPublisher>,
    retry: RetryPolicy,
    publish_timeout: Duration,
}

impl CertificateSyncService {
    /// Assemble the service from its collaborators.
    pub fn new(
        skills: Arc<dyn SkillDataClient>,
        repository: Arc<dyn CertificateRepository>,
        publisher: Arc<dyn MessageBusPublisher>,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            pipeline: Arc::new(Pipeline {
                skills,
                repository,
                publisher,
                retry,
                publish_timeout: DEFAULT_PUBLISH_TIMEOUT,
            }),
        }
    }

    /// Bound the publish step, whatever the publisher does internally.
    ///
    /// A publish still running after `timeout` counts as failed.
    #[must_use]
    pub fn with_publish_timeout(mut self, timeout: Duration) -> Self {
        Arc::make_mut(&mut self.pipeline).publish_timeout = timeout;
        self
    }

    /// Configured bound on the publish step.
    #[must_use]
    pub fn publish_timeout(&self) -> Duration {
        self.pipeline.publish_timeout
    }

    /// Create a certificate from `request`.
    ///
    /// Dropping the returned future while skills are being resolved abandons
    /// the request. Once the write has started, the write and the publish
    /// attempt that follows it run to completion, logged and counted, even
    /// if the caller is gone.
    ///
    /// # Errors
    ///
    /// Returns [`CertificateError::InvalidRequest`] for a malformed request,
    /// [`CertificateError::SkillLookup`] if any skill cannot be resolved (the
    /// store is not touched), or [`CertificateError::Persistence`] if the
    /// write fails (nothing is published).
    #[instrument(skip(self, request), fields(subject = %request.subject))]
    pub async fn create_certificate(
        &self,
        request: CreateCertificateRequest,
    ) -> Result<Certificate, CertificateError> {
        let mut state = SyncState::Received(request);
        loop {
            state = match state {
                SyncState::Done(result) => return result,
                SyncState::Received(_) => self.pipeline.step(state).await,
                resolved => self.finish_detached(resolved).await,
            };
        }
    }

    /// Drive a resolved request to its end on a task of its own.
    async fn finish_detached(&self, resolved: SyncState) -> SyncState {
        let pipeline = Arc::clone(&self.pipeline);
        let task = tokio::spawn(async move { pipeline.run(resolved).await }.in_current_span());
        match task.await {
            Ok(done) => done,
            Err(join_err) => fail(
                PersistenceError::storage(format!("creation task failed: {join_err}")).into(),
            ),
        }
    }

    /// Load a stored certificate.
    ///
    /// # Errors
    ///
    /// Returns [`CertificateError::NotFound`] for an unknown id.
    pub async fn get_certificate(&self, id: CertificateId) -> Result<Certificate, CertificateError> {
        Ok(self.pipeline.repository.find_by_id(id).await?)
    }

    /// Load every stored certificate, oldest first.
    ///
    /// # Errors
    ///
    /// Propagates storage failures.
    pub async fn list_certificates(&self) -> Result<Vec<Certificate>, CertificateError> {
        Ok(self.pipeline.repository.find_all().await?)
    }
}

impl Pipeline {
    async fn run(&self, mut state: SyncState) -> SyncState {
        while !state.is_done() {
            state = self.step(state).await;
        }
        state
    }

    async fn step(&self, state: SyncState) -> SyncState {
        debug!(state = state.name(), "Certificate creation step");
        match state {
            SyncState::Received(request) => self.resolve(request).await,
            SyncState::SkillResolved { subject, skills } => self.persist(subject, skills).await,
            SyncState::Persisted(certificate) => self.announce(certificate).await,
            SyncState::Published { certificate, ack } => {
                info!(
                    certificate_id = %certificate.id,
                    event_id = %ack.event_id,
                    receivers = ack.receivers,
                    "Certificate created"
                );
                record_creation("published");
                SyncState::Done(Ok(certificate))
            }
            SyncState::PublishFailed { certificate, error } => {
                error!(
                    certificate_id = %certificate.id,
                    error = %error,
                    kind = error.kind(),
                    "Certificate stored but creation event was not published"
                );
                record_creation("publish_failed");
                SyncState::Done(Ok(certificate.with_status(CertificateStatus::PublishFailed)))
            }
            done @ SyncState::Done(_) => done,
        }
    }

    async fn resolve(&self, request: CreateCertificateRequest) -> SyncState {
        if let Err(err) = request.validate() {
            return fail(err);
        }

        let started = Instant::now();
        let mut skills = Vec::with_capacity(request.skill_ids.len());
        for id in request.distinct_skill_ids() {
            match self.fetch_with_retry(id).await {
                Ok(skill) => skills.push(skill),
                Err(err) => {
                    record_stage_latency("skill_lookup", started.elapsed().as_secs_f64());
                    return fail(err);
                }
            }
        }
        record_stage_latency("skill_lookup", started.elapsed().as_secs_f64());

        SyncState::SkillResolved {
            subject: request.subject,
            skills,
        }
    }

    async fn fetch_with_retry(&self, id: &str) -> Result<SkillReference, CertificateError> {
        let result = self
            .retry
            .execute("skill_lookup", || self.skills.fetch_skill(id))
            .await;
        match result {
            Ok(skill) => {
                record_skill_lookup("ok");
                Ok(skill)
            }
            Err(err) => {
                record_skill_lookup(err.kind());
                warn!(
                    skill_id = err.skill_id(),
                    kind = err.kind(),
                    error = %err,
                    "Skill lookup failed"
                );
                Err(err.into())
            }
        }
    }

    async fn persist(&self, subject: String, skills: Vec<SkillReference>) -> SyncState {
        let certificate = Certificate::new(subject, skills);
        let started = Instant::now();
        let saved = self.repository.save(certificate).await;
        record_stage_latency("persistence", started.elapsed().as_secs_f64());

        match saved {
            Ok(stored) => {
                debug!(certificate_id = %stored.id, "Certificate persisted");
                SyncState::Persisted(stored)
            }
            Err(err) => fail(err.into()),
        }
    }

    async fn announce(&self, certificate: Certificate) -> SyncState {
        let event = CertificateCreatedEvent::from(&certificate);
        let started = Instant::now();
        let outcome =
            match tokio::time::timeout(self.publish_timeout, self.publisher.publish(&event)).await {
                Ok(result) => result,
                Err(_) => Err(PublishError::Timeout(self.publish_timeout)),
            };
        record_stage_latency("publish", started.elapsed().as_secs_f64());

        match outcome {
            Ok(ack) => {
                record_publish("ok");
                SyncState::Published { certificate, ack }
            }
            Err(error) => {
                record_publish(error.kind());
                SyncState::PublishFailed { certificate, error }
            }
        }
    }
}

fn fail(err: CertificateError) -> SyncState {
    warn!(
        stage = err.stage().as_str(),
        code = err.code(),
        error = %err,
        "Certificate creation failed"
    );
    record_creation(err.stage().as_str());
    SyncState::Done(Err(err))
}

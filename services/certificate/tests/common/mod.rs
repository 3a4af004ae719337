//! Recording test doubles for the certificate service collaborators.

#![allow(dead_code)]

use async_trait::async_trait;
use certificate_service::error::{PersistenceError, PublishError, SkillLookupError};
use certificate_service::messaging::{CertificateCreatedEvent, MessageBusPublisher, PublishAck};
use certificate_service::models::{Certificate, CertificateId, SkillReference};
use certificate_service::skills::SkillDataClient;
use certificate_service::storage::{CertificateRepository, InMemoryCertificateRepository};
use certificate_service::CertificateSyncService;
use rust_common::{RetryConfig, RetryPolicy};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use uuid::Uuid;

/// Scripted answer for one skill id.
#[derive(Clone)]
pub enum SkillAnswer {
    Found(SkillReference),
    Status(u16),
    /// Fail with `status` for the first `times` calls, then succeed.
    Flaky {
        status: u16,
        times: usize,
        skill: SkillReference,
    },
}

/// Skill client answering from a fixed table and counting calls per id.
#[derive(Default)]
pub struct StubSkillClient {
    answers: HashMap<String, SkillAnswer>,
    calls: Mutex<HashMap<String, usize>>,
}

impl StubSkillClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_skill(mut self, id: &str, name: &str) -> Self {
        self.answers
            .insert(id.to_string(), SkillAnswer::Found(SkillReference::new(id, name)));
        self
    }

    pub fn with_status(mut self, id: &str, status: u16) -> Self {
        self.answers.insert(id.to_string(), SkillAnswer::Status(status));
        self
    }

    pub fn with_flaky(mut self, id: &str, name: &str, status: u16, times: usize) -> Self {
        self.answers.insert(
            id.to_string(),
            SkillAnswer::Flaky {
                status,
                times,
                skill: SkillReference::new(id, name),
            },
        );
        self
    }

    pub fn calls_for(&self, id: &str) -> usize {
        self.calls.lock().unwrap().get(id).copied().unwrap_or(0)
    }

    pub fn total_calls(&self) -> usize {
        self.calls.lock().unwrap().values().sum()
    }
}

#[async_trait]
impl SkillDataClient for StubSkillClient {
    async fn fetch_skill(&self, id: &str) -> Result<SkillReference, SkillLookupError> {
        let call = {
            let mut calls = self.calls.lock().unwrap();
            let count = calls.entry(id.to_string()).or_insert(0);
            *count += 1;
            *count
        };

        match self.answers.get(id) {
            Some(SkillAnswer::Found(skill)) => Ok(skill.clone()),
            Some(SkillAnswer::Status(status)) => Err(SkillLookupError::Status {
                id: id.to_string(),
                status: *status,
            }),
            Some(SkillAnswer::Flaky {
                status,
                times,
                skill,
            }) => {
                if call <= *times {
                    Err(SkillLookupError::Status {
                        id: id.to_string(),
                        status: *status,
                    })
                } else {
                    Ok(skill.clone())
                }
            }
            None => Err(SkillLookupError::Status {
                id: id.to_string(),
                status: 404,
            }),
        }
    }
}

/// Repository wrapper counting saves, with an optional injected failure.
pub struct RecordingRepository {
    inner: InMemoryCertificateRepository,
    saves: AtomicUsize,
    fail_with: Mutex<Option<fn(CertificateId) -> PersistenceError>>,
    save_delay: Option<Duration>,
}

impl RecordingRepository {
    pub fn new() -> Self {
        Self {
            inner: InMemoryCertificateRepository::new(),
            saves: AtomicUsize::new(0),
            fail_with: Mutex::new(None),
            save_delay: None,
        }
    }

    pub fn failing(make_error: fn(CertificateId) -> PersistenceError) -> Self {
        let repo = Self::new();
        *repo.fail_with.lock().unwrap() = Some(make_error);
        repo
    }

    pub fn with_save_delay(mut self, delay: Duration) -> Self {
        self.save_delay = Some(delay);
        self
    }

    pub fn save_calls(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CertificateRepository for RecordingRepository {
    async fn save(&self, certificate: Certificate) -> Result<Certificate, PersistenceError> {
        self.saves.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.save_delay {
            tokio::time::sleep(delay).await;
        }
        let failure = *self.fail_with.lock().unwrap();
        if let Some(make_error) = failure {
            return Err(make_error(certificate.id));
        }
        self.inner.save(certificate).await
    }

    async fn find_by_id(&self, id: CertificateId) -> Result<Certificate, PersistenceError> {
        self.inner.find_by_id(id).await
    }

    async fn find_all(&self) -> Result<Vec<Certificate>, PersistenceError> {
        self.inner.find_all().await
    }

    async fn count(&self) -> Result<usize, PersistenceError> {
        self.inner.count().await
    }
}

/// Publisher recording every event it is handed.
#[derive(Default)]
pub struct RecordingPublisher {
    events: Mutex<Vec<CertificateCreatedEvent>>,
    fail: bool,
    delay: Option<Duration>,
}

impl RecordingPublisher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    /// Publisher that stalls for `delay` before acknowledging.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn publish_calls(&self) -> usize {
        self.events.lock().unwrap().len()
    }

    pub fn events(&self) -> Vec<CertificateCreatedEvent> {
        self.events.lock().unwrap().clone()
    }
}

#[async_trait]
impl MessageBusPublisher for RecordingPublisher {
    async fn publish(&self, event: &CertificateCreatedEvent) -> Result<PublishAck, PublishError> {
        self.events.lock().unwrap().push(event.clone());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail {
            return Err(PublishError::Timeout(Duration::from_millis(10)));
        }
        Ok(PublishAck {
            event_id: Uuid::new_v4(),
            receivers: 1,
        })
    }
}

/// Retry policy with no waiting between attempts.
pub fn fast_retry(max_retries: u32) -> RetryPolicy {
    RetryPolicy::new(
        RetryConfig::default()
            .with_max_retries(max_retries)
            .with_initial_delay(Duration::from_millis(1))
            .with_max_delay(Duration::from_millis(1))
            .without_jitter(),
    )
}

/// Service wired to the given doubles.
pub fn service_with(
    skills: Arc<StubSkillClient>,
    repository: Arc<RecordingRepository>,
    publisher: Arc<RecordingPublisher>,
) -> CertificateSyncService {
    CertificateSyncService::new(skills, repository, publisher, fast_retry(2))
}

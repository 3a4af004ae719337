//! Certificate storage.
//!
//! [`CertificateRepository`] is the only way the service touches stored
//! certificates. Two backends implement it with identical semantics: a
//! durable SQLite store and an ephemeral in-memory store. Which one runs is
//! decided by [`open_repository`] from configuration.

pub mod factory;
pub mod memory;
pub mod schema;
pub mod seed;
pub mod sqlite;

pub use factory::{open_repository, StoreBackend};
pub use memory::InMemoryCertificateRepository;
pub use seed::seed_if_empty;
pub use sqlite::SqliteCertificateRepository;

use crate::error::PersistenceError;
use crate::models::{Certificate, CertificateId};
use async_trait::async_trait;

/// Persistence access for certificates.
#[async_trait]
pub trait CertificateRepository: Send + Sync {
    /// Atomically store a new certificate with all of its skills.
    ///
    /// Returns the stored certificate with status
    /// [`crate::models::CertificateStatus::Persisted`].
    async fn save(&self, certificate: Certificate) -> Result<Certificate, PersistenceError>;

    /// Load a certificate by id.
    async fn find_by_id(&self, id: CertificateId) -> Result<Certificate, PersistenceError>;

    /// Load every certificate, oldest first.
    async fn find_all(&self) -> Result<Vec<Certificate>, PersistenceError>;

    /// Number of stored certificates.
    async fn count(&self) -> Result<usize, PersistenceError>;
}

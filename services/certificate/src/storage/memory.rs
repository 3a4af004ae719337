//! Ephemeral in-memory certificate store.

use super::CertificateRepository;
use crate::error::PersistenceError;
use crate::models::{Certificate, CertificateId, CertificateStatus};
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

#[derive(Debug, Default)]
struct Records {
    by_id: HashMap<CertificateId, Certificate>,
    // Insertion order; breaks ties between equal creation times.
    order: Vec<CertificateId>,
}

/// Certificate store that lives for the lifetime of the process.
#[derive(Debug, Default)]
pub struct InMemoryCertificateRepository {
    records: RwLock<Records>,
}

impl InMemoryCertificateRepository {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CertificateRepository for InMemoryCertificateRepository {
    async fn save(&self, certificate: Certificate) -> Result<Certificate, PersistenceError> {
        let stored = certificate.with_status(CertificateStatus::Persisted);

        // Check and insert under one write guard.
        let mut records = self.records.write().await;
        if records.by_id.contains_key(&stored.id) {
            return Err(PersistenceError::Duplicate(stored.id));
        }
        records.order.push(stored.id);
        records.by_id.insert(stored.id, stored.clone());
        Ok(stored)
    }

    async fn find_by_id(&self, id: CertificateId) -> Result<Certificate, PersistenceError> {
        self.records
            .read()
            .await
            .by_id
            .get(&id)
            .cloned()
            .ok_or(PersistenceError::NotFound(id))
    }

    async fn find_all(&self) -> Result<Vec<Certificate>, PersistenceError> {
        let records = self.records.read().await;
        let mut all: Vec<Certificate> = records
            .order
            .iter()
            .filter_map(|id| records.by_id.get(id).cloned())
            .collect();
        // Stable, so equal timestamps keep insertion order like SQLite's rowid.
        all.sort_by_key(|cert| cert.created_at);
        Ok(all)
    }

    async fn count(&self) -> Result<usize, PersistenceError> {
        Ok(self.records.read().await.by_id.len())
    }
}

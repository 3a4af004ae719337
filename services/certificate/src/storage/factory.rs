//! Configuration-driven selection of the storage backend.

use super::{CertificateRepository, InMemoryCertificateRepository, SqliteCertificateRepository};
use crate::error::PersistenceError;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

/// Which store backs the repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreBackend {
    /// Durable SQLite database at `path`
    Sqlite {
        /// Database file
        path: PathBuf,
    },
    /// Process-local store, lost on restart
    InMemory,
}

impl StoreBackend {
    /// Backend name for logs.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Sqlite { .. } => "sqlite",
            Self::InMemory => "memory",
        }
    }
}

/// Build the repository for the configured backend.
///
/// # Errors
///
/// Fails if the durable store cannot be opened or migrated.
pub fn open_repository(
    backend: &StoreBackend,
) -> Result<Arc<dyn CertificateRepository>, PersistenceError> {
    match backend {
        StoreBackend::Sqlite { path } => {
            info!(path = %path.display(), "Using SQLite certificate store");
            Ok(Arc::new(SqliteCertificateRepository::open(path)?))
        }
        StoreBackend::InMemory => {
            info!("Using in-memory certificate store");
            Ok(Arc::new(InMemoryCertificateRepository::new()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_in_memory_backend_starts_empty() {
        let repo = open_repository(&StoreBackend::InMemory).unwrap();
        assert_eq!(repo.count().await.unwrap(), 0);
    }

    #[test]
    fn test_sqlite_backend_rejects_unopenable_path() {
        let backend = StoreBackend::Sqlite {
            path: PathBuf::from("/nonexistent-dir/certificates.db"),
        };
        assert!(open_repository(&backend).is_err());
    }

    #[test]
    fn test_backend_names() {
        assert_eq!(StoreBackend::InMemory.name(), "memory");
        assert_eq!(
            StoreBackend::Sqlite {
                path: PathBuf::from("x.db")
            }
            .name(),
            "sqlite"
        );
    }
}

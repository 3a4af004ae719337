//! Sample data for non-production stores.

use super::CertificateRepository;
use crate::error::PersistenceError;
use crate::models::{Certificate, SkillReference};
use tracing::info;

fn sample_certificates() -> Vec<Certificate> {
    vec![
        Certificate::new(
            "seed-user-1",
            vec![
                SkillReference::new("dotnet-1", "C# / .NET"),
                SkillReference::new("sql-1", "SQL Server"),
            ],
        ),
        Certificate::new("seed-user-2", vec![SkillReference::new("k8s-3", "Kubernetes")]),
        Certificate::new("seed-user-3", vec![]),
    ]
}

/// Populate the store with sample certificates if it is empty.
///
/// Returns how many certificates were written; a store that already holds
/// data is left untouched.
///
/// # Errors
///
/// Propagates storage failures.
pub async fn seed_if_empty(repository: &dyn CertificateRepository) -> Result<usize, PersistenceError> {
    if repository.count().await? > 0 {
        info!("Certificate store already populated, skipping seed");
        return Ok(0);
    }

    info!("Seeding certificate store");
    let mut written = 0;
    for certificate in sample_certificates() {
        repository.save(certificate).await?;
        written += 1;
    }
    Ok(written)
}

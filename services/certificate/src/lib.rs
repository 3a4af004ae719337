//! Certificate Service library.
//!
//! Creates certificates enriched with skill data from the skill service,
//! stores them durably, and announces each creation on the message bus.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod app;
pub mod config;
pub mod error;
pub mod messaging;
pub mod metrics;
pub mod models;
pub mod shutdown;
pub mod skills;
pub mod storage;
pub mod sync;

// Re-exports for convenience
pub use app::CertificateApp;
pub use config::Config;
pub use error::{CertificateError, FailureStage, PersistenceError, PublishError, SkillLookupError};
pub use models::{Certificate, CertificateId, CertificateStatus, CreateCertificateRequest, SkillReference};
pub use sync::CertificateSyncService;

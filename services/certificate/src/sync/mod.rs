//! Certificate creation pipeline.

pub mod service;
pub mod state;

pub use service::CertificateSyncService;
pub use state::SyncState;

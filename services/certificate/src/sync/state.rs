//! States of a single certificate creation.

use crate::error::{CertificateError, PublishError};
use crate::messaging::PublishAck;
use crate::models::{Certificate, CreateCertificateRequest, SkillReference};

/// Where a creation request currently stands.
///
/// Each state owns exactly the data the next step needs. Transitions only
/// move forward: `Received → SkillResolved → Persisted → Published |
/// PublishFailed → Done`, with any earlier failure jumping straight to
/// `Done`.
#[derive(Debug)]
pub enum SyncState {
    /// Request accepted, nothing resolved yet
    Received(CreateCertificateRequest),
    /// Every referenced skill was fetched
    SkillResolved {
        /// Subject from the request
        subject: String,
        /// Fetched skills, in request order
        skills: Vec<SkillReference>,
    },
    /// The certificate is durably stored
    Persisted(Certificate),
    /// The creation event reached the broker
    Published {
        /// Stored certificate
        certificate: Certificate,
        /// Broker acknowledgement
        ack: PublishAck,
    },
    /// The creation event could not be sent; the certificate stays stored
    PublishFailed {
        /// Stored certificate
        certificate: Certificate,
        /// Why the publish failed
        error: PublishError,
    },
    /// Terminal state
    Done(Result<Certificate, CertificateError>),
}

impl SyncState {
    /// State name for logs.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Received(_) => "received",
            Self::SkillResolved { .. } => "skill_resolved",
            Self::Persisted(_) => "persisted",
            Self::Published { .. } => "published",
            Self::PublishFailed { .. } => "publish_failed",
            Self::Done(_) => "done",
        }
    }

    /// Whether the state is terminal.
    #[must_use]
    pub const fn is_done(&self) -> bool {
        matches!(self, Self::Done(_))
    }
}

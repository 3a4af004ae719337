//! Error taxonomy for the certificate service.
//!
//! Each collaborator has its own error type. [`CertificateError`] is the single
//! terminal error a creation request can end with; it names the stage that
//! failed. [`PublishError`] never reaches a caller.

use crate::models::CertificateId;
use rust_common::{is_transient_status, PlatformError, Retryable};
use std::time::Duration;
use thiserror::Error;

/// Failure to resolve a skill against the skill service.
#[derive(Error, Debug)]
pub enum SkillLookupError {
    /// The identifier was empty
    #[error("invalid skill id {0:?}")]
    InvalidId(String),

    /// The skill service answered with a non-success status
    #[error("skill {id} lookup returned HTTP {status}")]
    Status {
        /// Skill identifier
        id: String,
        /// HTTP status code
        status: u16,
    },

    /// The request never produced a response
    #[error("skill {id} lookup failed: {source}")]
    Transport {
        /// Skill identifier
        id: String,
        /// Underlying client error
        #[source]
        source: reqwest::Error,
    },

    /// The response body was not a skill record
    #[error("skill {id} response malformed: {reason}")]
    MalformedBody {
        /// Skill identifier
        id: String,
        /// What was wrong with the body
        reason: String,
    },

    /// The skill service base URL could not carry the lookup path
    #[error("skill {id} lookup URL invalid: {source}")]
    Endpoint {
        /// Skill identifier
        id: String,
        /// Underlying platform error
        #[source]
        source: PlatformError,
    },
}

impl SkillLookupError {
    /// Identifier of the skill that failed to resolve.
    #[must_use]
    pub fn skill_id(&self) -> &str {
        match self {
            Self::InvalidId(id)
            | Self::Status { id, .. }
            | Self::Transport { id, .. }
            | Self::MalformedBody { id, .. }
            | Self::Endpoint { id, .. } => id,
        }
    }

    /// Whether the skill service reported the skill as unknown.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::Status { status: 404, .. })
    }

    /// Label used in logs and metrics.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::InvalidId(_) => "invalid_id",
            Self::Status { status: 404, .. } => "not_found",
            Self::Status { .. } => "status",
            Self::Transport { .. } => "transport",
            Self::MalformedBody { .. } => "malformed_body",
            Self::Endpoint { .. } => "endpoint",
        }
    }
}

impl Retryable for SkillLookupError {
    fn is_retryable(&self) -> bool {
        match self {
            Self::Transport { .. } => true,
            Self::Status { status, .. } => is_transient_status(*status),
            Self::InvalidId(_) | Self::MalformedBody { .. } | Self::Endpoint { .. } => false,
        }
    }
}

/// Failure of the certificate store.
#[derive(Error, Debug)]
pub enum PersistenceError {
    /// A certificate with this id already exists
    #[error("certificate {0} already exists")]
    Duplicate(CertificateId),

    /// No certificate with this id exists
    #[error("certificate {0} not found")]
    NotFound(CertificateId),

    /// Stored data could not be decoded
    #[error("stored certificate data is corrupt: {0}")]
    Corrupt(String),

    /// The storage layer failed
    #[error("storage failure: {0}")]
    Storage(String),
}

impl PersistenceError {
    /// Create a storage error.
    #[must_use]
    pub fn storage(msg: impl Into<String>) -> Self {
        Self::Storage(msg.into())
    }

    /// Create a corrupt-data error.
    #[must_use]
    pub fn corrupt(msg: impl Into<String>) -> Self {
        Self::Corrupt(msg.into())
    }

    /// Label used in logs and metrics.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Duplicate(_) => "duplicate",
            Self::NotFound(_) => "not_found",
            Self::Corrupt(_) => "corrupt",
            Self::Storage(_) => "storage",
        }
    }
}

impl From<rusqlite::Error> for PersistenceError {
    fn from(err: rusqlite::Error) -> Self {
        Self::Storage(err.to_string())
    }
}

/// Failure to hand a creation event to the message bus.
#[derive(Error, Debug)]
pub enum PublishError {
    /// The event could not be encoded
    #[error("event serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The broker URL is unusable
    #[error("invalid bus configuration: {0}")]
    InvalidConfig(String),

    /// The broker rejected the command or the connection failed
    #[error("broker error: {0}")]
    Broker(#[from] redis::RedisError),

    /// The publish did not finish in time
    #[error("publish timed out after {0:?}")]
    Timeout(Duration),

    /// The broker is considered down; nothing was sent
    #[error("circuit open for message bus {0}")]
    CircuitOpen(String),
}

impl PublishError {
    /// Label used in logs and metrics.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Serialization(_) => "serialization",
            Self::InvalidConfig(_) => "invalid_config",
            Self::Broker(_) => "broker",
            Self::Timeout(_) => "timeout",
            Self::CircuitOpen(_) => "circuit_open",
        }
    }
}

/// Stage of the creation pipeline an error belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureStage {
    /// Request rejected before any collaborator was called
    Validation,
    /// Skill resolution failed
    SkillLookup,
    /// The durable write failed
    Persistence,
    /// Startup or wiring failed
    Configuration,
}

impl FailureStage {
    /// Stable label for the stage.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Validation => "validation",
            Self::SkillLookup => "skill_lookup",
            Self::Persistence => "persistence",
            Self::Configuration => "configuration",
        }
    }
}

/// Terminal error of a certificate operation.
#[derive(Error, Debug)]
pub enum CertificateError {
    /// The request was malformed
    #[error("invalid certificate request: {0}")]
    InvalidRequest(String),

    /// A referenced skill could not be resolved
    #[error("skill lookup failed: {0}")]
    SkillLookup(#[from] SkillLookupError),

    /// The certificate could not be stored or read
    #[error("persistence failed: {0}")]
    Persistence(PersistenceError),

    /// The requested certificate does not exist
    #[error("certificate {0} not found")]
    NotFound(CertificateId),

    /// Configuration or wiring error
    #[error("configuration error: {0}")]
    Config(String),
}

impl From<PersistenceError> for CertificateError {
    fn from(err: PersistenceError) -> Self {
        match err {
            PersistenceError::NotFound(id) => Self::NotFound(id),
            other => Self::Persistence(other),
        }
    }
}

impl CertificateError {
    /// Create an invalid request error.
    #[must_use]
    pub fn invalid_request(msg: impl Into<String>) -> Self {
        Self::InvalidRequest(msg.into())
    }

    /// Create a configuration error.
    #[must_use]
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// The pipeline stage that produced this error.
    #[must_use]
    pub const fn stage(&self) -> FailureStage {
        match self {
            Self::InvalidRequest(_) => FailureStage::Validation,
            Self::SkillLookup(_) => FailureStage::SkillLookup,
            Self::Persistence(_) | Self::NotFound(_) => FailureStage::Persistence,
            Self::Config(_) => FailureStage::Configuration,
        }
    }

    /// Stable error code for API responses.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::InvalidRequest(_) => CERT_INVALID_REQUEST,
            Self::SkillLookup(e) if e.is_not_found() => CERT_SKILL_NOT_FOUND,
            Self::SkillLookup(_) => CERT_SKILL_LOOKUP_FAILED,
            Self::Persistence(PersistenceError::Duplicate(_)) => CERT_DUPLICATE,
            Self::Persistence(_) => CERT_PERSISTENCE_FAILED,
            Self::NotFound(_) => CERT_NOT_FOUND,
            Self::Config(_) => CERT_CONFIG_ERROR,
        }
    }
}

// Error codes for API responses
/// Request failed validation
pub const CERT_INVALID_REQUEST: &str = "CERT_INVALID_REQUEST";
/// A referenced skill does not exist
pub const CERT_SKILL_NOT_FOUND: &str = "CERT_SKILL_NOT_FOUND";
/// The skill service could not be queried
pub const CERT_SKILL_LOOKUP_FAILED: &str = "CERT_SKILL_LOOKUP_FAILED";
/// A certificate with the same id already exists
pub const CERT_DUPLICATE: &str = "CERT_DUPLICATE";
/// The store failed
pub const CERT_PERSISTENCE_FAILED: &str = "CERT_PERSISTENCE_FAILED";
/// The certificate does not exist
pub const CERT_NOT_FOUND: &str = "CERT_NOT_FOUND";
/// Startup configuration is invalid
pub const CERT_CONFIG_ERROR: &str = "CERT_CONFIG_ERROR";

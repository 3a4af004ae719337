//! Certificate domain types.

use crate::error::CertificateError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Surrogate key of a certificate, assigned at creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CertificateId(Uuid);

impl CertificateId {
    /// Generate a fresh random identifier.
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    /// Wrap an existing UUID.
    #[must_use]
    pub const fn from_uuid(id: Uuid) -> Self {
        Self(id)
    }

    /// The underlying UUID.
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for CertificateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for CertificateId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

/// Skill data resolved from the skill service.
///
/// Only `id` and `name` are read from the peer's response; any other fields
/// are ignored.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SkillReference {
    /// Skill identifier as known by the skill service
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    /// Display name
    pub name: String,
}

impl SkillReference {
    /// Create a skill reference.
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

// The skill service may key skills by integer; both forms are accepted.
fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Text(String),
        Number(i64),
    }

    Ok(match RawId::deserialize(deserializer)? {
        RawId::Text(s) => s,
        RawId::Number(n) => n.to_string(),
    })
}

/// In-process lifecycle marker of a certificate.
///
/// Never persisted: a certificate read back from storage is always
/// [`CertificateStatus::Persisted`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CertificateStatus {
    /// Built from a request, not yet stored
    #[default]
    Pending,
    /// Durably stored
    Persisted,
    /// Durably stored, but the creation event could not be published
    PublishFailed,
}

impl CertificateStatus {
    /// Label used in logs and metrics.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Persisted => "persisted",
            Self::PublishFailed => "publish_failed",
        }
    }
}

/// An issued certificate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Certificate {
    /// Unique identifier
    pub id: CertificateId,
    /// Entity the certificate applies to
    pub subject: String,
    /// Skills resolved at creation time, in request order
    pub skills: Vec<SkillReference>,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// In-process status, not serialized
    #[serde(skip)]
    pub status: CertificateStatus,
}

impl Certificate {
    /// Build a pending certificate with a fresh id and creation time.
    pub fn new(subject: impl Into<String>, skills: Vec<SkillReference>) -> Self {
        Self {
            id: CertificateId::generate(),
            subject: subject.into(),
            skills,
            created_at: Utc::now(),
            status: CertificateStatus::Pending,
        }
    }

    /// Identifiers of the resolved skills.
    #[must_use]
    pub fn skill_ids(&self) -> Vec<String> {
        self.skills.iter().map(|s| s.id.clone()).collect()
    }

    /// Return the certificate with its status replaced.
    #[must_use]
    pub fn with_status(mut self, status: CertificateStatus) -> Self {
        self.status = status;
        self
    }
}

/// Inbound request to create a certificate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCertificateRequest {
    /// Entity the certificate applies to
    pub subject: String,
    /// Skills to resolve against the skill service
    #[serde(default)]
    pub skill_ids: Vec<String>,
}

impl CreateCertificateRequest {
    /// Create a request.
    pub fn new<I, S>(subject: impl Into<String>, skill_ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            subject: subject.into(),
            skill_ids: skill_ids.into_iter().map(Into::into).collect(),
        }
    }

    /// Check the request before any collaborator is called.
    ///
    /// # Errors
    ///
    /// Returns [`CertificateError::InvalidRequest`] for a blank subject or a
    /// blank skill id.
    pub fn validate(&self) -> Result<(), CertificateError> {
        if self.subject.trim().is_empty() {
            return Err(CertificateError::invalid_request("subject must not be empty"));
        }
        if let Some(pos) = self.skill_ids.iter().position(|id| id.trim().is_empty()) {
            return Err(CertificateError::invalid_request(format!(
                "skill id at position {pos} must not be empty"
            )));
        }
        Ok(())
    }

    /// Skill ids with duplicates removed, first occurrence wins.
    #[must_use]
    pub fn distinct_skill_ids(&self) -> Vec<&str> {
        let mut seen = HashSet::new();
        self.skill_ids
            .iter()
            .map(String::as_str)
            .filter(|id| seen.insert(*id))
            .collect()
    }
}

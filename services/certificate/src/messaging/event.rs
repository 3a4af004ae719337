//! Certificate creation event and its wire envelope.

use crate::error::PublishError;
use crate::models::{Certificate, CertificateId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Event name carried in the envelope.
pub const CERTIFICATE_CREATED: &str = "certificate_created";

/// Envelope schema version. Consumers must ignore unknown fields; a breaking
/// payload change bumps this number.
pub const EVENT_SCHEMA_VERSION: u32 = 1;

/// Announcement that a certificate was durably stored.
///
/// Immutable once built; only constructible from a [`Certificate`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CertificateCreatedEvent {
    certificate_id: CertificateId,
    subject: String,
    skill_ids: Vec<String>,
    created_at: DateTime<Utc>,
}

impl From<&Certificate> for CertificateCreatedEvent {
    fn from(certificate: &Certificate) -> Self {
        Self {
            certificate_id: certificate.id,
            subject: certificate.subject.clone(),
            skill_ids: certificate.skill_ids(),
            created_at: certificate.created_at,
        }
    }
}

impl CertificateCreatedEvent {
    /// Id of the stored certificate.
    #[must_use]
    pub const fn certificate_id(&self) -> CertificateId {
        self.certificate_id
    }

    /// Certificate subject.
    #[must_use]
    pub fn subject(&self) -> &str {
        &self.subject
    }

    /// Ids of the certificate's skills.
    #[must_use]
    pub fn skill_ids(&self) -> &[String] {
        &self.skill_ids
    }

    /// When the certificate was created.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Wrap the event in a fresh envelope.
    #[must_use]
    pub fn envelope(&self) -> EventEnvelope<&Self> {
        EventEnvelope {
            event: CERTIFICATE_CREATED.to_string(),
            version: EVENT_SCHEMA_VERSION,
            event_id: Uuid::new_v4(),
            occurred_at: Utc::now(),
            payload: self,
        }
    }

    /// Encode the event as an enveloped JSON message.
    ///
    /// # Errors
    ///
    /// Fails only if serialization fails.
    pub fn to_wire(&self) -> Result<(Uuid, String), PublishError> {
        let envelope = self.envelope();
        let body = serde_json::to_string(&envelope)?;
        Ok((envelope.event_id, body))
    }
}

/// Versioned wrapper every bus message is sent in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventEnvelope<T> {
    /// Event name
    pub event: String,
    /// Envelope schema version
    pub version: u32,
    /// Unique id of this message
    pub event_id: Uuid,
    /// When the message was built
    pub occurred_at: DateTime<Utc>,
    /// Event payload
    pub payload: T,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SkillReference;

    fn certificate() -> Certificate {
        Certificate::new(
            "user-42",
            vec![
                SkillReference::new("sql-1", "SQL"),
                SkillReference::new("go-2", "Go"),
            ],
        )
    }

    #[test]
    fn test_event_from_certificate() {
        let cert = certificate();
        let event = CertificateCreatedEvent::from(&cert);

        assert_eq!(event.certificate_id(), cert.id);
        assert_eq!(event.subject(), "user-42");
        assert_eq!(event.skill_ids(), ["sql-1".to_string(), "go-2".to_string()]);
        assert_eq!(event.created_at(), cert.created_at);
    }

    #[test]
    fn test_wire_format_fields() {
        let cert = certificate();
        let (event_id, body) = CertificateCreatedEvent::from(&cert).to_wire().unwrap();
        let json: serde_json::Value = serde_json::from_str(&body).unwrap();

        assert_eq!(json["event"], CERTIFICATE_CREATED);
        assert_eq!(json["version"], EVENT_SCHEMA_VERSION);
        assert_eq!(json["eventId"], event_id.to_string());
        assert_eq!(json["payload"]["certificateId"], cert.id.to_string());
        assert_eq!(json["payload"]["subject"], "user-42");
        assert_eq!(json["payload"]["skillIds"][1], "go-2");
        assert!(json["payload"]["createdAt"].is_string());
    }

    #[test]
    fn test_consumer_can_decode_envelope() {
        let event = CertificateCreatedEvent::from(&certificate());
        let (_, body) = event.to_wire().unwrap();

        let decoded: EventEnvelope<CertificateCreatedEvent> = serde_json::from_str(&body).unwrap();
        assert_eq!(decoded.payload, event);
    }
}

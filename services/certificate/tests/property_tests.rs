//! Property-based tests for the certificate creation pipeline.

mod common;

use certificate_service::error::FailureStage;
use certificate_service::messaging::CertificateCreatedEvent;
use certificate_service::models::{Certificate, CertificateStatus, CreateCertificateRequest, SkillReference};
use common::{service_with, RecordingPublisher, RecordingRepository, StubSkillClient};
use proptest::prelude::*;
use std::collections::HashSet;
use std::sync::Arc;

fn arb_skill_id() -> impl Strategy<Value = String> {
    "[a-z]{2,6}-[0-9]{1,3}"
}

fn arb_subject() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9_-]{1,32}"
}

fn stub_for(ids: &[String]) -> StubSkillClient {
    ids.iter()
        .fold(StubSkillClient::new(), |stub, id| stub.with_skill(id, &id.to_uppercase()))
}

fn distinct_in_order(ids: &[String]) -> Vec<String> {
    let mut seen = HashSet::new();
    ids.iter().filter(|id| seen.insert(id.as_str())).cloned().collect()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// Resolvable requests are stored once and carry exactly the fetched skills.
    #[test]
    fn prop_resolvable_request_saved_once(
        subject in arb_subject(),
        ids in prop::collection::vec(arb_skill_id(), 0..8),
    ) {
        let rt = tokio::runtime::Runtime::new().unwrap();
        rt.block_on(async {
            let skills = Arc::new(stub_for(&ids));
            let repo = Arc::new(RecordingRepository::new());
            let publisher = Arc::new(RecordingPublisher::new());
            let service = service_with(skills, repo.clone(), publisher.clone());

            let cert = service
                .create_certificate(CreateCertificateRequest::new(subject.clone(), ids.clone()))
                .await
                .unwrap();

            let expected: Vec<SkillReference> = distinct_in_order(&ids)
                .iter()
                .map(|id| SkillReference::new(id.clone(), id.to_uppercase()))
                .collect();
            prop_assert_eq!(&cert.skills, &expected);
            prop_assert_eq!(&cert.subject, &subject);
            prop_assert_eq!(repo.save_calls(), 1);
            prop_assert_eq!(publisher.publish_calls(), 1);
            Ok(())
        })?;
    }

    /// A single unresolvable skill anywhere in the request prevents the save.
    #[test]
    fn prop_any_missing_skill_prevents_save(
        ids in prop::collection::vec(arb_skill_id(), 0..6),
        position in 0usize..6,
    ) {
        let rt = tokio::runtime::Runtime::new().unwrap();
        rt.block_on(async {
            let skills = Arc::new(stub_for(&ids));
            let repo = Arc::new(RecordingRepository::new());
            let publisher = Arc::new(RecordingPublisher::new());
            let service = service_with(skills, repo.clone(), publisher.clone());

            let mut request_ids = ids.clone();
            request_ids.insert(position.min(ids.len()), "MISSING".to_string());

            let err = service
                .create_certificate(CreateCertificateRequest::new("user-1", request_ids))
                .await
                .unwrap_err();

            prop_assert_eq!(err.stage(), FailureStage::SkillLookup);
            prop_assert_eq!(repo.save_calls(), 0);
            prop_assert_eq!(publisher.publish_calls(), 0);
            Ok(())
        })?;
    }

    /// A failed publish never fails the request or loses the certificate.
    #[test]
    fn prop_publish_failure_keeps_certificate(
        ids in prop::collection::vec(arb_skill_id(), 1..5),
    ) {
        let rt = tokio::runtime::Runtime::new().unwrap();
        rt.block_on(async {
            let skills = Arc::new(stub_for(&ids));
            let repo = Arc::new(RecordingRepository::new());
            let publisher = Arc::new(RecordingPublisher::failing());
            let service = service_with(skills, repo.clone(), publisher.clone());

            let cert = service
                .create_certificate(CreateCertificateRequest::new("user-1", ids.clone()))
                .await
                .unwrap();

            prop_assert_eq!(cert.status, CertificateStatus::PublishFailed);
            let stored = service.get_certificate(cert.id).await.unwrap();
            prop_assert_eq!(stored.skills, cert.skills);
            Ok(())
        })?;
    }

    /// The event mirrors the certificate it announces.
    #[test]
    fn prop_event_matches_certificate(
        subject in arb_subject(),
        ids in prop::collection::vec(arb_skill_id(), 0..6),
    ) {
        let skills: Vec<SkillReference> = ids
            .iter()
            .map(|id| SkillReference::new(id.clone(), "x"))
            .collect();
        let cert = Certificate::new(subject, skills);
        let event = CertificateCreatedEvent::from(&cert);

        prop_assert_eq!(event.certificate_id(), cert.id);
        prop_assert_eq!(event.subject(), cert.subject.as_str());
        prop_assert_eq!(event.skill_ids(), ids.as_slice());
    }
}

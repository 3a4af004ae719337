//! Property-based tests for rust-common crate.
//!
//! These tests verify universal properties across all inputs using proptest.

use proptest::prelude::*;
use reqwest::Url;
use rust_common::{
    endpoint_url, CircuitBreaker, CircuitBreakerConfig, CircuitState, PlatformError, RetryConfig,
    RetryPolicy, Retryable,
};
use std::time::Duration;

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Transient HTTP statuses are retryable, client errors are not.
    #[test]
    fn prop_status_classification(status in 400u16..600) {
        let err = PlatformError::status("peer", status);
        let transient = matches!(status, 408 | 429 | 500..=599);
        prop_assert_eq!(err.is_retryable(), transient);
    }

    /// Backoff never exceeds the configured cap and never decreases.
    #[test]
    fn prop_backoff_monotonic_and_capped(
        initial_ms in 1u64..500,
        cap_ms in 500u64..5_000,
        attempt in 0u32..12,
    ) {
        let policy = RetryPolicy::new(
            RetryConfig::default()
                .without_jitter()
                .with_initial_delay(Duration::from_millis(initial_ms))
                .with_max_delay(Duration::from_millis(cap_ms)),
        );

        let current = policy.delay_for_attempt(attempt);
        let next = policy.delay_for_attempt(attempt + 1);
        prop_assert!(current <= Duration::from_millis(cap_ms));
        prop_assert!(next >= current);
    }

    /// The circuit opens exactly when consecutive failures reach the threshold.
    #[test]
    fn prop_circuit_opens_at_threshold(threshold in 1u32..10, failures in 0u32..20) {
        let cb = CircuitBreaker::new(
            "prop",
            CircuitBreakerConfig::default().with_failure_threshold(threshold),
        );
        for _ in 0..failures {
            cb.record_failure();
        }
        let expected = if failures >= threshold {
            CircuitState::Open
        } else {
            CircuitState::Closed
        };
        prop_assert_eq!(cb.state(), expected);
    }

    /// Plain identifiers are appended verbatim under the base path.
    #[test]
    fn prop_endpoint_appends_identifier(id in "[a-zA-Z0-9_-]{1,24}") {
        let base = Url::parse("http://skills.local/").unwrap();
        let url = endpoint_url(&base, &["api", "skills", &id]).unwrap();
        prop_assert_eq!(url.path(), format!("/api/skills/{id}"));
    }
}

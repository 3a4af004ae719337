//! Prometheus metrics for the certificate service.
//!
//! Provides counters and histograms for observability.

use once_cell::sync::Lazy;
use prometheus::{register_counter_vec, register_histogram_vec, CounterVec, HistogramVec};

/// Certificate creation outcomes.
pub static CERTIFICATES_CREATED: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "certificate_service_creations_total",
        "Total number of certificate creation requests by outcome",
        &["outcome"]
    )
    .expect("Failed to register creations metric")
});

/// Skill lookups against the skill service.
pub static SKILL_LOOKUPS: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "certificate_service_skill_lookups_total",
        "Total number of skill lookups by status",
        &["status"]
    )
    .expect("Failed to register skill_lookups metric")
});

/// Creation events handed to the message bus.
pub static EVENTS_PUBLISHED: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "certificate_service_events_published_total",
        "Total number of certificate_created publish attempts by status",
        &["status"]
    )
    .expect("Failed to register events_published metric")
});

/// Per-stage latency of the creation pipeline.
pub static STAGE_LATENCY: Lazy<HistogramVec> = Lazy::new(|| {
    register_histogram_vec!(
        "certificate_service_stage_latency_seconds",
        "Creation pipeline stage latency in seconds",
        &["stage"],
        vec![0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0]
    )
    .expect("Failed to register stage_latency metric")
});

/// Record the outcome of a creation request.
pub fn record_creation(outcome: &str) {
    CERTIFICATES_CREATED.with_label_values(&[outcome]).inc();
}

/// Record a skill lookup.
pub fn record_skill_lookup(status: &str) {
    SKILL_LOOKUPS.with_label_values(&[status]).inc();
}

/// Record a publish attempt.
pub fn record_publish(status: &str) {
    EVENTS_PUBLISHED.with_label_values(&[status]).inc();
}

/// Record how long a pipeline stage took.
pub fn record_stage_latency(stage: &str, duration_secs: f64) {
    STAGE_LATENCY.with_label_values(&[stage]).observe(duration_secs);
}

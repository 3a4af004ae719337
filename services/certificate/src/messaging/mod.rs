//! Certificate event publishing.
//!
//! Events are sent on a fan-out channel: every subscriber receives its own
//! copy. Delivery is at-most-once; a publish that fails is not retried.

pub mod connection;
pub mod event;
pub mod publisher;

pub use connection::BusConnection;
pub use event::{CertificateCreatedEvent, EventEnvelope, CERTIFICATE_CREATED, EVENT_SCHEMA_VERSION};
pub use publisher::{MessageBusPublisher, PublishAck, RedisBusPublisher};

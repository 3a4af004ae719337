//! Message bus publisher for certificate events.

use super::connection::BusConnection;
use super::event::CertificateCreatedEvent;
use crate::config::BusConfig;
use crate::error::PublishError;
use async_trait::async_trait;
use rust_common::{CircuitBreaker, CircuitState};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, instrument, warn};
use uuid::Uuid;

/// Outcome of a successful publish.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PublishAck {
    /// Id of the envelope that was sent
    pub event_id: Uuid,
    /// Subscribers the broker delivered to at publish time
    pub receivers: u64,
}

/// Announces certificate events on the message bus.
#[async_trait]
pub trait MessageBusPublisher: Send + Sync {
    /// Publish a creation event, fire and forget.
    ///
    /// Completes within a bounded time. A failure means the event may not
    /// have reached the broker.
    async fn publish(&self, event: &CertificateCreatedEvent) -> Result<PublishAck, PublishError>;
}

/// Publisher that fans events out over a Redis channel.
pub struct RedisBusPublisher {
    connection: Arc<BusConnection>,
    channel: String,
    timeout: Duration,
    breaker: CircuitBreaker,
}

impl RedisBusPublisher {
    /// Create a publisher on a shared connection.
    #[must_use]
    pub fn new(connection: Arc<BusConnection>, config: &BusConfig) -> Self {
        Self {
            connection,
            channel: config.channel.clone(),
            timeout: config.publish_timeout,
            breaker: CircuitBreaker::new("message-bus", config.circuit_breaker.clone()),
        }
    }

    /// Channel events are published on.
    #[must_use]
    pub fn channel(&self) -> &str {
        &self.channel
    }

    /// Current breaker state for the broker.
    #[must_use]
    pub fn circuit_state(&self) -> CircuitState {
        self.breaker.state()
    }

    async fn send(&self, body: String) -> Result<u64, PublishError> {
        let mut conn = self.connection.connection().await?;
        let receivers: u64 = redis::cmd("PUBLISH")
            .arg(&self.channel)
            .arg(body)
            .query_async(&mut conn)
            .await?;
        Ok(receivers)
    }
}

#[async_trait]
impl MessageBusPublisher for RedisBusPublisher {
    #[instrument(skip(self, event), fields(certificate_id = %event.certificate_id(), channel = %self.channel))]
    async fn publish(&self, event: &CertificateCreatedEvent) -> Result<PublishAck, PublishError> {
        if !self.breaker.allow_request() {
            return Err(PublishError::CircuitOpen(self.breaker.name().to_string()));
        }

        let (event_id, body) = event.to_wire()?;

        let outcome = match tokio::time::timeout(self.timeout, self.send(body)).await {
            Ok(result) => result,
            Err(_) => Err(PublishError::Timeout(self.timeout)),
        };

        match outcome {
            Ok(receivers) => {
                self.breaker.record_success();
                debug!(%event_id, receivers, "Certificate event published");
                Ok(PublishAck {
                    event_id,
                    receivers,
                })
            }
            Err(err) => {
                self.breaker.record_failure();
                warn!(%event_id, error = %err, "Certificate event publish failed");
                Err(err)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Certificate, SkillReference};
    use rust_common::CircuitBreakerConfig;

    fn unreachable_config() -> BusConfig {
        BusConfig {
            url: "redis://127.0.0.1:1".to_string(),
            channel: "certificates.created".to_string(),
            publish_timeout: Duration::from_millis(500),
            circuit_breaker: CircuitBreakerConfig::default()
                .with_failure_threshold(2)
                .with_timeout(Duration::from_secs(60)),
        }
    }

    fn event() -> CertificateCreatedEvent {
        let cert = Certificate::new("user-42", vec![SkillReference::new("sql-1", "SQL")]);
        CertificateCreatedEvent::from(&cert)
    }

    #[tokio::test]
    async fn test_unreachable_broker_fails_and_opens_circuit() {
        let config = unreachable_config();
        let connection = Arc::new(BusConnection::new(&config.url).unwrap());
        let publisher = RedisBusPublisher::new(connection, &config);

        assert!(publisher.publish(&event()).await.is_err());
        assert!(publisher.publish(&event()).await.is_err());
        assert_eq!(publisher.circuit_state(), CircuitState::Open);

        let err = publisher.publish(&event()).await.unwrap_err();
        assert!(matches!(err, PublishError::CircuitOpen(_)));
    }

    #[tokio::test]
    async fn test_silent_broker_times_out_within_bound() {
        // Accepts connections and never answers a single byte.
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let mut held = Vec::new();
            while let Ok((socket, _)) = listener.accept().await {
                held.push(socket);
            }
        });

        let config = BusConfig {
            url: format!("redis://{addr}"),
            publish_timeout: Duration::from_millis(200),
            ..unreachable_config()
        };
        let connection = Arc::new(BusConnection::new(&config.url).unwrap());
        let publisher = RedisBusPublisher::new(connection, &config);

        let started = std::time::Instant::now();
        let err = publisher.publish(&event()).await.unwrap_err();
        let elapsed = started.elapsed();

        assert!(matches!(err, PublishError::Timeout(bound) if bound == config.publish_timeout));
        assert!(elapsed >= config.publish_timeout);
        assert!(elapsed < config.publish_timeout + Duration::from_secs(1), "{elapsed:?}");
    }

    #[test]
    fn test_publisher_uses_configured_channel() {
        let config = unreachable_config();
        let connection = Arc::new(BusConnection::new(&config.url).unwrap());
        let publisher = RedisBusPublisher::new(connection, &config);
        assert_eq!(publisher.channel(), "certificates.created");
        assert_eq!(publisher.circuit_state(), CircuitState::Closed);
    }
}

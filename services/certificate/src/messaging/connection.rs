//! Shared connection to the message broker.

use crate::error::PublishError;
use redis::aio::ConnectionManager;
use tokio::sync::OnceCell;
use tracing::info;

/// Process-wide handle to the broker.
///
/// Constructed once at startup and shared through `Arc`. Nothing is dialed
/// until the first [`BusConnection::connection`] call; after that the
/// multiplexed connection lives as long as the handle and re-establishes
/// itself after a disconnect. A failed first dial leaves the handle
/// unconnected, so the next call dials again.
pub struct BusConnection {
    client: redis::Client,
    manager: OnceCell<ConnectionManager>,
}

impl BusConnection {
    /// Create a handle for the broker at `url` without connecting.
    ///
    /// # Errors
    ///
    /// Returns [`PublishError::InvalidConfig`] if the URL cannot be parsed.
    pub fn new(url: &str) -> Result<Self, PublishError> {
        let client = redis::Client::open(url)
            .map_err(|e| PublishError::InvalidConfig(format!("{url}: {e}")))?;
        Ok(Self {
            client,
            manager: OnceCell::new(),
        })
    }

    /// Get a handle to the shared connection, dialing on first use.
    ///
    /// Handles are cheap clones of one multiplexed connection; concurrent
    /// callers pipeline their commands over it.
    ///
    /// # Errors
    ///
    /// Returns the broker error if the first dial fails.
    pub async fn connection(&self) -> Result<ConnectionManager, PublishError> {
        let manager = self
            .manager
            .get_or_try_init(|| async {
                info!("Opening message bus connection");
                ConnectionManager::new(self.client.clone()).await
            })
            .await?;
        Ok(manager.clone())
    }

    /// Whether the connection has been established.
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.manager.initialized()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_url_rejected() {
        assert!(matches!(
            BusConnection::new("not-a-broker-url"),
            Err(PublishError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_connection_is_lazy() {
        let bus = BusConnection::new("redis://127.0.0.1:6379").unwrap();
        assert!(!bus.is_open());
    }
}

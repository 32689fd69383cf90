//! Publishes domain events to NATS when a connection is configured.

use tracing::{debug, warn};

use crate::domain::events::DomainEvent;

#[derive(Clone, Default)]
pub struct EventPublisher {
    nats: Option<async_nats::Client>,
}

impl EventPublisher {
    pub fn new(nats: Option<async_nats::Client>) -> Self { Self { nats } }

    /// Publisher that only logs.
    pub fn disabled() -> Self { Self::default() }

    pub async fn connect(url: &str) -> Result<Self, async_nats::ConnectError> {
        let client = async_nats::connect(url).await?;
        Ok(Self::new(Some(client)))
    }

    pub fn is_connected(&self) -> bool { self.nats.is_some() }

    /// Never fails the caller; delivery problems are logged.
    pub async fn publish(&self, event: DomainEvent) {
        let subject = event.subject();
        let Some(client) = &self.nats else {
            debug!(%subject, ?event, "domain event");
            return;
        };
        let payload = match serde_json::to_vec(&event) {
            Ok(payload) => payload,
            Err(e) => {
                warn!(%subject, error = %e, "failed to encode domain event");
                return;
            }
        };
        if let Err(e) = client.publish(subject.clone(), payload.into()).await {
            warn!(%subject, error = %e, "failed to publish domain event");
        }
    }
}

use super::migration_events::MigrationEvent;
use async_trait::async_trait;
use tokio::sync::broadcast;

/// Capability the migration service uses to announce outcomes
#[async_trait]
pub trait EventSink: Send + Sync {
    async fn emit(&self, event: MigrationEvent) -> Result<(), PublishError>;
}

/// Broadcast publisher for migration events
#[derive(Debug, Clone)]
pub struct EventPublisher {
    sender: broadcast::Sender<PublishedEvent>,
}

/// Event that has been published
#[derive(Debug, Clone)]
pub struct PublishedEvent {
    pub name: String,
    pub event: MigrationEvent,
    pub published_at: chrono::DateTime<chrono::Utc>,
}

impl EventPublisher {
    /// Create a new event publisher with the specified channel capacity
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    pub fn publish(&self, event: MigrationEvent) -> Result<(), PublishError> {
        let published = PublishedEvent {
            name: event.event_name().to_string(),
            event,
            published_at: chrono::Utc::now(),
        };

        // No subscribers is fine: emission is fire-and-forget
        match self.sender.send(published) {
            Ok(_) => Ok(()),
            Err(broadcast::error::SendError(_)) => Ok(()),
        }
    }

    /// Subscribe to events
    pub fn subscribe(&self) -> broadcast::Receiver<PublishedEvent> {
        self.sender.subscribe()
    }

    /// Get the number of active subscribers
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

#[async_trait]
impl EventSink for EventPublisher {
    async fn emit(&self, event: MigrationEvent) -> Result<(), PublishError> {
        self.publish(event)
    }
}

/// Error types for event publishing
#[derive(Debug, thiserror::Error)]
pub enum PublishError {
    #[error("Event sink rejected {event_name}: {reason}")]
    Rejected { event_name: String, reason: String },
}

impl Default for EventPublisher {
    fn default() -> Self {
        Self::new(crate::constants::system::DEFAULT_EVENT_CHANNEL_CAPACITY)
    }
}

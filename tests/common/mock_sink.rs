//! Event sinks that record, fail or stop the batch on demand

#![allow(dead_code)]

use async_trait::async_trait;
use parking_lot::Mutex;
use user_migration_core::events::{EventSink, MigrationEvent, PublishError};
use user_migration_core::state_machine::BatchHandle;

/// Records every event; optionally stops a batch after N migrated users
#[derive(Default)]
pub struct RecordingSink {
    events: Mutex<Vec<MigrationEvent>>,
    stop_after: Mutex<Option<(usize, BatchHandle)>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stop `batch` once `migrated` users have been announced
    pub fn stopping_after(migrated: usize, batch: BatchHandle) -> Self {
        Self {
            events: Mutex::new(Vec::new()),
            stop_after: Mutex::new(Some((migrated, batch))),
        }
    }

    pub fn events(&self) -> Vec<MigrationEvent> {
        self.events.lock().clone()
    }

    pub fn migrated_count(&self) -> usize {
        self.events
            .lock()
            .iter()
            .filter(|event| matches!(event, MigrationEvent::UserHasBeenMigrated(_)))
            .count()
    }
}

#[async_trait]
impl EventSink for RecordingSink {
    async fn emit(&self, event: MigrationEvent) -> Result<(), PublishError> {
        self.events.lock().push(event);

        let migrated = self.migrated_count();
        let mut stop_after = self.stop_after.lock();
        if matches!(stop_after.as_ref(), Some((n, _)) if *n == migrated) {
            if let Some((_, batch)) = stop_after.take() {
                batch.stop().expect("batch should be stoppable");
            }
        }
        Ok(())
    }
}

/// Rejects every event
pub struct FailingSink;

#[async_trait]
impl EventSink for FailingSink {
    async fn emit(&self, event: MigrationEvent) -> Result<(), PublishError> {
        Err(PublishError::Rejected {
            event_name: event.event_name().to_string(),
            reason: "bus offline".to_string(),
        })
    }
}

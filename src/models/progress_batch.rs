//! # Progress Batch
//!
//! Tracks the lifecycle of one bulk operation and accumulates its
//! `accomplished` / `incidences` counters.
//!
//! State transitions go through [`TransitionGuard`]; an illegal transition
//! returns [`StateMachineError::IllegalStateTransition`] and leaves the batch
//! untouched. Counters can only grow.

use crate::state_machine::errors::StateMachineResult;
use crate::state_machine::events::BatchEvent;
use crate::state_machine::guards::TransitionGuard;
use crate::state_machine::states::BatchState;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[cfg(doc)]
use crate::state_machine::errors::StateMachineError;

/// Partial attribute set merged over the defaults by [`ProgressBatch::create`]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewProgressBatch {
    pub id: Option<Uuid>,
    pub accomplished: Option<u64>,
    pub incidences: Option<u64>,
}

/// Progress record of one bulk operation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressBatch {
    id: Uuid,
    state: BatchState,
    accomplished: u64,
    incidences: u64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl ProgressBatch {
    /// Create a new batch in `pending` with zeroed counters
    pub fn create(attributes: Option<NewProgressBatch>) -> Self {
        let attributes = attributes.unwrap_or_default();
        let now = Utc::now();

        Self {
            id: attributes.id.unwrap_or_else(Uuid::new_v4),
            state: BatchState::Pending,
            accomplished: attributes.accomplished.unwrap_or(0),
            incidences: attributes.incidences.unwrap_or(0),
            created_at: now,
            updated_at: now,
        }
    }

    /// Rebuild a batch from persisted fields
    pub fn restore(
        id: Uuid,
        state: BatchState,
        accomplished: u64,
        incidences: u64,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            state,
            accomplished,
            incidences,
            created_at,
            updated_at,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn state(&self) -> BatchState {
        self.state
    }

    pub fn accomplished(&self) -> u64 {
        self.accomplished
    }

    pub fn incidences(&self) -> u64 {
        self.incidences
    }

    /// Items accounted for so far, successful or not
    pub fn processed(&self) -> u64 {
        self.accomplished.saturating_add(self.incidences)
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    pub fn pending(&self) -> bool {
        self.state == BatchState::Pending
    }

    pub fn finished(&self) -> bool {
        self.state == BatchState::Finished
    }

    pub fn stopped(&self) -> bool {
        self.state == BatchState::Stopped
    }

    /// `pending` → `finished`
    pub fn finish(&mut self) -> StateMachineResult<BatchState> {
        self.transition(BatchEvent::Finish)
    }

    /// `pending` → `stopped`
    pub fn stop(&mut self) -> StateMachineResult<BatchState> {
        self.transition(BatchEvent::Stop)
    }

    /// `stopped` → `pending`
    pub fn resume(&mut self) -> StateMachineResult<BatchState> {
        self.transition(BatchEvent::Resume)
    }

    /// Count one successfully processed item
    pub fn record_accomplished(&mut self) -> u64 {
        self.accomplished = self.accomplished.saturating_add(1);
        self.touch();
        self.accomplished
    }

    /// Count one failed item
    pub fn record_incidence(&mut self) -> u64 {
        self.incidences = self.incidences.saturating_add(1);
        self.touch();
        self.incidences
    }

    fn transition(&mut self, event: BatchEvent) -> StateMachineResult<BatchState> {
        let from = self.state;
        let target = TransitionGuard::target_state(from, event)?;

        self.state = target;
        self.touch();

        crate::log_batch!(debug, "batch_transition",
            batch_id: self.id,
            event: event.event_type(),
            from: from.as_str(),
            to: target.as_str()
        );

        Ok(target)
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

impl Default for ProgressBatch {
    fn default() -> Self {
        Self::create(None)
    }
}

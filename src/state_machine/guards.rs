use super::errors::{illegal_transition, StateMachineResult};
use super::events::BatchEvent;
use super::states::BatchState;

/// Guard conditions for batch state transitions
#[derive(Debug)]
pub struct TransitionGuard;

impl TransitionGuard {
    /// Resolve the state an event leads to, rejecting anything outside the table
    ///
    /// | from     | event  | to       |
    /// |----------|--------|----------|
    /// | pending  | finish | finished |
    /// | pending  | stop   | stopped  |
    /// | stopped  | resume | pending  |
    pub fn target_state(from: BatchState, event: BatchEvent) -> StateMachineResult<BatchState> {
        use BatchEvent::*;
        use BatchState::*;

        match (from, event) {
            (Pending, Finish) => Ok(Finished),
            (Pending, Stop) => Ok(Stopped),
            (Stopped, Resume) => Ok(Pending),
            (from, event) => Err(illegal_transition(from, event)),
        }
    }

    /// Check if a transition is valid without performing it
    pub fn can_transition(from: BatchState, event: BatchEvent) -> bool {
        Self::target_state(from, event).is_ok()
    }
}

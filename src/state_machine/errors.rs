use super::events::BatchEvent;
use super::states::BatchState;
use thiserror::Error;

/// Errors raised by batch state transitions
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StateMachineError {
    #[error("Illegal state transition: cannot {event} a batch in state {from}")]
    IllegalStateTransition { from: BatchState, event: BatchEvent },

    #[error("Invalid batch state: {state}")]
    InvalidState { state: String },
}

impl StateMachineError {
    pub fn is_illegal_transition(&self) -> bool {
        matches!(self, Self::IllegalStateTransition { .. })
    }
}

/// Result type alias for state machine operations
pub type StateMachineResult<T> = Result<T, StateMachineError>;

/// Helper function to create illegal transition errors
pub fn illegal_transition(from: BatchState, event: BatchEvent) -> StateMachineError {
    StateMachineError::IllegalStateTransition { from, event }
}

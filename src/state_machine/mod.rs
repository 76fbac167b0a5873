// State machine module for progress batches
//
// A batch moves pending -> finished, or pending <-> stopped. Every transition
// is checked by the guard table; counters live on the batch record itself.

pub mod batch_handle;
pub mod errors;
pub mod events;
pub mod guards;
pub mod states;

// Re-export main types for convenient access
pub use batch_handle::BatchHandle;
pub use errors::{StateMachineError, StateMachineResult};
pub use events::BatchEvent;
pub use guards::TransitionGuard;
pub use states::BatchState;

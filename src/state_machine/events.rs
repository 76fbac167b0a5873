use serde::{Deserialize, Serialize};
use std::fmt;

/// Events that can trigger batch state transitions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BatchEvent {
    /// All items have been processed
    Finish,
    /// Pause the batch
    Stop,
    /// Continue a stopped batch
    Resume,
}

impl BatchEvent {
    /// Get a string representation of the event type for logging
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::Finish => "finish",
            Self::Stop => "stop",
            Self::Resume => "resume",
        }
    }
}

impl fmt::Display for BatchEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.event_type())
    }
}

use super::errors::StateMachineError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle states of a progress batch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum BatchState {
    /// Initial state; the batch accepts further progress
    #[default]
    Pending,
    /// Every item of the bulk operation has been accounted for
    Finished,
    /// Paused by the batch owner, resumable
    Stopped,
}

impl BatchState {
    /// Check if this is a terminal state (no further transitions allowed)
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Finished)
    }

    /// Check if items may still be recorded against the batch
    pub fn accepts_progress(&self) -> bool {
        matches!(self, Self::Pending)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Finished => "finished",
            Self::Stopped => "stopped",
        }
    }
}

impl fmt::Display for BatchState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for BatchState {
    type Err = StateMachineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "finished" => Ok(Self::Finished),
            "stopped" => Ok(Self::Stopped),
            _ => Err(StateMachineError::InvalidState {
                state: s.to_string(),
            }),
        }
    }
}

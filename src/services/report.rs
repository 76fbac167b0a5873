use super::errors::MigrationError;
use crate::models::MigratedUser;
use crate::state_machine::BatchState;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Classification of one processed source user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum MigrationOutcome {
    Migrated { source_user_id: i64, user: MigratedUser },
    Incidence { source_user_id: i64, reason: MigrationError },
}

impl MigrationOutcome {
    pub fn source_user_id(&self) -> i64 {
        match self {
            Self::Migrated { source_user_id, .. } | Self::Incidence { source_user_id, .. } => {
                *source_user_id
            }
        }
    }

    pub fn is_migrated(&self) -> bool {
        matches!(self, Self::Migrated { .. })
    }
}

/// Result of a `migrate_users` run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MigrationReport {
    pub batch_id: Uuid,
    pub state: BatchState,
    pub accomplished: u64,
    pub incidences: u64,
    /// Outcomes in completion order
    pub outcomes: Vec<MigrationOutcome>,
    /// Source ids never started because the batch was stopped
    pub unprocessed_source_ids: Vec<i64>,
    pub interrupted: bool,
}

impl MigrationReport {
    pub fn migrated(&self) -> impl Iterator<Item = &MigratedUser> {
        self.outcomes.iter().filter_map(|outcome| match outcome {
            MigrationOutcome::Migrated { user, .. } => Some(user),
            MigrationOutcome::Incidence { .. } => None,
        })
    }

    pub fn incidences(&self) -> impl Iterator<Item = &MigrationError> {
        self.outcomes.iter().filter_map(|outcome| match outcome {
            MigrationOutcome::Incidence { reason, .. } => Some(reason),
            MigrationOutcome::Migrated { .. } => None,
        })
    }

    /// Payload for the admin endpoint that triggered the run
    pub fn response(&self) -> MigrationResponse {
        MigrationResponse {
            done: !self.interrupted,
            batch_id: self.batch_id,
            state: self.state,
            accomplished: self.accomplished,
            incidences: self.incidences,
        }
    }
}

/// `done` reports that the collection completed, not that every item was clean
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MigrationResponse {
    pub done: bool,
    pub batch_id: Uuid,
    pub state: BatchState,
    pub accomplished: u64,
    pub incidences: u64,
}

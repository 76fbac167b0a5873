use crate::constants::messages;
use crate::repositories::{PersistenceError, StoreError};
use crate::state_machine::{BatchState, StateMachineError};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// A single source user could not be migrated; counted as an incidence
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum MigrationError {
    #[error("{}", messages::MISSING_EMAIL)]
    MissingEmail { source_user_id: i64 },

    /// Carries the store's integrity violation message
    #[error("{message}")]
    IntegrityViolation { source_user_id: i64, message: String },
}

impl MigrationError {
    pub fn source_user_id(&self) -> i64 {
        match self {
            Self::MissingEmail { source_user_id } => *source_user_id,
            Self::IntegrityViolation { source_user_id, .. } => *source_user_id,
        }
    }

    /// Short reason code for logs and reports
    pub fn reason(&self) -> &'static str {
        match self {
            Self::MissingEmail { .. } => "missing_email",
            Self::IntegrityViolation { .. } => "integrity_violation",
        }
    }
}

/// Errors returned by the user migration service
///
/// Only [`UserMigrationError::Migration`] is an incidence; everything else is
/// unclassified and leaves the counters alone.
#[derive(Error, Debug)]
pub enum UserMigrationError {
    #[error(transparent)]
    Migration(#[from] MigrationError),

    #[error("Destination store failure: {0}")]
    Store(StoreError),

    #[error("Source provider failure: {0}")]
    SourceProvider(StoreError),

    #[error(transparent)]
    StateMachine(#[from] StateMachineError),

    #[error("Batch persistence failed: {0}")]
    Persistence(#[from] PersistenceError),

    #[error("Failed to snapshot source user: {0}")]
    Snapshot(#[from] serde_json::Error),

    #[error("Progress batch {0} not found")]
    BatchNotFound(Uuid),

    #[error("Progress batch {batch_id} is {state} and accepts no further progress")]
    BatchClosed { batch_id: Uuid, state: BatchState },
}

impl UserMigrationError {
    pub fn is_incidence(&self) -> bool {
        matches!(self, Self::Migration(_))
    }

    pub fn as_migration_error(&self) -> Option<&MigrationError> {
        match self {
            Self::Migration(err) => Some(err),
            _ => None,
        }
    }
}

pub type UserMigrationResult<T> = Result<T, UserMigrationError>;

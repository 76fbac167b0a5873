use crate::constants::events;
use crate::models::MigratedUser;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// A source user was copied into the destination store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserHasBeenMigrated {
    pub source_user_id: i64,
    /// Serialized snapshot of the legacy record
    pub source_user: Value,
    pub new_user: MigratedUser,
    pub batch_id: Uuid,
}

/// Every item of a batch has been accounted for
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MigrationBatchFinished {
    pub batch_id: Uuid,
    pub accomplished: u64,
    pub incidences: u64,
}

/// Domain events emitted by the migration service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum MigrationEvent {
    UserHasBeenMigrated(UserHasBeenMigrated),
    BatchFinished(MigrationBatchFinished),
}

impl MigrationEvent {
    /// Name under which the event is published
    pub fn event_name(&self) -> &'static str {
        match self {
            Self::UserHasBeenMigrated(_) => events::USER_HAS_BEEN_MIGRATED,
            Self::BatchFinished(_) => events::MIGRATION_BATCH_FINISHED,
        }
    }

    pub fn batch_id(&self) -> Uuid {
        match self {
            Self::UserHasBeenMigrated(event) => event.batch_id,
            Self::BatchFinished(event) => event.batch_id,
        }
    }
}

impl From<UserHasBeenMigrated> for MigrationEvent {
    fn from(event: UserHasBeenMigrated) -> Self {
        Self::UserHasBeenMigrated(event)
    }
}

impl From<MigrationBatchFinished> for MigrationEvent {
    fn from(event: MigrationBatchFinished) -> Self {
        Self::BatchFinished(event)
    }
}

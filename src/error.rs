use crate::config::ConfigurationError;
use crate::repositories::{PersistenceError, StoreError};
use crate::services::UserMigrationError;
use crate::state_machine::StateMachineError;
use std::fmt;

/// Top-level error for embedding the migration core in a host application
#[derive(Debug, Clone, PartialEq)]
pub enum CoreError {
    DatabaseError(String),
    StateTransitionError(String),
    MigrationError(String),
    ConfigurationError(String),
}

impl fmt::Display for CoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CoreError::DatabaseError(msg) => write!(f, "Database error: {msg}"),
            CoreError::StateTransitionError(msg) => write!(f, "State transition error: {msg}"),
            CoreError::MigrationError(msg) => write!(f, "Migration error: {msg}"),
            CoreError::ConfigurationError(msg) => write!(f, "Configuration error: {msg}"),
        }
    }
}

impl std::error::Error for CoreError {}

impl From<StateMachineError> for CoreError {
    fn from(err: StateMachineError) -> Self {
        CoreError::StateTransitionError(err.to_string())
    }
}

impl From<StoreError> for CoreError {
    fn from(err: StoreError) -> Self {
        CoreError::DatabaseError(err.to_string())
    }
}

impl From<PersistenceError> for CoreError {
    fn from(err: PersistenceError) -> Self {
        CoreError::DatabaseError(err.to_string())
    }
}

impl From<sqlx::Error> for CoreError {
    fn from(err: sqlx::Error) -> Self {
        CoreError::DatabaseError(err.to_string())
    }
}

impl From<ConfigurationError> for CoreError {
    fn from(err: ConfigurationError) -> Self {
        CoreError::ConfigurationError(err.to_string())
    }
}

impl From<UserMigrationError> for CoreError {
    fn from(err: UserMigrationError) -> Self {
        match err {
            UserMigrationError::StateMachine(err) => err.into(),
            UserMigrationError::Store(err) | UserMigrationError::SourceProvider(err) => err.into(),
            UserMigrationError::Persistence(err) => err.into(),
            closed @ UserMigrationError::BatchClosed { .. } => {
                CoreError::StateTransitionError(closed.to_string())
            }
            other => CoreError::MigrationError(other.to_string()),
        }
    }
}

pub type Result<T> = std::result::Result<T, CoreError>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::MigrationError;
    use crate::state_machine::{BatchEvent, BatchState};

    #[test]
    fn test_state_machine_errors_keep_their_message() {
        let err: CoreError = StateMachineError::IllegalStateTransition {
            from: BatchState::Finished,
            event: BatchEvent::Finish,
        }
        .into();

        assert!(matches!(err, CoreError::StateTransitionError(_)));
        assert!(err.to_string().contains("finished"));
    }

    #[test]
    fn test_incidences_map_to_migration_errors() {
        let err: CoreError =
            UserMigrationError::from(MigrationError::MissingEmail { source_user_id: 3 }).into();
        assert_eq!(
            err,
            CoreError::MigrationError("Source User doesn't have email".to_string())
        );
    }

    #[test]
    fn test_closed_batch_maps_to_state_transition_error() {
        let err: CoreError = UserMigrationError::BatchClosed {
            batch_id: uuid::Uuid::nil(),
            state: BatchState::Finished,
        }
        .into();
        assert!(matches!(err, CoreError::StateTransitionError(ref msg) if msg.contains("finished")));
    }

    #[test]
    fn test_store_outage_maps_to_database_error() {
        let err: CoreError =
            UserMigrationError::Store(StoreError::Unavailable("refused".to_string())).into();
        assert!(matches!(err, CoreError::DatabaseError(ref msg) if msg.contains("refused")));
    }
}

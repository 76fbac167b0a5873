use crate::constants::messages;
use crate::database::PgErrorCode;
use thiserror::Error;
use uuid::Uuid;

/// Errors raised by user stores and source user providers
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("{}: Duplicate entry '{value}' for key '{constraint}'", messages::INTEGRITY_VIOLATION_PREFIX)]
    UniqueViolation { constraint: String, value: String },

    #[error("{}: {reason}", messages::INTEGRITY_VIOLATION_PREFIX)]
    ConstraintViolation { reason: String },

    #[error("User store unavailable: {0}")]
    Unavailable(String),

    #[error("Invalid source configuration: {0}")]
    InvalidSource(String),

    #[error("Database error: {0}")]
    Database(sqlx::Error),
}

impl StoreError {
    /// True for duplicate keys and other class 23 failures
    pub fn is_integrity_violation(&self) -> bool {
        matches!(
            self,
            Self::UniqueViolation { .. } | Self::ConstraintViolation { .. }
        )
    }

    /// Classify a failed insert into `users`
    pub fn from_insert_error(err: sqlx::Error, email: &str) -> Self {
        if let sqlx::Error::Database(db_err) = &err {
            if let Some(code) = db_err.code() {
                if PgErrorCode::is_unique_violation(&code) {
                    return Self::UniqueViolation {
                        constraint: db_err
                            .constraint()
                            .unwrap_or(crate::constants::system::USERS_EMAIL_UNIQUE_KEY)
                            .to_string(),
                        value: email.to_string(),
                    };
                }
                if PgErrorCode::is_integrity_violation(&code) {
                    return Self::ConstraintViolation {
                        reason: db_err.message().to_string(),
                    };
                }
            }
        }
        Self::from(err)
    }
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        if is_unavailable(&err) {
            return Self::Unavailable(err.to_string());
        }
        Self::Database(err)
    }
}

/// Pool exhaustion, broken sockets and SQLSTATE class 08
fn is_unavailable(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => true,
        sqlx::Error::Database(db_err) => db_err
            .code()
            .is_some_and(|code| PgErrorCode::is_connection_error(&code)),
        _ => false,
    }
}

/// Errors raised while persisting progress batches
#[derive(Error, Debug)]
pub enum PersistenceError {
    #[error("Progress batch {batch_id} not found")]
    NotFound { batch_id: Uuid },

    #[error("Progress batch {batch_id} already exists")]
    AlreadyExists { batch_id: Uuid },

    #[error("Invalid persisted batch data for field {field}: {reason}")]
    InvalidData { field: String, reason: String },

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;
pub type PersistenceResult<T> = Result<T, PersistenceError>;

//! # Constants
//!
//! Event names, messages and defaults shared across the migration core.

/// Published event names
pub mod events {
    pub const USER_HAS_BEEN_MIGRATED: &str = "migration.user_has_been_migrated";
    pub const MIGRATION_BATCH_FINISHED: &str = "migration.batch_finished";
}

/// Messages surfaced to callers
pub mod messages {
    pub const MISSING_EMAIL: &str = "Source User doesn't have email";
    pub const INTEGRITY_VIOLATION_PREFIX: &str = "Integrity constraint violation";
}

/// System-level defaults
pub mod system {
    pub const DEFAULT_EVENT_CHANNEL_CAPACITY: usize = 1000;
    pub const DEFAULT_MAX_CONCURRENCY: usize = 1;
    pub const DEFAULT_PLACEHOLDER_PASSWORD_LENGTH: usize = 40;
    pub const MIN_PLACEHOLDER_PASSWORD_LENGTH: usize = 16;
    pub const MAX_PLACEHOLDER_PASSWORD_LENGTH: usize = 128;
    pub const DEFAULT_SOURCE_USERS_TABLE: &str = "users";
    pub const USERS_EMAIL_UNIQUE_KEY: &str = "users_email_unique";
}

/// Table names used by the Postgres adapters
pub mod tables {
    pub const PROGRESS_BATCHES: &str = "progress_batches";
    pub const USERS: &str = "users";
}

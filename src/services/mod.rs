//! # Services
//!
//! The user migration service and the report it returns.

pub mod errors;
pub mod report;
pub mod user_migration_service;

pub use errors::{MigrationError, UserMigrationError, UserMigrationResult};
pub use report::{MigrationOutcome, MigrationReport, MigrationResponse};
pub use user_migration_service::{generate_placeholder_password, UserMigrationService};

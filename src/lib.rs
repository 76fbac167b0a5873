#![allow(clippy::doc_markdown)] // Allow technical terms like PostgreSQL, SQLx in docs
#![allow(clippy::missing_errors_doc)] // Allow public functions without # Errors sections
#![allow(clippy::must_use_candidate)] // Allow methods without must_use when context is clear

//! # User Migration Core
//!
//! Moves user accounts from a legacy users table into a new user store while
//! tracking progress in a persistent batch record.
//!
//! ## Overview
//!
//! Each run is owned by a **progress batch**: a small state machine
//! (`pending`, `finished`, `stopped`) with two counters, `accomplished` and
//! `incidences`. Every source user processed in the run increments exactly
//! one of them. Users without an email, or whose email already exists in the
//! destination, become incidences and never abort the run.
//!
//! ## Module Organization
//!
//! - [`state_machine`] - Batch states, events, transition guards and the shared batch handle
//! - [`models`] - Progress batch record, legacy and migrated users
//! - [`repositories`] - User store, source provider and batch repository contracts
//! - [`services`] - The user migration service and its reports
//! - [`events`] - Migration events and the broadcast publisher
//! - [`config`] - Layered configuration
//! - [`database`] - Pool setup and PostgreSQL error codes
//! - [`bootstrap`] - Wiring for Postgres-backed and in-memory systems
//! - [`error`] - Top-level error type
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use user_migration_core::bootstrap::MigrationSystem;
//! use user_migration_core::config::MigrationConfig;
//! use user_migration_core::models::LegacyUser;
//! use user_migration_core::repositories::{InMemorySourceUserProvider, SourceSelection};
//!
//! # async fn example() -> user_migration_core::Result<()> {
//! let source = InMemorySourceUserProvider::new(vec![
//!     LegacyUser::new(1, "ada", Some("ada@example.com")),
//!     LegacyUser::new(2, "nobody", None),
//! ]);
//! let system = MigrationSystem::in_memory(MigrationConfig::default(), source);
//!
//! let batch = system.start_batch().await?;
//! let report = system
//!     .service()
//!     .migrate_selection(system.source(), &SourceSelection::All, &batch)
//!     .await?;
//!
//! assert_eq!((report.accomplished, report.incidences), (1, 1));
//! # Ok(())
//! # }
//! ```
//!
//! ## Testing
//!
//! ```bash
//! cargo test --lib    # Unit tests
//! cargo test          # Unit, integration and property tests
//! ```

pub mod bootstrap;
pub mod config;
pub mod constants;
pub mod database;
pub mod error;
pub mod events;
pub mod logging;
pub mod models;
pub mod repositories;
pub mod services;
pub mod state_machine;

pub use bootstrap::MigrationSystem;
pub use config::{ConfigManager, MigrationConfig, MigrationSettings};
// Re-export constants events with different name to avoid conflict
pub use constants::events as event_names;
pub use error::{CoreError, Result};
pub use events::{EventPublisher, EventSink, MigrationEvent};
pub use models::{LegacyUser, MigratedUser, NewProgressBatch, ProgressBatch, SourceUser};
pub use repositories::{
    BatchRepository, SourceSelection, SourceUserProvider, StoreError, UserStore,
};
pub use services::{
    MigrationError, MigrationOutcome, MigrationReport, MigrationResponse, UserMigrationError,
    UserMigrationService,
};
pub use state_machine::{BatchEvent, BatchHandle, BatchState, StateMachineError};

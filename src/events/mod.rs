//! # Event System
//!
//! Migration events and the broadcast publisher they flow through.

pub mod migration_events;
pub mod publisher;

pub use migration_events::{MigrationBatchFinished, MigrationEvent, UserHasBeenMigrated};
pub use publisher::{EventPublisher, EventSink, PublishError, PublishedEvent};

//! # Repositories
//!
//! Collaborator contracts of the migration core, each with an in-memory
//! implementation and a Postgres implementation.

pub mod batch_repository;
pub mod errors;
pub mod source_user_provider;
pub mod user_store;

pub use batch_repository::{
    BatchCounter, BatchRepository, InMemoryBatchRepository, PgBatchRepository,
};
pub use errors::{PersistenceError, PersistenceResult, StoreError, StoreResult};
pub use source_user_provider::{
    InMemorySourceUserProvider, PgSourceUserProvider, SourceSelection, SourceUserProvider,
};
pub use user_store::{InMemoryUserStore, PgUserStore, UserStore};

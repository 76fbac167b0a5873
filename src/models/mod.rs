//! # Models
//!
//! Records handled by the migration core: the progress batch it tracks, the
//! legacy users it reads and the destination users it creates.

pub mod migrated_user;
pub mod progress_batch;
pub mod source_user;

pub use migrated_user::{MigratedUser, NewUser};
pub use progress_batch::{NewProgressBatch, ProgressBatch};
pub use source_user::{LegacyUser, SourceUser};

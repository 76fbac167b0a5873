//! # User Migration Service
//!
//! Copies legacy users into the destination store, one progress batch at a
//! time.
//!
//! Per-item failures (no email, duplicate email) are counted as incidences and
//! returned as [`MigrationError`]. `migrate_users` turns them into
//! [`MigrationOutcome::Incidence`] and keeps going, so one bad record never
//! aborts the batch. Store outages and persistence failures are not counted
//! and propagate to the caller, leaving the batch `pending` with whatever
//! counts were already recorded. Event emission is fire-and-forget: a sink
//! failure is logged and the run carries on.
//!
//! The service only increments counters and requests `finish`. Stopping and
//! resuming belong to the batch owner; when `honor_stop_requests` is set the
//! loop checks for a stopped batch before starting each item.

use super::errors::{MigrationError, UserMigrationError, UserMigrationResult};
use super::report::{MigrationOutcome, MigrationReport};
use crate::config::MigrationSettings;
use crate::events::{EventSink, MigrationBatchFinished, MigrationEvent, UserHasBeenMigrated};
use crate::models::{MigratedUser, NewProgressBatch, NewUser, ProgressBatch, SourceUser};
use crate::repositories::{
    BatchCounter, BatchRepository, SourceSelection, SourceUserProvider, UserStore,
};
use crate::state_machine::errors::illegal_transition;
use crate::state_machine::{BatchEvent, BatchHandle};
use crate::{log_batch, log_migration};
use futures::stream::{self, StreamExt};
use std::sync::Arc;
use uuid::Uuid;

/// Where an item's outcome is counted
#[derive(Clone, Copy)]
enum Tally<'a> {
    /// In-process handle, written through when `persist_progress` is on
    Handle(&'a BatchHandle),
    /// Persisted batch, incremented in place by the repository
    Stored(Uuid),
}

impl Tally<'_> {
    fn batch_id(&self) -> Uuid {
        match self {
            Self::Handle(batch) => batch.id(),
            Self::Stored(batch_id) => *batch_id,
        }
    }
}

pub struct UserMigrationService {
    store: Arc<dyn UserStore>,
    events: Arc<dyn EventSink>,
    batches: Arc<dyn BatchRepository>,
    settings: MigrationSettings,
}

impl std::fmt::Debug for UserMigrationService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UserMigrationService")
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

impl UserMigrationService {
    pub fn new(
        store: Arc<dyn UserStore>,
        events: Arc<dyn EventSink>,
        batches: Arc<dyn BatchRepository>,
    ) -> Self {
        Self {
            store,
            events,
            batches,
            settings: MigrationSettings::default(),
        }
    }

    pub fn with_settings(mut self, settings: MigrationSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn settings(&self) -> &MigrationSettings {
        &self.settings
    }

    /// Create and persist a pending batch
    pub async fn start_batch(
        &self,
        attributes: Option<NewProgressBatch>,
    ) -> UserMigrationResult<BatchHandle> {
        let batch = ProgressBatch::create(attributes);
        self.batches.insert(&batch).await?;

        log_batch!(info, "created", batch_id: batch.id(),
            accomplished: batch.accomplished(),
            incidences: batch.incidences()
        );

        Ok(BatchHandle::new(batch))
    }

    /// Load a persisted batch into a fresh handle
    pub async fn load_batch(&self, batch_id: Uuid) -> UserMigrationResult<BatchHandle> {
        self.batches
            .find(batch_id)
            .await?
            .map(BatchHandle::new)
            .ok_or(UserMigrationError::BatchNotFound(batch_id))
    }

    /// Write the current batch record through the repository
    pub async fn persist_batch(&self, batch: &BatchHandle) -> UserMigrationResult<()> {
        self.batches.save(&batch.snapshot()).await?;
        Ok(())
    }

    /// Migrate one source user, counting the outcome on `batch`
    ///
    /// Never transitions the batch.
    pub async fn migrate_user<U: SourceUser>(
        &self,
        source_user: &U,
        batch: &BatchHandle,
    ) -> UserMigrationResult<MigratedUser> {
        self.migrate_one(source_user, Tally::Handle(batch)).await
    }

    /// Migrate one source user against a persisted batch
    ///
    /// The outcome is counted with an in-place repository increment, so
    /// overlapping calls on the same batch never overwrite each other. A batch
    /// that is no longer `pending` is rejected before anything is written.
    pub async fn migrate_user_by_batch_id<U: SourceUser>(
        &self,
        source_user: &U,
        batch_id: Uuid,
    ) -> UserMigrationResult<MigratedUser> {
        let state = self.load_batch(batch_id).await?.state();
        if !state.accepts_progress() {
            log_migration!(warn, "batch_closed", batch_id: batch_id, source_user_id: source_user.id(),
                state: state.as_str()
            );
            return Err(UserMigrationError::BatchClosed { batch_id, state });
        }

        self.migrate_one(source_user, Tally::Stored(batch_id)).await
    }

    /// Migrate a whole collection and finish the batch
    ///
    /// Incidences are collected into the report. The batch is finished exactly
    /// once, after every item is accounted for. A batch stopped mid-run is left
    /// `stopped` and the report lists the ids that never started.
    pub async fn migrate_users<U: SourceUser>(
        &self,
        source_users: &[U],
        batch: &BatchHandle,
    ) -> UserMigrationResult<MigrationReport> {
        let max_concurrency = self.settings.max_concurrency.max(1);
        let honor_stop = self.settings.honor_stop_requests;

        // a stopped batch is only acceptable when the loop will notice it
        let state = batch.state();
        if state.is_terminal() || (!honor_stop && !state.accepts_progress()) {
            return Err(illegal_transition(state, BatchEvent::Finish).into());
        }

        log_batch!(info, "migration_started", batch_id: batch.id(),
            items: source_users.len(),
            max_concurrency: max_concurrency
        );

        let mut outcomes = Vec::with_capacity(source_users.len());
        let mut unprocessed = Vec::new();

        // buffer_unordered(1) starts each item only after the previous one settled
        let mut results = stream::iter(source_users.iter().map(|source_user| async move {
            if honor_stop && batch.stopped() {
                return (source_user.id(), None);
            }
            (
                source_user.id(),
                Some(self.migrate_user(source_user, batch).await),
            )
        }))
        .buffer_unordered(max_concurrency);

        while let Some((source_user_id, result)) = results.next().await {
            match result {
                None => unprocessed.push(source_user_id),
                Some(Ok(user)) => outcomes.push(MigrationOutcome::Migrated {
                    source_user_id,
                    user,
                }),
                Some(Err(UserMigrationError::Migration(reason))) => {
                    outcomes.push(MigrationOutcome::Incidence {
                        source_user_id,
                        reason,
                    })
                }
                Some(Err(err)) => {
                    log_batch!(error, "migration_aborted", batch_id: batch.id(),
                        source_user_id: source_user_id,
                        error: err.to_string(),
                        accomplished: batch.accomplished(),
                        incidences: batch.incidences()
                    );
                    return Err(err);
                }
            }
        }
        drop(results);

        // a batch stopped and resumed mid-run still has skipped items
        if honor_stop && (batch.stopped() || !unprocessed.is_empty()) {
            unprocessed.sort_unstable();
            log_batch!(warn, "migration_interrupted", batch_id: batch.id(),
                unprocessed: unprocessed.len(),
                accomplished: batch.accomplished(),
                incidences: batch.incidences()
            );
            self.persist_batch(batch).await?;
            return Ok(self.report(batch, outcomes, unprocessed, true));
        }

        batch.finish()?;
        self.persist_batch(batch).await?;

        let finished = batch.snapshot();
        self.announce(
            MigrationBatchFinished {
                batch_id: finished.id(),
                accomplished: finished.accomplished(),
                incidences: finished.incidences(),
            }
            .into(),
        )
        .await;

        log_batch!(info, "migration_finished", batch_id: finished.id(),
            accomplished: finished.accomplished(),
            incidences: finished.incidences()
        );

        Ok(self.report(batch, outcomes, unprocessed, false))
    }

    /// Resolve a selection through `provider` and migrate it
    pub async fn migrate_selection<P: SourceUserProvider>(
        &self,
        provider: &P,
        selection: &SourceSelection,
        batch: &BatchHandle,
    ) -> UserMigrationResult<MigrationReport> {
        let source_users = provider
            .select(selection)
            .await
            .map_err(UserMigrationError::SourceProvider)?;

        self.migrate_users(&source_users, batch).await
    }

    async fn migrate_one<U: SourceUser>(
        &self,
        source_user: &U,
        tally: Tally<'_>,
    ) -> UserMigrationResult<MigratedUser> {
        let source_user_id = source_user.id();
        let batch_id = tally.batch_id();
        let email = source_user.email_from_user();

        if email.trim().is_empty() {
            return self
                .record_incidence(tally, MigrationError::MissingEmail { source_user_id })
                .await;
        }

        let snapshot = source_user.snapshot()?;
        let new_user = NewUser {
            name: source_user.username().to_string(),
            email,
            password: generate_placeholder_password(self.settings.placeholder_password_length),
        };

        let user = match self.store.create(new_user).await {
            Ok(user) => user,
            Err(err) if err.is_integrity_violation() => {
                let reason = MigrationError::IntegrityViolation {
                    source_user_id,
                    message: err.to_string(),
                };
                return self.record_incidence(tally, reason).await;
            }
            Err(err) => {
                log_migration!(error, "store_failure", batch_id: batch_id, source_user_id: source_user_id,
                    error: err.to_string()
                );
                return Err(UserMigrationError::Store(err));
            }
        };

        let accomplished = self.count(tally, BatchCounter::Accomplished).await?;

        self.announce(
            UserHasBeenMigrated {
                source_user_id,
                source_user: snapshot,
                new_user: user.clone(),
                batch_id,
            }
            .into(),
        )
        .await;

        log_migration!(debug, "migrated", batch_id: batch_id, source_user_id: source_user_id,
            new_user_id: user.id,
            accomplished: accomplished
        );

        Ok(user)
    }

    async fn record_incidence<T>(
        &self,
        tally: Tally<'_>,
        reason: MigrationError,
    ) -> UserMigrationResult<T> {
        let incidences = self.count(tally, BatchCounter::Incidences).await?;

        log_migration!(warn, "incidence", batch_id: tally.batch_id(), source_user_id: reason.source_user_id(),
            reason: reason.reason(),
            detail: reason.to_string(),
            incidences: incidences
        );

        Err(reason.into())
    }

    /// Add one to `counter` and return its new value
    async fn count(&self, tally: Tally<'_>, counter: BatchCounter) -> UserMigrationResult<u64> {
        match tally {
            Tally::Handle(batch) => {
                let value = match counter {
                    BatchCounter::Accomplished => batch.record_accomplished(),
                    BatchCounter::Incidences => batch.record_incidence(),
                };
                if self.settings.persist_progress {
                    self.persist_batch(batch).await?;
                }
                Ok(value)
            }
            Tally::Stored(batch_id) => {
                let stored = self.batches.increment(batch_id, counter).await?;
                Ok(counter.value(&stored))
            }
        }
    }

    /// Emit without failing the caller; the item is already counted
    async fn announce(&self, event: MigrationEvent) {
        let event_name = event.event_name();
        let batch_id = event.batch_id();

        if let Err(err) = self.events.emit(event).await {
            log_batch!(warn, "event_emission_failed", batch_id: batch_id,
                event_name: event_name,
                error: err.to_string()
            );
        }
    }

    fn report(
        &self,
        batch: &BatchHandle,
        outcomes: Vec<MigrationOutcome>,
        unprocessed_source_ids: Vec<i64>,
        interrupted: bool,
    ) -> MigrationReport {
        let snapshot = batch.snapshot();
        MigrationReport {
            batch_id: snapshot.id(),
            state: snapshot.state(),
            accomplished: snapshot.accomplished(),
            incidences: snapshot.incidences(),
            outcomes,
            unprocessed_source_ids,
            interrupted,
        }
    }
}

/// Random alphanumeric password for migrated accounts; users reset it on first login
pub fn generate_placeholder_password(length: usize) -> String {
    let mut password = String::with_capacity(length + 32);
    while password.len() < length {
        password.push_str(&Uuid::new_v4().simple().to_string());
    }
    password.truncate(length);
    password
}

//! User migration service behavior over in-memory collaborators

mod common;

use common::*;
use std::sync::Arc;
use user_migration_core::events::MigrationEvent;
use user_migration_core::models::{LegacyUser, SourceUser};
use user_migration_core::repositories::{
    BatchRepository, InMemorySourceUserProvider, SourceSelection, StoreError, UserStore,
};
use user_migration_core::services::{MigrationError, MigrationOutcome, UserMigrationError};
use user_migration_core::state_machine::{BatchHandle, BatchState, StateMachineError};

#[tokio::test]
async fn migrating_a_valid_user_creates_one_record_and_one_event() {
    let harness = harness();
    let mut events = harness.publisher.subscribe();
    let batch = BatchHandle::create(None);
    let source = LegacyUser::new(10, "ada", Some("ada@example.com"));

    let user = harness
        .service
        .migrate_user(&source, &batch)
        .await
        .unwrap();

    assert_eq!(user.name, "ada");
    assert_eq!(user.email, source.email_from_user());
    assert_eq!(harness.store.count().await.unwrap(), 1);
    assert_eq!(batch.accomplished(), 1);
    assert_eq!(batch.incidences(), 0);

    let published = events.try_recv().unwrap();
    match published.event {
        MigrationEvent::UserHasBeenMigrated(event) => {
            assert_eq!(event.source_user_id, 10);
            assert_eq!(event.new_user, user);
            assert_eq!(event.batch_id, batch.id());
            assert_eq!(event.source_user["username"], "ada");
        }
        other => panic!("unexpected event {other:?}"),
    }
    assert!(events.try_recv().is_err());
}

#[tokio::test]
async fn missing_email_is_an_incidence_without_a_record() {
    let harness = harness();
    let mut events = harness.publisher.subscribe();
    let batch = BatchHandle::create(None);

    let err = harness
        .service
        .migrate_user(&legacy_user_without_email(3), &batch)
        .await
        .unwrap_err();

    assert_eq!(err.to_string(), "Source User doesn't have email");
    assert!(matches!(
        err.as_migration_error(),
        Some(MigrationError::MissingEmail { source_user_id: 3 })
    ));
    assert_eq!(harness.store.count().await.unwrap(), 0);
    assert_eq!(batch.incidences(), 1);
    assert_eq!(batch.accomplished(), 0);
    assert!(events.try_recv().is_err());
}

#[tokio::test]
async fn whitespace_email_counts_as_missing() {
    let harness = harness();
    let batch = BatchHandle::create(None);
    let source = LegacyUser::new(4, "blank", Some("   "));

    let err = harness
        .service
        .migrate_user(&source, &batch)
        .await
        .unwrap_err();

    assert!(err.is_incidence());
    assert_eq!(batch.incidences(), 1);
}

#[tokio::test]
async fn duplicate_email_is_an_integrity_incidence() {
    let harness = TestHarnessBuilder::new()
        .with_existing_emails(&["user1@example.com"])
        .build();
    let batch = BatchHandle::create(None);

    let err = harness
        .service
        .migrate_user(&legacy_user(1), &batch)
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        UserMigrationError::Migration(MigrationError::IntegrityViolation {
            source_user_id: 1,
            ..
        })
    ));
    assert!(err.to_string().contains("Integrity constraint violation"));
    assert_eq!(harness.store.count().await.unwrap(), 1);
    assert_eq!(batch.incidences(), 1);
}

#[tokio::test]
async fn migrate_users_finishes_with_n_minus_k_accounting() {
    let harness = TestHarnessBuilder::new()
        .with_existing_emails(&["user2@example.com", "USER5@example.com"])
        .build();
    let batch = harness.service.start_batch(None).await.unwrap();

    let mut sources = legacy_users(1..=6);
    sources.push(legacy_user_without_email(7));

    let report = harness
        .service
        .migrate_users(&sources, &batch)
        .await
        .unwrap();

    assert_eq!(report.state, BatchState::Finished);
    assert_eq!(report.accomplished, 4);
    assert_eq!(report.incidences, 3);
    assert!(!report.interrupted);
    assert!(report.response().done);
    assert_eq!(harness.store.count().await.unwrap(), 2 + 4);

    // sequential runs report in source order
    let ids: Vec<i64> = report.outcomes.iter().map(|o| o.source_user_id()).collect();
    assert_eq!(ids, (1..=7).collect::<Vec<_>>());

    let stored = harness.batches.find_required(batch.id()).await.unwrap();
    assert!(stored.finished());
    assert_eq!((stored.accomplished(), stored.incidences()), (4, 3));
}

#[tokio::test]
async fn migrate_users_reports_done_even_when_every_item_fails() {
    let harness = harness();
    let batch = BatchHandle::create(None);
    let sources: Vec<_> = (1..=3).map(legacy_user_without_email).collect();

    let report = harness
        .service
        .migrate_users(&sources, &batch)
        .await
        .unwrap();

    assert!(report.response().done);
    assert_eq!(report.state, BatchState::Finished);
    assert_eq!(report.incidences().count(), 3);
    assert_eq!(report.migrated().count(), 0);
}

#[tokio::test]
async fn empty_collection_finishes_immediately() {
    let harness = harness();
    let mut events = harness.publisher.subscribe();
    let batch = BatchHandle::create(None);

    let report = harness
        .service
        .migrate_users::<LegacyUser>(&[], &batch)
        .await
        .unwrap();

    assert!(batch.finished());
    assert_eq!((report.accomplished, report.incidences), (0, 0));

    let published = events.try_recv().unwrap();
    assert!(matches!(published.event, MigrationEvent::BatchFinished(_)));
}

#[tokio::test]
async fn batch_finished_event_carries_final_counts() {
    let sink = Arc::new(RecordingSink::new());
    let harness = TestHarnessBuilder::new().with_sink(sink.clone()).build();
    let batch = BatchHandle::create(None);

    let mut sources = legacy_users(1..=3);
    sources.push(legacy_user_without_email(4));
    harness
        .service
        .migrate_users(&sources, &batch)
        .await
        .unwrap();

    let events = sink.events();
    assert_eq!(sink.migrated_count(), 3);
    match events.last() {
        Some(MigrationEvent::BatchFinished(finished)) => {
            assert_eq!(finished.batch_id, batch.id());
            assert_eq!(finished.accomplished, 3);
            assert_eq!(finished.incidences, 1);
        }
        other => panic!("expected batch finished event, got {other:?}"),
    }
}

#[tokio::test]
async fn finished_batch_cannot_be_reused() {
    let harness = harness();
    let batch = BatchHandle::create(None);
    harness
        .service
        .migrate_users(&legacy_users(1..=2), &batch)
        .await
        .unwrap();

    let err = harness
        .service
        .migrate_users(&legacy_users(3..=4), &batch)
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        UserMigrationError::StateMachine(StateMachineError::IllegalStateTransition { .. })
    ));
    assert_eq!(harness.store.count().await.unwrap(), 2);
    assert_eq!(batch.accomplished(), 2);
}

#[tokio::test]
async fn concurrent_run_matches_sequential_counts() {
    let existing = ["user3@example.com", "user17@example.com", "user40@example.com"];
    let mut sources = legacy_users(1..=45);
    sources.extend((46..=50).map(legacy_user_without_email));

    let sequential = TestHarnessBuilder::new()
        .with_existing_emails(&existing)
        .build();
    let concurrent = TestHarnessBuilder::new()
        .with_existing_emails(&existing)
        .with_concurrency(8)
        .build();

    let seq_batch = BatchHandle::create(None);
    let con_batch = BatchHandle::create(None);
    let seq_report = sequential
        .service
        .migrate_users(&sources, &seq_batch)
        .await
        .unwrap();
    let con_report = concurrent
        .service
        .migrate_users(&sources, &con_batch)
        .await
        .unwrap();

    assert_eq!(seq_report.accomplished, 42);
    assert_eq!(seq_report.incidences, 8);
    assert_eq!(con_report.accomplished, seq_report.accomplished);
    assert_eq!(con_report.incidences, seq_report.incidences);
    assert_eq!(con_report.outcomes.len(), 50);
    assert!(con_batch.finished());
    assert_eq!(concurrent.store.count().await.unwrap(), 45);
}

#[tokio::test]
async fn stop_mid_run_leaves_batch_stopped_and_lists_unprocessed() {
    let batch = BatchHandle::create(None);
    let sink = Arc::new(RecordingSink::stopping_after(2, batch.clone()));
    let harness = TestHarnessBuilder::new().with_sink(sink.clone()).build();
    let sources = legacy_users(1..=5);

    let report = harness
        .service
        .migrate_users(&sources, &batch)
        .await
        .unwrap();

    assert!(report.interrupted);
    assert!(!report.response().done);
    assert_eq!(report.state, BatchState::Stopped);
    assert_eq!(report.unprocessed_source_ids, vec![3, 4, 5]);
    assert_eq!(batch.accomplished(), 2);
    assert!(batch.stopped());
    assert!(sink
        .events()
        .iter()
        .all(|event| !matches!(event, MigrationEvent::BatchFinished(_))));

    // resuming and migrating the rest completes the batch
    batch.resume().unwrap();
    let remaining: Vec<_> = sources
        .iter()
        .filter(|user| report.unprocessed_source_ids.contains(&user.id))
        .cloned()
        .collect();
    let report = harness
        .service
        .migrate_users(&remaining, &batch)
        .await
        .unwrap();

    assert!(report.response().done);
    assert!(batch.finished());
    assert_eq!(batch.accomplished(), 5);
    assert_eq!(harness.store.count().await.unwrap(), 5);
}

#[tokio::test]
async fn stopped_batch_migrates_nothing_when_stop_is_honored() {
    let harness = harness();
    let batch = BatchHandle::create(None);
    batch.stop().unwrap();

    let report = harness
        .service
        .migrate_users(&legacy_users(1..=3), &batch)
        .await
        .unwrap();

    assert!(report.interrupted);
    assert_eq!(report.unprocessed_source_ids, vec![1, 2, 3]);
    assert_eq!(harness.store.count().await.unwrap(), 0);
    assert!(batch.stopped());
}

#[tokio::test]
async fn stopped_batch_is_rejected_up_front_when_stop_is_ignored() {
    let harness = TestHarnessBuilder::new()
        .honoring_stop_requests(false)
        .build();
    let batch = BatchHandle::create(None);
    batch.stop().unwrap();

    let err = harness
        .service
        .migrate_users(&legacy_users(1..=2), &batch)
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        UserMigrationError::StateMachine(StateMachineError::IllegalStateTransition {
            from: BatchState::Stopped,
            ..
        })
    ));
    assert_eq!(harness.store.count().await.unwrap(), 0);
    assert_eq!(batch.accomplished(), 0);
    assert!(batch.stopped());
}

#[tokio::test]
async fn store_outage_aborts_and_leaves_batch_pending() {
    let harness = harness();
    harness.store.set_available(false);
    let batch = BatchHandle::create(None);

    let sources = vec![legacy_user_without_email(1), legacy_user(2), legacy_user(3)];
    let err = harness
        .service
        .migrate_users(&sources, &batch)
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        UserMigrationError::Store(StoreError::Unavailable(_))
    ));
    assert!(!err.is_incidence());
    assert!(batch.pending());
    assert_eq!(batch.incidences(), 1);
    assert_eq!(batch.accomplished(), 0);
}

#[tokio::test]
async fn event_sink_failure_does_not_abort_the_run() {
    let harness = TestHarnessBuilder::new()
        .with_sink(Arc::new(FailingSink))
        .build();
    let batch = harness.service.start_batch(None).await.unwrap();

    let mut sources = legacy_users(1..=2);
    sources.push(legacy_user_without_email(3));
    let report = harness
        .service
        .migrate_users(&sources, &batch)
        .await
        .unwrap();

    assert!(report.response().done);
    assert_eq!((report.accomplished, report.incidences), (2, 1));
    assert_eq!(harness.store.count().await.unwrap(), 2);

    let stored = harness.batches.find_required(batch.id()).await.unwrap();
    assert!(stored.finished());
    assert_eq!((stored.accomplished(), stored.incidences()), (2, 1));
}

#[tokio::test]
async fn by_batch_id_loads_and_persists_progress() {
    let harness = harness();
    let batch = harness.service.start_batch(None).await.unwrap();

    harness
        .service
        .migrate_user_by_batch_id(&legacy_user(1), batch.id())
        .await
        .unwrap();
    let err = harness
        .service
        .migrate_user_by_batch_id(&legacy_user_without_email(2), batch.id())
        .await
        .unwrap_err();
    assert!(err.is_incidence());

    let stored = harness.batches.find_required(batch.id()).await.unwrap();
    assert_eq!(stored.accomplished(), 1);
    assert_eq!(stored.incidences(), 1);
    assert!(stored.pending());
}

#[tokio::test]
async fn by_batch_id_counts_in_place_when_progress_is_not_streamed() {
    let harness = TestHarnessBuilder::new().persisting_progress(false).build();
    let batch = harness.service.start_batch(None).await.unwrap();

    harness
        .service
        .migrate_user_by_batch_id(&legacy_user(1), batch.id())
        .await
        .unwrap();

    let stored = harness.batches.find_required(batch.id()).await.unwrap();
    assert_eq!(stored.accomplished(), 1);
}

#[tokio::test]
async fn overlapping_by_batch_id_calls_keep_every_count() {
    let harness = harness();
    let batch = harness.service.start_batch(None).await.unwrap();

    let valid = legacy_user(1);
    let missing = legacy_user_without_email(2);
    let (migrated, incidence) = tokio::join!(
        harness.service.migrate_user_by_batch_id(&valid, batch.id()),
        harness.service.migrate_user_by_batch_id(&missing, batch.id()),
    );
    assert!(migrated.is_ok());
    assert!(incidence.unwrap_err().is_incidence());

    harness
        .service
        .migrate_user_by_batch_id(&legacy_user(3), batch.id())
        .await
        .unwrap();

    let stored = harness.batches.find_required(batch.id()).await.unwrap();
    assert_eq!((stored.accomplished(), stored.incidences()), (2, 1));
    assert_eq!(harness.store.count().await.unwrap(), 2);
}

#[tokio::test]
async fn stale_handle_snapshot_cannot_lower_stored_counts() {
    let harness = harness();
    let batch = harness.service.start_batch(None).await.unwrap();
    let stale = harness.service.load_batch(batch.id()).await.unwrap();

    for id in 1..=2 {
        harness
            .service
            .migrate_user_by_batch_id(&legacy_user(id), batch.id())
            .await
            .unwrap();
    }
    harness.service.persist_batch(&stale).await.unwrap();

    let stored = harness.batches.find_required(batch.id()).await.unwrap();
    assert_eq!(stored.accomplished(), 2);
}

#[tokio::test]
async fn by_batch_id_rejects_a_finished_batch_before_inserting() {
    let harness = harness();
    let batch = harness.service.start_batch(None).await.unwrap();
    harness
        .service
        .migrate_users(&legacy_users(1..=2), &batch)
        .await
        .unwrap();

    let err = harness
        .service
        .migrate_user_by_batch_id(&legacy_user(3), batch.id())
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        UserMigrationError::BatchClosed { batch_id, state: BatchState::Finished } if batch_id == batch.id()
    ));
    assert!(!err.is_incidence());
    assert_eq!(harness.store.count().await.unwrap(), 2);

    let stored = harness.batches.find_required(batch.id()).await.unwrap();
    assert_eq!((stored.accomplished(), stored.incidences()), (2, 0));
}

#[tokio::test]
async fn by_batch_id_rejects_a_stopped_batch() {
    let harness = harness();
    let batch = harness.service.start_batch(None).await.unwrap();
    batch.stop().unwrap();
    harness.service.persist_batch(&batch).await.unwrap();

    let err = harness
        .service
        .migrate_user_by_batch_id(&legacy_user_without_email(1), batch.id())
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        UserMigrationError::BatchClosed {
            state: BatchState::Stopped,
            ..
        }
    ));
    let stored = harness.batches.find_required(batch.id()).await.unwrap();
    assert_eq!(stored.incidences(), 0);
}

#[tokio::test]
async fn by_batch_id_rejects_unknown_batches() {
    let harness = harness();
    let batch_id = uuid::Uuid::new_v4();

    let err = harness
        .service
        .migrate_user_by_batch_id(&legacy_user(1), batch_id)
        .await
        .unwrap_err();

    assert!(matches!(err, UserMigrationError::BatchNotFound(id) if id == batch_id));
    assert_eq!(harness.store.count().await.unwrap(), 0);
}

#[tokio::test]
async fn selection_by_ids_skips_unknown_ids() {
    let harness = harness();
    let provider = InMemorySourceUserProvider::new(legacy_users([5, 1, 3]));
    let batch = BatchHandle::create(None);

    let report = harness
        .service
        .migrate_selection(&provider, &SourceSelection::Ids(vec![3, 1, 99]), &batch)
        .await
        .unwrap();

    let migrated: Vec<i64> = report
        .outcomes
        .iter()
        .filter(|outcome| matches!(outcome, MigrationOutcome::Migrated { .. }))
        .map(MigrationOutcome::source_user_id)
        .collect();
    assert_eq!(migrated, vec![1, 3]);
    assert!(batch.finished());
}

#[tokio::test]
async fn migrated_users_receive_placeholder_passwords() {
    let harness = harness();
    let batch = BatchHandle::create(None);

    let report = harness
        .service
        .migrate_users(&legacy_users(1..=2), &batch)
        .await
        .unwrap();

    let emails: Vec<&str> = report.migrated().map(|user| user.email.as_str()).collect();
    assert_eq!(emails, vec!["user1@example.com", "user2@example.com"]);
    assert_eq!(
        harness.service.settings().placeholder_password_length,
        40
    );
}

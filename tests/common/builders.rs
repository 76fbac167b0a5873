//! Builders for legacy users and fully wired in-memory services

#![allow(dead_code)]

use std::sync::Arc;
use user_migration_core::config::MigrationSettings;
use user_migration_core::events::{EventPublisher, EventSink};
use user_migration_core::models::LegacyUser;
use user_migration_core::repositories::{InMemoryBatchRepository, InMemoryUserStore};
use user_migration_core::services::UserMigrationService;

/// Legacy user with a deterministic email derived from its id
pub fn legacy_user(id: i64) -> LegacyUser {
    LegacyUser::new(id, format!("user{id}"), Some(&format!("user{id}@example.com")))
}

pub fn legacy_user_without_email(id: i64) -> LegacyUser {
    LegacyUser::new(id, format!("user{id}"), None)
}

pub fn legacy_users(ids: impl IntoIterator<Item = i64>) -> Vec<LegacyUser> {
    ids.into_iter().map(legacy_user).collect()
}

/// Service plus handles on its in-memory collaborators
pub struct TestHarness {
    pub service: UserMigrationService,
    pub store: Arc<InMemoryUserStore>,
    pub publisher: Arc<EventPublisher>,
    pub batches: Arc<InMemoryBatchRepository>,
}

pub struct TestHarnessBuilder {
    store: InMemoryUserStore,
    settings: MigrationSettings,
    sink: Option<Arc<dyn EventSink>>,
}

impl TestHarnessBuilder {
    pub fn new() -> Self {
        Self {
            store: InMemoryUserStore::new(),
            settings: MigrationSettings::default(),
            sink: None,
        }
    }

    pub fn with_existing_emails(mut self, emails: &[&str]) -> Self {
        self.store = InMemoryUserStore::with_existing_emails(emails.iter().copied());
        self
    }

    pub fn with_concurrency(mut self, max_concurrency: usize) -> Self {
        self.settings.max_concurrency = max_concurrency;
        self
    }

    pub fn honoring_stop_requests(mut self, honor: bool) -> Self {
        self.settings.honor_stop_requests = honor;
        self
    }

    pub fn persisting_progress(mut self, persist: bool) -> Self {
        self.settings.persist_progress = persist;
        self
    }

    /// Replace the broadcast publisher as the service's sink
    pub fn with_sink(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    pub fn build(self) -> TestHarness {
        let store = Arc::new(self.store);
        let publisher = Arc::new(EventPublisher::new(1024));
        let batches = Arc::new(InMemoryBatchRepository::new());
        let sink = self
            .sink
            .unwrap_or_else(|| publisher.clone() as Arc<dyn EventSink>);

        let service = UserMigrationService::new(store.clone(), sink, batches.clone())
            .with_settings(self.settings);

        TestHarness {
            service,
            store,
            publisher,
            batches,
        }
    }
}

impl Default for TestHarnessBuilder {
    fn default() -> Self {
        Self::new()
    }
}

pub fn harness() -> TestHarness {
    TestHarnessBuilder::new().build()
}

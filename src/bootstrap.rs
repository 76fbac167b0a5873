//! # Migration System Bootstrap
//!
//! Wires configuration, database pools, repositories, the event publisher
//! and the migration service into one handle.
//!
//! ```rust,no_run
//! use user_migration_core::bootstrap::MigrationSystem;
//! use user_migration_core::config::ConfigManager;
//! use user_migration_core::repositories::SourceSelection;
//!
//! # async fn example() -> user_migration_core::error::Result<()> {
//! let manager = ConfigManager::load()?;
//! let system = MigrationSystem::connect(manager.config()).await?;
//!
//! let batch = system.start_batch().await?;
//! let report = system
//!     .service()
//!     .migrate_selection(system.source(), &SourceSelection::All, &batch)
//!     .await?;
//! println!("done: {}", report.response().done);
//! # Ok(())
//! # }
//! ```

use crate::config::MigrationConfig;
use crate::database::DatabaseConnection;
use crate::error::Result;
use crate::events::EventPublisher;
use crate::repositories::{
    InMemoryBatchRepository, InMemorySourceUserProvider, InMemoryUserStore, PgBatchRepository,
    PgSourceUserProvider, PgUserStore,
};
use crate::services::UserMigrationService;
use crate::state_machine::BatchHandle;
use sqlx::PgPool;
use std::sync::Arc;
use tracing::info;

/// Everything needed to run migrations against one configuration
#[derive(Debug)]
pub struct MigrationSystem<P> {
    config: MigrationConfig,
    service: UserMigrationService,
    publisher: Arc<EventPublisher>,
    source: P,
    pool: Option<PgPool>,
}

impl MigrationSystem<PgSourceUserProvider> {
    /// Connect to the destination and source databases
    pub async fn connect(config: &MigrationConfig) -> Result<Self> {
        config.validate()?;

        let destination =
            DatabaseConnection::connect(&config.database.url, &config.database).await?;
        destination.health_check().await?;
        let destination = destination.into_pool();

        // reuse the destination pool when the legacy table lives in the same database
        let source_pool = match config.source.url.as_deref() {
            Some(url) if url != config.database.url => {
                DatabaseConnection::connect(url, &config.database)
                    .await?
                    .into_pool()
            }
            _ => destination.clone(),
        };

        let source = PgSourceUserProvider::new(source_pool, config.source.users_table.clone())?;
        let publisher = Arc::new(EventPublisher::new(config.events.channel_capacity));
        let service = UserMigrationService::new(
            Arc::new(PgUserStore::new(destination.clone())),
            publisher.clone(),
            Arc::new(PgBatchRepository::new(destination.clone())),
        )
        .with_settings(config.migration.clone());

        info!(
            users_table = %config.source.users_table,
            max_concurrency = config.migration.max_concurrency,
            "Migration system connected"
        );

        Ok(Self {
            config: config.clone(),
            service,
            publisher,
            source,
            pool: Some(destination),
        })
    }
}

impl MigrationSystem<InMemorySourceUserProvider> {
    /// Fully in-memory system over a fixed source
    pub fn in_memory(config: MigrationConfig, source: InMemorySourceUserProvider) -> Self {
        let publisher = Arc::new(EventPublisher::new(config.events.channel_capacity));
        let service = UserMigrationService::new(
            Arc::new(InMemoryUserStore::new()),
            publisher.clone(),
            Arc::new(InMemoryBatchRepository::new()),
        )
        .with_settings(config.migration.clone());

        Self {
            config,
            service,
            publisher,
            source,
            pool: None,
        }
    }
}

impl<P> MigrationSystem<P> {
    /// Create and persist a fresh pending batch
    pub async fn start_batch(&self) -> Result<BatchHandle> {
        Ok(self.service.start_batch(None).await?)
    }

    pub fn config(&self) -> &MigrationConfig {
        &self.config
    }

    pub fn service(&self) -> &UserMigrationService {
        &self.service
    }

    pub fn publisher(&self) -> &Arc<EventPublisher> {
        &self.publisher
    }

    pub fn source(&self) -> &P {
        &self.source
    }

    /// Destination pool; `None` for in-memory systems
    pub fn pool(&self) -> Option<&PgPool> {
        self.pool.as_ref()
    }
}

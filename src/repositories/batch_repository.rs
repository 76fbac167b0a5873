use super::errors::{PersistenceError, PersistenceResult};
use crate::constants::tables;
use crate::models::ProgressBatch;
use crate::state_machine::{BatchState, StateMachineError};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use sqlx::PgPool;
use uuid::Uuid;

/// Which progress counter an item lands in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchCounter {
    Accomplished,
    Incidences,
}

impl BatchCounter {
    fn column(self) -> &'static str {
        match self {
            Self::Accomplished => "accomplished",
            Self::Incidences => "incidences",
        }
    }

    /// Current value of this counter on `batch`
    pub fn value(self, batch: &ProgressBatch) -> u64 {
        match self {
            Self::Accomplished => batch.accomplished(),
            Self::Incidences => batch.incidences(),
        }
    }
}

/// Durable storage for progress batches
#[async_trait]
pub trait BatchRepository: Send + Sync {
    async fn insert(&self, batch: &ProgressBatch) -> PersistenceResult<()>;

    async fn find(&self, batch_id: Uuid) -> PersistenceResult<Option<ProgressBatch>>;

    /// Upsert state and counters; stored counters are never lowered
    async fn save(&self, batch: &ProgressBatch) -> PersistenceResult<()>;

    /// Add one to a stored counter in place and return the updated batch
    async fn increment(
        &self,
        batch_id: Uuid,
        counter: BatchCounter,
    ) -> PersistenceResult<ProgressBatch>;

    async fn find_required(&self, batch_id: Uuid) -> PersistenceResult<ProgressBatch> {
        self.find(batch_id)
            .await?
            .ok_or(PersistenceError::NotFound { batch_id })
    }
}

#[derive(Debug, Default)]
pub struct InMemoryBatchRepository {
    batches: DashMap<Uuid, ProgressBatch>,
}

impl InMemoryBatchRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.batches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.batches.is_empty()
    }
}

#[async_trait]
impl BatchRepository for InMemoryBatchRepository {
    async fn insert(&self, batch: &ProgressBatch) -> PersistenceResult<()> {
        match self.batches.entry(batch.id()) {
            dashmap::mapref::entry::Entry::Occupied(_) => Err(PersistenceError::AlreadyExists {
                batch_id: batch.id(),
            }),
            dashmap::mapref::entry::Entry::Vacant(slot) => {
                slot.insert(batch.clone());
                Ok(())
            }
        }
    }

    async fn find(&self, batch_id: Uuid) -> PersistenceResult<Option<ProgressBatch>> {
        Ok(self.batches.get(&batch_id).map(|entry| entry.value().clone()))
    }

    async fn save(&self, batch: &ProgressBatch) -> PersistenceResult<()> {
        self.batches
            .entry(batch.id())
            .and_modify(|stored| {
                *stored = ProgressBatch::restore(
                    batch.id(),
                    batch.state(),
                    batch.accomplished().max(stored.accomplished()),
                    batch.incidences().max(stored.incidences()),
                    stored.created_at(),
                    batch.updated_at(),
                );
            })
            .or_insert_with(|| batch.clone());
        Ok(())
    }

    async fn increment(
        &self,
        batch_id: Uuid,
        counter: BatchCounter,
    ) -> PersistenceResult<ProgressBatch> {
        let mut stored = self
            .batches
            .get_mut(&batch_id)
            .ok_or(PersistenceError::NotFound { batch_id })?;

        match counter {
            BatchCounter::Accomplished => stored.record_accomplished(),
            BatchCounter::Incidences => stored.record_incidence(),
        };
        Ok(stored.clone())
    }
}

/// Row shape of `progress_batches`
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ProgressBatchRow {
    pub id: Uuid,
    pub state: String,
    pub accomplished: i64,
    pub incidences: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<ProgressBatchRow> for ProgressBatch {
    type Error = PersistenceError;

    fn try_from(row: ProgressBatchRow) -> Result<Self, Self::Error> {
        let state: BatchState = row
            .state
            .parse()
            .map_err(|err: StateMachineError| PersistenceError::InvalidData {
                field: "state".to_string(),
                reason: err.to_string(),
            })?;

        Ok(ProgressBatch::restore(
            row.id,
            state,
            to_counter("accomplished", row.accomplished)?,
            to_counter("incidences", row.incidences)?,
            row.created_at,
            row.updated_at,
        ))
    }
}

fn to_counter(field: &str, value: i64) -> PersistenceResult<u64> {
    u64::try_from(value).map_err(|_| PersistenceError::InvalidData {
        field: field.to_string(),
        reason: format!("negative counter {value}"),
    })
}

fn to_column(field: &str, value: u64) -> PersistenceResult<i64> {
    i64::try_from(value).map_err(|_| PersistenceError::InvalidData {
        field: field.to_string(),
        reason: format!("counter {value} exceeds BIGINT"),
    })
}

/// Postgres repository over `progress_batches(id uuid, state varchar, accomplished bigint,
/// incidences bigint, created_at timestamptz, updated_at timestamptz)`
#[derive(Debug, Clone)]
pub struct PgBatchRepository {
    pool: PgPool,
}

impl PgBatchRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl BatchRepository for PgBatchRepository {
    async fn insert(&self, batch: &ProgressBatch) -> PersistenceResult<()> {
        let sql = format!(
            "INSERT INTO {table} (id, state, accomplished, incidences, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6)",
            table = tables::PROGRESS_BATCHES
        );

        sqlx::query(&sql)
            .bind(batch.id())
            .bind(batch.state().as_str())
            .bind(to_column("accomplished", batch.accomplished())?)
            .bind(to_column("incidences", batch.incidences())?)
            .bind(batch.created_at())
            .bind(batch.updated_at())
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn find(&self, batch_id: Uuid) -> PersistenceResult<Option<ProgressBatch>> {
        let sql = format!(
            "SELECT id, state, accomplished, incidences, created_at, updated_at \
             FROM {table} WHERE id = $1",
            table = tables::PROGRESS_BATCHES
        );

        sqlx::query_as::<_, ProgressBatchRow>(&sql)
            .bind(batch_id)
            .fetch_optional(&self.pool)
            .await?
            .map(ProgressBatch::try_from)
            .transpose()
    }

    async fn save(&self, batch: &ProgressBatch) -> PersistenceResult<()> {
        // GREATEST keeps counters monotonic if an older snapshot is written late
        let sql = format!(
            "INSERT INTO {table} AS b (id, state, accomplished, incidences, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6) \
             ON CONFLICT (id) DO UPDATE SET state = EXCLUDED.state, \
             accomplished = GREATEST(b.accomplished, EXCLUDED.accomplished), \
             incidences = GREATEST(b.incidences, EXCLUDED.incidences), \
             updated_at = EXCLUDED.updated_at",
            table = tables::PROGRESS_BATCHES
        );

        sqlx::query(&sql)
            .bind(batch.id())
            .bind(batch.state().as_str())
            .bind(to_column("accomplished", batch.accomplished())?)
            .bind(to_column("incidences", batch.incidences())?)
            .bind(batch.created_at())
            .bind(batch.updated_at())
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn increment(
        &self,
        batch_id: Uuid,
        counter: BatchCounter,
    ) -> PersistenceResult<ProgressBatch> {
        let sql = format!(
            "UPDATE {table} SET {column} = {column} + 1, updated_at = NOW() WHERE id = $1 \
             RETURNING id, state, accomplished, incidences, created_at, updated_at",
            table = tables::PROGRESS_BATCHES,
            column = counter.column()
        );

        sqlx::query_as::<_, ProgressBatchRow>(&sql)
            .bind(batch_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(PersistenceError::NotFound { batch_id })
            .and_then(ProgressBatch::try_from)
    }
}

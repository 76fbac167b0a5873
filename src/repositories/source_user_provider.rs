//! # Source User Providers
//!
//! Read-only access to the legacy users table.

use super::errors::{StoreError, StoreResult};
use crate::config::is_valid_identifier;
use crate::models::{LegacyUser, SourceUser};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

/// Which legacy users a migration run covers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", content = "ids", rename_all = "snake_case")]
pub enum SourceSelection {
    /// The whole legacy table
    All,
    /// An explicit id list
    Ids(Vec<i64>),
}

#[async_trait]
pub trait SourceUserProvider: Send + Sync {
    type User: SourceUser;

    /// Every legacy user, ordered by id
    async fn all(&self) -> StoreResult<Vec<Self::User>>;

    /// Legacy users with the given ids, ordered by id; unknown ids are skipped
    async fn find_many(&self, ids: &[i64]) -> StoreResult<Vec<Self::User>>;

    async fn select(&self, selection: &SourceSelection) -> StoreResult<Vec<Self::User>> {
        match selection {
            SourceSelection::All => self.all().await,
            SourceSelection::Ids(ids) => self.find_many(ids).await,
        }
    }
}

/// Provider over a fixed list of legacy users
#[derive(Debug, Clone, Default)]
pub struct InMemorySourceUserProvider {
    users: Vec<LegacyUser>,
}

impl InMemorySourceUserProvider {
    pub fn new(mut users: Vec<LegacyUser>) -> Self {
        users.sort_by_key(|user| user.id);
        Self { users }
    }
}

#[async_trait]
impl SourceUserProvider for InMemorySourceUserProvider {
    type User = LegacyUser;

    async fn all(&self) -> StoreResult<Vec<LegacyUser>> {
        Ok(self.users.clone())
    }

    async fn find_many(&self, ids: &[i64]) -> StoreResult<Vec<LegacyUser>> {
        Ok(self
            .users
            .iter()
            .filter(|user| ids.contains(&user.id))
            .cloned()
            .collect())
    }
}

/// Postgres provider over a legacy table with `id`, `username` and `email` columns
#[derive(Debug, Clone)]
pub struct PgSourceUserProvider {
    pool: PgPool,
    table: String,
}

impl PgSourceUserProvider {
    pub fn new(pool: PgPool, table: impl Into<String>) -> StoreResult<Self> {
        let table = table.into();
        if !is_valid_identifier(&table) {
            return Err(StoreError::InvalidSource(format!(
                "'{table}' is not a valid table name"
            )));
        }
        Ok(Self { pool, table })
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    fn select_sql(&self) -> String {
        format!("SELECT id, username, email FROM {}", self.table)
    }
}

#[async_trait]
impl SourceUserProvider for PgSourceUserProvider {
    type User = LegacyUser;

    async fn all(&self) -> StoreResult<Vec<LegacyUser>> {
        let sql = format!("{} ORDER BY id", self.select_sql());
        Ok(sqlx::query_as::<_, LegacyUser>(&sql)
            .fetch_all(&self.pool)
            .await?)
    }

    async fn find_many(&self, ids: &[i64]) -> StoreResult<Vec<LegacyUser>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let sql = format!("{} WHERE id = ANY($1) ORDER BY id", self.select_sql());
        Ok(sqlx::query_as::<_, LegacyUser>(&sql)
            .bind(ids)
            .fetch_all(&self.pool)
            .await?)
    }
}

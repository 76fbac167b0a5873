//! # Destination User Store
//!
//! Where migrated users land. Email addresses are unique; a duplicate insert
//! fails with [`StoreError::UniqueViolation`].

use super::errors::{StoreError, StoreResult};
use crate::constants::{system, tables};
use crate::models::{MigratedUser, NewUser};
use async_trait::async_trait;
use chrono::Utc;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use sqlx::PgPool;
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};

#[async_trait]
pub trait UserStore: Send + Sync {
    /// Insert a new user, rejecting duplicate emails
    async fn create(&self, user: NewUser) -> StoreResult<MigratedUser>;

    async fn count(&self) -> StoreResult<u64>;
}

/// In-memory store with case-insensitive unique emails
#[derive(Debug)]
pub struct InMemoryUserStore {
    users: DashMap<String, MigratedUser>,
    next_id: AtomicI64,
    available: AtomicBool,
}

impl InMemoryUserStore {
    pub fn new() -> Self {
        Self {
            users: DashMap::new(),
            next_id: AtomicI64::new(1),
            available: AtomicBool::new(true),
        }
    }

    /// Pre-populate the store with existing destination users
    pub fn with_existing_emails<I, S>(emails: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let store = Self::new();
        for email in emails {
            let email = email.into();
            let id = store.next_id.fetch_add(1, Ordering::SeqCst);
            store.users.insert(
                Self::email_key(&email),
                MigratedUser {
                    id,
                    name: email.clone(),
                    email,
                    created_at: Utc::now(),
                },
            );
        }
        store
    }

    /// Simulate an outage: every call fails with `StoreError::Unavailable`
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    pub fn users(&self) -> Vec<MigratedUser> {
        let mut users: Vec<MigratedUser> = self.users.iter().map(|e| e.value().clone()).collect();
        users.sort_by_key(|user| user.id);
        users
    }

    fn email_key(email: &str) -> String {
        email.trim().to_lowercase()
    }

    fn ensure_available(&self) -> StoreResult<()> {
        if self.available.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(StoreError::Unavailable("in-memory store marked unavailable".to_string()))
        }
    }
}

impl Default for InMemoryUserStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    async fn create(&self, user: NewUser) -> StoreResult<MigratedUser> {
        self.ensure_available()?;

        match self.users.entry(Self::email_key(&user.email)) {
            Entry::Occupied(_) => Err(StoreError::UniqueViolation {
                constraint: system::USERS_EMAIL_UNIQUE_KEY.to_string(),
                value: user.email,
            }),
            Entry::Vacant(slot) => {
                let created = MigratedUser {
                    id: self.next_id.fetch_add(1, Ordering::SeqCst),
                    name: user.name,
                    email: user.email,
                    created_at: Utc::now(),
                };
                slot.insert(created.clone());
                Ok(created)
            }
        }
    }

    async fn count(&self) -> StoreResult<u64> {
        self.ensure_available()?;
        Ok(self.users.len() as u64)
    }
}

/// Postgres-backed store over `users(id, name, email, password, created_at, updated_at)`
///
/// `email` is expected to carry a unique index.
#[derive(Debug, Clone)]
pub struct PgUserStore {
    pool: PgPool,
}

impl PgUserStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn create(&self, user: NewUser) -> StoreResult<MigratedUser> {
        let sql = format!(
            "INSERT INTO {table} (name, email, password, created_at, updated_at) \
             VALUES ($1, $2, $3, NOW(), NOW()) \
             RETURNING id, name, email, created_at",
            table = tables::USERS
        );

        sqlx::query_as::<_, MigratedUser>(&sql)
            .bind(&user.name)
            .bind(&user.email)
            .bind(&user.password)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| StoreError::from_insert_error(e, &user.email))
    }

    async fn count(&self) -> StoreResult<u64> {
        let sql = format!("SELECT COUNT(*) FROM {table}", table = tables::USERS);
        let count: i64 = sqlx::query_scalar(&sql).fetch_one(&self.pool).await?;
        Ok(count.max(0) as u64)
    }
}

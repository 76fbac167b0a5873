//! # Migration Configuration System
//!
//! Layered configuration: built-in defaults, then `config/user-migration.toml`,
//! then `config/user-migration.{environment}.toml`, then `USER_MIGRATION__*`
//! environment variables.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use user_migration_core::config::ConfigManager;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let manager = ConfigManager::load()?;
//! let concurrency = manager.config().migration.max_concurrency;
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod loader;

use crate::constants::system;
use serde::{Deserialize, Serialize};

pub use error::{ConfigResult, ConfigurationError};
pub use loader::ConfigManager;

/// Root configuration structure mirroring user-migration.toml
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct MigrationConfig {
    /// Destination database (users and progress batches)
    pub database: DatabaseConfig,

    /// Legacy user source
    pub source: SourceConfig,

    /// Migration loop behavior
    pub migration: MigrationSettings,

    /// Event publishing
    pub events: EventsConfig,
}

/// Destination database connection and pooling configuration
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub acquire_timeout_seconds: u64,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "postgresql://localhost/user_migration_development".to_string(),
            max_connections: 10,
            min_connections: 1,
            acquire_timeout_seconds: 30,
        }
    }
}

/// Legacy source database configuration
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct SourceConfig {
    /// Falls back to `database.url` when unset
    pub url: Option<String>,
    pub users_table: String,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            url: None,
            users_table: system::DEFAULT_SOURCE_USERS_TABLE.to_string(),
        }
    }
}

/// Migration loop settings
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct MigrationSettings {
    /// Items migrated at the same time; 1 keeps strict source order
    pub max_concurrency: usize,
    /// Check for a stopped batch before starting each item
    pub honor_stop_requests: bool,
    /// Write the batch through the repository after every outcome
    pub persist_progress: bool,
    pub placeholder_password_length: usize,
}

impl Default for MigrationSettings {
    fn default() -> Self {
        Self {
            max_concurrency: system::DEFAULT_MAX_CONCURRENCY,
            honor_stop_requests: true,
            persist_progress: true,
            placeholder_password_length: system::DEFAULT_PLACEHOLDER_PASSWORD_LENGTH,
        }
    }
}

/// Event channel configuration
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct EventsConfig {
    pub channel_capacity: usize,
}

impl Default for EventsConfig {
    fn default() -> Self {
        Self {
            channel_capacity: system::DEFAULT_EVENT_CHANNEL_CAPACITY,
        }
    }
}

impl MigrationConfig {
    /// Validate value ranges after all layers are merged
    pub fn validate(&self) -> ConfigResult<()> {
        if self.database.url.trim().is_empty() {
            return Err(ConfigurationError::missing_required_field(
                "url",
                "database",
            ));
        }

        if self.database.max_connections == 0
            || self.database.min_connections > self.database.max_connections
        {
            return Err(ConfigurationError::invalid_value(
                "database.max_connections",
                self.database.max_connections,
                "must be positive and not below min_connections",
            ));
        }

        if !is_valid_identifier(&self.source.users_table) {
            return Err(ConfigurationError::invalid_value(
                "source.users_table",
                &self.source.users_table,
                "must be a plain SQL identifier",
            ));
        }

        if self.migration.max_concurrency == 0 {
            return Err(ConfigurationError::invalid_value(
                "migration.max_concurrency",
                self.migration.max_concurrency,
                "must be at least 1",
            ));
        }

        let password_range =
            system::MIN_PLACEHOLDER_PASSWORD_LENGTH..=system::MAX_PLACEHOLDER_PASSWORD_LENGTH;
        if !password_range.contains(&self.migration.placeholder_password_length) {
            return Err(ConfigurationError::invalid_value(
                "migration.placeholder_password_length",
                self.migration.placeholder_password_length,
                format!(
                    "must be between {} and {}",
                    password_range.start(),
                    password_range.end()
                ),
            ));
        }

        if self.events.channel_capacity == 0 {
            return Err(ConfigurationError::invalid_value(
                "events.channel_capacity",
                self.events.channel_capacity,
                "must be positive",
            ));
        }

        Ok(())
    }

    /// Connection string for the legacy source
    pub fn source_url(&self) -> &str {
        self.source.url.as_deref().unwrap_or(&self.database.url)
    }
}

/// Letters, digits and underscores, optionally schema-qualified with one dot
pub fn is_valid_identifier(name: &str) -> bool {
    let parts: Vec<&str> = name.split('.').collect();
    parts.len() <= 2
        && parts.iter().all(|part| {
            let mut chars = part.chars();
            matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
                && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        })
}

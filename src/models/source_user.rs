use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Read-only user record coming from the legacy data source
///
/// Implementations are serialized whole into migration events, so every
/// field worth auditing should be part of the `Serialize` output.
pub trait SourceUser: Serialize + Send + Sync {
    /// Identifier in the legacy source
    fn id(&self) -> i64;

    fn username(&self) -> &str;

    /// Email address of the user, or an empty string when the source has none
    fn email_from_user(&self) -> String;

    /// Full structured snapshot of the record
    fn snapshot(&self) -> Result<Value, serde_json::Error> {
        serde_json::to_value(self)
    }
}

/// Row of the legacy `users` table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct LegacyUser {
    pub id: i64,
    pub username: String,
    pub email: Option<String>,
}

impl LegacyUser {
    pub fn new(id: i64, username: impl Into<String>, email: Option<&str>) -> Self {
        Self {
            id,
            username: username.into(),
            email: email.map(str::to_string),
        }
    }
}

impl SourceUser for LegacyUser {
    fn id(&self) -> i64 {
        self.id
    }

    fn username(&self) -> &str {
        &self.username
    }

    fn email_from_user(&self) -> String {
        self.email
            .as_deref()
            .map(str::trim)
            .unwrap_or_default()
            .to_string()
    }
}

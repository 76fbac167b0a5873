use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Insert payload for the destination user store
#[derive(Clone, PartialEq, Eq)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password: String,
}

// Keeps the placeholder password out of logs.
impl std::fmt::Debug for NewUser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NewUser")
            .field("name", &self.name)
            .field("email", &self.email)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

/// User record created in the destination store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct MigratedUser {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_user_debug_redacts_password() {
        let user = NewUser {
            name: "ada".to_string(),
            email: "ada@example.com".to_string(),
            password: "s3cr3t-placeholder".to_string(),
        };

        let rendered = format!("{user:?}");
        assert!(rendered.contains("ada@example.com"));
        assert!(!rendered.contains("s3cr3t"));
    }
}

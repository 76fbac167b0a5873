//! PostgreSQL Error Codes
//!
//! SQLSTATE constants the adapters classify on. Full list:
//! <https://www.postgresql.org/docs/current/errcodes-appendix.html>

/// PostgreSQL SQLSTATE error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PgErrorCode;

impl PgErrorCode {
    // =========================================================================
    // Class 23 — Integrity Constraint Violation
    // =========================================================================

    /// Unique violation (duplicate key) - Code 23505
    ///
    /// Raised when a migrated user's email already exists in `users`.
    pub const UNIQUE_VIOLATION: &'static str = "23505";

    /// Not null violation - Code 23502
    pub const NOT_NULL_VIOLATION: &'static str = "23502";

    /// Check constraint violation - Code 23514
    pub const CHECK_VIOLATION: &'static str = "23514";

    pub fn is_unique_violation(code: &str) -> bool {
        code == Self::UNIQUE_VIOLATION
    }

    /// Any class 23 code
    pub fn is_integrity_violation(code: &str) -> bool {
        code.starts_with("23")
    }

    /// Any class 08 code
    pub fn is_connection_error(code: &str) -> bool {
        code.starts_with("08")
    }
}

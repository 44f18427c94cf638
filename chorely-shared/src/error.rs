//! Domain errors for model operations
//!
//! Model functions that only read or write a single row return `sqlx::Error`
//! directly. Operations that enforce a consistency rule (member removal,
//! household deletion, task lifecycle, comments) return [`DomainError`] so the
//! caller can tell a rule violation apart from a database failure.
//!
//! PostgreSQL constraint violations are translated here, so a race that slips
//! past an application-level check still surfaces as a `Conflict` instead of
//! an internal error.

use sqlx::error::DatabaseError;

/// Message returned when a member still has tasks assigned
pub const ASSIGNED_TASKS_MESSAGE: &str =
    "Cannot remove member with assigned tasks. Please reassign tasks first.";

/// Result alias for consistency-checked operations
pub type DomainResult<T> = Result<T, DomainError>;

/// Error type for consistency-checked model operations
#[derive(Debug, thiserror::Error)]
pub enum DomainError {
    /// Referenced entity does not exist
    #[error("{0}")]
    NotFound(String),

    /// Operation would break a uniqueness or integrity rule
    #[error("{0}")]
    Conflict(String),

    /// Input is well-formed but semantically invalid
    #[error("{0}")]
    Invalid(String),

    /// Unexpected database failure
    #[error("Database error: {0}")]
    Database(sqlx::Error),
}

impl DomainError {
    pub fn not_found(entity: &str, id: impl std::fmt::Display) -> Self {
        DomainError::NotFound(format!("{} with id {} not found", entity, id))
    }
}

impl From<sqlx::Error> for DomainError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => DomainError::NotFound("Resource not found".to_string()),
            sqlx::Error::Database(db_err) => match constraint_conflict(db_err.as_ref()) {
                Some(message) => DomainError::Conflict(message),
                None => DomainError::Database(sqlx::Error::Database(db_err)),
            },
            other => DomainError::Database(other),
        }
    }
}

/// Maps a unique or foreign-key violation to a user-facing message
fn constraint_conflict(db_err: &dyn DatabaseError) -> Option<String> {
    if !db_err.is_unique_violation() && !db_err.is_foreign_key_violation() {
        return None;
    }

    let message = match db_err.constraint()? {
        "users_email_key" => "User with this email already exists.".to_string(),
        "household_members_household_user_key" => {
            "User is already a member of this household.".to_string()
        }
        "household_members_household_email_key" => {
            "A member with this email already exists in this household.".to_string()
        }
        "tasks_assignee_fkey" => ASSIGNED_TASKS_MESSAGE.to_string(),
        other => format!("Constraint violation: {}", other),
    };

    Some(message)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_not_found_maps_to_not_found() {
        let err = DomainError::from(sqlx::Error::RowNotFound);
        assert!(matches!(err, DomainError::NotFound(_)));
    }

    #[test]
    fn test_other_errors_map_to_database() {
        let err = DomainError::from(sqlx::Error::PoolTimedOut);
        assert!(matches!(err, DomainError::Database(_)));
        assert!(err.to_string().starts_with("Database error"));
    }

    #[test]
    fn test_not_found_message() {
        let err = DomainError::not_found("Task", "abc");
        assert_eq!(err.to_string(), "Task with id abc not found");
    }
}

/// Task comments
///
/// Comments are always read joined with their author's display name and
/// avatar ([`CommentWithAuthor`]) and listed oldest first.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use crate::error::DomainError;

/// Longest accepted comment, in characters
pub const MAX_COMMENT_LENGTH: usize = 2000;

/// A comment row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Comment {
    pub id: Uuid,
    pub task_id: Uuid,
    /// Author
    pub user_id: Uuid,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A comment with its author resolved
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct CommentWithAuthor {
    pub id: Uuid,
    pub task_id: Uuid,
    pub user_id: Uuid,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub user_name: String,
    pub user_avatar: Option<String>,
}

/// Trims comment content and rejects blank or oversized text
pub fn normalize_content(content: &str) -> Result<String, DomainError> {
    let trimmed = content.trim();

    if trimmed.is_empty() {
        return Err(DomainError::Invalid("Comment content cannot be empty".to_string()));
    }
    if trimmed.chars().count() > MAX_COMMENT_LENGTH {
        return Err(DomainError::Invalid(format!(
            "Comment content cannot exceed {} characters",
            MAX_COMMENT_LENGTH
        )));
    }

    Ok(trimmed.to_string())
}

impl Comment {
    /// Adds a comment by `user_id` to a task
    ///
    /// # Errors
    ///
    /// - `DomainError::Invalid` for blank or oversized content
    /// - `DomainError::NotFound` when the task does not exist
    pub async fn create(
        pool: &PgPool,
        task_id: Uuid,
        user_id: Uuid,
        content: &str,
    ) -> Result<CommentWithAuthor, DomainError> {
        let content = normalize_content(content)?;

        let comment = sqlx::query_as::<_, CommentWithAuthor>(
            r#"
            WITH inserted AS (
                INSERT INTO comments (task_id, user_id, content)
                SELECT id, $2, $3 FROM tasks WHERE id = $1
                RETURNING id, task_id, user_id, content, created_at, updated_at
            )
            SELECT i.id, i.task_id, i.user_id, i.content, i.created_at, i.updated_at,
                   u.name AS user_name, u.avatar_url AS user_avatar
            FROM inserted i
            JOIN users u ON u.id = i.user_id
            "#,
        )
        .bind(task_id)
        .bind(user_id)
        .bind(content)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| DomainError::not_found("Task", task_id))?;

        info!(comment_id = %comment.id, task_id = %task_id, "Comment added");
        Ok(comment)
    }

    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Comment>(
            r#"
            SELECT id, task_id, user_id, content, created_at, updated_at
            FROM comments
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await
    }

    /// Comments of a task with author info, oldest first
    pub async fn list_for_task(
        pool: &PgPool,
        task_id: Uuid,
    ) -> Result<Vec<CommentWithAuthor>, sqlx::Error> {
        sqlx::query_as::<_, CommentWithAuthor>(
            r#"
            SELECT c.id, c.task_id, c.user_id, c.content, c.created_at, c.updated_at,
                   u.name AS user_name, u.avatar_url AS user_avatar
            FROM comments c
            JOIN users u ON u.id = c.user_id
            WHERE c.task_id = $1
            ORDER BY c.created_at ASC, c.id
            "#,
        )
        .bind(task_id)
        .fetch_all(pool)
        .await
    }

    /// Replaces the content of a comment
    ///
    /// Authorization is the caller's job (see
    /// [`crate::auth::authorization::require_comment_author`]).
    pub async fn update_content(
        pool: &PgPool,
        id: Uuid,
        content: &str,
    ) -> Result<CommentWithAuthor, DomainError> {
        let content = normalize_content(content)?;

        sqlx::query_as::<_, CommentWithAuthor>(
            r#"
            WITH updated AS (
                UPDATE comments SET content = $2, updated_at = NOW()
                WHERE id = $1
                RETURNING id, task_id, user_id, content, created_at, updated_at
            )
            SELECT c.id, c.task_id, c.user_id, c.content, c.created_at, c.updated_at,
                   u.name AS user_name, u.avatar_url AS user_avatar
            FROM updated c
            JOIN users u ON u.id = c.user_id
            "#,
        )
        .bind(id)
        .bind(content)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| DomainError::not_found("Comment", id))
    }

    /// Deletes a comment; `Ok(false)` when it did not exist
    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM comments WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

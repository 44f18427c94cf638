/// Task history audit trail
///
/// An append-only log of task status transitions. Entries are written in the
/// same transaction as the task change that caused them, and the table rejects
/// updates at the database level (`task_history_append_only` trigger).
///
/// Besides the three task statuses, two pseudo-states appear in the log:
/// [`CREATED_STATUS`] as the old status of a task's first entry and
/// [`DELETED_STATUS`] as the new status of its last one. `task_id` carries no
/// foreign key so entries survive their task.
///
/// # Example
///
/// ```no_run
/// use chorely_shared::models::task_history::{HistoryFilter, HistorySort, TaskHistory};
/// use sqlx::PgPool;
/// use uuid::Uuid;
///
/// # async fn example(pool: PgPool, household_id: Uuid) -> Result<(), sqlx::Error> {
/// let report = TaskHistory::report(
///     &pool,
///     &HistoryFilter { household_id: Some(household_id), ..Default::default() },
///     HistorySort::User,
/// ).await?;
/// println!("{} changes, {} completions", report.stats.total_changes, report.stats.completed);
/// # Ok(())
/// # }
/// ```

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{PgConnection, PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use super::task::TaskStatus;

/// Old status of the entry written when a task is created
pub const CREATED_STATUS: &str = "created";

/// New status of the entry written when a task is deleted
pub const DELETED_STATUS: &str = "deleted";

/// Label used when a user or task can no longer be resolved
pub const UNKNOWN_LABEL: &str = "Unknown";

/// A stored history entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct TaskHistory {
    pub id: Uuid,
    pub task_id: Uuid,
    pub household_id: Uuid,
    pub changed_by: Uuid,
    pub old_status: String,
    pub new_status: String,
    pub changed_at: DateTime<Utc>,
}

/// A history entry with the acting user's name and the task title resolved
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct HistoryEntry {
    pub id: Uuid,
    pub task_id: Uuid,
    pub household_id: Uuid,
    pub changed_by: Uuid,
    pub old_status: String,
    pub new_status: String,
    pub changed_at: DateTime<Utc>,
    pub user_name: Option<String>,
    pub task_title: Option<String>,
}

impl HistoryEntry {
    pub fn user_label(&self) -> &str {
        self.user_name.as_deref().unwrap_or(UNKNOWN_LABEL)
    }

    pub fn task_label(&self) -> &str {
        self.task_title.as_deref().unwrap_or(UNKNOWN_LABEL)
    }

    pub fn is_completion(&self) -> bool {
        self.new_status == TaskStatus::Done.as_str()
    }
}

/// Scopes for a history query; every `Some` narrows the result
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HistoryFilter {
    pub household_id: Option<Uuid>,
    pub task_id: Option<Uuid>,
    pub user_id: Option<Uuid>,
    /// Restricts entries to households this user has a member profile in
    pub visible_to: Option<Uuid>,
}

/// Result ordering
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HistorySort {
    /// Newest first
    #[default]
    Date,
    /// By acting user's name
    User,
    /// By task title
    Task,
}

impl HistorySort {
    /// Sorts entries in place
    ///
    /// `User` and `Task` compare case-insensitively and are stable, so entries
    /// with the same name keep their relative (date) order.
    pub fn apply(self, entries: &mut [HistoryEntry]) {
        match self {
            HistorySort::Date => entries.sort_by(|a, b| b.changed_at.cmp(&a.changed_at)),
            HistorySort::User => entries.sort_by_cached_key(|e| e.user_label().to_lowercase()),
            HistorySort::Task => entries.sort_by_cached_key(|e| e.task_label().to_lowercase()),
        }
    }
}

/// Aggregates over a filtered set of entries
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryStats {
    pub total_changes: usize,
    /// Entries whose new status is "Done"
    pub completed: usize,
    /// Distinct users that made a change
    pub active_users: usize,
}

impl HistoryStats {
    pub fn from_entries(entries: &[HistoryEntry]) -> Self {
        let users: HashSet<Uuid> = entries.iter().map(|e| e.changed_by).collect();

        Self {
            total_changes: entries.len(),
            completed: entries.iter().filter(|e| e.is_completion()).count(),
            active_users: users.len(),
        }
    }
}

/// Sorted entries plus their statistics
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryReport {
    pub entries: Vec<HistoryEntry>,
    pub stats: HistoryStats,
}

impl HistoryReport {
    pub fn new(mut entries: Vec<HistoryEntry>, sort: HistorySort) -> Self {
        sort.apply(&mut entries);
        let stats = HistoryStats::from_entries(&entries);
        Self { entries, stats }
    }
}

impl TaskHistory {
    /// Appends an entry inside the caller's transaction
    ///
    /// Returns `Ok(None)` without writing when the status did not change.
    pub async fn record(
        conn: &mut PgConnection,
        task_id: Uuid,
        household_id: Uuid,
        changed_by: Uuid,
        old_status: &str,
        new_status: &str,
    ) -> Result<Option<Self>, sqlx::Error> {
        if old_status == new_status {
            return Ok(None);
        }

        let entry = sqlx::query_as::<_, TaskHistory>(
            r#"
            INSERT INTO task_history (task_id, household_id, changed_by, old_status, new_status)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, task_id, household_id, changed_by, old_status, new_status, changed_at
            "#,
        )
        .bind(task_id)
        .bind(household_id)
        .bind(changed_by)
        .bind(old_status)
        .bind(new_status)
        .fetch_one(&mut *conn)
        .await?;

        Ok(Some(entry))
    }

    /// The status a task had right before it last became Done
    ///
    /// `None` when the task was created Done or never completed.
    pub async fn status_before_done(
        conn: &mut PgConnection,
        task_id: Uuid,
    ) -> Result<Option<TaskStatus>, sqlx::Error> {
        let old_status: Option<String> = sqlx::query_scalar(
            r#"
            SELECT old_status
            FROM task_history
            WHERE task_id = $1 AND new_status = 'Done'
            ORDER BY changed_at DESC
            LIMIT 1
            "#,
        )
        .bind(task_id)
        .fetch_optional(&mut *conn)
        .await?;

        Ok(old_status.as_deref().and_then(TaskStatus::parse))
    }

    /// Entries matching the filter, newest first
    pub async fn query(pool: &PgPool, filter: &HistoryFilter) -> Result<Vec<HistoryEntry>, sqlx::Error> {
        let mut builder: QueryBuilder<Postgres> = QueryBuilder::new(
            r#"
            SELECT h.id, h.task_id, h.household_id, h.changed_by,
                   h.old_status, h.new_status, h.changed_at,
                   u.name AS user_name, t.title AS task_title
            FROM task_history h
            LEFT JOIN users u ON u.id = h.changed_by
            LEFT JOIN tasks t ON t.id = h.task_id
            WHERE TRUE
            "#,
        );

        if let Some(household_id) = filter.household_id {
            builder.push(" AND h.household_id = ").push_bind(household_id);
        }
        if let Some(task_id) = filter.task_id {
            builder.push(" AND h.task_id = ").push_bind(task_id);
        }
        if let Some(user_id) = filter.user_id {
            builder.push(" AND h.changed_by = ").push_bind(user_id);
        }
        if let Some(viewer) = filter.visible_to {
            builder
                .push(" AND h.household_id IN (SELECT household_id FROM household_members WHERE user_id = ")
                .push_bind(viewer)
                .push(")");
        }

        builder.push(" ORDER BY h.changed_at DESC, h.id");

        builder.build_query_as::<HistoryEntry>().fetch_all(pool).await
    }

    /// Queries, sorts and summarizes in one call
    pub async fn report(
        pool: &PgPool,
        filter: &HistoryFilter,
        sort: HistorySort,
    ) -> Result<HistoryReport, sqlx::Error> {
        let entries = Self::query(pool, filter).await?;
        Ok(HistoryReport::new(entries, sort))
    }
}

/// Household tasks
///
/// A task belongs to exactly one household and may be assigned to one of that
/// household's members. Its status is a single enum ([`TaskStatus`]); the
/// `completed` flag seen by clients is derived from it ([`TaskView`]) and is
/// never stored.
///
/// # Lifecycle
///
/// ```text
/// create ──► To Do ◄──► In Progress ◄──► Done ──► delete
/// ```
///
/// Every write that changes the status appends a [`TaskHistory`] entry in the
/// same transaction:
///
/// - create: `("created", <initial status>)`
/// - status change: `(<previous>, <next>)`, skipped when they are equal
/// - delete: `(<status at delete>, "deleted")`
///
/// # Example
///
/// ```no_run
/// use chorely_shared::models::task::{CreateTask, StatusChange, Task, TaskPriority, TaskStatus, UpdateTask};
/// use sqlx::PgPool;
/// use uuid::Uuid;
///
/// # async fn example(pool: PgPool, household_id: Uuid, user_id: Uuid) -> Result<(), Box<dyn std::error::Error>> {
/// let task = Task::create(&pool, CreateTask {
///     household_id,
///     title: "Clean the kitchen".to_string(),
///     description: None,
///     assigned_to: None,
///     priority: TaskPriority::High,
///     category: "Cleaning".to_string(),
///     status: TaskStatus::Todo,
///     due_date: None,
/// }, user_id).await?;
///
/// let done = Task::update(&pool, task.id, UpdateTask {
///     status_change: Some(StatusChange::Completed(true)),
///     ..Default::default()
/// }, user_id).await?;
/// assert_eq!(done.status, TaskStatus::Done);
/// # Ok(())
/// # }
/// ```

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{PgConnection, PgPool, Postgres, QueryBuilder};
use tracing::{debug, info};
use uuid::Uuid;

use super::task_history::{TaskHistory, CREATED_STATUS, DELETED_STATUS};
use crate::error::DomainError;

/// Task status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "task_status")]
pub enum TaskStatus {
    #[sqlx(rename = "To Do")]
    #[serde(rename = "To Do")]
    Todo,

    #[sqlx(rename = "In Progress")]
    #[serde(rename = "In Progress")]
    InProgress,

    #[sqlx(rename = "Done")]
    #[serde(rename = "Done")]
    Done,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Todo => "To Do",
            TaskStatus::InProgress => "In Progress",
            TaskStatus::Done => "Done",
        }
    }

    /// The derived `completed` view
    pub fn is_completed(&self) -> bool {
        *self == TaskStatus::Done
    }

    /// Parses a stored status; history pseudo-states yield `None`
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "To Do" => Some(TaskStatus::Todo),
            "In Progress" => Some(TaskStatus::InProgress),
            "Done" => Some(TaskStatus::Done),
            _ => None,
        }
    }
}

impl Default for TaskStatus {
    fn default() -> Self {
        TaskStatus::Todo
    }
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Task priority
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "task_priority", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum TaskPriority {
    Low,
    Medium,
    High,
}

impl TaskPriority {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskPriority::Low => "low",
            TaskPriority::Medium => "medium",
            TaskPriority::High => "high",
        }
    }
}

impl Default for TaskPriority {
    fn default() -> Self {
        TaskPriority::Medium
    }
}

/// A requested status change
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusChange {
    /// Set the status explicitly
    Set(TaskStatus),

    /// Set the `completed` view: `true` → Done; `false` reopens a Done task,
    /// otherwise unchanged
    Completed(bool),

    /// Flip the `completed` view
    Toggle,
}

impl StatusChange {
    /// Whether applying this change to `current` takes a Done task back out of Done
    pub fn reopens(self, current: TaskStatus) -> bool {
        current.is_completed()
            && matches!(self, StatusChange::Toggle | StatusChange::Completed(false))
    }

    /// Resolves the status that results from applying this change to `current`,
    /// reopening to In Progress
    pub fn apply(self, current: TaskStatus) -> TaskStatus {
        self.resolve(current, TaskStatus::InProgress)
    }

    /// Like [`StatusChange::apply`], reopening a Done task to `reopened`
    ///
    /// `reopened` is the status the task had before it was completed, so that
    /// un-completing undoes the completion.
    pub fn resolve(self, current: TaskStatus, reopened: TaskStatus) -> TaskStatus {
        match self {
            StatusChange::Set(status) => status,
            StatusChange::Completed(true) => TaskStatus::Done,
            StatusChange::Completed(false) | StatusChange::Toggle if current.is_completed() => {
                reopened
            }
            StatusChange::Completed(false) => current,
            StatusChange::Toggle => TaskStatus::Done,
        }
    }
}

/// A task row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Task {
    pub id: Uuid,
    pub household_id: Uuid,

    /// Member id within the same household
    pub assigned_to: Option<Uuid>,

    pub title: String,
    pub description: Option<String>,
    pub priority: TaskPriority,
    pub category: String,
    pub status: TaskStatus,
    pub due_date: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Wire form of a task with the derived `completed` flag
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskView {
    #[serde(flatten)]
    pub task: Task,
    pub completed: bool,
}

impl From<Task> for TaskView {
    fn from(task: Task) -> Self {
        let completed = task.status.is_completed();
        Self { task, completed }
    }
}

/// Input for creating a task
#[derive(Debug, Clone)]
pub struct CreateTask {
    pub household_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub assigned_to: Option<Uuid>,
    pub priority: TaskPriority,
    pub category: String,
    pub status: TaskStatus,
    pub due_date: Option<NaiveDate>,
}

/// Task edits; `None` leaves a field alone, `Some(None)` clears it
#[derive(Debug, Clone, Default)]
pub struct UpdateTask {
    pub title: Option<String>,
    pub description: Option<Option<String>>,
    /// Reassigns the task; `Some(None)` unassigns it
    pub assigned_to: Option<Option<Uuid>>,
    pub priority: Option<TaskPriority>,
    pub category: Option<String>,
    pub due_date: Option<Option<NaiveDate>>,
    pub status_change: Option<StatusChange>,
}

const TASK_COLUMNS: &str = "id, household_id, assigned_to, title, description, priority, \
                            category, status, due_date, created_at, updated_at";

/// Checks that a member exists in the household and holds it until commit
async fn ensure_assignee(
    conn: &mut PgConnection,
    household_id: Uuid,
    member_id: Uuid,
) -> Result<(), DomainError> {
    let found: Option<Uuid> = sqlx::query_scalar(
        r#"
        SELECT id FROM household_members
        WHERE household_id = $1 AND id = $2
        FOR KEY SHARE
        "#,
    )
    .bind(household_id)
    .bind(member_id)
    .fetch_optional(&mut *conn)
    .await?;

    match found {
        Some(_) => Ok(()),
        None => Err(DomainError::Invalid(
            "Assignee is not a member of this household".to_string(),
        )),
    }
}

async fn lock_task(conn: &mut PgConnection, id: Uuid) -> Result<Task, DomainError> {
    sqlx::query_as::<_, Task>(&format!(
        "SELECT {TASK_COLUMNS} FROM tasks WHERE id = $1 FOR UPDATE"
    ))
    .bind(id)
    .fetch_optional(&mut *conn)
    .await?
    .ok_or_else(|| DomainError::not_found("Task", id))
}

impl Task {
    /// Creates a task and its `created` history entry in one transaction
    ///
    /// # Errors
    ///
    /// `DomainError::Invalid` when `assigned_to` is not a member of the
    /// household.
    pub async fn create(
        pool: &PgPool,
        data: CreateTask,
        created_by: Uuid,
    ) -> Result<Self, DomainError> {
        let mut tx = pool.begin().await?;

        if let Some(assignee) = data.assigned_to {
            ensure_assignee(&mut tx, data.household_id, assignee).await?;
        }

        let task = sqlx::query_as::<_, Task>(&format!(
            r#"
            INSERT INTO tasks
                (household_id, assigned_to, title, description, priority, category, status, due_date)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {TASK_COLUMNS}
            "#
        ))
        .bind(data.household_id)
        .bind(data.assigned_to)
        .bind(data.title)
        .bind(data.description)
        .bind(data.priority)
        .bind(data.category)
        .bind(data.status)
        .bind(data.due_date)
        .fetch_one(&mut *tx)
        .await?;

        TaskHistory::record(
            &mut tx,
            task.id,
            task.household_id,
            created_by,
            CREATED_STATUS,
            task.status.as_str(),
        )
        .await?;

        tx.commit().await?;

        info!(
            task_id = %task.id,
            household_id = %task.household_id,
            status = task.status.as_str(),
            "Task created"
        );
        Ok(task)
    }

    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Task>(&format!("SELECT {TASK_COLUMNS} FROM tasks WHERE id = $1"))
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Tasks of one household, oldest first
    pub async fn list_by_household(pool: &PgPool, household_id: Uuid) -> Result<Vec<Self>, sqlx::Error> {
        Self::list_by_households(pool, &[household_id]).await
    }

    /// Tasks of several households, oldest first
    pub async fn list_by_households(
        pool: &PgPool,
        household_ids: &[Uuid],
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Task>(&format!(
            r#"
            SELECT {TASK_COLUMNS}
            FROM tasks
            WHERE household_id = ANY($1)
            ORDER BY created_at, id
            "#
        ))
        .bind(household_ids)
        .fetch_all(pool)
        .await
    }

    /// Applies field edits and an optional status change
    ///
    /// The task row is locked for the duration of the transaction. A history
    /// entry is written only when the resolved status differs from the current
    /// one.
    ///
    /// # Errors
    ///
    /// - `DomainError::NotFound` for an unknown task id
    /// - `DomainError::Invalid` when reassigning to a non-member
    pub async fn update(
        pool: &PgPool,
        id: Uuid,
        data: UpdateTask,
        changed_by: Uuid,
    ) -> Result<Self, DomainError> {
        let mut tx = pool.begin().await?;
        let current = lock_task(&mut tx, id).await?;

        if let Some(Some(assignee)) = data.assigned_to {
            ensure_assignee(&mut tx, current.household_id, assignee).await?;
        }

        let next_status = match data.status_change {
            Some(change) if change.reopens(current.status) => {
                let reopened = TaskHistory::status_before_done(&mut tx, id)
                    .await?
                    .filter(|status| !status.is_completed())
                    .unwrap_or(TaskStatus::InProgress);
                change.resolve(current.status, reopened)
            }
            Some(change) => change.apply(current.status),
            None => current.status,
        };

        let mut builder: QueryBuilder<Postgres> = QueryBuilder::new("UPDATE tasks SET updated_at = NOW()");

        if let Some(title) = data.title {
            builder.push(", title = ").push_bind(title);
        }
        if let Some(description) = data.description {
            builder.push(", description = ").push_bind(description);
        }
        if let Some(assigned_to) = data.assigned_to {
            builder.push(", assigned_to = ").push_bind(assigned_to);
        }
        if let Some(priority) = data.priority {
            builder.push(", priority = ").push_bind(priority);
        }
        if let Some(category) = data.category {
            builder.push(", category = ").push_bind(category);
        }
        if let Some(due_date) = data.due_date {
            builder.push(", due_date = ").push_bind(due_date);
        }
        if next_status != current.status {
            builder.push(", status = ").push_bind(next_status);
        }

        builder
            .push(" WHERE id = ")
            .push_bind(id)
            .push(format!(" RETURNING {TASK_COLUMNS}"));

        let task = builder.build_query_as::<Task>().fetch_one(&mut *tx).await?;

        let entry = TaskHistory::record(
            &mut tx,
            task.id,
            task.household_id,
            changed_by,
            current.status.as_str(),
            task.status.as_str(),
        )
        .await?;

        tx.commit().await?;

        match entry {
            Some(_) => info!(
                task_id = %task.id,
                from = current.status.as_str(),
                to = task.status.as_str(),
                "Task status changed"
            ),
            None => debug!(task_id = %task.id, "Task updated without status change"),
        }
        Ok(task)
    }

    /// Flips the `completed` view
    ///
    /// Not done → Done; Done → the status it had before completion (In
    /// Progress when unknown). Toggling twice restores the original status.
    pub async fn toggle_completion(
        pool: &PgPool,
        id: Uuid,
        changed_by: Uuid,
    ) -> Result<Self, DomainError> {
        let change = UpdateTask {
            status_change: Some(StatusChange::Toggle),
            ..Default::default()
        };
        Self::update(pool, id, change, changed_by).await
    }

    /// Deletes a task, its comments, and records the `deleted` history entry
    ///
    /// All three writes share one transaction.
    pub async fn delete(pool: &PgPool, id: Uuid, deleted_by: Uuid) -> Result<(), DomainError> {
        let mut tx = pool.begin().await?;
        let task = lock_task(&mut tx, id).await?;

        TaskHistory::record(
            &mut tx,
            task.id,
            task.household_id,
            deleted_by,
            task.status.as_str(),
            DELETED_STATUS,
        )
        .await?;

        let comments = sqlx::query("DELETE FROM comments WHERE task_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        sqlx::query("DELETE FROM tasks WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        info!(
            task_id = %id,
            household_id = %task.household_id,
            comments_deleted = comments.rows_affected(),
            "Task deleted"
        );
        Ok(())
    }
}

/// Task endpoints
///
/// - `POST /v1/tasks` - create a task in a household
/// - `GET /v1/tasks/:id` - read one task
/// - `PUT /v1/tasks/:id` - edit fields, reassign, change status or completion
/// - `DELETE /v1/tasks/:id` - delete the task and its comments
/// - `POST /v1/tasks/:id/toggle` - flip the `completed` view
///
/// Status and `completed` are two views of one field. A request may set one of
/// them, not both. Every status transition is written to the task history in
/// the same transaction as the change.

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    extract::{double_option, ValidJson},
    validation::{blank_to_none, not_blank},
};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use chorely_shared::{
    auth::{authorization::require_household_access, session::Session},
    models::{
        household::Household,
        task::{CreateTask, StatusChange, Task, TaskPriority, TaskStatus, TaskView, UpdateTask},
    },
};
use chrono::NaiveDate;
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
pub struct CreateTaskRequest {
    pub household_id: Uuid,

    #[validate(
        length(min = 1, max = 100, message = "Task title must be between 1 and 100 characters"),
        custom(function = "not_blank")
    )]
    pub title: String,

    #[validate(length(max = 500, message = "Description must be less than 500 characters"))]
    pub description: Option<String>,

    /// Member id in the same household
    pub assigned_to: Option<Uuid>,

    #[serde(default)]
    pub priority: TaskPriority,

    #[validate(
        length(min = 1, max = 50, message = "Category must be between 1 and 50 characters"),
        custom(function = "not_blank")
    )]
    pub category: String,

    pub status: Option<TaskStatus>,

    pub completed: Option<bool>,

    pub due_date: Option<NaiveDate>,
}

#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateTaskRequest {
    #[validate(
        length(min = 1, max = 100, message = "Task title must be between 1 and 100 characters"),
        custom(function = "not_blank")
    )]
    pub title: Option<String>,

    #[serde(default, deserialize_with = "double_option")]
    #[validate(length(max = 500, message = "Description must be less than 500 characters"))]
    pub description: Option<Option<String>>,

    /// `null` unassigns
    #[serde(default, deserialize_with = "double_option")]
    pub assigned_to: Option<Option<Uuid>>,

    pub priority: Option<TaskPriority>,

    #[validate(
        length(min = 1, max = 50, message = "Category must be between 1 and 50 characters"),
        custom(function = "not_blank")
    )]
    pub category: Option<String>,

    #[serde(default, deserialize_with = "double_option")]
    pub due_date: Option<Option<NaiveDate>>,

    pub status: Option<TaskStatus>,

    pub completed: Option<bool>,
}

/// Resolves the requested status change; setting both views is rejected
fn status_change(
    status: Option<TaskStatus>,
    completed: Option<bool>,
) -> Result<Option<StatusChange>, ApiError> {
    match (status, completed) {
        (Some(_), Some(_)) => Err(ApiError::invalid_field(
            "completed",
            "Provide either status or completed, not both",
        )),
        (Some(status), None) => Ok(Some(StatusChange::Set(status))),
        (None, Some(completed)) => Ok(Some(StatusChange::Completed(completed))),
        (None, None) => Ok(None),
    }
}

impl CreateTaskRequest {
    fn into_task(self) -> Result<CreateTask, ApiError> {
        let initial = status_change(self.status, self.completed)?
            .map(|change| change.apply(TaskStatus::default()))
            .unwrap_or_default();

        Ok(CreateTask {
            household_id: self.household_id,
            title: self.title.trim().to_string(),
            description: blank_to_none(self.description),
            assigned_to: self.assigned_to,
            priority: self.priority,
            category: self.category.trim().to_string(),
            status: initial,
            due_date: self.due_date,
        })
    }
}

impl UpdateTaskRequest {
    fn into_update(self) -> Result<UpdateTask, ApiError> {
        Ok(UpdateTask {
            status_change: status_change(self.status, self.completed)?,
            title: self.title.map(|t| t.trim().to_string()),
            description: self.description.map(blank_to_none),
            assigned_to: self.assigned_to,
            priority: self.priority,
            category: self.category.map(|c| c.trim().to_string()),
            due_date: self.due_date,
        })
    }
}

/// Loads a task and checks the caller may act on its household
pub(crate) async fn load_task(state: &AppState, session: &Session, id: Uuid) -> ApiResult<Task> {
    let task = Task::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Task with id {} not found", id)))?;

    require_household_access(&state.db, session, task.household_id).await?;
    Ok(task)
}

/// # Errors
///
/// - `400 Bad Request`: validation failed, both `status` and `completed`
///   given, or the assignee is not a member of the household
/// - `403 Forbidden`: caller is not in the household
pub async fn create_task(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    ValidJson(req): ValidJson<CreateTaskRequest>,
) -> ApiResult<(StatusCode, Json<TaskView>)> {
    let data = req.into_task()?;

    require_household_access(&state.db, &session, data.household_id).await?;
    if Household::find_by_id(&state.db, data.household_id).await?.is_none() {
        return Err(ApiError::NotFound(format!(
            "Household with id {} not found",
            data.household_id
        )));
    }

    let task = Task::create(&state.db, data, session.user_id).await?;

    Ok((StatusCode::CREATED, Json(task.into())))
}

pub async fn get_task(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<TaskView>> {
    let task = load_task(&state, &session, id).await?;
    Ok(Json(task.into()))
}

pub async fn update_task(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Path(id): Path<Uuid>,
    ValidJson(req): ValidJson<UpdateTaskRequest>,
) -> ApiResult<Json<TaskView>> {
    let update = req.into_update()?;
    load_task(&state, &session, id).await?;

    let task = Task::update(&state.db, id, update, session.user_id).await?;
    Ok(Json(task.into()))
}

pub async fn toggle_task(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<TaskView>> {
    load_task(&state, &session, id).await?;

    let task = Task::toggle_completion(&state.db, id, session.user_id).await?;
    Ok(Json(task.into()))
}

pub async fn delete_task(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    load_task(&state, &session, id).await?;

    Task::delete(&state.db, id, session.user_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create(json: &str) -> CreateTaskRequest {
        serde_json::from_str(json).unwrap()
    }

    const HOUSEHOLD: &str = "6f1c2f1e-8a4b-4c7d-9e0f-123456789abc";

    #[test]
    fn test_create_defaults_to_todo_medium() {
        let req = create(&format!(
            r#"{{"household_id":"{HOUSEHOLD}","title":" Clean the kitchen ","category":"Cleaning"}}"#
        ));
        assert!(req.validate().is_ok());

        let task = req.into_task().unwrap();
        assert_eq!(task.status, TaskStatus::Todo);
        assert_eq!(task.priority, TaskPriority::Medium);
        assert_eq!(task.title, "Clean the kitchen");
    }

    #[test]
    fn test_create_with_completed_starts_done() {
        let req = create(&format!(
            r#"{{"household_id":"{HOUSEHOLD}","title":"Trash","category":"Chores","completed":true,"priority":"high"}}"#
        ));
        let task = req.into_task().unwrap();
        assert_eq!(task.status, TaskStatus::Done);
        assert_eq!(task.priority, TaskPriority::High);
    }

    #[test]
    fn test_create_status_uses_display_names() {
        let req = create(&format!(
            r#"{{"household_id":"{HOUSEHOLD}","title":"Laundry","category":"Chores","status":"In Progress","due_date":"2026-11-01"}}"#
        ));
        let task = req.into_task().unwrap();
        assert_eq!(task.status, TaskStatus::InProgress);
        assert_eq!(task.due_date, NaiveDate::from_ymd_opt(2026, 11, 1));
    }

    #[test]
    fn test_status_and_completed_together_rejected() {
        let req: UpdateTaskRequest =
            serde_json::from_str(r#"{"status":"Done","completed":false}"#).unwrap();
        assert!(matches!(req.into_update(), Err(ApiError::ValidationError(_))));
    }

    #[test]
    fn test_update_maps_completion_and_unassign() {
        let req: UpdateTaskRequest =
            serde_json::from_str(r#"{"completed":true,"assigned_to":null,"description":""}"#).unwrap();
        let update = req.into_update().unwrap();

        assert_eq!(update.status_change, Some(StatusChange::Completed(true)));
        assert_eq!(update.assigned_to, Some(None));
        assert_eq!(update.description, Some(None));
        assert!(update.due_date.is_none());
    }

    #[test]
    fn test_title_rules() {
        let req = create(&format!(
            r#"{{"household_id":"{HOUSEHOLD}","title":"   ","category":"Chores"}}"#
        ));
        assert!(req.validate().unwrap_err().field_errors().contains_key("title"));

        let long = "x".repeat(101);
        let req = create(&format!(
            r#"{{"household_id":"{HOUSEHOLD}","title":"{long}","category":"Chores"}}"#
        ));
        assert!(req.validate().is_err());
    }
}

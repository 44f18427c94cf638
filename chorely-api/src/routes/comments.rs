/// Comment endpoints, nested under a task
///
/// - `GET /v1/tasks/:id/comments` - oldest first, with author name and avatar
/// - `POST /v1/tasks/:id/comments` - add a comment as the caller
/// - `PUT /v1/tasks/:id/comments/:comment_id` - edit (author or admin)
/// - `DELETE /v1/tasks/:id/comments/:comment_id` - delete (author or admin)

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    extract::ValidJson,
    routes::tasks::load_task,
    validation::comment_content,
};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use chorely_shared::{
    auth::{authorization::require_comment_author, session::Session},
    models::comment::{Comment, CommentWithAuthor},
};
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
pub struct CommentRequest {
    /// Blank or over 2000 characters after trimming is rejected
    #[validate(custom(function = "comment_content"))]
    pub content: String,
}

/// Loads a comment and checks it belongs to the task in the path
async fn load_comment(state: &AppState, task_id: Uuid, comment_id: Uuid) -> ApiResult<Comment> {
    Comment::find_by_id(&state.db, comment_id)
        .await?
        .filter(|comment| comment.task_id == task_id)
        .ok_or_else(|| ApiError::NotFound(format!("Comment with id {} not found", comment_id)))
}

pub async fn list_comments(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Path(task_id): Path<Uuid>,
) -> ApiResult<Json<Vec<CommentWithAuthor>>> {
    load_task(&state, &session, task_id).await?;
    Ok(Json(Comment::list_for_task(&state.db, task_id).await?))
}

/// # Errors
///
/// - `400 Bad Request`: content is blank or longer than 2000 characters
/// - `404 Not Found`: the task does not exist
pub async fn add_comment(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Path(task_id): Path<Uuid>,
    ValidJson(req): ValidJson<CommentRequest>,
) -> ApiResult<(StatusCode, Json<CommentWithAuthor>)> {
    load_task(&state, &session, task_id).await?;

    let comment = Comment::create(&state.db, task_id, session.user_id, &req.content).await?;
    Ok((StatusCode::CREATED, Json(comment)))
}

pub async fn update_comment(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Path((task_id, comment_id)): Path<(Uuid, Uuid)>,
    ValidJson(req): ValidJson<CommentRequest>,
) -> ApiResult<Json<CommentWithAuthor>> {
    load_task(&state, &session, task_id).await?;
    let comment = load_comment(&state, task_id, comment_id).await?;
    require_comment_author(&session, &comment)?;

    let updated = Comment::update_content(&state.db, comment_id, &req.content).await?;
    Ok(Json(updated))
}

pub async fn delete_comment(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Path((task_id, comment_id)): Path<(Uuid, Uuid)>,
) -> ApiResult<StatusCode> {
    load_task(&state, &session, task_id).await?;
    let comment = load_comment(&state, task_id, comment_id).await?;
    require_comment_author(&session, &comment)?;

    if !Comment::delete(&state.db, comment_id).await? {
        return Err(ApiError::NotFound(format!(
            "Comment with id {} not found",
            comment_id
        )));
    }

    tracing::info!(comment_id = %comment_id, deleted_by = %session.user_id, "Comment deleted");
    Ok(StatusCode::NO_CONTENT)
}

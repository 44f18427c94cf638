/// Task-history endpoints
///
/// - `GET /v1/history?household_id=&task_id=&user_id=&sort=date|user|task`
/// - `GET /v1/households/:id/history?sort=`
/// - `GET /v1/tasks/:id/history?sort=`
///
/// Each returns `{ "entries": [...], "stats": { total_changes, completed, active_users } }`.
/// Non-admin callers only ever see entries from households they belong to.
/// History of a deleted task stays readable; its title resolves to "Unknown".

use crate::{app::AppState, error::ApiResult};
use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use chorely_shared::{
    auth::{authorization::require_household_access, session::Session},
    models::{
        task::Task,
        task_history::{HistoryFilter, HistoryReport, HistorySort, TaskHistory},
    },
};
use serde::Deserialize;
use uuid::Uuid;

#[derive(Debug, Default, Deserialize)]
pub struct HistoryQuery {
    pub household_id: Option<Uuid>,
    pub task_id: Option<Uuid>,
    pub user_id: Option<Uuid>,
    #[serde(default)]
    pub sort: HistorySort,
}

#[derive(Debug, Default, Deserialize)]
pub struct SortQuery {
    #[serde(default)]
    pub sort: HistorySort,
}

fn scoped_filter(session: &Session, filter: HistoryFilter) -> HistoryFilter {
    HistoryFilter {
        visible_to: (!session.is_admin()).then_some(session.user_id),
        ..filter
    }
}

pub async fn query_history(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Query(query): Query<HistoryQuery>,
) -> ApiResult<Json<HistoryReport>> {
    if let Some(household_id) = query.household_id {
        require_household_access(&state.db, &session, household_id).await?;
    }

    let filter = scoped_filter(
        &session,
        HistoryFilter {
            household_id: query.household_id,
            task_id: query.task_id,
            user_id: query.user_id,
            visible_to: None,
        },
    );

    Ok(Json(TaskHistory::report(&state.db, &filter, query.sort).await?))
}

pub async fn household_history(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Path(household_id): Path<Uuid>,
    Query(query): Query<SortQuery>,
) -> ApiResult<Json<HistoryReport>> {
    require_household_access(&state.db, &session, household_id).await?;

    let filter = HistoryFilter {
        household_id: Some(household_id),
        ..Default::default()
    };

    Ok(Json(TaskHistory::report(&state.db, &filter, query.sort).await?))
}

pub async fn task_history(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Path(task_id): Path<Uuid>,
    Query(query): Query<SortQuery>,
) -> ApiResult<Json<HistoryReport>> {
    if let Some(task) = Task::find_by_id(&state.db, task_id).await? {
        require_household_access(&state.db, &session, task.household_id).await?;
    }

    let filter = scoped_filter(
        &session,
        HistoryFilter {
            task_id: Some(task_id),
            ..Default::default()
        },
    );

    Ok(Json(TaskHistory::report(&state.db, &filter, query.sort).await?))
}

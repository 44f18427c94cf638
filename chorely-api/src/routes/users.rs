/// Account endpoints
///
/// - `GET /v1/users/me` - own profile with household ids
/// - `PUT /v1/users/me` - edit name, email, avatar
/// - `GET /v1/users` - every account (admin)
/// - `PUT /v1/users/:id/role` - change an account's role (admin)
/// - `GET /v1/users/:id/households` - households of an account (self or admin)
///
/// A role change applies to the account's next login or token refresh.

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    extract::{double_option, ValidJson},
    validation::{blank_to_none, not_blank},
};
use axum::{
    extract::{Path, State},
    Extension, Json,
};
use chorely_shared::{
    auth::{
        authorization::{require_admin, require_self_or_admin},
        session::Session,
    },
    models::{
        household::{Household, HouseholdDetail},
        user::{UpdateUser, User, UserProfile, UserRole},
    },
};
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateProfileRequest {
    #[validate(
        length(min = 2, max = 50, message = "Name must be between 2 and 50 characters"),
        custom(function = "not_blank")
    )]
    pub name: Option<String>,

    #[validate(email(message = "Please enter a valid email address"))]
    pub email: Option<String>,

    /// `null` or `""` removes the avatar
    #[serde(default, deserialize_with = "double_option")]
    #[validate(length(max = 500, message = "Avatar URL must be at most 500 characters"))]
    pub avatar_url: Option<Option<String>>,
}

impl From<UpdateProfileRequest> for UpdateUser {
    fn from(req: UpdateProfileRequest) -> Self {
        UpdateUser {
            name: req.name.map(|n| n.trim().to_string()),
            email: req.email.map(|e| e.trim().to_string()),
            avatar_url: req.avatar_url.map(blank_to_none),
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct SetRoleRequest {
    pub role: UserRole,
}

fn account_not_found(id: Uuid) -> ApiError {
    ApiError::NotFound(format!("User with id {} not found", id))
}

pub async fn get_me(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
) -> ApiResult<Json<UserProfile>> {
    let profile = User::profile(&state.db, session.user_id)
        .await?
        .ok_or_else(|| account_not_found(session.user_id))?;

    Ok(Json(profile))
}

/// # Errors
///
/// - `409 Conflict`: the email belongs to another account
pub async fn update_me(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    ValidJson(req): ValidJson<UpdateProfileRequest>,
) -> ApiResult<Json<User>> {
    let user = User::update(&state.db, session.user_id, req.into())
        .await?
        .ok_or_else(|| account_not_found(session.user_id))?;

    tracing::info!(user_id = %user.id, "Profile updated");
    Ok(Json(user))
}

pub async fn list_users(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
) -> ApiResult<Json<Vec<User>>> {
    require_admin(&session)?;
    Ok(Json(User::list(&state.db).await?))
}

pub async fn set_role(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Path(id): Path<Uuid>,
    ValidJson(req): ValidJson<SetRoleRequest>,
) -> ApiResult<Json<User>> {
    require_admin(&session)?;

    let user = User::set_role(&state.db, id, req.role)
        .await?
        .ok_or_else(|| account_not_found(id))?;

    tracing::info!(
        user_id = %user.id,
        role = user.role.as_str(),
        changed_by = %session.user_id,
        "User role changed"
    );
    Ok(Json(user))
}

pub async fn user_households(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Vec<HouseholdDetail>>> {
    require_self_or_admin(&session, id)?;

    let households = Household::list_for_user(&state.db, id).await?;
    Ok(Json(Household::with_details(&state.db, households).await?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_profile_request_absent_vs_cleared_avatar() {
        let req: UpdateProfileRequest = serde_json::from_str(r#"{"name":" Ana "}"#).unwrap();
        let update: UpdateUser = req.into();
        assert_eq!(update.name.as_deref(), Some("Ana"));
        assert!(update.avatar_url.is_none());

        let req: UpdateProfileRequest = serde_json::from_str(r#"{"avatar_url":null}"#).unwrap();
        let update: UpdateUser = req.into();
        assert_eq!(update.avatar_url, Some(None));

        let req: UpdateProfileRequest = serde_json::from_str(r#"{"avatar_url":"  "}"#).unwrap();
        let update: UpdateUser = req.into();
        assert_eq!(update.avatar_url, Some(None));
    }

    #[test]
    fn test_profile_request_validation() {
        let req: UpdateProfileRequest =
            serde_json::from_str(r#"{"name":"A","email":"nope"}"#).unwrap();
        let errors = req.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("name"));
        assert!(fields.contains_key("email"));
    }

    #[test]
    fn test_role_request_uses_lowercase_names() {
        let req: SetRoleRequest = serde_json::from_str(r#"{"role":"admin"}"#).unwrap();
        assert_eq!(req.role, UserRole::Admin);
        assert!(serde_json::from_str::<SetRoleRequest>(r#"{"role":"root"}"#).is_err());
    }
}

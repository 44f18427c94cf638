/// Household member endpoints
///
/// - `POST /v1/households/:id/members` - link an account or add a standalone profile
/// - `PUT /v1/households/:id/members/:member_id` - edit a profile
/// - `DELETE /v1/households/:id/members/:member_id` - remove a profile
///
/// Removal is refused with 409 while any task is assigned to the member.

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    extract::{double_option, ValidJson},
    validation::{blank_to_none, not_blank, optional_email, valid_color, valid_phone},
};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use chorely_shared::{
    auth::{authorization::require_household_access, session::Session},
    models::{
        member::{CreateMember, Member, UpdateMember, DEFAULT_MEMBER_COLOR, DEFAULT_MEMBER_ROLE},
        user::User,
    },
};
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

/// Either `user_id` (link an existing account) or at least `name`
#[derive(Debug, Deserialize, Validate)]
pub struct AddMemberRequest {
    pub user_id: Option<Uuid>,

    #[validate(
        length(min = 2, max = 50, message = "Name must be between 2 and 50 characters"),
        custom(function = "not_blank")
    )]
    pub name: Option<String>,

    #[validate(custom(function = "valid_color"))]
    pub color: Option<String>,

    #[validate(length(min = 1, max = 30, message = "Role must be between 1 and 30 characters"))]
    pub role: Option<String>,

    #[validate(range(min = 1, max = 120, message = "Age must be between 1 and 120"))]
    pub age: Option<i32>,

    #[validate(length(max = 50, message = "Room name must be less than 50 characters"))]
    pub room: Option<String>,

    #[validate(
        custom(function = "optional_email"),
        length(max = 100, message = "Email must be less than 100 characters")
    )]
    pub email: Option<String>,

    #[validate(custom(function = "valid_phone"))]
    pub phone: Option<String>,

    #[validate(length(max = 500, message = "Bio must be less than 500 characters"))]
    pub bio: Option<String>,
}

impl AddMemberRequest {
    /// Builds the profile, starting from the linked account when there is one
    fn into_member(self, household_id: Uuid, linked: Option<&User>) -> Result<CreateMember, ApiError> {
        let role = blank_to_none(self.role).unwrap_or_else(|| DEFAULT_MEMBER_ROLE.to_string());

        let mut member = match linked {
            Some(user) => CreateMember::for_user(household_id, user, role),
            None => {
                let name = blank_to_none(self.name.clone())
                    .ok_or_else(|| ApiError::invalid_field("name", "Name is required"))?;
                CreateMember {
                    household_id,
                    user_id: None,
                    name,
                    color: DEFAULT_MEMBER_COLOR.to_string(),
                    role,
                    age: None,
                    room: None,
                    email: None,
                    phone: None,
                    bio: None,
                }
            }
        };

        if let Some(name) = blank_to_none(self.name) {
            member.name = name;
        }
        if let Some(color) = blank_to_none(self.color) {
            member.color = color;
        }
        if let Some(email) = blank_to_none(self.email) {
            member.email = Some(email);
        }
        member.age = self.age.or(member.age);
        member.room = blank_to_none(self.room);
        member.phone = blank_to_none(self.phone);
        member.bio = blank_to_none(self.bio);

        Ok(member)
    }
}

/// Partial update; `null` or `""` clears an optional field
#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateMemberRequest {
    #[validate(
        length(min = 2, max = 50, message = "Name must be between 2 and 50 characters"),
        custom(function = "not_blank")
    )]
    pub name: Option<String>,

    #[validate(custom(function = "valid_color"))]
    pub color: Option<String>,

    #[validate(length(min = 1, max = 30, message = "Role must be between 1 and 30 characters"))]
    pub role: Option<String>,

    #[serde(default, deserialize_with = "double_option")]
    #[validate(range(min = 1, max = 120, message = "Age must be between 1 and 120"))]
    pub age: Option<Option<i32>>,

    #[serde(default, deserialize_with = "double_option")]
    #[validate(length(max = 50, message = "Room name must be less than 50 characters"))]
    pub room: Option<Option<String>>,

    #[serde(default, deserialize_with = "double_option")]
    #[validate(
        custom(function = "optional_email"),
        length(max = 100, message = "Email must be less than 100 characters")
    )]
    pub email: Option<Option<String>>,

    #[serde(default, deserialize_with = "double_option")]
    #[validate(custom(function = "valid_phone"))]
    pub phone: Option<Option<String>>,

    #[serde(default, deserialize_with = "double_option")]
    #[validate(length(max = 500, message = "Bio must be less than 500 characters"))]
    pub bio: Option<Option<String>>,
}

impl From<UpdateMemberRequest> for UpdateMember {
    fn from(req: UpdateMemberRequest) -> Self {
        UpdateMember {
            name: req.name.map(|n| n.trim().to_string()),
            color: req.color.map(|c| c.trim().to_string()),
            role: req.role.map(|r| r.trim().to_string()),
            age: req.age,
            room: req.room.map(blank_to_none),
            email: req.email.map(blank_to_none),
            phone: req.phone.map(blank_to_none),
            bio: req.bio.map(blank_to_none),
        }
    }
}

fn member_not_found() -> ApiError {
    ApiError::NotFound("Member not found in this household".to_string())
}

/// # Errors
///
/// - `404 Not Found`: `user_id` names no account
/// - `409 Conflict`: the account is already linked, or the email is already
///   used in this household
pub async fn add_member(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Path(household_id): Path<Uuid>,
    ValidJson(req): ValidJson<AddMemberRequest>,
) -> ApiResult<(StatusCode, Json<Member>)> {
    require_household_access(&state.db, &session, household_id).await?;

    let linked = match req.user_id {
        Some(user_id) => Some(
            User::find_by_id(&state.db, user_id)
                .await?
                .ok_or_else(|| ApiError::NotFound(format!("User with id {} not found", user_id)))?,
        ),
        None => None,
    };

    let data = req.into_member(household_id, linked.as_ref())?;
    let member = Member::create(&state.db, data).await?;

    Ok((StatusCode::CREATED, Json(member)))
}

pub async fn update_member(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Path((household_id, member_id)): Path<(Uuid, Uuid)>,
    ValidJson(req): ValidJson<UpdateMemberRequest>,
) -> ApiResult<Json<Member>> {
    require_household_access(&state.db, &session, household_id).await?;

    let member = Member::update(&state.db, household_id, member_id, req.into())
        .await?
        .ok_or_else(member_not_found)?;

    tracing::info!(household_id = %household_id, member_id = %member_id, "Member updated");
    Ok(Json(member))
}

/// # Errors
///
/// - `404 Not Found`: the member is not in this household
/// - `409 Conflict`: tasks are still assigned to the member
pub async fn remove_member(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Path((household_id, member_id)): Path<(Uuid, Uuid)>,
) -> ApiResult<StatusCode> {
    require_household_access(&state.db, &session, household_id).await?;

    Member::remove(&state.db, household_id, member_id).await?;

    Ok(StatusCode::NO_CONTENT)
}

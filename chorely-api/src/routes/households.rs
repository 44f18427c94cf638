/// Household endpoints
///
/// - `GET /v1/households` - every household (admin) or the caller's own
/// - `POST /v1/households` - create; the caller becomes the "Owner" member
/// - `GET /v1/households/:id` - household with nested members and tasks
/// - `PUT /v1/households/:id` - edit attributes
/// - `DELETE /v1/households/:id` - delete with comments, history, tasks and members
///
/// Non-admins may only touch households they have a member profile in; for
/// anything else they get 403, whether or not the household exists.

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
        household::{
            CreateHousehold, Household, HouseholdDeletion, HouseholdDetail, HouseType,
            UpdateHousehold,
        },
        member::Member,
        user::User,
    },
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
pub struct CreateHouseholdRequest {
    #[validate(
        length(min = 2, max = 50, message = "Household name must be between 2 and 50 characters"),
        custom(function = "not_blank")
    )]
    pub name: String,

    #[validate(range(min = 1, max = 50, message = "Number of rooms must be between 1 and 50"))]
    pub number_of_rooms: Option<i32>,

    /// m²
    #[validate(range(min = 10.0, max = 10000.0, message = "House size must be between 10 and 10,000 m²"))]
    pub house_size: Option<f64>,

    #[validate(range(min = 1, max = 20, message = "Number of floors must be between 1 and 20"))]
    pub number_of_floors: Option<i32>,

    #[validate(length(max = 200, message = "Address must be less than 200 characters"))]
    pub address: Option<String>,

    pub house_type: Option<HouseType>,

    #[serde(default)]
    pub has_garden: bool,
    #[serde(default)]
    pub has_garage: bool,
    #[serde(default)]
    pub has_basement: bool,
    #[serde(default)]
    pub has_attic: bool,

    #[validate(length(max = 500, message = "Description must be less than 500 characters"))]
    pub description: Option<String>,
}

impl From<CreateHouseholdRequest> for CreateHousehold {
    fn from(req: CreateHouseholdRequest) -> Self {
        CreateHousehold {
            name: req.name.trim().to_string(),
            number_of_rooms: req.number_of_rooms,
            house_size: req.house_size,
            number_of_floors: req.number_of_floors,
            address: blank_to_none(req.address),
            house_type: req.house_type,
            has_garden: req.has_garden,
            has_garage: req.has_garage,
            has_basement: req.has_basement,
            has_attic: req.has_attic,
            description: blank_to_none(req.description),
        }
    }
}

/// Partial update; `null` clears an optional attribute
#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateHouseholdRequest {
    #[validate(
        length(min = 2, max = 50, message = "Household name must be between 2 and 50 characters"),
        custom(function = "not_blank")
    )]
    pub name: Option<String>,

    #[serde(default, deserialize_with = "double_option")]
    #[validate(range(min = 1, max = 50, message = "Number of rooms must be between 1 and 50"))]
    pub number_of_rooms: Option<Option<i32>>,

    #[serde(default, deserialize_with = "double_option")]
    #[validate(range(min = 10.0, max = 10000.0, message = "House size must be between 10 and 10,000 m²"))]
    pub house_size: Option<Option<f64>>,

    #[serde(default, deserialize_with = "double_option")]
    #[validate(range(min = 1, max = 20, message = "Number of floors must be between 1 and 20"))]
    pub number_of_floors: Option<Option<i32>>,

    #[serde(default, deserialize_with = "double_option")]
    #[validate(length(max = 200, message = "Address must be less than 200 characters"))]
    pub address: Option<Option<String>>,

    #[serde(default, deserialize_with = "double_option")]
    pub house_type: Option<Option<HouseType>>,

    pub has_garden: Option<bool>,
    pub has_garage: Option<bool>,
    pub has_basement: Option<bool>,
    pub has_attic: Option<bool>,

    #[serde(default, deserialize_with = "double_option")]
    #[validate(length(max = 500, message = "Description must be less than 500 characters"))]
    pub description: Option<Option<String>>,
}

impl From<UpdateHouseholdRequest> for UpdateHousehold {
    fn from(req: UpdateHouseholdRequest) -> Self {
        UpdateHousehold {
            name: req.name.map(|n| n.trim().to_string()),
            number_of_rooms: req.number_of_rooms,
            house_size: req.house_size,
            number_of_floors: req.number_of_floors,
            address: req.address.map(blank_to_none),
            house_type: req.house_type,
            has_garden: req.has_garden,
            has_garage: req.has_garage,
            has_basement: req.has_basement,
            has_attic: req.has_attic,
            description: req.description.map(blank_to_none),
        }
    }
}

/// Newly created household and the caller's owner profile
#[derive(Debug, Serialize)]
pub struct CreatedHousehold {
    #[serde(flatten)]
    pub household: Household,
    pub owner: Member,
}

#[derive(Debug, Serialize)]
pub struct DeletedHousehold {
    pub id: Uuid,
    pub deleted: HouseholdDeletion,
}

fn household_not_found(id: Uuid) -> ApiError {
    ApiError::NotFound(format!("Household with id {} not found", id))
}

pub async fn list_households(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
) -> ApiResult<Json<Vec<HouseholdDetail>>> {
    let households = if session.is_admin() {
        Household::list_all(&state.db).await?
    } else {
        Household::list_for_user(&state.db, session.user_id).await?
    };

    Ok(Json(Household::with_details(&state.db, households).await?))
}

pub async fn create_household(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    ValidJson(req): ValidJson<CreateHouseholdRequest>,
) -> ApiResult<(StatusCode, Json<CreatedHousehold>)> {
    let owner = User::find_by_id(&state.db, session.user_id)
        .await?
        .ok_or_else(|| ApiError::Unauthorized("Account no longer exists".to_string()))?;

    let (household, owner) = Household::create_with_owner(&state.db, req.into(), &owner).await?;

    Ok((StatusCode::CREATED, Json(CreatedHousehold { household, owner })))
}

pub async fn get_household(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<HouseholdDetail>> {
    require_household_access(&state.db, &session, id).await?;

    let detail = Household::detail(&state.db, id)
        .await?
        .ok_or_else(|| household_not_found(id))?;

    Ok(Json(detail))
}

pub async fn update_household(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Path(id): Path<Uuid>,
    ValidJson(req): ValidJson<UpdateHouseholdRequest>,
) -> ApiResult<Json<Household>> {
    require_household_access(&state.db, &session, id).await?;

    let household = Household::update(&state.db, id, req.into())
        .await?
        .ok_or_else(|| household_not_found(id))?;

    tracing::info!(household_id = %id, updated_by = %session.user_id, "Household updated");
    Ok(Json(household))
}

/// Deletes the household and everything that belongs to it
///
/// Runs in one transaction; a failure leaves every row in place.
pub async fn delete_household(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<DeletedHousehold>> {
    require_household_access(&state.db, &session, id).await?;

    let deleted = Household::delete_cascade(&state.db, id).await?;

    tracing::info!(
        household_id = %id,
        deleted_by = %session.user_id,
        tasks = deleted.tasks,
        members = deleted.members,
        "Household deleted"
    );
    Ok(Json(DeletedHousehold { id, deleted }))
}

//! API request handlers.

use axum::{
    Json,
    extract::{Path, State, rejection::JsonRejection},
};
use serde::Serialize;
use tracing::{info, instrument, warn};

use crate::auth::CurrentUser;
use crate::user::policy::{self, UserAction};
use crate::user::validation::{UpdateUserRequest, ValidationFailure, parse_user_id};
use crate::user::{DeletedUser, UserInfo};

use super::error::{ApiError, ApiResult};
use super::state::AppState;

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
}

/// Health check endpoint.
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

#[derive(Debug, Serialize)]
pub struct UserListResponse {
    pub message: &'static str,
    pub users: Vec<UserInfo>,
    pub count: usize,
}

#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub message: &'static str,
    pub user: UserInfo,
}

#[derive(Debug, Serialize)]
pub struct DeletedUserResponse {
    pub message: &'static str,
    pub user: DeletedUser,
}

/// List all users.
#[instrument(skip(state, _caller))]
pub async fn list_users(
    State(state): State<AppState>,
    _caller: CurrentUser,
) -> ApiResult<Json<UserListResponse>> {
    info!("Listing users");

    let users: Vec<UserInfo> = state
        .users
        .list_users()
        .await?
        .into_iter()
        .map(UserInfo::from)
        .collect();

    Ok(Json(UserListResponse {
        message: "Successfully retrieved all users",
        count: users.len(),
        users,
    }))
}

/// Get a single user.
#[instrument(skip(state, _caller))]
pub async fn get_user(
    State(state): State<AppState>,
    _caller: CurrentUser,
    Path(raw_id): Path<String>,
) -> ApiResult<Json<UserResponse>> {
    let id = parse_user_id(&raw_id)?;
    info!(user_id = id, "Getting user");

    let user = state.users.get_user(id).await?;

    Ok(Json(UserResponse {
        message: "Successfully retrieved user",
        user: user.into(),
    }))
}

/// Update a user. Non-admins may only update themselves and may not set a role.
#[instrument(skip(state, caller, body), fields(caller_id = caller.id))]
pub async fn update_user(
    State(state): State<AppState>,
    caller: CurrentUser,
    Path(raw_id): Path<String>,
    body: Result<Json<UpdateUserRequest>, JsonRejection>,
) -> ApiResult<Json<UserResponse>> {
    let id = parse_user_id(&raw_id)?;

    let Json(request) =
        body.map_err(|rejection| ValidationFailure::single(None, rejection.body_text()))?;
    let changes = request.into_changes()?;

    let action = UserAction::Update {
        changes_role: changes.role.is_some(),
    };
    if let Err(denial) = policy::authorize(&caller, id, action) {
        warn!(
            caller = %caller.email,
            target_id = id,
            reason = %denial,
            "Refused user update"
        );
        return Err(denial.into());
    }

    info!(user_id = id, "Updating user");
    let user = state.users.update_user(id, changes).await?;

    Ok(Json(UserResponse {
        message: "Successfully updated user",
        user: user.into(),
    }))
}

/// Delete a user. Admins cannot delete their own account.
#[instrument(skip(state, caller), fields(caller_id = caller.id))]
pub async fn delete_user(
    State(state): State<AppState>,
    caller: CurrentUser,
    Path(raw_id): Path<String>,
) -> ApiResult<Json<DeletedUserResponse>> {
    let id = parse_user_id(&raw_id)?;

    if let Err(denial) = policy::authorize(&caller, id, UserAction::Delete) {
        warn!(
            caller = %caller.email,
            target_id = id,
            reason = %denial,
            "Refused user deletion"
        );
        return Err(ApiError::from(denial));
    }

    info!(user_id = id, "Deleting user");
    let user = state.users.delete_user(id).await?;

    Ok(Json(DeletedUserResponse {
        message: "Successfully deleted user",
        user: user.into(),
    }))
}

//! User management HTTP handlers
//! Every operation establishes its target, consults the policy and then
//! delegates to the directory service.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde_json::json;
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

use crate::{
    auth::policy::{self, Action, Identity, Target},
    error::AppError,
    middleware::AppState,
    models::user::{
        ChangePasswordRequest, ChangeRoleRequest, CreateUserRequest, ListUsersQuery,
        UpdateUserRequest, UserProfile, UserResponse,
    },
};

/// List users. Admins see everyone and may filter freely; employees are
/// scoped to citizens inside the service.
pub async fn list_users(
    State(state): State<Arc<AppState>>,
    identity: Identity,
    Query(query): Query<ListUsersQuery>,
) -> Result<impl IntoResponse, AppError> {
    policy::authorize(&identity, Action::ListUsers, None)?;

    let page = state.user_service.list(&identity, query).await?;

    Ok(Json(json!({
        "message": "Users fetched successfully",
        "data": page,
    })))
}

/// Create a user with an explicit role. An employee requesting any role
/// other than citizen is denied before anything touches the directory.
pub async fn create_user(
    State(state): State<Arc<AppState>>,
    identity: Identity,
    Json(mut req): Json<CreateUserRequest>,
) -> Result<impl IntoResponse, AppError> {
    req.normalize();
    req.validate()?;

    policy::authorize(&identity, Action::CreateUser, Some(&Target::with_role(req.role)))?;

    let user = state.user_service.create(req).await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "User created successfully",
            "username": user.username,
        })),
    ))
}

/// Current user's profile
pub async fn get_profile(
    State(state): State<Arc<AppState>>,
    identity: Identity,
) -> Result<impl IntoResponse, AppError> {
    let user = state.user_service.get(identity.id).await?;

    policy::authorize(&identity, Action::ReadUser, Some(&user.as_target()))?;

    Ok(Json(json!({
        "message": "User fetched successfully",
        "user": UserProfile::from(user),
    })))
}

/// Update the current user's profile
pub async fn update_profile(
    State(state): State<Arc<AppState>>,
    identity: Identity,
    Json(mut req): Json<UpdateUserRequest>,
) -> Result<impl IntoResponse, AppError> {
    req.normalize();
    req.validate()?;

    let target = state.user_service.get(identity.id).await?;
    policy::authorize(&identity, Action::UpdateUser, Some(&target.as_target()))?;

    let user = state.user_service.update(identity.id, req).await?;

    Ok(Json(json!({
        "message": "User profile updated successfully",
        "user": UserProfile::from(user),
    })))
}

/// Change the current user's password
pub async fn change_password(
    State(state): State<Arc<AppState>>,
    identity: Identity,
    Json(req): Json<ChangePasswordRequest>,
) -> Result<impl IntoResponse, AppError> {
    req.validate()?;

    policy::authorize(
        &identity,
        Action::ChangePassword,
        Some(&Target::subject(identity.id, identity.role)),
    )?;

    state.user_service.change_password(identity.id, req).await?;

    Ok(Json(json!({ "message": "Password changed successfully" })))
}

/// Fetch a user by ID
pub async fn get_user(
    State(state): State<Arc<AppState>>,
    identity: Identity,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let user = state.user_service.get(id).await?;

    policy::authorize(&identity, Action::ReadUser, Some(&user.as_target()))?;

    Ok(Json(json!({
        "message": "User fetched successfully",
        "user": UserProfile::from(user),
    })))
}

/// Update a user by ID
pub async fn update_user(
    State(state): State<Arc<AppState>>,
    identity: Identity,
    Path(id): Path<Uuid>,
    Json(mut req): Json<UpdateUserRequest>,
) -> Result<impl IntoResponse, AppError> {
    req.normalize();
    req.validate()?;

    let target = state.user_service.get(id).await?;
    policy::authorize(&identity, Action::UpdateUser, Some(&target.as_target()))?;

    let user = state.user_service.update(id, req).await?;

    Ok(Json(json!({
        "message": "User updated successfully",
        "user": UserProfile::from(user),
    })))
}

/// Toggle a user's active flag
pub async fn toggle_active(
    State(state): State<Arc<AppState>>,
    identity: Identity,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let target = state.user_service.get(id).await?;
    policy::authorize(&identity, Action::ToggleActive, Some(&target.as_target()))?;

    let user = state.user_service.toggle_active(id).await?;

    Ok(Json(json!({
        "message": "User active status toggled",
        "user": UserResponse::from(user),
    })))
}

/// Change a user's role (admin only, whatever the target)
pub async fn change_role(
    State(state): State<Arc<AppState>>,
    identity: Identity,
    Path(id): Path<Uuid>,
    Json(req): Json<ChangeRoleRequest>,
) -> Result<impl IntoResponse, AppError> {
    policy::authorize(&identity, Action::ChangeRole, None)?;

    let user = state.user_service.change_role(id, req.role).await?;

    Ok(Json(json!({
        "message": "User role changed successfully",
        "user": UserResponse::from(user),
    })))
}

/// Delete a user (admin only, whatever the target)
pub async fn delete_user(
    State(state): State<Arc<AppState>>,
    identity: Identity,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    policy::authorize(&identity, Action::DeleteUser, None)?;

    state.user_service.delete(identity.id, id).await?;

    Ok(Json(json!({ "message": "User deleted successfully" })))
}

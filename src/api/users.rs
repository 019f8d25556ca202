use axum::{Extension, Json, extract::State};
use std::sync::Arc;

use super::auth::CurrentUser;
use super::validation::{ApiJson, IdPath};
use super::{ApiError, AppState, UpdateUserRequest, UserDto};
use crate::models::{User, UserPatch};
use crate::services::AuthError;

fn require_superuser(user: &User) -> Result<(), AuthError> {
    if user.is_superuser {
        Ok(())
    } else {
        Err(AuthError::Forbidden)
    }
}

/// GET /users/me
pub async fn get_me(Extension(CurrentUser(user)): Extension<CurrentUser>) -> Json<UserDto> {
    Json(UserDto::from(user))
}

/// PATCH /users/me
///
/// Privileged flags in the body are ignored.
pub async fn update_me(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    ApiJson(payload): ApiJson<UpdateUserRequest>,
) -> Result<Json<UserDto>, ApiError> {
    let patch = UserPatch::from(payload).without_privileged_fields();
    let updated = state.auth_service().update_user(user.id, patch).await?;
    Ok(Json(UserDto::from(updated)))
}

/// GET /users/{id}
pub async fn get_user(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(caller)): Extension<CurrentUser>,
    IdPath(id): IdPath,
) -> Result<Json<UserDto>, ApiError> {
    require_superuser(&caller)?;
    let user = state.auth_service().get_user(id).await?;
    Ok(Json(UserDto::from(user)))
}

/// PATCH /users/{id}
pub async fn update_user(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(caller)): Extension<CurrentUser>,
    IdPath(id): IdPath,
    ApiJson(payload): ApiJson<UpdateUserRequest>,
) -> Result<Json<UserDto>, ApiError> {
    require_superuser(&caller)?;
    let updated = state
        .auth_service()
        .update_user(id, UserPatch::from(payload))
        .await?;
    Ok(Json(UserDto::from(updated)))
}

/// DELETE /users/{id}
///
/// Accounts are never deleted.
pub async fn delete_user() -> ApiError {
    ApiError::MethodNotAllowed
}

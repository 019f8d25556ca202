use axum::{Extension, Json, extract::State, http::StatusCode};
use std::sync::Arc;

use super::auth::CurrentUser;
use super::validation::{ApiJson, IdPath};
use super::{
    ApiError, AppState, CreatePostRequest, LikeCountDto, PostDto, PostLikeDto, UpdatePostRequest,
};

/// POST /Post/
pub async fn create_post(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    ApiJson(payload): ApiJson<CreatePostRequest>,
) -> Result<(StatusCode, Json<PostDto>), ApiError> {
    let post = state
        .post_service()
        .create_post(&user, payload.into())
        .await?;
    Ok((StatusCode::CREATED, Json(PostDto::from(post))))
}

/// GET /Post/
pub async fn list_posts(State(state): State<Arc<AppState>>) -> Result<Json<Vec<PostDto>>, ApiError> {
    let posts = state.post_service().list_posts().await?;
    Ok(Json(posts.into_iter().map(PostDto::from).collect()))
}

/// GET /Post/my_likes
pub async fn my_likes(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
) -> Result<Json<LikeCountDto>, ApiError> {
    let my_likes_count = state.post_service().count_likes_by_user(&user).await?;
    Ok(Json(LikeCountDto { my_likes_count }))
}

/// GET /Post/{id}
pub async fn get_post(
    State(state): State<Arc<AppState>>,
    IdPath(id): IdPath,
) -> Result<Json<PostDto>, ApiError> {
    let post = state.post_service().get_post(id).await?;
    Ok(Json(PostDto::from(post)))
}

/// PATCH /Post/{id}
pub async fn update_post(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    IdPath(id): IdPath,
    ApiJson(payload): ApiJson<UpdatePostRequest>,
) -> Result<Json<PostDto>, ApiError> {
    let post = state
        .post_service()
        .update_post(id, &user, payload.into())
        .await?;
    Ok(Json(PostDto::from(post)))
}

/// DELETE /Post/{id}
pub async fn delete_post(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    IdPath(id): IdPath,
) -> Result<Json<PostDto>, ApiError> {
    let post = state.post_service().delete_post(id, &user).await?;
    Ok(Json(PostDto::from(post)))
}

/// POST /Post/{id}/like
pub async fn like_post(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    IdPath(id): IdPath,
) -> Result<(StatusCode, Json<PostLikeDto>), ApiError> {
    let like = state.post_service().like_post(id, &user).await?;
    Ok((StatusCode::CREATED, Json(PostLikeDto::from(like))))
}

/// DELETE /Post/{id}/remove_like
pub async fn remove_like(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    IdPath(id): IdPath,
) -> Result<StatusCode, ApiError> {
    state.post_service().unlike_post(id, &user).await?;
    Ok(StatusCode::NO_CONTENT)
}

//! Request guards. Each one does a single read and a single check, and
//! fails with a categorized error. None of them write.

use crate::db::Store;
use crate::models::{Post, PostLike, User};
use crate::services::{AuthError, PostError};

/// NOT_FOUND unless the post exists. Returns the loaded post.
pub async fn post_exists(store: &Store, post_id: i32) -> Result<Post, PostError> {
    store.get_post(post_id).await?.ok_or(PostError::NotFound)
}

/// FORBIDDEN unless `user` owns the post.
pub async fn is_post_owner(store: &Store, post_id: i32, user: &User) -> Result<Post, PostError> {
    let post = post_exists(store, post_id).await?;
    if !post.is_owned_by(user.id) {
        return Err(PostError::NotOwner);
    }
    Ok(post)
}

/// NOT_FOUND unless `user_id` has liked the post.
pub async fn like_exists(store: &Store, post_id: i32, user_id: i32) -> Result<PostLike, PostError> {
    store
        .get_like(post_id, user_id)
        .await?
        .ok_or(PostError::LikeNotFound)
}

/// FORBIDDEN if `user` owns the post.
pub async fn not_own_post(store: &Store, post_id: i32, user: &User) -> Result<(), PostError> {
    let post = post_exists(store, post_id).await?;
    if post.is_owned_by(user.id) {
        return Err(PostError::OwnPost);
    }
    Ok(())
}

/// CONFLICT if `user` already liked the post.
pub async fn no_duplicate_like(store: &Store, post_id: i32, user: &User) -> Result<(), PostError> {
    if store.get_like(post_id, user.id).await?.is_some() {
        return Err(PostError::DuplicateLike);
    }
    Ok(())
}

/// CONFLICT if another account already uses `email`.
pub async fn email_not_taken(store: &Store, email: &str) -> Result<(), AuthError> {
    if store.email_exists(email).await? {
        return Err(AuthError::EmailTaken);
    }
    Ok(())
}

/// CONFLICT if another account already uses `username`.
pub async fn username_not_taken(store: &Store, username: &str) -> Result<(), AuthError> {
    if store.username_exists(username).await? {
        return Err(AuthError::UsernameTaken);
    }
    Ok(())
}

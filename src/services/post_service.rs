//! Domain service for posts and likes.
//!
//! Every mutating operation runs its guards from [`super::validators`] in a
//! fixed order before touching storage.

use thiserror::Error;

use super::ErrorCategory;
use crate::models::{InvalidInput, NewPost, Post, PostLike, PostPatch, User};

/// Errors specific to post and like operations.
#[derive(Debug, Error)]
pub enum PostError {
    #[error("Post not found")]
    NotFound,

    #[error("Like not found")]
    LikeNotFound,

    #[error("Only the author can modify this post")]
    NotOwner,

    #[error("You cannot like your own post")]
    OwnPost,

    #[error("You have already liked this post")]
    DuplicateLike,

    #[error(transparent)]
    Validation(#[from] InvalidInput),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl PostError {
    #[must_use]
    pub const fn category(&self) -> ErrorCategory {
        match self {
            Self::NotFound | Self::LikeNotFound => ErrorCategory::NotFound,
            Self::NotOwner | Self::OwnPost => ErrorCategory::Forbidden,
            Self::DuplicateLike => ErrorCategory::Conflict,
            Self::Validation(_) => ErrorCategory::Validation,
            Self::Database(_) | Self::Internal(_) => ErrorCategory::Internal,
        }
    }
}

impl From<sea_orm::DbErr> for PostError {
    fn from(err: sea_orm::DbErr) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<anyhow::Error> for PostError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(format!("{err:#}"))
    }
}

/// Domain service trait for posts.
#[async_trait::async_trait]
pub trait PostService: Send + Sync {
    /// Creates a post owned by `author`.
    ///
    /// # Errors
    ///
    /// Returns [`PostError::Validation`] if the text is empty or too long.
    async fn create_post(&self, author: &User, input: NewPost) -> Result<Post, PostError>;

    /// Returns [`PostError::NotFound`] for a missing post.
    async fn get_post(&self, post_id: i32) -> Result<Post, PostError>;

    async fn list_posts(&self) -> Result<Vec<Post>, PostError>;

    /// Applies `patch` to a post owned by `user`.
    ///
    /// Existence and ownership are checked before the patch is validated, so a
    /// non-owner gets [`PostError::NotOwner`] whatever the body holds.
    async fn update_post(
        &self,
        post_id: i32,
        user: &User,
        patch: PostPatch,
    ) -> Result<Post, PostError>;

    /// Deletes a post owned by `user` and returns it.
    async fn delete_post(&self, post_id: i32, user: &User) -> Result<Post, PostError>;

    /// Likes a post: existence, then not-own-post, then no-duplicate, then insert.
    async fn like_post(&self, post_id: i32, user: &User) -> Result<PostLike, PostError>;

    /// Removes a like: existence, then like-exists, then delete.
    async fn unlike_post(&self, post_id: i32, user: &User) -> Result<(), PostError>;

    /// Number of likes `user` has given.
    async fn count_likes_by_user(&self, user: &User) -> Result<u64, PostError>;
}

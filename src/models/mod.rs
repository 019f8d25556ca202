pub mod post;
pub mod user;

pub use post::{NewPost, Post, PostLike, PostPatch};
pub use user::{NewUser, User, UserPatch, normalize_email};

use thiserror::Error;

/// A request field that failed a shape check (length, format).
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{message}")]
pub struct InvalidInput {
    pub field: &'static str,
    pub message: String,
}

impl InvalidInput {
    pub fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

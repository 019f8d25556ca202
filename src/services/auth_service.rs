//! Domain service for authentication and user management.
//!
//! Handles registration, login, token verification and profile edits.

use thiserror::Error;

use super::ErrorCategory;
use crate::db::UserWriteError;
use crate::models::{InvalidInput, NewUser, User, UserPatch};

/// Errors specific to authentication operations.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("LOGIN_BAD_CREDENTIALS")]
    InvalidCredentials,

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Not a superuser")]
    Forbidden,

    #[error("User not found")]
    UserNotFound,

    #[error("A user with this email already exists")]
    EmailTaken,

    #[error("A user with this username already exists")]
    UsernameTaken,

    #[error(transparent)]
    Validation(#[from] InvalidInput),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AuthError {
    #[must_use]
    pub const fn category(&self) -> ErrorCategory {
        match self {
            Self::InvalidCredentials => ErrorCategory::BadCredentials,
            Self::Unauthorized => ErrorCategory::Unauthorized,
            Self::Forbidden => ErrorCategory::Forbidden,
            Self::UserNotFound => ErrorCategory::NotFound,
            Self::EmailTaken | Self::UsernameTaken => ErrorCategory::Conflict,
            Self::Validation(_) => ErrorCategory::Validation,
            Self::Database(_) | Self::Internal(_) => ErrorCategory::Internal,
        }
    }
}

impl From<sea_orm::DbErr> for AuthError {
    fn from(err: sea_orm::DbErr) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<UserWriteError> for AuthError {
    fn from(err: UserWriteError) -> Self {
        match err {
            UserWriteError::EmailTaken => Self::EmailTaken,
            UserWriteError::UsernameTaken => Self::UsernameTaken,
            UserWriteError::Other(err) => err.into(),
        }
    }
}

impl From<anyhow::Error> for AuthError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(format!("{err:#}"))
    }
}

/// Login form contents. The form field is called `username` but carries the
/// email address.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone)]
pub struct AccessToken {
    pub token: String,
    pub expires_in: i64,
}

/// Domain service trait for authentication.
#[async_trait::async_trait]
pub trait AuthService: Send + Sync {
    /// Creates an account and kicks off email verification in the background.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::EmailTaken`] or [`AuthError::UsernameTaken`] on
    /// collisions and [`AuthError::Validation`] for malformed input.
    async fn register(&self, input: NewUser) -> Result<User, AuthError>;

    /// Exchanges credentials for a signed access token.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::InvalidCredentials`] for an unknown email, a wrong
    /// password or an inactive account.
    async fn authenticate(&self, credentials: Credentials) -> Result<AccessToken, AuthError>;

    /// Resolves a bearer token to an active user.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Unauthorized`] if the token is malformed, expired,
    /// or names a missing or inactive user.
    async fn verify(&self, token: &str) -> Result<User, AuthError>;

    async fn get_user(&self, user_id: i32) -> Result<User, AuthError>;

    /// Applies `patch` to a user. Callers strip privileged fields for
    /// self-service edits.
    async fn update_user(&self, user_id: i32, patch: UserPatch) -> Result<User, AuthError>;

    /// Creates the bootstrap superuser. Returns `None` if the email is already
    /// registered.
    async fn create_first_superuser(
        &self,
        email: &str,
        password: &str,
        username: &str,
    ) -> Result<Option<User>, AuthError>;
}

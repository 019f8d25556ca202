use axum::{
    Json,
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use std::fmt;

use super::ErrorBody;
use crate::services::{AuthError, ErrorCategory, PostError};

#[derive(Debug)]
pub enum ApiError {
    NotFound(String),

    Forbidden(String),

    Conflict(String),

    ValidationError(String),

    Unauthorized(String),

    BadCredentials,

    MethodNotAllowed,

    DatabaseError(String),

    InternalError(String),
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::NotFound(msg) => write!(f, "Not found: {}", msg),
            ApiError::Forbidden(msg) => write!(f, "Forbidden: {}", msg),
            ApiError::Conflict(msg) => write!(f, "Conflict: {}", msg),
            ApiError::ValidationError(msg) => write!(f, "Validation error: {}", msg),
            ApiError::Unauthorized(msg) => write!(f, "Unauthorized: {}", msg),
            ApiError::BadCredentials => write!(f, "{}", BAD_CREDENTIALS),
            ApiError::MethodNotAllowed => write!(f, "Method Not Allowed"),
            ApiError::DatabaseError(msg) => write!(f, "Database error: {}", msg),
            ApiError::InternalError(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for ApiError {}

/// Detail returned for a failed login.
pub const BAD_CREDENTIALS: &str = "LOGIN_BAD_CREDENTIALS";

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, detail) = match &self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            ApiError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg.clone()),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, msg.clone()),
            ApiError::ValidationError(msg) => (StatusCode::UNPROCESSABLE_ENTITY, msg.clone()),
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg.clone()),
            ApiError::BadCredentials => (StatusCode::BAD_REQUEST, BAD_CREDENTIALS.to_string()),
            ApiError::MethodNotAllowed => (
                StatusCode::METHOD_NOT_ALLOWED,
                "Method Not Allowed".to_string(),
            ),
            ApiError::DatabaseError(msg) => {
                tracing::error!("Database error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "A database error occurred".to_string(),
                )
            }
            ApiError::InternalError(msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "An internal error occurred".to_string(),
                )
            }
        };

        let mut response = (status, Json(ErrorBody { detail })).into_response();
        if status == StatusCode::UNAUTHORIZED {
            response
                .headers_mut()
                .insert(header::WWW_AUTHENTICATE, HeaderValue::from_static("Bearer"));
        }
        response
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        ApiError::InternalError(format!("{err:#}"))
    }
}

impl From<PostError> for ApiError {
    fn from(err: PostError) -> Self {
        match err.category() {
            ErrorCategory::NotFound => ApiError::NotFound(err.to_string()),
            ErrorCategory::Forbidden => ApiError::Forbidden(err.to_string()),
            ErrorCategory::Conflict => ApiError::Conflict(err.to_string()),
            ErrorCategory::Validation => ApiError::ValidationError(err.to_string()),
            ErrorCategory::Unauthorized => ApiError::Unauthorized(err.to_string()),
            ErrorCategory::BadCredentials => ApiError::BadCredentials,
            ErrorCategory::Internal => match err {
                PostError::Database(msg) => ApiError::DatabaseError(msg),
                other => ApiError::InternalError(other.to_string()),
            },
        }
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err.category() {
            ErrorCategory::NotFound => ApiError::NotFound(err.to_string()),
            ErrorCategory::Forbidden => ApiError::Forbidden(err.to_string()),
            ErrorCategory::Conflict => ApiError::Conflict(err.to_string()),
            ErrorCategory::Validation => ApiError::ValidationError(err.to_string()),
            ErrorCategory::Unauthorized => ApiError::Unauthorized(err.to_string()),
            ErrorCategory::BadCredentials => ApiError::BadCredentials,
            ErrorCategory::Internal => match err {
                AuthError::Database(msg) => ApiError::DatabaseError(msg),
                other => ApiError::InternalError(other.to_string()),
            },
        }
    }
}

impl ApiError {
    pub fn validation(msg: impl Into<String>) -> Self {
        ApiError::ValidationError(msg.into())
    }

    pub fn unauthorized() -> Self {
        ApiError::Unauthorized("Unauthorized".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::InvalidInput;

    #[test]
    fn post_errors_map_to_status() {
        let cases = [
            (PostError::NotFound, StatusCode::NOT_FOUND),
            (PostError::LikeNotFound, StatusCode::NOT_FOUND),
            (PostError::NotOwner, StatusCode::FORBIDDEN),
            (PostError::OwnPost, StatusCode::FORBIDDEN),
            (PostError::DuplicateLike, StatusCode::CONFLICT),
            (
                PostError::Validation(InvalidInput::new("text", "too long")),
                StatusCode::UNPROCESSABLE_ENTITY,
            ),
            (
                PostError::Database("locked".to_string()),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (err, status) in cases {
            assert_eq!(ApiError::from(err).into_response().status(), status);
        }
    }

    #[test]
    fn auth_errors_map_to_status() {
        assert_eq!(
            ApiError::from(AuthError::InvalidCredentials)
                .into_response()
                .status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::from(AuthError::EmailTaken).into_response().status(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            ApiError::from(AuthError::UsernameTaken)
                .into_response()
                .status(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            ApiError::from(AuthError::Forbidden).into_response().status(),
            StatusCode::FORBIDDEN
        );

        let response = ApiError::from(AuthError::Unauthorized).into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            response.headers().get(header::WWW_AUTHENTICATE).unwrap(),
            "Bearer"
        );
    }
}

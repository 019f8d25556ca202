use axum::{
    Json,
    extract::{Request, State},
    http::{HeaderMap, StatusCode, header},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;

use super::validation::{ApiForm, ApiJson, validate_login_field};
use super::{ApiError, AppState, LoginForm, RegisterRequest, TokenDto, UserDto};
use crate::models::{NewUser, User};
use crate::services::Credentials;

/// The authenticated caller, inserted by [`auth_middleware`].
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

/// Id of the caller, attached to the response for request logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthenticatedUser(pub i32);

// ============================================================================
// Middleware
// ============================================================================

/// Resolves `Authorization: Bearer <jwt>` to an active user.
pub async fn auth_middleware(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = extract_bearer_token(&headers).ok_or_else(ApiError::unauthorized)?;

    let user = state.auth_service().verify(token).await?;
    let user_id = user.id;
    tracing::Span::current().record("user_id", user_id);

    request.extensions_mut().insert(CurrentUser(user));
    let mut response = next.run(request).await;
    response
        .extensions_mut()
        .insert(AuthenticatedUser(user_id));
    Ok(response)
}

fn extract_bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim();
    (!token.is_empty()).then_some(token)
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /auth/jwt/login
pub async fn login(
    State(state): State<Arc<AppState>>,
    ApiForm(form): ApiForm<LoginForm>,
) -> Result<Json<TokenDto>, ApiError> {
    let email = validate_login_field("username", &form.username)?;
    let password = validate_login_field("password", &form.password)?;

    let token = state
        .auth_service()
        .authenticate(Credentials {
            email: email.to_string(),
            password: password.to_string(),
        })
        .await?;

    Ok(Json(TokenDto::from(token)))
}

/// POST /auth/jwt/logout
///
/// Tokens are stateless, so there is nothing to revoke.
pub async fn logout() -> StatusCode {
    StatusCode::NO_CONTENT
}

/// POST /auth/register
pub async fn register(
    State(state): State<Arc<AppState>>,
    ApiJson(payload): ApiJson<RegisterRequest>,
) -> Result<(StatusCode, Json<UserDto>), ApiError> {
    let user = state
        .auth_service()
        .register(NewUser {
            email: payload.email,
            password: payload.password,
            username: payload.username,
            is_superuser: false,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(UserDto::from(user))))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn bearer_token_extraction() {
        assert_eq!(extract_bearer_token(&headers("Bearer abc")), Some("abc"));
        assert_eq!(extract_bearer_token(&headers("bearer abc ")), Some("abc"));
        assert_eq!(extract_bearer_token(&headers("Basic abc")), None);
        assert_eq!(extract_bearer_token(&headers("Bearer ")), None);
        assert_eq!(extract_bearer_token(&HeaderMap::new()), None);
    }
}

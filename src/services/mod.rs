pub mod validators;

pub mod token;
pub use token::{Claims, TOKEN_AUDIENCE, TokenIssuer};

pub mod post_service;
pub mod post_service_impl;
pub use post_service::{PostError, PostService};
pub use post_service_impl::SeaOrmPostService;

pub mod auth_service;
pub mod auth_service_impl;
pub use auth_service::{AccessToken, AuthError, AuthService, Credentials};
pub use auth_service_impl::SeaOrmAuthService;

/// Coarse error classes shared by every service. The HTTP layer maps each
/// class to one status code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    NotFound,
    Forbidden,
    Conflict,
    Validation,
    Unauthorized,
    BadCredentials,
    Internal,
}

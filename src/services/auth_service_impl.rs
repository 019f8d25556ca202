//! `SeaORM` implementation of the `AuthService` trait.

use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, info};

use crate::clients::{EmailVerifier, spawn_verification};
use crate::config::SecurityConfig;
use crate::db::{Store, UserWriteError};
use crate::models::{NewUser, User, UserPatch, normalize_email};
use crate::services::auth_service::{AccessToken, AuthError, AuthService, Credentials};
use crate::services::token::TokenIssuer;
use crate::services::validators;

pub struct SeaOrmAuthService {
    store: Store,
    tokens: TokenIssuer,
    security: SecurityConfig,
    email_verifier: Option<Arc<dyn EmailVerifier>>,
}

impl SeaOrmAuthService {
    #[must_use]
    pub fn new(
        store: Store,
        tokens: TokenIssuer,
        security: SecurityConfig,
        email_verifier: Option<Arc<dyn EmailVerifier>>,
    ) -> Self {
        Self {
            store,
            tokens,
            security,
            email_verifier,
        }
    }

    async fn check_unique(
        &self,
        email: Option<&str>,
        username: Option<&str>,
    ) -> Result<(), AuthError> {
        if let Some(email) = email {
            validators::email_not_taken(&self.store, email).await?;
        }
        if let Some(username) = username {
            validators::username_not_taken(&self.store, username).await?;
        }
        Ok(())
    }
}

#[async_trait]
impl AuthService for SeaOrmAuthService {
    async fn register(&self, input: NewUser) -> Result<User, AuthError> {
        let input = NewUser {
            email: normalize_email(&input.email),
            ..input
        };
        input.validate()?;
        self.check_unique(Some(input.email.as_str()), Some(input.username.as_str()))
            .await?;

        let user = self.store.create_user(&input, &self.security).await?;
        info!(user_id = user.id, email = %user.email, "User registered");
        metrics::counter!("postwall_users_registered_total").increment(1);

        if let Some(verifier) = &self.email_verifier {
            spawn_verification(Arc::clone(verifier), user.email.clone());
        }

        Ok(user)
    }

    async fn authenticate(&self, credentials: Credentials) -> Result<AccessToken, AuthError> {
        let email = normalize_email(&credentials.email);
        let user = self
            .store
            .verify_user_password(&email, &credentials.password)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        if !user.is_active {
            return Err(AuthError::InvalidCredentials);
        }

        let token = self.tokens.issue(user.id)?;
        debug!(user_id = user.id, "Access token issued");

        Ok(AccessToken {
            token,
            expires_in: self.tokens.lifetime_seconds(),
        })
    }

    async fn verify(&self, token: &str) -> Result<User, AuthError> {
        let claims = self
            .tokens
            .decode(token)
            .map_err(|_| AuthError::Unauthorized)?;
        let user_id = claims.user_id().ok_or(AuthError::Unauthorized)?;

        let user = self
            .store
            .get_user(user_id)
            .await?
            .ok_or(AuthError::Unauthorized)?;

        if !user.is_active {
            return Err(AuthError::Unauthorized);
        }

        Ok(user)
    }

    async fn get_user(&self, user_id: i32) -> Result<User, AuthError> {
        self.store
            .get_user(user_id)
            .await?
            .ok_or(AuthError::UserNotFound)
    }

    async fn update_user(&self, user_id: i32, patch: UserPatch) -> Result<User, AuthError> {
        let patch = UserPatch {
            email: patch.email.as_deref().map(normalize_email),
            ..patch
        };
        let current = self.get_user(user_id).await?;
        patch.validate(&current)?;

        let new_email = patch.email.as_deref().filter(|e| *e != current.email);
        let new_username = patch
            .username
            .as_deref()
            .filter(|u| *u != current.username);
        self.check_unique(new_email, new_username).await?;

        let user = self
            .store
            .update_user(user_id, &patch, &self.security)
            .await?;
        debug!(user_id, "User updated");
        Ok(user)
    }

    async fn create_first_superuser(
        &self,
        email: &str,
        password: &str,
        username: &str,
    ) -> Result<Option<User>, AuthError> {
        let email = normalize_email(email);
        if self.store.email_exists(&email).await? {
            debug!(email = %email, "Bootstrap superuser already exists");
            return Ok(None);
        }

        let input = NewUser {
            email,
            password: password.to_string(),
            username: username.to_string(),
            is_superuser: true,
        };
        input.validate()?;
        validators::username_not_taken(&self.store, username).await?;

        let user = match self.store.create_user(&input, &self.security).await {
            Ok(user) => user,
            Err(UserWriteError::EmailTaken) => {
                debug!(email = %input.email, "Bootstrap superuser created concurrently");
                return Ok(None);
            }
            Err(e) => return Err(e.into()),
        };
        info!(user_id = user.id, email = %user.email, "Bootstrap superuser created");
        Ok(Some(user))
    }
}

use anyhow::{Context, Result};
use argon2::{
    Algorithm, Argon2, Params, Version,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, PaginatorTrait,
    QueryFilter, Set, SqlErr,
};
use tokio::task;

use super::base::CrudRepository;
use crate::config::SecurityConfig;
use crate::entities::users;
use crate::models::{NewUser, User, UserPatch};

/// Failure modes of user writes that callers must tell apart.
#[derive(Debug, thiserror::Error)]
pub enum UserWriteError {
    #[error("email already registered")]
    EmailTaken,

    #[error("username already taken")]
    UsernameTaken,

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl From<DbErr> for UserWriteError {
    fn from(err: DbErr) -> Self {
        match err.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(msg)) if msg.contains("username") => {
                Self::UsernameTaken
            }
            Some(SqlErr::UniqueConstraintViolation(_)) => Self::EmailTaken,
            _ => Self::Other(err.into()),
        }
    }
}

pub struct UserRepository {
    conn: DatabaseConnection,
}

impl UserRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    fn crud(&self) -> CrudRepository<users::Entity> {
        CrudRepository::new(self.conn.clone())
    }

    /// Hashes the password off the async runtime and inserts the user.
    /// A lost race on the unique email or username index is reported as
    /// the matching `*Taken` variant.
    pub async fn create(
        &self,
        input: &NewUser,
        security: &SecurityConfig,
    ) -> Result<User, UserWriteError> {
        let password = input.password.clone();
        let security = security.clone();
        let hashed_password = task::spawn_blocking(move || hash_password(&password, &security))
            .await
            .context("Password hashing task panicked")??;

        let now = chrono::Utc::now().to_rfc3339();

        let active = users::ActiveModel {
            email: Set(input.email.clone()),
            username: Set(input.username.clone()),
            hashed_password: Set(hashed_password),
            is_active: Set(true),
            is_superuser: Set(input.is_superuser),
            is_verified: Set(false),
            created_at: Set(now.clone()),
            updated_at: Set(now),
            ..Default::default()
        };

        let model = active.insert(&self.conn).await?;
        Ok(User::from(model))
    }

    pub async fn get_by_id(&self, id: i32) -> Result<Option<User>> {
        Ok(self.crud().get(id).await?.map(User::from))
    }

    pub async fn get_by_email(&self, email: &str) -> Result<Option<User>> {
        let user = users::Entity::find()
            .filter(users::Column::Email.eq(email))
            .one(&self.conn)
            .await
            .context("Failed to query user by email")?;

        Ok(user.map(User::from))
    }

    pub async fn email_exists(&self, email: &str) -> Result<bool> {
        let count = users::Entity::find()
            .filter(users::Column::Email.eq(email))
            .count(&self.conn)
            .await
            .context("Failed to count users by email")?;

        Ok(count > 0)
    }

    pub async fn username_exists(&self, username: &str) -> Result<bool> {
        let count = users::Entity::find()
            .filter(users::Column::Username.eq(username))
            .count(&self.conn)
            .await
            .context("Failed to count users by username")?;

        Ok(count > 0)
    }

    /// Returns the user when the email exists and the password matches.
    /// Note: This uses `spawn_blocking` because Argon2 hashing is CPU-intensive
    /// and would block the async runtime if run directly.
    pub async fn verify_password(&self, email: &str, password: &str) -> Result<Option<User>> {
        let user = users::Entity::find()
            .filter(users::Column::Email.eq(email))
            .one(&self.conn)
            .await
            .context("Failed to query user for password verification")?;

        let Some(user) = user else {
            return Ok(None);
        };

        let password_hash = user.hashed_password.clone();
        let password = password.to_string();

        let is_valid = task::spawn_blocking(move || {
            let parsed_hash = PasswordHash::new(&password_hash)
                .map_err(|e| anyhow::anyhow!("Invalid password hash format: {e}"))?;

            let argon2 = Argon2::default();
            Ok::<bool, anyhow::Error>(
                argon2
                    .verify_password(password.as_bytes(), &parsed_hash)
                    .is_ok(),
            )
        })
        .await
        .context("Password verification task panicked")??;

        Ok(is_valid.then(|| User::from(user)))
    }

    /// Applies `patch` to the stored user. A new password is re-hashed.
    pub async fn update(
        &self,
        id: i32,
        patch: &UserPatch,
        security: &SecurityConfig,
    ) -> Result<User, UserWriteError> {
        let existing = users::Entity::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query user for update")?
            .ok_or_else(|| anyhow::anyhow!("User not found: {id}"))?;

        let updated = patch.apply(User::from(existing.clone()));

        let mut active: users::ActiveModel = existing.into();
        active.email = Set(updated.email);
        active.username = Set(updated.username);
        active.is_active = Set(updated.is_active);
        active.is_superuser = Set(updated.is_superuser);
        active.is_verified = Set(updated.is_verified);

        if let Some(password) = &patch.password {
            let password = password.clone();
            let security = security.clone();
            let new_hash = task::spawn_blocking(move || hash_password(&password, &security))
                .await
                .context("Password hashing task panicked")??;
            active.hashed_password = Set(new_hash);
        }

        active.updated_at = Set(chrono::Utc::now().to_rfc3339());

        let model = active.update(&self.conn).await?;
        Ok(User::from(model))
    }
}

/// Hash a password using Argon2id with the configured cost params.
pub fn hash_password(password: &str, config: &SecurityConfig) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);

    let params = Params::new(
        config.argon2_memory_cost_kib,
        config.argon2_time_cost,
        config.argon2_parallelism,
        None,
    )
    .map_err(|e| anyhow::anyhow!("Invalid Argon2 params: {e}"))?;
    let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);

    let hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!("Failed to hash password: {e}"))?;

    Ok(hash.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_support::{cheap_security, new_user, temp_store};

    #[test]
    fn hash_roundtrip_with_custom_params() {
        let config = SecurityConfig {
            argon2_memory_cost_kib: 1024,
            argon2_time_cost: 1,
            argon2_parallelism: 1,
        };
        let hash = hash_password("hunter2", &config).unwrap();
        assert!(hash.starts_with("$argon2id$"));

        let parsed = PasswordHash::new(&hash).unwrap();
        assert!(
            Argon2::default()
                .verify_password(b"hunter2", &parsed)
                .is_ok()
        );
        assert!(
            Argon2::default()
                .verify_password(b"hunter3", &parsed)
                .is_err()
        );
    }

    #[test]
    fn invalid_params_are_rejected() {
        let config = SecurityConfig {
            argon2_memory_cost_kib: 0,
            argon2_time_cost: 0,
            argon2_parallelism: 0,
        };
        assert!(hash_password("hunter2", &config).is_err());
    }

    #[tokio::test]
    async fn unique_violations_name_the_column() {
        let store = temp_store().await;
        let repo = UserRepository::new(store.conn.clone());
        let security = cheap_security();

        repo.create(&new_user("carol"), &security).await.unwrap();

        let same_email = NewUser {
            username: "carol2".to_string(),
            ..new_user("carol")
        };
        assert!(matches!(
            repo.create(&same_email, &security).await,
            Err(UserWriteError::EmailTaken)
        ));

        let same_username = NewUser {
            email: "other@example.com".to_string(),
            ..new_user("carol")
        };
        assert!(matches!(
            repo.create(&same_username, &security).await,
            Err(UserWriteError::UsernameTaken)
        ));
    }

    #[tokio::test]
    async fn update_into_a_taken_email_is_reported() {
        let store = temp_store().await;
        let repo = UserRepository::new(store.conn.clone());
        let security = cheap_security();

        repo.create(&new_user("dave"), &security).await.unwrap();
        let erin = repo.create(&new_user("erin"), &security).await.unwrap();

        let patch = UserPatch {
            email: Some("dave@example.com".to_string()),
            ..UserPatch::default()
        };
        assert!(matches!(
            repo.update(erin.id, &patch, &security).await,
            Err(UserWriteError::EmailTaken)
        ));

        let patch = UserPatch {
            username: Some("dave".to_string()),
            ..UserPatch::default()
        };
        assert!(matches!(
            repo.update(erin.id, &patch, &security).await,
            Err(UserWriteError::UsernameTaken)
        ));
    }
}

use anyhow::Result;
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, Statement};
use std::path::Path;
use std::time::Duration;
use tracing::info;

use crate::config::SecurityConfig;
use crate::models::{NewPost, NewUser, Post, PostLike, PostPatch, User, UserPatch};

pub mod migrator;
pub mod repositories;

pub use repositories::like::LikeInsertError;
pub use repositories::user::UserWriteError;

#[cfg(test)]
pub(crate) mod test_support;

#[derive(Clone)]
pub struct Store {
    pub conn: DatabaseConnection,
}

impl Store {
    pub async fn new(db_url: &str) -> Result<Self> {
        Self::with_pool_options(db_url, 5, 1).await
    }

    pub async fn with_pool_options(
        db_url: &str,
        max_connections: u32,
        min_connections: u32,
    ) -> Result<Self> {
        use sea_orm_migration::MigratorTrait;

        if let Some(path) = sqlite_file_path(db_url) {
            if let Some(parent) = path.parent()
                && !parent.as_os_str().is_empty()
            {
                tokio::fs::create_dir_all(parent).await.ok();
            }
            if !path.exists() {
                std::fs::File::create(path)?;
            }
        }

        let mut opt = ConnectOptions::new(db_url.to_string());
        opt.max_connections(max_connections)
            .min_connections(min_connections)
            .connect_timeout(Duration::from_secs(10))
            .acquire_timeout(Duration::from_secs(10))
            .idle_timeout(Duration::from_secs(300))
            .max_lifetime(Duration::from_secs(600))
            .sqlx_logging(false);

        let conn = Database::connect(opt).await?;

        migrator::Migrator::up(&conn, None).await?;

        info!(
            "Database connected & migrations applied (pool: {}-{})",
            min_connections, max_connections
        );

        Ok(Self { conn })
    }

    pub async fn ping(&self) -> Result<()> {
        let backend = self.conn.get_database_backend();
        self.conn
            .query_one(Statement::from_string(backend, "SELECT 1".to_string()))
            .await?;
        Ok(())
    }

    fn user_repo(&self) -> repositories::user::UserRepository {
        repositories::user::UserRepository::new(self.conn.clone())
    }

    fn post_repo(&self) -> repositories::post::PostRepository {
        repositories::post::PostRepository::new(self.conn.clone())
    }

    fn like_repo(&self) -> repositories::like::LikeRepository {
        repositories::like::LikeRepository::new(self.conn.clone())
    }

    pub async fn create_user(
        &self,
        input: &NewUser,
        security: &SecurityConfig,
    ) -> Result<User, UserWriteError> {
        self.user_repo().create(input, security).await
    }

    pub async fn get_user(&self, id: i32) -> Result<Option<User>> {
        self.user_repo().get_by_id(id).await
    }

    pub async fn get_user_by_email(&self, email: &str) -> Result<Option<User>> {
        self.user_repo().get_by_email(email).await
    }

    pub async fn email_exists(&self, email: &str) -> Result<bool> {
        self.user_repo().email_exists(email).await
    }

    pub async fn username_exists(&self, username: &str) -> Result<bool> {
        self.user_repo().username_exists(username).await
    }

    pub async fn verify_user_password(&self, email: &str, password: &str) -> Result<Option<User>> {
        self.user_repo().verify_password(email, password).await
    }

    pub async fn update_user(
        &self,
        id: i32,
        patch: &UserPatch,
        security: &SecurityConfig,
    ) -> Result<User, UserWriteError> {
        self.user_repo().update(id, patch, security).await
    }

    pub async fn create_post(&self, input: &NewPost, owner: &User) -> Result<Post> {
        self.post_repo().create(input, owner).await
    }

    pub async fn get_post(&self, id: i32) -> Result<Option<Post>> {
        self.post_repo().get(id).await
    }

    pub async fn list_posts(&self) -> Result<Vec<Post>> {
        self.post_repo().list_all().await
    }

    pub async fn update_post(&self, existing: Post, patch: &PostPatch) -> Result<Post> {
        self.post_repo().update(existing, patch).await
    }

    pub async fn delete_post(&self, existing: Post) -> Result<Post> {
        self.post_repo().delete(existing).await
    }

    pub async fn add_like(&self, post_id: i32, user: &User) -> Result<PostLike, LikeInsertError> {
        self.like_repo().like(post_id, user).await
    }

    pub async fn remove_like(&self, post_id: i32, user: &User) -> Result<Option<PostLike>> {
        self.like_repo().unlike(post_id, user).await
    }

    pub async fn get_like(&self, post_id: i32, user_id: i32) -> Result<Option<PostLike>> {
        self.like_repo().get(post_id, user_id).await
    }

    pub async fn count_likes_by_user(&self, user_id: i32) -> Result<u64> {
        self.like_repo().count_by_user(user_id).await
    }
}

/// On-disk path for a `sqlite:` URL, or `None` for in-memory databases.
fn sqlite_file_path(db_url: &str) -> Option<&Path> {
    if db_url.contains(":memory:") || db_url.contains("mode=memory") {
        return None;
    }

    let path = db_url
        .strip_prefix("sqlite://")
        .or_else(|| db_url.strip_prefix("sqlite:"))?;
    let path = path.split('?').next().unwrap_or(path);

    (!path.is_empty()).then(|| Path::new(path))
}

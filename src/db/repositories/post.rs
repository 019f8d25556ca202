use anyhow::{Context, Result};
use sea_orm::{ActiveModelTrait, DatabaseConnection, Set};
use tracing::info;

use super::base::CrudRepository;
use crate::entities::posts;
use crate::models::{NewPost, Post, PostPatch, User};

/// Repository for post operations
pub struct PostRepository {
    conn: DatabaseConnection,
}

impl PostRepository {
    pub fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    fn crud(&self) -> CrudRepository<posts::Entity> {
        CrudRepository::new(self.conn.clone())
    }

    /// Persists `input` with owner id and author username taken from `owner`.
    pub async fn create(&self, input: &NewPost, owner: &User) -> Result<Post> {
        let active = posts::ActiveModel {
            user_id: Set(owner.id),
            text: Set(input.text.clone()),
            username: Set(owner.username.clone()),
            created_at: Set(chrono::Utc::now().to_rfc3339()),
            ..Default::default()
        };

        let model = active
            .insert(&self.conn)
            .await
            .context("Failed to insert post")?;
        info!(post_id = model.id, user_id = owner.id, "Post created");
        Ok(Post::from(model))
    }

    pub async fn get(&self, id: i32) -> Result<Option<Post>> {
        Ok(self.crud().get(id).await?.map(Post::from))
    }

    pub async fn list_all(&self) -> Result<Vec<Post>> {
        let rows = self.crud().list_all().await?;
        Ok(rows.into_iter().map(Post::from).collect())
    }

    pub async fn update(&self, existing: Post, patch: &PostPatch) -> Result<Post> {
        if patch.is_empty() {
            return Ok(existing);
        }

        let updated = patch.apply(existing);

        let active = posts::ActiveModel {
            id: Set(updated.id),
            text: Set(updated.text),
            ..Default::default()
        };

        let model = active
            .update(&self.conn)
            .await
            .context("Failed to update post")?;
        Ok(Post::from(model))
    }

    pub async fn delete(&self, existing: Post) -> Result<Post> {
        let model = posts::Model {
            id: existing.id,
            user_id: existing.user_id,
            text: existing.text,
            username: existing.username,
            created_at: existing.created_at,
        };

        let removed = self.crud().delete::<posts::ActiveModel>(model).await?;
        info!(post_id = removed.id, "Post deleted");
        Ok(Post::from(removed))
    }
}

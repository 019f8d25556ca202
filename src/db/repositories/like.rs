use anyhow::{Context, Result};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, PaginatorTrait,
    QueryFilter, Set, SqlErr,
};

use super::base::CrudRepository;
use crate::entities::post_likes;
use crate::models::{PostLike, User};

#[derive(Debug, thiserror::Error)]
pub enum LikeInsertError {
    /// The (post, user) pair already has a row.
    #[error("Like already exists")]
    Duplicate,

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Repository for post likes
pub struct LikeRepository {
    conn: DatabaseConnection,
}

impl LikeRepository {
    pub fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    fn crud(&self) -> CrudRepository<post_likes::Entity> {
        CrudRepository::new(self.conn.clone())
    }

    /// Inserts a like. No preconditions are checked here beyond the
    /// storage-level uniqueness of the pair.
    pub async fn like(&self, post_id: i32, user: &User) -> Result<PostLike, LikeInsertError> {
        let active = post_likes::ActiveModel {
            post_id: Set(post_id),
            user_id: Set(user.id),
            created_at: Set(chrono::Utc::now().to_rfc3339()),
        };

        match active.insert(&self.conn).await {
            Ok(model) => Ok(PostLike::from(model)),
            Err(e) if is_unique_violation(&e) => Err(LikeInsertError::Duplicate),
            Err(e) => Err(LikeInsertError::Other(
                anyhow::Error::new(e).context("Failed to insert like"),
            )),
        }
    }

    pub async fn get(&self, post_id: i32, user_id: i32) -> Result<Option<PostLike>> {
        Ok(self
            .crud()
            .get((post_id, user_id))
            .await?
            .map(PostLike::from))
    }

    /// Deletes the like for (post, user). Returns `Ok(None)` when no row
    /// was deleted, whether it never existed or another request removed it
    /// first.
    pub async fn unlike(&self, post_id: i32, user: &User) -> Result<Option<PostLike>> {
        let existing = self.crud().get((post_id, user.id)).await?;

        let result = post_likes::Entity::delete_by_id((post_id, user.id))
            .exec(&self.conn)
            .await
            .context("Failed to delete like")?;

        if result.rows_affected == 0 {
            return Ok(None);
        }

        Ok(existing.map(PostLike::from))
    }

    pub async fn count_by_user(&self, user_id: i32) -> Result<u64> {
        post_likes::Entity::find()
            .filter(post_likes::Column::UserId.eq(user_id))
            .count(&self.conn)
            .await
            .context("Failed to count likes by user")
    }
}

fn is_unique_violation(err: &DbErr) -> bool {
    matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_support::{seed_post, seed_user, temp_store};

    #[tokio::test]
    async fn second_insert_of_a_pair_is_a_duplicate() {
        let store = temp_store().await;
        let alice = seed_user(&store, "alice").await;
        let bob = seed_user(&store, "bob").await;
        let post = seed_post(&store, &alice).await;
        let repo = LikeRepository::new(store.conn.clone());

        repo.like(post.id, &bob).await.unwrap();
        assert!(matches!(
            repo.like(post.id, &bob).await,
            Err(LikeInsertError::Duplicate)
        ));
        assert_eq!(repo.count_by_user(bob.id).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn unlike_without_a_row_is_none() {
        let store = temp_store().await;
        let alice = seed_user(&store, "alice").await;
        let bob = seed_user(&store, "bob").await;
        let post = seed_post(&store, &alice).await;
        let repo = LikeRepository::new(store.conn.clone());

        assert!(repo.unlike(post.id, &bob).await.unwrap().is_none());

        let like = repo.like(post.id, &bob).await.unwrap();
        assert_eq!(repo.unlike(post.id, &bob).await.unwrap(), Some(like));
        assert!(repo.unlike(post.id, &bob).await.unwrap().is_none());
        assert!(repo.get(post.id, bob.id).await.unwrap().is_none());
    }
}

//! `SeaORM` implementation of the `PostService` trait.

use async_trait::async_trait;
use tracing::debug;

use crate::db::{LikeInsertError, Store};
use crate::models::{NewPost, Post, PostLike, PostPatch, User};
use crate::services::post_service::{PostError, PostService};
use crate::services::validators;

pub struct SeaOrmPostService {
    store: Store,
}

impl SeaOrmPostService {
    #[must_use]
    pub const fn new(store: Store) -> Self {
        Self { store }
    }
}

#[async_trait]
impl PostService for SeaOrmPostService {
    async fn create_post(&self, author: &User, input: NewPost) -> Result<Post, PostError> {
        input.validate()?;

        let post = self.store.create_post(&input, author).await?;
        metrics::counter!("postwall_posts_created_total").increment(1);
        Ok(post)
    }

    async fn get_post(&self, post_id: i32) -> Result<Post, PostError> {
        validators::post_exists(&self.store, post_id).await
    }

    async fn list_posts(&self) -> Result<Vec<Post>, PostError> {
        Ok(self.store.list_posts().await?)
    }

    async fn update_post(
        &self,
        post_id: i32,
        user: &User,
        patch: PostPatch,
    ) -> Result<Post, PostError> {
        let post = validators::is_post_owner(&self.store, post_id, user).await?;
        patch.validate()?;

        if patch.is_empty() {
            return Ok(post);
        }

        let updated = self.store.update_post(post, &patch).await?;
        debug!(post_id, "Post updated");
        Ok(updated)
    }

    async fn delete_post(&self, post_id: i32, user: &User) -> Result<Post, PostError> {
        let post = validators::is_post_owner(&self.store, post_id, user).await?;

        Ok(self.store.delete_post(post).await?)
    }

    async fn like_post(&self, post_id: i32, user: &User) -> Result<PostLike, PostError> {
        validators::post_exists(&self.store, post_id).await?;
        validators::not_own_post(&self.store, post_id, user).await?;
        validators::no_duplicate_like(&self.store, post_id, user).await?;

        // A concurrent like can slip past the check above; the primary key
        // still rejects it.
        let like = self
            .store
            .add_like(post_id, user)
            .await
            .map_err(|e| match e {
                LikeInsertError::Duplicate => PostError::DuplicateLike,
                LikeInsertError::Other(e) => PostError::from(e),
            })?;

        metrics::counter!("postwall_likes_total", "action" => "like").increment(1);
        debug!(post_id, user_id = user.id, "Post liked");
        Ok(like)
    }

    async fn unlike_post(&self, post_id: i32, user: &User) -> Result<(), PostError> {
        validators::post_exists(&self.store, post_id).await?;
        validators::like_exists(&self.store, post_id, user.id).await?;

        // A concurrent unlike may win between the check and the delete; the
        // caller still sees success.
        if self.store.remove_like(post_id, user).await?.is_none() {
            debug!(post_id, user_id = user.id, "Like already gone at delete time");
            return Ok(());
        }

        metrics::counter!("postwall_likes_total", "action" => "unlike").increment(1);
        Ok(())
    }

    async fn count_likes_by_user(&self, user: &User) -> Result<u64, PostError> {
        Ok(self.store.count_likes_by_user(user.id).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_support::{seed_user as user, temp_store as test_store};
    use std::sync::Arc;

    fn text(s: &str) -> NewPost {
        NewPost {
            text: s.to_string(),
        }
    }

    #[tokio::test]
    async fn like_lifecycle() {
        let store = test_store().await;
        let service = SeaOrmPostService::new(store.clone());
        let alice = user(&store, "alice").await;
        let bob = user(&store, "bob").await;

        let post = service.create_post(&alice, text("hello")).await.unwrap();
        assert_eq!(post.username, "alice");
        assert_eq!(post.user_id, alice.id);

        let like = service.like_post(post.id, &bob).await.unwrap();
        assert_eq!((like.post_id, like.user_id), (post.id, bob.id));

        assert!(matches!(
            service.like_post(post.id, &bob).await,
            Err(PostError::DuplicateLike)
        ));
        assert!(matches!(
            service.like_post(post.id, &alice).await,
            Err(PostError::OwnPost)
        ));

        service.unlike_post(post.id, &bob).await.unwrap();
        assert!(matches!(
            service.unlike_post(post.id, &bob).await,
            Err(PostError::LikeNotFound)
        ));
        assert!(matches!(
            service.like_post(9999, &bob).await,
            Err(PostError::NotFound)
        ));
    }

    #[tokio::test]
    async fn like_count_tracks_likes() {
        let store = test_store().await;
        let service = SeaOrmPostService::new(store.clone());
        let alice = user(&store, "alice").await;
        let bob = user(&store, "bob").await;

        let first = service.create_post(&alice, text("one")).await.unwrap();
        let second = service.create_post(&alice, text("two")).await.unwrap();
        let third = service.create_post(&alice, text("three")).await.unwrap();

        for post in [&first, &second, &third] {
            service.like_post(post.id, &bob).await.unwrap();
        }
        assert_eq!(service.count_likes_by_user(&bob).await.unwrap(), 3);

        service.unlike_post(second.id, &bob).await.unwrap();
        assert_eq!(service.count_likes_by_user(&bob).await.unwrap(), 2);
        assert_eq!(service.count_likes_by_user(&alice).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn update_checks_ownership_before_text() {
        let store = test_store().await;
        let service = SeaOrmPostService::new(store.clone());
        let alice = user(&store, "alice").await;
        let bob = user(&store, "bob").await;
        let post = service.create_post(&alice, text("hello")).await.unwrap();

        let empty = PostPatch {
            text: Some(String::new()),
        };
        assert!(matches!(
            service.update_post(post.id, &bob, empty.clone()).await,
            Err(PostError::NotOwner)
        ));
        assert!(matches!(
            service.update_post(post.id, &alice, empty).await,
            Err(PostError::Validation(_))
        ));

        let max = PostPatch {
            text: Some("x".repeat(2000)),
        };
        let updated = service.update_post(post.id, &alice, max).await.unwrap();
        assert_eq!(updated.text.chars().count(), 2000);
        assert_eq!(updated.username, "alice");

        let too_long = PostPatch {
            text: Some("x".repeat(2001)),
        };
        assert!(matches!(
            service.update_post(post.id, &alice, too_long).await,
            Err(PostError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn delete_returns_prior_state() {
        let store = test_store().await;
        let service = SeaOrmPostService::new(store.clone());
        let alice = user(&store, "alice").await;
        let bob = user(&store, "bob").await;
        let post = service.create_post(&alice, text("bye")).await.unwrap();

        assert!(matches!(
            service.delete_post(post.id, &bob).await,
            Err(PostError::NotOwner)
        ));

        let deleted = service.delete_post(post.id, &alice).await.unwrap();
        assert_eq!(deleted, post);
        assert!(matches!(
            service.get_post(post.id).await,
            Err(PostError::NotFound)
        ));
        assert!(service.list_posts().await.unwrap().is_empty());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn racing_likes_yield_one_row_and_conflicts() {
        let store = test_store().await;
        let service = Arc::new(SeaOrmPostService::new(store.clone()));
        let alice = user(&store, "alice").await;
        let bob = user(&store, "bob").await;
        let post = service.create_post(&alice, text("hot")).await.unwrap();
        let post_id = post.id;

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let service = Arc::clone(&service);
                let bob = bob.clone();
                tokio::spawn(async move { service.like_post(post_id, &bob).await })
            })
            .collect();

        let mut liked = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => liked += 1,
                Err(PostError::DuplicateLike) => {}
                Err(other) => panic!("unexpected error: {other:?}"),
            }
        }
        assert_eq!(liked, 1);
        assert_eq!(service.count_likes_by_user(&bob).await.unwrap(), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn racing_unlikes_all_succeed_or_miss() {
        let store = test_store().await;
        let service = Arc::new(SeaOrmPostService::new(store.clone()));
        let alice = user(&store, "alice").await;
        let bob = user(&store, "bob").await;
        let post = service.create_post(&alice, text("hot")).await.unwrap();
        service.like_post(post.id, &bob).await.unwrap();
        let post_id = post.id;

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let service = Arc::clone(&service);
                let bob = bob.clone();
                tokio::spawn(async move { service.unlike_post(post_id, &bob).await })
            })
            .collect();

        let mut unliked = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(()) => unliked += 1,
                Err(PostError::LikeNotFound) => {}
                Err(other) => panic!("unexpected error: {other:?}"),
            }
        }
        assert!(unliked >= 1);
        assert!(store.get_like(post.id, bob.id).await.unwrap().is_none());
        assert_eq!(service.count_likes_by_user(&bob).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn unlike_after_row_removed_elsewhere_is_not_found() {
        let store = test_store().await;
        let service = SeaOrmPostService::new(store.clone());
        let alice = user(&store, "alice").await;
        let bob = user(&store, "bob").await;
        let post = service.create_post(&alice, text("gone")).await.unwrap();
        service.like_post(post.id, &bob).await.unwrap();

        assert!(store.remove_like(post.id, &bob).await.unwrap().is_some());
        assert!(store.remove_like(post.id, &bob).await.unwrap().is_none());
        assert!(matches!(
            service.unlike_post(post.id, &bob).await,
            Err(PostError::LikeNotFound)
        ));
    }
}

use crate::entities::{post_likes, posts};

use super::InvalidInput;

pub const POST_TEXT_MIN_CHARS: usize = 1;
pub const POST_TEXT_MAX_CHARS: usize = 2000;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Post {
    pub id: i32,
    pub user_id: i32,
    pub text: String,
    pub username: String,
    pub created_at: String,
}

impl From<posts::Model> for Post {
    fn from(model: posts::Model) -> Self {
        Self {
            id: model.id,
            user_id: model.user_id,
            text: model.text,
            username: model.username,
            created_at: model.created_at,
        }
    }
}

impl Post {
    #[must_use]
    pub fn is_owned_by(&self, user_id: i32) -> bool {
        self.user_id == user_id
    }
}

/// Input for a new post. Owner fields come from the caller, not the body.
#[derive(Debug, Clone)]
pub struct NewPost {
    pub text: String,
}

impl NewPost {
    pub fn validate(&self) -> Result<(), InvalidInput> {
        check_text(&self.text)
    }
}

/// Field-level patch for a post. Only `Some` fields are applied.
#[derive(Debug, Clone, Default)]
pub struct PostPatch {
    pub text: Option<String>,
}

impl PostPatch {
    pub fn validate(&self) -> Result<(), InvalidInput> {
        match &self.text {
            Some(text) => check_text(text),
            None => Ok(()),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.text.is_none()
    }

    /// Rebuilds `post` with the patched fields; owner and author are untouched.
    #[must_use]
    pub fn apply(&self, post: Post) -> Post {
        Post {
            text: self.text.clone().unwrap_or(post.text),
            ..post
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostLike {
    pub post_id: i32,
    pub user_id: i32,
    pub created_at: String,
}

impl From<post_likes::Model> for PostLike {
    fn from(model: post_likes::Model) -> Self {
        Self {
            post_id: model.post_id,
            user_id: model.user_id,
            created_at: model.created_at,
        }
    }
}

pub fn check_text(text: &str) -> Result<(), InvalidInput> {
    let len = text.chars().count();
    if len < POST_TEXT_MIN_CHARS {
        return Err(InvalidInput::new("text", "Post text cannot be empty"));
    }
    if len > POST_TEXT_MAX_CHARS {
        return Err(InvalidInput::new(
            "text",
            format!("Post text must be at most {POST_TEXT_MAX_CHARS} characters"),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_post() -> Post {
        Post {
            id: 7,
            user_id: 1,
            text: "original".to_string(),
            username: "alice".to_string(),
            created_at: "2024-01-01T00:00:00+00:00".to_string(),
        }
    }

    #[test]
    fn text_length_bounds() {
        assert!(check_text("").is_err());
        assert!(check_text("a").is_ok());
        assert!(check_text(&"a".repeat(2000)).is_ok());
        assert!(check_text(&"a".repeat(2001)).is_err());
    }

    #[test]
    fn text_length_counts_characters_not_bytes() {
        // 2000 two-byte characters is still within the limit.
        assert!(check_text(&"ж".repeat(2000)).is_ok());
        assert!(check_text(&"ж".repeat(2001)).is_err());
    }

    #[test]
    fn patch_only_touches_present_fields() {
        let post = sample_post();

        let unchanged = PostPatch::default().apply(post.clone());
        assert_eq!(unchanged, post);

        let patch = PostPatch {
            text: Some("edited".to_string()),
        };
        let edited = patch.apply(post.clone());
        assert_eq!(edited.text, "edited");
        assert_eq!(edited.user_id, post.user_id);
        assert_eq!(edited.username, post.username);
        assert_eq!(edited.created_at, post.created_at);
    }

    #[test]
    fn patch_validation() {
        assert!(PostPatch::default().validate().is_ok());
        assert!(
            PostPatch {
                text: Some(String::new())
            }
            .validate()
            .is_err()
        );
    }

    #[test]
    fn ownership() {
        let post = sample_post();
        assert!(post.is_owned_by(1));
        assert!(!post.is_owned_by(2));
    }
}

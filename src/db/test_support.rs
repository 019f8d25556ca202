use super::Store;
use crate::config::SecurityConfig;
use crate::models::{NewPost, NewUser, Post, User};

/// Fresh migrated store backed by its own temp file.
pub async fn temp_store() -> Store {
    let path = std::env::temp_dir().join(format!("postwall-{}.db", uuid::Uuid::new_v4()));
    Store::new(&format!("sqlite:{}?mode=rwc", path.display()))
        .await
        .unwrap()
}

pub fn cheap_security() -> SecurityConfig {
    SecurityConfig {
        argon2_memory_cost_kib: 1024,
        argon2_time_cost: 1,
        argon2_parallelism: 1,
    }
}

pub fn new_user(name: &str) -> NewUser {
    NewUser {
        email: format!("{name}@example.com"),
        password: "password".to_string(),
        username: name.to_string(),
        is_superuser: false,
    }
}

pub async fn seed_user(store: &Store, name: &str) -> User {
    store
        .create_user(&new_user(name), &cheap_security())
        .await
        .unwrap()
}

pub async fn seed_post(store: &Store, owner: &User) -> Post {
    store
        .create_post(
            &NewPost {
                text: "hello".to_string(),
            },
            owner,
        )
        .await
        .unwrap()
}

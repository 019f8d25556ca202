use regex::Regex;
use std::sync::OnceLock;

use crate::entities::users;

use super::InvalidInput;

pub const USERNAME_MIN_CHARS: usize = 3;
pub const USERNAME_MAX_CHARS: usize = 50;
pub const PASSWORD_MIN_CHARS: usize = 3;

fn email_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("Invalid regex"))
}

/// User data without the password hash.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: i32,
    pub email: String,
    pub username: String,
    pub is_active: bool,
    pub is_superuser: bool,
    pub is_verified: bool,
    pub created_at: String,
    pub updated_at: String,
}

impl From<users::Model> for User {
    fn from(model: users::Model) -> Self {
        Self {
            id: model.id,
            email: model.email,
            username: model.username,
            is_active: model.is_active,
            is_superuser: model.is_superuser,
            is_verified: model.is_verified,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub password: String,
    pub username: String,
    pub is_superuser: bool,
}

impl NewUser {
    pub fn validate(&self) -> Result<(), InvalidInput> {
        check_email(&self.email)?;
        check_username(&self.username)?;
        check_password(&self.password, &self.email)
    }
}

/// Field-level patch for a user. Privileged flags are only honoured on the
/// superuser path; see [`UserPatch::without_privileged_fields`].
#[derive(Debug, Clone, Default)]
pub struct UserPatch {
    pub email: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub is_active: Option<bool>,
    pub is_superuser: Option<bool>,
    pub is_verified: Option<bool>,
}

impl UserPatch {
    #[must_use]
    pub fn without_privileged_fields(self) -> Self {
        Self {
            is_active: None,
            is_superuser: None,
            is_verified: None,
            ..self
        }
    }

    /// Validates the patch against the user it will be applied to.
    pub fn validate(&self, current: &User) -> Result<(), InvalidInput> {
        if let Some(email) = &self.email {
            check_email(email)?;
        }
        if let Some(username) = &self.username {
            check_username(username)?;
        }
        if let Some(password) = &self.password {
            let email = self.email.as_deref().unwrap_or(&current.email);
            check_password(password, email)?;
        }
        Ok(())
    }

    /// Rebuilds `user` with the patched fields. The password is handled by the
    /// repository since it needs hashing.
    #[must_use]
    pub fn apply(&self, user: User) -> User {
        User {
            email: self.email.clone().unwrap_or(user.email),
            username: self.username.clone().unwrap_or(user.username),
            is_active: self.is_active.unwrap_or(user.is_active),
            is_superuser: self.is_superuser.unwrap_or(user.is_superuser),
            is_verified: self.is_verified.unwrap_or(user.is_verified),
            ..user
        }
    }
}

/// Canonical stored form of an email: trimmed and lowercased, so lookups
/// and uniqueness ignore case.
#[must_use]
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

pub fn check_email(email: &str) -> Result<(), InvalidInput> {
    if email_regex().is_match(email) {
        Ok(())
    } else {
        Err(InvalidInput::new("email", "Invalid email address"))
    }
}

pub fn check_username(username: &str) -> Result<(), InvalidInput> {
    let len = username.chars().count();
    if !(USERNAME_MIN_CHARS..=USERNAME_MAX_CHARS).contains(&len) {
        return Err(InvalidInput::new(
            "username",
            format!(
                "Username must be between {USERNAME_MIN_CHARS} and {USERNAME_MAX_CHARS} characters"
            ),
        ));
    }
    Ok(())
}

pub fn check_password(password: &str, email: &str) -> Result<(), InvalidInput> {
    if password.chars().count() < PASSWORD_MIN_CHARS {
        return Err(InvalidInput::new(
            "password",
            format!("Password should be at least {PASSWORD_MIN_CHARS} characters"),
        ));
    }
    if password.contains(email) {
        return Err(InvalidInput::new(
            "password",
            "Password should not contain e-mail",
        ));
    }
    Ok(())
}

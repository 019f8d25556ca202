//! HS256 access tokens.

use anyhow::{Context, Result};
use chrono::Utc;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

pub const TOKEN_AUDIENCE: &str = "postwall:auth";

const JWT_ALGORITHM: Algorithm = Algorithm::HS256;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// User id as a decimal string.
    pub sub: String,
    pub aud: String,
    pub iat: i64,
    pub exp: i64,
}

impl Claims {
    pub fn user_id(&self) -> Option<i32> {
        self.sub.parse().ok()
    }
}

/// Signs and checks access tokens with a shared secret.
#[derive(Clone)]
pub struct TokenIssuer {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    lifetime_seconds: i64,
}

impl TokenIssuer {
    #[must_use]
    pub fn new(secret: &str, lifetime_seconds: u64) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            lifetime_seconds: i64::try_from(lifetime_seconds).unwrap_or(i64::MAX),
        }
    }

    #[must_use]
    pub const fn lifetime_seconds(&self) -> i64 {
        self.lifetime_seconds
    }

    pub fn issue(&self, user_id: i32) -> Result<String> {
        let now = Utc::now().timestamp();
        let claims = Claims {
            sub: user_id.to_string(),
            aud: TOKEN_AUDIENCE.to_string(),
            iat: now,
            exp: now.saturating_add(self.lifetime_seconds),
        };

        encode(&Header::new(JWT_ALGORITHM), &claims, &self.encoding_key)
            .context("Failed to sign access token")
    }

    /// Checks signature, audience and expiry.
    pub fn decode(&self, token: &str) -> Result<Claims> {
        let mut validation = Validation::new(JWT_ALGORITHM);
        validation.set_audience(&[TOKEN_AUDIENCE]);
        validation.leeway = 0;

        let data = decode::<Claims>(token, &self.decoding_key, &validation)
            .context("Invalid access token")?;
        Ok(data.claims)
    }
}

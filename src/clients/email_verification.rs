use anyhow::{Context, Result};
use reqwest::Client;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::config::EmailVerificationConfig;

/// Outcome reported by the verification provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmailVerdict {
    Deliverable,
    Undeliverable,
    Unknown,
}

impl EmailVerdict {
    #[must_use]
    pub fn from_result(result: Option<&str>) -> Self {
        match result {
            Some("deliverable") => Self::Deliverable,
            Some("undeliverable") => Self::Undeliverable,
            _ => Self::Unknown,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Deliverable => "deliverable",
            Self::Undeliverable => "undeliverable",
            Self::Unknown => "unknown",
        }
    }
}

#[derive(Debug, Deserialize)]
struct VerifyResponse {
    result: Option<String>,
    #[serde(default)]
    reason: Option<String>,
}

#[async_trait::async_trait]
pub trait EmailVerifier: Send + Sync {
    async fn verify(&self, email: &str) -> Result<EmailVerdict>;
}

/// Client for the Kickbox `verify` endpoint.
#[derive(Clone)]
pub struct KickboxClient {
    client: Client,
    base_url: String,
    api_key: String,
}

impl KickboxClient {
    pub fn new(base_url: String, api_key: String, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("Postwall/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to build email verification HTTP client")?;

        Ok(Self {
            client,
            base_url,
            api_key,
        })
    }

    /// Builds a client if verification is enabled and a key is configured.
    pub fn from_config(config: &EmailVerificationConfig) -> Result<Option<Self>> {
        if !config.is_active() {
            return Ok(None);
        }
        let api_key = config.api_key.clone().unwrap_or_default();
        Self::new(
            config.base_url.clone(),
            api_key,
            Duration::from_secs(config.request_timeout_seconds),
        )
        .map(Some)
    }

    fn request_url(&self, email: &str) -> Result<url::Url> {
        url::Url::parse_with_params(
            &self.base_url,
            &[("email", email), ("apikey", self.api_key.as_str())],
        )
        .with_context(|| format!("Invalid verification URL: {}", self.base_url))
    }
}

#[async_trait::async_trait]
impl EmailVerifier for KickboxClient {
    async fn verify(&self, email: &str) -> Result<EmailVerdict> {
        let url = self.request_url(email)?;
        let response = self.client.get(url).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(anyhow::anyhow!(
                "Email verification API error: {} - {}",
                status,
                body
            ));
        }

        let body: VerifyResponse = response.json().await?;
        if let Some(reason) = &body.reason {
            debug!(reason = %reason, "Email verification reason");
        }

        Ok(EmailVerdict::from_result(body.result.as_deref()))
    }
}

/// Runs verification on its own task. The result is only logged.
pub fn spawn_verification(verifier: Arc<dyn EmailVerifier>, email: String) {
    tokio::spawn(async move {
        match verifier.verify(&email).await {
            Ok(verdict) => {
                metrics::counter!("postwall_email_verifications_total", "result" => verdict.as_str())
                    .increment(1);
                match verdict {
                    EmailVerdict::Deliverable => info!(email = %email, "Email exists"),
                    EmailVerdict::Undeliverable => {
                        warn!(email = %email, "Email does not exist");
                    }
                    EmailVerdict::Unknown => warn!(email = %email, "Unable to verify email"),
                }
            }
            Err(e) => {
                metrics::counter!("postwall_email_verifications_total", "result" => "error")
                    .increment(1);
                warn!(email = %email, error = %e, "Email verification failed");
            }
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verdict_classification() {
        assert_eq!(
            EmailVerdict::from_result(Some("deliverable")),
            EmailVerdict::Deliverable
        );
        assert_eq!(
            EmailVerdict::from_result(Some("undeliverable")),
            EmailVerdict::Undeliverable
        );
        assert_eq!(
            EmailVerdict::from_result(Some("risky")),
            EmailVerdict::Unknown
        );
        assert_eq!(EmailVerdict::from_result(None), EmailVerdict::Unknown);
    }

    #[test]
    fn response_parsing_tolerates_extra_fields() {
        let json = r#"{"result":"deliverable","reason":"accepted_email","role":false,"success":true}"#;
        let parsed: VerifyResponse = serde_json::from_str(json).unwrap();
        assert_eq!(
            EmailVerdict::from_result(parsed.result.as_deref()),
            EmailVerdict::Deliverable
        );
    }

    #[test]
    fn request_url_encodes_params() {
        let client = KickboxClient::new(
            "https://api.kickbox.com/v2/verify".to_string(),
            "key".to_string(),
            Duration::from_secs(1),
        )
        .unwrap();
        let url = client.request_url("a+b@example.com").unwrap();
        assert_eq!(url.path(), "/v2/verify");
        let pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();
        assert_eq!(
            pairs,
            vec![
                ("email".to_string(), "a+b@example.com".to_string()),
                ("apikey".to_string(), "key".to_string()),
            ]
        );
    }

    #[test]
    fn disabled_config_builds_no_client() {
        let config = EmailVerificationConfig::default();
        assert!(KickboxClient::from_config(&config).unwrap().is_none());
    }
}

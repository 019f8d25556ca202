use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Secret shipped in the default config. Accepted, but loudly.
pub const DEFAULT_SECRET: &str = "SECRET";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub general: GeneralConfig,

    pub server: ServerConfig,

    pub auth: AuthConfig,

    pub security: SecurityConfig,

    pub email_verification: EmailVerificationConfig,

    pub observability: ObservabilityConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    pub app_title: String,

    pub database_url: String,

    pub log_level: String,

    /// Number of tokio worker threads (default: 2)
    /// Set to 0 to use the number of CPU cores
    pub worker_threads: usize,

    pub max_db_connections: u32,

    pub min_db_connections: u32,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            app_title: "Postwall social network".to_string(),
            database_url: "sqlite:data/postwall.db".to_string(),
            log_level: "info".to_string(),
            worker_threads: 2,
            max_db_connections: 5,
            min_db_connections: 1,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub port: u16,

    pub cors_allowed_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 8000,
            cors_allowed_origins: vec![
                "http://localhost:8000".to_string(),
                "http://127.0.0.1:8000".to_string(),
            ],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// HMAC secret used to sign access tokens.
    pub secret: String,

    pub token_lifetime_seconds: u64,

    /// Superuser created at startup when both email and password are set.
    pub first_superuser_email: Option<String>,

    pub first_superuser_password: Option<String>,

    pub first_superuser_username: String,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            secret: DEFAULT_SECRET.to_string(),
            token_lifetime_seconds: 3600,
            first_superuser_email: None,
            first_superuser_password: None,
            first_superuser_username: "admin".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SecurityConfig {
    /// Argon2 memory cost in KiB (default: 8192 = 8MB)
    pub argon2_memory_cost_kib: u32,

    /// Argon2 time cost (iterations)
    pub argon2_time_cost: u32,

    pub argon2_parallelism: u32,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            argon2_memory_cost_kib: 8192,
            argon2_time_cost: 3,
            argon2_parallelism: 1,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmailVerificationConfig {
    pub enabled: bool,

    pub base_url: String,

    pub api_key: Option<String>,

    /// Upper bound for a single verification call.
    pub request_timeout_seconds: u64,
}

impl Default for EmailVerificationConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            base_url: "https://api.kickbox.com/v2/verify".to_string(),
            api_key: None,
            request_timeout_seconds: 10,
        }
    }
}

impl EmailVerificationConfig {
    /// Verification only runs when enabled and a key is present.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.enabled && self.api_key.as_deref().is_some_and(|k| !k.is_empty())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    pub metrics_enabled: bool,

    pub loki_enabled: bool,

    pub loki_url: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            metrics_enabled: true,
            loki_enabled: false,
            loki_url: "http://localhost:3100".to_string(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            general: GeneralConfig::default(),
            server: ServerConfig::default(),
            auth: AuthConfig::default(),
            security: SecurityConfig::default(),
            email_verification: EmailVerificationConfig::default(),
            observability: ObservabilityConfig::default(),
        }
    }
}

impl Config {
    /// Loads the first config file found, then applies environment overrides.
    pub fn load() -> Result<Self> {
        let mut config = Self::load_file()?;
        config.apply_env_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    fn load_file() -> Result<Self> {
        for path in &Self::config_paths() {
            if path.exists() {
                info!("Loading config from: {}", path.display());
                return Self::load_from_path(path);
            }
        }

        info!("No config file found, using defaults");
        Ok(Self::default())
    }

    pub fn load_from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Overlays values from the process environment (and `.env`).
    ///
    /// The lookup is injected so tests do not have to touch the real
    /// environment.
    pub fn apply_env_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup("APP_TITLE") {
            self.general.app_title = v;
        }
        if let Some(v) = lookup("DATABASE_URL") {
            self.general.database_url = v;
        }
        if let Some(v) = lookup("SECRET") {
            self.auth.secret = v;
        }
        if let Some(v) = lookup("FIRST_SUPERUSER_EMAIL") {
            self.auth.first_superuser_email = Some(v);
        }
        if let Some(v) = lookup("FIRST_SUPERUSER_PASSWORD") {
            self.auth.first_superuser_password = Some(v);
        }
        if let Some(v) = lookup("EMAIL_VERIFICATION_API_KEY") {
            self.email_verification.api_key = Some(v);
        }
        if let Some(v) = lookup("PORT") {
            match v.parse() {
                Ok(port) => self.server.port = port,
                Err(_) => warn!("Ignoring invalid PORT value: {v}"),
            }
        }
    }

    pub fn save_to_path(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        info!("Config saved to: {}", path.display());
        Ok(())
    }

    fn config_paths() -> Vec<PathBuf> {
        let mut paths = vec![];

        paths.push(PathBuf::from("config.toml"));

        if let Some(config_dir) = dirs::config_dir() {
            paths.push(config_dir.join("postwall").join("config.toml"));
        }

        if let Some(home) = dirs::home_dir() {
            paths.push(home.join(".postwall").join("config.toml"));
        }

        paths
    }

    fn default_config_path() -> PathBuf {
        PathBuf::from("config.toml")
    }

    pub fn create_default_if_missing() -> Result<bool> {
        let path = Self::default_config_path();
        if path.exists() {
            return Ok(false);
        }

        Self::default().save_to_path(&path)?;
        Ok(true)
    }

    pub fn validate(&self) -> Result<()> {
        if self.general.database_url.is_empty() {
            anyhow::bail!("Database URL cannot be empty");
        }

        if self.auth.secret.is_empty() {
            anyhow::bail!("Auth secret cannot be empty");
        }

        if self.auth.token_lifetime_seconds == 0 {
            anyhow::bail!("Token lifetime must be > 0");
        }

        if self.auth.first_superuser_email.is_some() != self.auth.first_superuser_password.is_some()
        {
            anyhow::bail!("First superuser needs both an email and a password");
        }

        if self.general.min_db_connections > self.general.max_db_connections {
            anyhow::bail!("min_db_connections cannot exceed max_db_connections");
        }

        if self.auth.secret == DEFAULT_SECRET {
            warn!("Using the default auth secret; set SECRET before exposing this server");
        }

        Ok(())
    }

    /// Bootstrap superuser credentials, if fully configured.
    #[must_use]
    pub fn first_superuser(&self) -> Option<(&str, &str)> {
        match (
            self.auth.first_superuser_email.as_deref(),
            self.auth.first_superuser_password.as_deref(),
        ) {
            (Some(email), Some(password)) => Some((email, password)),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.auth.token_lifetime_seconds, 3600);
        assert_eq!(config.server.port, 8000);
        assert!(config.first_superuser().is_none());
        assert!(!config.email_verification.is_active());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_serialization() {
        let config = Config::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        assert!(toml_str.contains("[general]"));
        assert!(toml_str.contains("[auth]"));
        assert!(toml_str.contains("[email_verification]"));
    }

    #[test]
    fn test_config_deserialization() {
        let toml_str = r#"
            [general]
            log_level = "debug"

            [auth]
            token_lifetime_seconds = 60
        "#;

        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.general.log_level, "debug");
        assert_eq!(config.auth.token_lifetime_seconds, 60);

        assert_eq!(config.auth.secret, DEFAULT_SECRET);
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = HashMap::from([
            ("DATABASE_URL", "sqlite::memory:"),
            ("SECRET", "s3cr3t"),
            ("FIRST_SUPERUSER_EMAIL", "root@example.com"),
            ("FIRST_SUPERUSER_PASSWORD", "hunter2"),
            ("EMAIL_VERIFICATION_API_KEY", "live_key"),
            ("PORT", "not-a-port"),
        ]);

        let mut config = Config::default();
        config.apply_env_overrides(|k| env.get(k).map(|v| (*v).to_string()));

        assert_eq!(config.general.database_url, "sqlite::memory:");
        assert_eq!(config.auth.secret, "s3cr3t");
        assert_eq!(
            config.first_superuser(),
            Some(("root@example.com", "hunter2"))
        );
        assert!(config.email_verification.is_active());
        assert_eq!(config.server.port, 8000);
    }

    #[test]
    fn test_validate_rejects_half_superuser() {
        let mut config = Config::default();
        config.auth.first_superuser_email = Some("root@example.com".to_string());
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.auth.secret = String::new();
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.auth.token_lifetime_seconds = 0;
        assert!(config.validate().is_err());
    }
}

use std::sync::Arc;
use tracing::info;

use crate::clients::{EmailVerifier, KickboxClient};
use crate::config::Config;
use crate::db::Store;
use crate::services::{
    AuthService, PostService, SeaOrmAuthService, SeaOrmPostService, TokenIssuer,
};

#[derive(Clone)]
pub struct SharedState {
    pub config: Arc<Config>,

    pub store: Store,

    pub auth_service: Arc<dyn AuthService>,

    pub post_service: Arc<dyn PostService>,
}

impl SharedState {
    /// Connects to the database, runs migrations, wires the services and
    /// creates the bootstrap superuser if one is configured.
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        let verifier = KickboxClient::from_config(&config.email_verification)?
            .map(|client| Arc::new(client) as Arc<dyn EmailVerifier>);
        if verifier.is_none() {
            info!("Email verification disabled");
        }

        Self::with_email_verifier(config, verifier).await
    }

    pub async fn with_email_verifier(
        config: Config,
        email_verifier: Option<Arc<dyn EmailVerifier>>,
    ) -> anyhow::Result<Self> {
        let store = Store::with_pool_options(
            &config.general.database_url,
            config.general.max_db_connections,
            config.general.min_db_connections,
        )
        .await?;

        let tokens = TokenIssuer::new(&config.auth.secret, config.auth.token_lifetime_seconds);

        let auth_service = Arc::new(SeaOrmAuthService::new(
            store.clone(),
            tokens,
            config.security.clone(),
            email_verifier,
        )) as Arc<dyn AuthService>;

        let post_service = Arc::new(SeaOrmPostService::new(store.clone())) as Arc<dyn PostService>;

        if let Some((email, password)) = config.first_superuser() {
            auth_service
                .create_first_superuser(email, password, &config.auth.first_superuser_username)
                .await
                .map_err(|e| anyhow::anyhow!("Failed to create first superuser: {e}"))?;
        }

        Ok(Self {
            config: Arc::new(config),
            store,
            auth_service,
            post_service,
        })
    }
}

use std::sync::Arc;

use anyhow::Context;
use sqlx::{postgres::PgPoolOptions, PgPool};

use crate::{
    auth::{repo::PgUserRepository, services::AuthService, token::TokenIssuer},
    config::AppConfig,
};

#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub config: Arc<AppConfig>,
    pub auth: Arc<AuthService>,
}

impl AppState {
    pub async fn init() -> anyhow::Result<Self> {
        let config = Arc::new(AppConfig::from_env()?);
        let db = PgPoolOptions::new()
            .max_connections(10)
            .connect(&config.database_url)
            .await
            .context("connect to database")?;
        Ok(Self::from_parts(db, config))
    }

    /// Wire the auth service from its collaborators. The repository and
    /// token issuer are constructed here once and injected; nothing in the
    /// auth path reaches for globals.
    pub fn from_parts(db: PgPool, config: Arc<AppConfig>) -> Self {
        let issuer = TokenIssuer::new(&config.jwt.secret, config.jwt.issuer.clone());
        let auth = Arc::new(AuthService::new(
            Arc::new(PgUserRepository::new(db.clone())),
            issuer,
            time::Duration::hours(config.jwt.ttl_hours),
        ));
        Self { db, config, auth }
    }
}

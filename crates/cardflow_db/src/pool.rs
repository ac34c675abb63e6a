//! Postgres pool construction.

use sqlx::postgres::PgPoolOptions;
use tracing::info;

use crate::error::{DbError, Result};

pub type DbPool = sqlx::PgPool;

#[derive(Debug, Clone)]
pub struct DbConfig {
    pub url: String,
    pub max_connections: u32,
}

impl DbConfig {
    pub fn from_url(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            max_connections: 10,
        }
    }

    pub fn with_max_connections(mut self, max: u32) -> Self {
        self.max_connections = max;
        self
    }
}

pub async fn create_pool(config: DbConfig) -> Result<DbPool> {
    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .connect(&config.url)
        .await
        .map_err(DbError::from)?;
    info!(max_connections = config.max_connections, "connected to postgres");
    Ok(pool)
}

/// Applies every migration under `migrations/` that the target database
/// hasn't recorded yet. Safe to call on every startup: a no-op once the
/// schema is current.
pub async fn run_migrations(pool: &DbPool) -> Result<()> {
    sqlx::migrate!("./migrations").run(pool).await.map_err(DbError::from)?;
    info!("database migrations up to date");
    Ok(())
}

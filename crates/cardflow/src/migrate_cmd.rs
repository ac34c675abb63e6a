use anyhow::{Context, Result};
use cardflow_db::DbConfig;

pub async fn run(database_url: &str) -> Result<()> {
    let pool = cardflow_db::create_pool(DbConfig::from_url(database_url))
        .await
        .context("failed to connect to postgres")?;
    cardflow_db::run_migrations(&pool).await.context("migration failed")?;
    tracing::info!("migrations applied");
    Ok(())
}

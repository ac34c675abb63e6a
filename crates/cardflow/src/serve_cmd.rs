use std::net::SocketAddr;

use anyhow::{Context, Result};
use cardflow_api::{AppConfig, AppState};
use cardflow_db::DbConfig;

pub struct ServeArgs {
    pub database_url: String,
    pub jwt_secret: String,
    pub bind_addr: SocketAddr,
    pub admin_token_ttl_seconds: i64,
    pub portal_token_ttl_seconds: i64,
    pub dashboard_cache_ttl_seconds: u64,
}

pub async fn run(args: ServeArgs) -> Result<()> {
    let pool = cardflow_db::create_pool(DbConfig::from_url(args.database_url))
        .await
        .context("failed to connect to postgres")?;
    cardflow_db::run_migrations(&pool).await.context("failed to apply migrations")?;

    let state = AppState::new(
        pool,
        AppConfig {
            jwt_secret: args.jwt_secret,
            admin_ttl_seconds: args.admin_token_ttl_seconds,
            portal_ttl_seconds: args.portal_token_ttl_seconds,
            dashboard_cache_ttl_seconds: args.dashboard_cache_ttl_seconds,
        },
    );

    let app = cardflow_api::router(state);
    let listener = tokio::net::TcpListener::bind(args.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", args.bind_addr))?;

    tracing::info!(addr = %args.bind_addr, "cardflow api listening");

    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        let _ = tokio::signal::ctrl_c().await;
    };

    #[cfg(unix)]
    let terminate = async {
        let mut signal = tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler");
        signal.recv().await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
    tracing::info!("shutdown signal received, draining in-flight requests");
}

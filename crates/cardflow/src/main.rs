//! CLI entry point. `serve` runs the HTTP API, `worker` runs the extraction
//! scheduler's poll loop, `migrate` applies pending schema migrations.

use std::net::SocketAddr;
use std::time::Duration as StdDuration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

mod migrate_cmd;
mod serve_cmd;
mod worker_cmd;

#[derive(Parser, Debug)]
#[command(name = "cardflow", about = "Work-hours card extraction and reconciliation platform")]
struct Cli {
    /// Enable verbose logging (info/debug to stderr as well as the log file)
    #[arg(short = 'v', long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the HTTP API (admin endpoints and the public upload portal).
    Serve {
        #[arg(long, env = "DATABASE_URL")]
        database_url: String,
        #[arg(long, env = "JWT_SECRET_KEY")]
        jwt_secret: String,
        #[arg(long, env = "BIND_ADDR", default_value = "0.0.0.0:8080")]
        bind_addr: SocketAddr,
        #[arg(long, env = "JWT_ACCESS_TOKEN_EXPIRES", default_value = "86400")]
        admin_token_ttl_seconds: i64,
        #[arg(long, env = "PORTAL_TOKEN_TTL_SECONDS", default_value = "3600")]
        portal_token_ttl_seconds: i64,
        #[arg(long, env = "DASHBOARD_CACHE_TTL_SECONDS", default_value = "30")]
        dashboard_cache_ttl_seconds: u64,
    },
    /// Run the extraction job scheduler's claim/execute poll loop.
    Worker {
        #[arg(long, env = "DATABASE_URL")]
        database_url: String,
        #[arg(long, env = "WORKER_ID")]
        worker_id: Option<String>,
        #[arg(long, env = "WORKER_POLL_SECONDS", default_value = "5")]
        poll_seconds: u64,
        #[arg(long, env = "MAX_RETRY_ATTEMPTS", default_value = "3")]
        max_attempts: i32,
        #[arg(long, env = "STALE_LOCK_MINUTES", default_value = "30")]
        stale_lock_minutes: u64,
        #[arg(long, env = "ENABLE_NAME_SITE_MATCH_FALLBACK", default_value = "false")]
        enable_name_site_fallback: bool,
        #[arg(long, env = "OPENAI_API_KEY")]
        openai_api_key: String,
        #[arg(long, env = "OPENAI_BASE_URL")]
        openai_base_url: Option<String>,
        #[arg(long, env = "OPENAI_MODEL", default_value = "gpt-4.1-mini")]
        vision_model_primary: String,
        #[arg(long, env = "OPENAI_FALLBACK_MODEL", default_value = "gpt-4.1-mini")]
        vision_model_fallback: String,
        #[arg(long, env = "OPENAI_FAST_VISION_MODEL", default_value = "gpt-4.1-mini")]
        vision_model_fast: String,
        #[arg(long, env = "OPENAI_VISION_TIMEOUT_SECONDS", default_value = "45")]
        vision_timeout_seconds: u64,
    },
    /// Apply every pending schema migration.
    Migrate {
        #[arg(long, env = "DATABASE_URL")]
        database_url: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    cardflow_logging::init_logging(cardflow_logging::LogConfig {
        app_name: "cardflow",
        verbose: cli.verbose,
        quiet_console: false,
    })
    .context("failed to initialize logging")?;

    match cli.command {
        Commands::Serve {
            database_url,
            jwt_secret,
            bind_addr,
            admin_token_ttl_seconds,
            portal_token_ttl_seconds,
            dashboard_cache_ttl_seconds,
        } => {
            serve_cmd::run(serve_cmd::ServeArgs {
                database_url,
                jwt_secret,
                bind_addr,
                admin_token_ttl_seconds,
                portal_token_ttl_seconds,
                dashboard_cache_ttl_seconds,
            })
            .await
        }
        Commands::Worker {
            database_url,
            worker_id,
            poll_seconds,
            max_attempts,
            stale_lock_minutes,
            enable_name_site_fallback,
            openai_api_key,
            openai_base_url,
            vision_model_primary,
            vision_model_fallback,
            vision_model_fast,
            vision_timeout_seconds,
        } => {
            worker_cmd::run(worker_cmd::WorkerArgs {
                database_url,
                worker_id: worker_id.unwrap_or_else(|| format!("worker-{}", &uuid::Uuid::new_v4().simple().to_string()[..8])),
                poll_interval: StdDuration::from_secs(poll_seconds),
                max_attempts,
                stale_threshold: StdDuration::from_secs(stale_lock_minutes * 60),
                enable_name_site_fallback,
                openai_api_key,
                openai_base_url,
                vision_model_primary,
                vision_model_fallback,
                vision_model_fast,
                vision_timeout: StdDuration::from_secs(vision_timeout_seconds),
            })
            .await
        }
        Commands::Migrate { database_url } => migrate_cmd::run(&database_url).await,
    }
}

//! Scheduler binary: polls for pending extraction jobs and runs them to
//! completion, one at a time per process, until asked to shut down.

use std::time::Duration;

use cardflow_db::{create_pool, DbConfig, PgEmployeeLookup};
use cardflow_matching::EmployeeResolver;
use cardflow_scheduler::pg::{PgEmployeeRecordStore, PgImageStore, PgJobStore, PgWorkCardStore};
use cardflow_scheduler::{Scheduler, SchedulerConfig, SystemClock, TracingLogger};
use cardflow_vision::{ChainVisionExtractor, GateConfig, OpenAiVisionExtractor};
use clap::Parser;

#[derive(Parser, Debug)]
#[command(name = "cardflow-scheduler", about = "Extraction job scheduler")]
struct Args {
    #[arg(long, env = "DATABASE_URL")]
    database_url: String,

    #[arg(long, env = "OPENAI_API_KEY")]
    openai_api_key: String,

    #[arg(long, env = "OPENAI_MODEL", default_value = "gpt-4.1")]
    openai_model: String,

    #[arg(long, env = "OPENAI_FALLBACK_MODEL")]
    openai_fallback_model: Option<String>,

    #[arg(long, env = "OPENAI_VISION_MODEL_CHAIN", value_delimiter = ',')]
    openai_vision_model_chain: Vec<String>,

    #[arg(long, env = "OPENAI_VISION_TIMEOUT_SECONDS", default_value_t = 45)]
    openai_vision_timeout_seconds: u64,

    #[arg(long, env = "WORKER_POLL_SECONDS", default_value_t = 5)]
    worker_poll_seconds: u64,

    #[arg(long, env = "MAX_RETRY_ATTEMPTS", default_value_t = 3)]
    max_retry_attempts: i32,

    #[arg(long, env = "STALE_LOCK_MINUTES", default_value_t = 30)]
    stale_lock_minutes: i64,

    #[arg(long, env = "ENABLE_NAME_SITE_MATCH_FALLBACK", default_value_t = false)]
    enable_name_site_match_fallback: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    cardflow_logging::init_logging(cardflow_logging::LogConfig {
        app_name: "cardflow-scheduler",
        verbose: false,
        quiet_console: false,
    })?;

    let args = Args::parse();
    let pool = create_pool(DbConfig::from_url(args.database_url.clone())).await?;

    let worker_id = format!("scheduler-{}", uuid::Uuid::new_v4());
    let config = SchedulerConfig {
        worker_id,
        stale_threshold: Duration::from_secs((args.stale_lock_minutes * 60).max(0) as u64),
        max_attempts: args.max_retry_attempts,
        enable_name_site_fallback: args.enable_name_site_match_fallback,
        gate: GateConfig::default(),
    };

    let openai = OpenAiVisionExtractor::new(args.openai_api_key);
    let vision = ChainVisionExtractor::new(
        openai,
        args.openai_model,
        args.openai_fallback_model,
        None,
        args.openai_vision_model_chain,
        Duration::from_secs(args.openai_vision_timeout_seconds),
    );

    let lookup = PgEmployeeLookup::new(pool.clone());
    let resolver = EmployeeResolver::new(lookup);

    let scheduler = Scheduler {
        jobs: PgJobStore::new(pool.clone()),
        cards: PgWorkCardStore::new(pool.clone()),
        images: PgImageStore::new(pool.clone()),
        employees: PgEmployeeRecordStore::new(pool.clone()),
        vision,
        resolver,
        clock: SystemClock,
        logger: TracingLogger,
        config,
    };

    let mut interval = tokio::time::interval(Duration::from_secs(args.worker_poll_seconds));
    tracing::info!("scheduler started");

    loop {
        tokio::select! {
            _ = interval.tick() => {
                if let Err(err) = scheduler.tick().await {
                    tracing::error!(error = %err, "scheduler tick failed");
                }
            }
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("shutdown signal received");
                break;
            }
        }
    }

    Ok(())
}

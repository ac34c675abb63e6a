use std::time::Duration;

use anyhow::{Context, Result};
use cardflow_db::{DbConfig, PgEmployeeLookup};
use cardflow_matching::EmployeeResolver;
use cardflow_scheduler::pg::{PgEmployeeRecordStore, PgImageStore, PgJobStore, PgWorkCardStore};
use cardflow_scheduler::{CancellationToken, Scheduler, SchedulerConfig, SystemClock, TracingLogger};
use cardflow_vision::{ChainVisionExtractor, GateConfig, OpenAiVisionExtractor};

pub struct WorkerArgs {
    pub database_url: String,
    pub worker_id: String,
    pub poll_interval: Duration,
    pub max_attempts: i32,
    pub stale_threshold: Duration,
    pub enable_name_site_fallback: bool,
    pub openai_api_key: String,
    pub openai_base_url: Option<String>,
    pub vision_model_primary: String,
    pub vision_model_fallback: String,
    pub vision_model_fast: String,
    pub vision_timeout: Duration,
}

pub async fn run(args: WorkerArgs) -> Result<()> {
    let pool = cardflow_db::create_pool(DbConfig::from_url(args.database_url))
        .await
        .context("failed to connect to postgres")?;

    let mut vision_client = OpenAiVisionExtractor::new(args.openai_api_key);
    if let Some(base_url) = args.openai_base_url {
        vision_client = vision_client.with_base_url(base_url);
    }

    let scheduler = Scheduler {
        jobs: PgJobStore::new(pool.clone()),
        cards: PgWorkCardStore::new(pool.clone()),
        images: PgImageStore::new(pool.clone()),
        employees: PgEmployeeRecordStore::new(pool.clone()),
        vision: ChainVisionExtractor::new(
            vision_client,
            args.vision_model_primary,
            Some(args.vision_model_fallback),
            Some(args.vision_model_fast),
            vec![],
            args.vision_timeout,
        ),
        resolver: EmployeeResolver::new(PgEmployeeLookup::new(pool.clone())),
        clock: SystemClock,
        logger: TracingLogger,
        config: SchedulerConfig {
            worker_id: args.worker_id.clone(),
            stale_threshold: args.stale_threshold,
            max_attempts: args.max_attempts,
            enable_name_site_fallback: args.enable_name_site_fallback,
            gate: GateConfig::default(),
        },
    };

    tracing::info!(worker_id = %args.worker_id, "cardflow worker starting");

    let cancel = CancellationToken::new();
    let shutdown_cancel = cancel.clone();
    tokio::spawn(async move {
        let _ = tokio::signal::ctrl_c().await;
        tracing::info!("shutdown signal received, stopping after the current job");
        shutdown_cancel.cancel();
    });

    while !cancel.is_cancelled() {
        match scheduler.tick().await {
            Ok(true) => continue,
            Ok(false) => tokio::time::sleep(args.poll_interval).await,
            Err(err) => {
                tracing::error!(error = %err, "scheduler tick failed");
                tokio::time::sleep(args.poll_interval).await;
            }
        }
    }

    tracing::info!("cardflow worker stopped");
    Ok(())
}

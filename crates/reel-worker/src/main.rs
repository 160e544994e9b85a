//! Pipeline worker binary.

use std::sync::Arc;

use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use reel_db::{PgVideoStore, VideoStore};
use reel_media::FfmpegEngine;
use reel_queue::JobQueue;
use reel_storage::S3Store;
use reel_worker::{JobExecutor, StageContext, WorkerConfig};

#[tokio::main]
async fn main() {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize tracing with colored output for dev, JSON for production
    let use_json = std::env::var("LOG_FORMAT")
        .map(|v| v.to_lowercase() == "json")
        .unwrap_or(false);

    let env_filter = EnvFilter::from_default_env()
        .add_directive("reel=info".parse().unwrap());

    if use_json {
        tracing_subscriber::registry()
            .with(fmt::layer().json())
            .with(env_filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_ansi(true)
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_file(false)
                    .with_line_number(false),
            )
            .with(env_filter)
            .init();
    }

    info!("Starting reel-worker");

    if let Err(e) = reel_media::check_ffmpeg() {
        error!("{}", e);
        std::process::exit(1);
    }

    let config = WorkerConfig::from_env();
    info!("Worker config: {:?}", config);

    let queue = match JobQueue::from_env() {
        Ok(q) => Arc::new(q),
        Err(e) => {
            error!("Failed to create stage queue: {}", e);
            std::process::exit(1);
        }
    };

    let storage = match S3Store::from_env() {
        Ok(s) => Arc::new(s),
        Err(e) => {
            error!("Failed to create storage client: {}", e);
            std::process::exit(1);
        }
    };

    let store = match PgVideoStore::from_env().await {
        Ok(s) => s,
        Err(e) => {
            error!("Failed to connect to database: {}", e);
            std::process::exit(1);
        }
    };
    if let Err(e) = store.ensure_schema().await {
        error!("Failed to prepare schema: {}", e);
        std::process::exit(1);
    }
    let store: Arc<dyn VideoStore> = Arc::new(store);

    let ctx = StageContext::new(
        queue.clone(),
        storage,
        store,
        Arc::new(FfmpegEngine::new()),
        config.clone(),
    );

    let executor = Arc::new(JobExecutor::new(config, queue, ctx));

    // Setup signal handler for graceful shutdown
    let shutdown_executor = Arc::clone(&executor);
    tokio::spawn(async move {
        tokio::signal::ctrl_c().await.ok();
        info!("Received shutdown signal");
        shutdown_executor.shutdown();
    });

    if let Err(e) = executor.run().await {
        error!("Executor error: {}", e);
        std::process::exit(1);
    }

    info!("Worker shutdown complete");
}

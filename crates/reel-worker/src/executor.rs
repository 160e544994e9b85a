//! Message executor.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Semaphore;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use reel_queue::{Enqueue, JobQueue, StageMessage};

use crate::config::WorkerConfig;
use crate::context::StageContext;
use crate::error::{StageError, StageResult};
use crate::handlers;

/// Executor that pulls stage messages from the queue and runs handlers to
/// completion, bounded by a concurrency limit.
///
/// A message either completes (side effects enqueued/persisted, then
/// acked) or fails: permanent failures go straight to the DLQ, transient
/// ones are left for the queue's redelivery policy.
pub struct JobExecutor {
    config: WorkerConfig,
    queue: Arc<JobQueue>,
    ctx: Arc<StageContext>,
    job_semaphore: Arc<Semaphore>,
    shutdown: tokio::sync::watch::Sender<bool>,
    consumer_name: String,
}

impl JobExecutor {
    /// Create a new executor around a processing context.
    pub fn new(config: WorkerConfig, queue: Arc<JobQueue>, ctx: StageContext) -> Self {
        let job_semaphore = Arc::new(Semaphore::new(config.max_concurrent_jobs));
        let (shutdown, _) = tokio::sync::watch::channel(false);
        let consumer_name = format!("worker-{}", Uuid::new_v4());

        Self {
            config,
            queue,
            ctx: Arc::new(ctx),
            job_semaphore,
            shutdown,
            consumer_name,
        }
    }

    /// Run the consumption loop until shutdown.
    pub async fn run(&self) -> StageResult<()> {
        info!(
            "Starting executor '{}' with {} max concurrent stages",
            self.consumer_name, self.config.max_concurrent_jobs
        );

        self.queue.init().await?;

        let mut shutdown_rx = self.shutdown.subscribe();

        // Periodically claim messages orphaned by crashed workers.
        let queue_clone = Arc::clone(&self.queue);
        let ctx_clone = Arc::clone(&self.ctx);
        let semaphore_clone = Arc::clone(&self.job_semaphore);
        let consumer_name = self.consumer_name.clone();
        let claim_interval = self.config.claim_interval;
        let claim_min_idle = self.config.claim_min_idle;
        let mut shutdown_rx_claim = self.shutdown.subscribe();

        let claim_task = tokio::spawn(async move {
            let mut interval = tokio::time::interval(claim_interval);
            loop {
                tokio::select! {
                    _ = shutdown_rx_claim.changed() => {
                        if *shutdown_rx_claim.borrow() {
                            break;
                        }
                    }
                    _ = interval.tick() => {
                        match queue_clone
                            .claim_pending(&consumer_name, claim_min_idle.as_millis() as u64, 5)
                            .await
                        {
                            Ok(messages) if !messages.is_empty() => {
                                info!("Claimed {} pending messages", messages.len());
                                for (message_id, message) in messages {
                                    let ctx = Arc::clone(&ctx_clone);
                                    let queue = Arc::clone(&queue_clone);
                                    let Ok(permit) =
                                        semaphore_clone.clone().acquire_owned().await
                                    else {
                                        break;
                                    };
                                    tokio::spawn(async move {
                                        let _permit = permit;
                                        Self::execute_message(ctx, queue, message_id, message)
                                            .await;
                                    });
                                }
                            }
                            Ok(_) => {}
                            Err(e) => {
                                warn!("Failed to claim pending messages: {}", e);
                            }
                        }
                    }
                }
            }
        });

        // Main consumption loop
        loop {
            tokio::select! {
                _ = shutdown_rx.changed() => {
                    if *shutdown_rx.borrow() {
                        info!("Shutdown signal received, stopping executor");
                        break;
                    }
                }
                result = self.consume_messages() => {
                    if let Err(e) = result {
                        error!("Error consuming messages: {}", e);
                        tokio::time::sleep(Duration::from_secs(5)).await;
                    }
                }
            }
        }

        claim_task.abort();

        info!("Waiting for in-flight stages to complete...");
        let _ = tokio::time::timeout(self.config.shutdown_timeout, self.wait_for_jobs()).await;

        info!("Executor stopped");
        Ok(())
    }

    /// Consume and dispatch a batch of messages.
    async fn consume_messages(&self) -> StageResult<()> {
        let available = self.job_semaphore.available_permits();
        if available == 0 {
            tokio::time::sleep(Duration::from_millis(100)).await;
            return Ok(());
        }

        let messages = self
            .queue
            .consume(&self.consumer_name, 1000, available.min(5))
            .await?;

        if messages.is_empty() {
            return Ok(());
        }

        debug!("Consumed {} messages from queue", messages.len());

        for (message_id, message) in messages {
            let ctx = Arc::clone(&self.ctx);
            let queue = Arc::clone(&self.queue);
            let permit = self
                .job_semaphore
                .clone()
                .acquire_owned()
                .await
                .map_err(|_| StageError::malformed("Semaphore closed"))?;

            tokio::spawn(async move {
                let _permit = permit;
                Self::execute_message(ctx, queue, message_id, message).await;
            });
        }

        Ok(())
    }

    /// Execute one message with ack, retry and DLQ handling.
    async fn execute_message(
        ctx: Arc<StageContext>,
        queue: Arc<JobQueue>,
        message_id: String,
        message: StageMessage,
    ) {
        match handlers::dispatch(&ctx, &message).await {
            Ok(()) => {
                if let Err(e) = queue.ack(&message_id).await {
                    error!("Failed to ack message {}: {}", message_id, e);
                }
            }
            Err(e) if e.is_permanent() => {
                // Redelivery cannot help; park it where an operator can see it.
                warn!(
                    stage = message.stage(),
                    "Permanent failure for message {}: {}", message_id, e
                );
                let payload = message.encode().unwrap_or_default();
                if let Err(dlq_err) = queue.dlq(&message_id, &payload, &e.to_string()).await {
                    error!("Failed to move message {} to DLQ: {}", message_id, dlq_err);
                }
            }
            Err(e) => {
                error!(
                    stage = message.stage(),
                    "Message {} failed: {}", message_id, e
                );

                let retry_count = queue.increment_retry(&message_id).await.unwrap_or(u32::MAX);
                let max_retries = queue.max_retries();

                if retry_count >= max_retries {
                    warn!(
                        "Message {} exceeded max retries ({}), moving to DLQ",
                        message_id, max_retries
                    );
                    let payload = message.encode().unwrap_or_default();
                    if let Err(dlq_err) = queue.dlq(&message_id, &payload, &e.to_string()).await {
                        error!("Failed to move message {} to DLQ: {}", message_id, dlq_err);
                    }
                } else {
                    info!(
                        "Message {} left for redelivery (attempt {}/{})",
                        message_id, retry_count, max_retries
                    );
                }
            }
        }
    }

    /// Wait for all in-flight stages to complete.
    async fn wait_for_jobs(&self) {
        loop {
            if self.job_semaphore.available_permits() == self.config.max_concurrent_jobs {
                break;
            }
            tokio::time::sleep(Duration::from_millis(100)).await;
        }
    }

    /// Signal shutdown.
    pub fn shutdown(&self) {
        let _ = self.shutdown.send(true);
    }

    /// Enqueue capability backed by this executor's queue, for seeding the
    /// pipeline (e.g. from an upload endpoint).
    pub fn enqueuer(&self) -> Arc<dyn Enqueue> {
        self.queue.clone()
    }
}

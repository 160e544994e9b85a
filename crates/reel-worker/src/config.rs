//! Worker configuration.

use std::path::PathBuf;
use std::time::Duration;

/// Worker configuration.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Maximum concurrent stage executions
    pub max_concurrent_jobs: usize,
    /// Root directory for job workspaces
    pub work_dir: PathBuf,
    /// HLS segment duration in seconds (observed configurations use 5-10)
    pub segment_seconds: u32,
    /// Number of stage reports that finalize a video.
    ///
    /// A property of the pipeline topology, not inferred at runtime:
    /// ingest, thumbnail and segment each report once. Adding a reporting
    /// stage means raising this, otherwise cleanup fires early.
    pub fan_in_threshold: i32,
    /// How often the worker scans for orphaned pending messages
    pub claim_interval: Duration,
    /// Minimum idle time before a pending message can be claimed
    pub claim_min_idle: Duration,
    /// Graceful shutdown timeout
    pub shutdown_timeout: Duration,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            max_concurrent_jobs: 10,
            work_dir: PathBuf::from("/tmp/reel"),
            segment_seconds: 10,
            fan_in_threshold: 3,
            claim_interval: Duration::from_secs(30),
            claim_min_idle: Duration::from_secs(300),
            shutdown_timeout: Duration::from_secs(30),
        }
    }
}

impl WorkerConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        Self {
            max_concurrent_jobs: std::env::var("WORKER_MAX_JOBS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(10),
            work_dir: std::env::var("WORKER_WORK_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("/tmp/reel")),
            segment_seconds: std::env::var("PIPELINE_SEGMENT_SECONDS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(10),
            fan_in_threshold: std::env::var("PIPELINE_FAN_IN")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(3),
            claim_interval: Duration::from_secs(
                std::env::var("WORKER_CLAIM_INTERVAL_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(30),
            ),
            claim_min_idle: Duration::from_secs(
                std::env::var("WORKER_CLAIM_MIN_IDLE_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(300),
            ),
            shutdown_timeout: Duration::from_secs(
                std::env::var("WORKER_SHUTDOWN_TIMEOUT")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(30),
            ),
        }
    }
}

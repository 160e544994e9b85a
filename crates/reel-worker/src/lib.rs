//! Pipeline worker.
//!
//! This crate provides:
//! - Per-execution job workspaces with unconditional cleanup
//! - The completion barrier gating upstream-source deletion
//! - One handler per pipeline stage, plus the router
//! - The queue-driven executor with retry/DLQ handling

pub mod barrier;
pub mod config;
pub mod context;
pub mod error;
pub mod executor;
pub mod handlers;
pub mod workspace;

pub use barrier::CompletionBarrier;
pub use config::WorkerConfig;
pub use context::StageContext;
pub use error::{StageError, StageResult};
pub use executor::JobExecutor;
pub use workspace::JobWorkspace;

//! Stage message queue on Redis Streams.
//!
//! This crate provides:
//! - `StageMessage`, the wire type chaining pipeline stages together
//! - The `Enqueue` capability handlers use for fan-out
//! - `JobQueue`: consumer groups, ack, DLQ, retry counters, and
//!   crash-recovery claiming of idle pending messages

pub mod error;
pub mod message;
pub mod queue;

pub use error::{QueueError, QueueResult};
pub use message::{Enqueue, MemoryQueue, StageMessage};
pub use queue::{JobQueue, QueueConfig};

//! Shared data models for the Reel pipeline.
//!
//! This crate provides Serde-serializable types for:
//! - Video identifiers and persisted video records
//! - The processing state derived from the completion counter
//! - The deterministic object-key scheme shared by all stages

pub mod keys;
pub mod video;

// Re-export common types
pub use video::{ProcessingState, VideoId, VideoRecord};

//! FFmpeg CLI wrapper for pipeline media transforms.
//!
//! This crate provides:
//! - Type-safe FFmpeg command building
//! - The `MediaEngine` trait with the three pipeline operations
//!   (normalize, preview frame, HLS segmenting)

pub mod command;
pub mod engine;
pub mod error;

pub use command::{check_ffmpeg, FfmpegCommand, FfmpegRunner};
pub use engine::{FfmpegEngine, MediaEngine};
pub use error::{MediaError, MediaResult};

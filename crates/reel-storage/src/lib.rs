//! Object storage gateway for pipeline artifacts.
//!
//! This crate provides:
//! - The `ObjectStore` trait every stage talks to
//! - An S3-compatible implementation (`S3Store`)
//! - An in-memory implementation for tests and local development
//! - Directory upload for multi-file artifacts (HLS packages)

pub mod error;
pub mod s3;
pub mod store;

pub use error::{StorageError, StorageResult};
pub use s3::{S3Config, S3Store};
pub use store::{content_type_for, put_dir, MemoryStore, ObjectStore};

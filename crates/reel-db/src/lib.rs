//! Video record persistence.
//!
//! This crate provides:
//! - The `VideoStore` trait, including the atomic `increment_and_get`
//!   the completion barrier is built on
//! - A Postgres implementation (`PgVideoStore`)
//! - An in-memory implementation for tests and local development

pub mod error;
pub mod postgres;
pub mod store;

pub use error::{DbError, DbResult};
pub use postgres::PgVideoStore;
pub use store::{MemoryVideoStore, VideoStore};

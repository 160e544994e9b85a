//! The `VideoStore` trait and the in-memory implementation.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;
use reel_models::{VideoId, VideoRecord};

use crate::error::{DbError, DbResult};

/// Persistence boundary for video records.
///
/// `increment_and_get` is the completion barrier's primitive and MUST be
/// atomic at the storage layer: increments arriving in any interleaving
/// sum to the same final value, and exactly one caller observes each
/// intermediate value. Never implement it as a read followed by a write.
#[async_trait]
pub trait VideoStore: Send + Sync {
    /// Create the record if absent; an existing record (redelivered ingest)
    /// keeps its counter.
    async fn upsert(&self, owner: &str, name: &str) -> DbResult<VideoRecord>;

    /// Fetch a record by identifier.
    async fn get(&self, id: &VideoId) -> DbResult<Option<VideoRecord>>;

    /// Atomically increment the completion counter and return the new value.
    async fn increment_and_get(&self, id: &VideoId) -> DbResult<i32>;
}

/// In-memory store used in tests and local development.
///
/// A single mutex over the map makes the increment trivially atomic.
#[derive(Default)]
pub struct MemoryVideoStore {
    records: Mutex<HashMap<VideoId, VideoRecord>>,
}

impl MemoryVideoStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl VideoStore for MemoryVideoStore {
    async fn upsert(&self, owner: &str, name: &str) -> DbResult<VideoRecord> {
        let mut records = self.records.lock().unwrap();
        let id = VideoId::derive(owner, name);
        let record = records
            .entry(id)
            .or_insert_with(|| VideoRecord::new(owner, name));
        record.updated_at = Utc::now();
        Ok(record.clone())
    }

    async fn get(&self, id: &VideoId) -> DbResult<Option<VideoRecord>> {
        Ok(self.records.lock().unwrap().get(id).cloned())
    }

    async fn increment_and_get(&self, id: &VideoId) -> DbResult<i32> {
        let mut records = self.records.lock().unwrap();
        let record = records
            .get_mut(id)
            .ok_or_else(|| DbError::not_found(id.as_str()))?;
        record.status += 1;
        record.updated_at = Utc::now();
        Ok(record.status)
    }
}

//! The completion barrier.
//!
//! Three stages (ingest, thumbnail, segment) each report completion once
//! per successful run, with no knowledge of each other or of how many
//! stages exist in total. The persisted counter is the barrier: each report
//! is an atomic increment, and increments arriving in any interleaving sum
//! to the same final value, so exactly one report observes the
//! threshold-crossing value and gets to finalize.

use std::sync::Arc;

use reel_db::{DbResult, VideoStore};
use reel_models::VideoId;
use tracing::debug;

/// Per-video fan-in barrier over the persisted completion counter.
#[derive(Clone)]
pub struct CompletionBarrier {
    store: Arc<dyn VideoStore>,
    threshold: i32,
}

impl CompletionBarrier {
    /// Create a barrier. `threshold` comes from pipeline configuration,
    /// never inferred at runtime.
    pub fn new(store: Arc<dyn VideoStore>, threshold: i32) -> Self {
        Self { store, threshold }
    }

    /// Record one stage completion, returning the freshly observed count.
    ///
    /// No side effect happens before the increment commits, so a failed
    /// report is safe to re-attempt from scratch on redelivery.
    pub async fn report(&self, owner: &str, video: &str) -> DbResult<i32> {
        let id = VideoId::derive(owner, video);
        let count = self.store.increment_and_get(&id).await?;
        debug!(video = %id, count, threshold = self.threshold, "Completion reported");
        Ok(count)
    }

    /// Whether the caller that observed `new_count` finalizes.
    ///
    /// Strict equality: under duplicate delivery the counter keeps
    /// climbing past the threshold, and those late reports must not
    /// re-trigger cleanup.
    pub fn should_finalize(&self, new_count: i32) -> bool {
        new_count == self.threshold
    }

    pub fn threshold(&self) -> i32 {
        self.threshold
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reel_db::MemoryVideoStore;

    async fn barrier_with_video(threshold: i32) -> CompletionBarrier {
        let store = Arc::new(MemoryVideoStore::new());
        store.upsert("u1", "v1").await.unwrap();
        CompletionBarrier::new(store, threshold)
    }

    #[tokio::test]
    async fn reports_sum_regardless_of_order() {
        let barrier = barrier_with_video(3).await;
        let mut counts = vec![
            barrier.report("u1", "v1").await.unwrap(),
            barrier.report("u1", "v1").await.unwrap(),
            barrier.report("u1", "v1").await.unwrap(),
        ];
        counts.sort_unstable();
        assert_eq!(counts, vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn exactly_one_concurrent_report_finalizes() {
        let barrier = barrier_with_video(3).await;

        let mut handles = Vec::new();
        for _ in 0..3 {
            let barrier = barrier.clone();
            handles.push(tokio::spawn(async move {
                let count = barrier.report("u1", "v1").await.unwrap();
                barrier.should_finalize(count)
            }));
        }

        let mut finalizers = 0;
        for handle in handles {
            if handle.await.unwrap() {
                finalizers += 1;
            }
        }
        assert_eq!(finalizers, 1);
    }

    #[tokio::test]
    async fn duplicate_report_past_threshold_never_finalizes_again() {
        let barrier = barrier_with_video(3).await;
        for _ in 0..3 {
            barrier.report("u1", "v1").await.unwrap();
        }

        // At-least-once delivery: a duplicate report still increments
        let count = barrier.report("u1", "v1").await.unwrap();
        assert_eq!(count, 4);
        assert!(!barrier.should_finalize(count));
    }

    #[tokio::test]
    async fn report_before_record_exists_is_an_error() {
        let store = Arc::new(MemoryVideoStore::new());
        let barrier = CompletionBarrier::new(store, 3);
        assert!(barrier.report("u1", "ghost").await.is_err());
    }
}

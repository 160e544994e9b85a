//! Pipeline integration tests.
//!
//! These run the real handlers against in-memory collaborators and a stub
//! transcoding engine, so every delivery ordering and failure mode can be
//! exercised deterministically.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;

use reel_db::{MemoryVideoStore, VideoStore};
use reel_media::{MediaEngine, MediaError, MediaResult};
use reel_models::{keys, VideoId};
use reel_queue::{Enqueue, MemoryQueue, StageMessage};
use reel_storage::{MemoryStore, ObjectStore, StorageResult};
use reel_worker::{handlers, StageContext, StageError, WorkerConfig};

/// Engine that fabricates plausible outputs without invoking ffmpeg.
struct StubEngine;

#[async_trait]
impl MediaEngine for StubEngine {
    async fn normalize(&self, input: &Path, output: &Path) -> MediaResult<()> {
        let bytes = tokio::fs::read(input).await?;
        tokio::fs::write(output, [b"normalized:".as_slice(), &bytes].concat()).await?;
        Ok(())
    }

    async fn extract_preview_frame(&self, input: &Path, output: &Path) -> MediaResult<()> {
        tokio::fs::read(input).await?;
        tokio::fs::write(output, b"\xff\xd8jpeg").await?;
        Ok(())
    }

    async fn segment(
        &self,
        input: &Path,
        out_dir: &Path,
        _segment_seconds: u32,
    ) -> MediaResult<PathBuf> {
        tokio::fs::read(input).await?;
        tokio::fs::create_dir_all(out_dir).await?;
        let manifest = out_dir.join("vid.m3u8");
        tokio::fs::write(&manifest, b"#EXTM3U\nvid0.ts\nvid1.ts\n").await?;
        tokio::fs::write(out_dir.join("vid0.ts"), b"segment-0").await?;
        tokio::fs::write(out_dir.join("vid1.ts"), b"segment-1").await?;
        Ok(manifest)
    }
}

/// Engine whose transform always fails transiently.
struct FailingEngine;

#[async_trait]
impl MediaEngine for FailingEngine {
    async fn normalize(&self, _input: &Path, _output: &Path) -> MediaResult<()> {
        Err(MediaError::ffmpeg_failed("engine crashed", None, Some(1)))
    }

    async fn extract_preview_frame(&self, _input: &Path, _output: &Path) -> MediaResult<()> {
        Err(MediaError::ffmpeg_failed("engine crashed", None, Some(1)))
    }

    async fn segment(
        &self,
        _input: &Path,
        _out_dir: &Path,
        _segment_seconds: u32,
    ) -> MediaResult<PathBuf> {
        Err(MediaError::ffmpeg_failed("engine crashed", None, Some(1)))
    }
}

/// Object store wrapper that counts effective deletions.
struct CountingStore {
    inner: MemoryStore,
    deletions: AtomicUsize,
}

impl CountingStore {
    fn new(inner: MemoryStore) -> Self {
        Self {
            inner,
            deletions: AtomicUsize::new(0),
        }
    }

    fn deletions(&self) -> usize {
        self.deletions.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ObjectStore for CountingStore {
    async fn fetch_bytes(&self, key: &str) -> StorageResult<Vec<u8>> {
        self.inner.fetch_bytes(key).await
    }

    async fn fetch_to_file(&self, key: &str, path: &Path) -> StorageResult<()> {
        self.inner.fetch_to_file(key, path).await
    }

    async fn put_bytes(&self, data: Vec<u8>, key: &str, content_type: &str) -> StorageResult<()> {
        self.inner.put_bytes(data, key, content_type).await
    }

    async fn put_file(&self, path: &Path, key: &str, content_type: &str) -> StorageResult<()> {
        self.inner.put_file(path, key, content_type).await
    }

    async fn delete(&self, key: &str) -> StorageResult<bool> {
        let deleted = self.inner.delete(key).await?;
        if deleted {
            self.deletions.fetch_add(1, Ordering::SeqCst);
        }
        Ok(deleted)
    }

    async fn exists(&self, key: &str) -> StorageResult<bool> {
        self.inner.exists(key).await
    }
}

struct Fixture {
    ctx: StageContext,
    queue: Arc<MemoryQueue>,
    storage: Arc<CountingStore>,
    store: Arc<MemoryVideoStore>,
    _work_root: tempfile::TempDir,
}

fn fixture_with_engine(engine: Arc<dyn MediaEngine>) -> Fixture {
    let work_root = tempfile::tempdir().unwrap();
    let queue = Arc::new(MemoryQueue::new());
    let storage = Arc::new(CountingStore::new(MemoryStore::new()));
    let store = Arc::new(MemoryVideoStore::new());

    let config = WorkerConfig {
        work_dir: work_root.path().to_path_buf(),
        ..WorkerConfig::default()
    };

    let ctx = StageContext::new(
        queue.clone() as Arc<dyn Enqueue>,
        storage.clone() as Arc<dyn ObjectStore>,
        store.clone() as Arc<dyn VideoStore>,
        engine,
        config,
    );

    Fixture {
        ctx,
        queue,
        storage,
        store,
        _work_root: work_root,
    }
}

fn fixture() -> Fixture {
    fixture_with_engine(Arc::new(StubEngine))
}

async fn seed_upload(fx: &Fixture, owner: &str, video: &str) {
    fx.storage
        .put_bytes(
            b"raw-upload".to_vec(),
            &keys::source_key(owner, video),
            "application/octet-stream",
        )
        .await
        .unwrap();
}

/// Drain the queue, dispatching every message until the pipeline settles.
async fn run_to_completion(fx: &Fixture) {
    loop {
        let batch = fx.queue.drain();
        if batch.is_empty() {
            break;
        }
        for message in batch {
            handlers::dispatch(&fx.ctx, &message).await.unwrap();
        }
    }
}

#[tokio::test]
async fn end_to_end_pipeline_finalizes_and_keeps_artifacts() {
    let fx = fixture();
    seed_upload(&fx, "u1", "v1").await;

    handlers::dispatch(
        &fx.ctx,
        &StageMessage::Ingest {
            owner: "u1".to_string(),
            video: "v1".to_string(),
        },
    )
    .await
    .unwrap();

    // Ingest fans out thumbnail, segment and its own report
    let stages: Vec<_> = fx.queue.messages().iter().map(|m| m.stage()).collect();
    assert_eq!(stages, vec!["thumbnail", "segment", "report-progress"]);

    run_to_completion(&fx).await;

    // All three stages reported
    let record = fx
        .store
        .get(&VideoId::derive("u1", "v1"))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(record.status, 3);

    // Upstream source is gone; derived artifacts remain
    assert!(!fx.storage.exists(&keys::source_key("u1", "v1")).await.unwrap());
    assert!(fx
        .storage
        .exists(&keys::thumbnail_key("u1", "v1"))
        .await
        .unwrap());
    assert!(fx
        .storage
        .exists(&keys::manifest_key("u1", "v1"))
        .await
        .unwrap());
    assert!(fx
        .storage
        .exists("users/u1/videos/v1/hls/vid0.ts")
        .await
        .unwrap());
    assert_eq!(fx.storage.deletions(), 1);
}

#[tokio::test]
async fn stage_order_does_not_matter() {
    let fx = fixture();
    seed_upload(&fx, "u1", "v1").await;

    handlers::dispatch(
        &fx.ctx,
        &StageMessage::Ingest {
            owner: "u1".to_string(),
            video: "v1".to_string(),
        },
    )
    .await
    .unwrap();

    // Deliver the fan-out in reverse order
    let mut batch = fx.queue.drain();
    batch.reverse();
    for message in batch {
        handlers::dispatch(&fx.ctx, &message).await.unwrap();
    }
    run_to_completion(&fx).await;

    let record = fx
        .store
        .get(&VideoId::derive("u1", "v1"))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(record.status, 3);
    assert_eq!(fx.storage.deletions(), 1);
}

#[tokio::test]
async fn concurrent_reports_delete_the_source_exactly_once() {
    let fx = fixture();
    seed_upload(&fx, "u1", "v1").await;
    fx.store.upsert("u1", "v1").await.unwrap();

    let mut handles = Vec::new();
    for _ in 0..3 {
        let ctx = fx.ctx.clone();
        handles.push(tokio::spawn(async move {
            handlers::dispatch(
                &ctx,
                &StageMessage::ReportProgress {
                    owner: "u1".to_string(),
                    video: "v1".to_string(),
                },
            )
            .await
        }));
    }
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    assert_eq!(fx.storage.deletions(), 1);
    assert!(!fx.storage.exists(&keys::source_key("u1", "v1")).await.unwrap());
}

#[tokio::test]
async fn duplicate_report_increments_but_never_deletes_twice() {
    let fx = fixture();
    seed_upload(&fx, "u1", "v1").await;

    handlers::dispatch(
        &fx.ctx,
        &StageMessage::Ingest {
            owner: "u1".to_string(),
            video: "v1".to_string(),
        },
    )
    .await
    .unwrap();
    run_to_completion(&fx).await;
    assert_eq!(fx.storage.deletions(), 1);

    // At-least-once delivery: the same report arrives again
    handlers::dispatch(
        &fx.ctx,
        &StageMessage::ReportProgress {
            owner: "u1".to_string(),
            video: "v1".to_string(),
        },
    )
    .await
    .unwrap();

    let record = fx
        .store
        .get(&VideoId::derive("u1", "v1"))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(record.status, 4);
    assert_eq!(fx.storage.deletions(), 1);
}

#[tokio::test]
async fn workspace_is_removed_after_transform_failure() {
    let fx = fixture_with_engine(Arc::new(FailingEngine));
    seed_upload(&fx, "u1", "v1").await;

    let err = handlers::dispatch(
        &fx.ctx,
        &StageMessage::Thumbnail {
            owner: "u1".to_string(),
            video: "v1".to_string(),
        },
    )
    .await
    .unwrap_err();

    // Transient failure propagates for the queue to redeliver
    assert!(matches!(err, StageError::Media(_)));
    assert!(!err.is_permanent());

    // No workspace left behind
    let scope_dir = fx.ctx.config.work_dir.join("thumbnail");
    let leftovers: Vec<_> = std::fs::read_dir(&scope_dir)
        .map(|entries| entries.collect())
        .unwrap_or_default();
    assert!(leftovers.is_empty());
}

#[tokio::test]
async fn missing_upload_fails_the_stage_transiently() {
    let fx = fixture();
    // No seed: the source object does not exist

    let err = handlers::dispatch(
        &fx.ctx,
        &StageMessage::Ingest {
            owner: "u1".to_string(),
            video: "ghost".to_string(),
        },
    )
    .await
    .unwrap_err();

    assert!(matches!(err, StageError::Storage(_)));
    assert!(!err.is_permanent());
    // Nothing was fanned out
    assert!(fx.queue.messages().is_empty());
}

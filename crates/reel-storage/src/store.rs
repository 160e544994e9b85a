//! The `ObjectStore` trait and the in-memory implementation.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use async_trait::async_trait;
use tracing::debug;

use crate::error::{StorageError, StorageResult};

/// Gateway to named binary objects.
///
/// All operations are idempotent from the caller's perspective: repeating a
/// `put` with identical bytes is safe, and `delete` of an already-deleted
/// key is a tolerated no-op (`Ok(false)`), since the completion barrier may
/// attempt the delete twice under duplicate delivery.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Download an object into memory.
    async fn fetch_bytes(&self, key: &str) -> StorageResult<Vec<u8>>;

    /// Download an object to a local file, creating parent directories.
    async fn fetch_to_file(&self, key: &str, path: &Path) -> StorageResult<()>;

    /// Upload bytes under a key.
    async fn put_bytes(&self, data: Vec<u8>, key: &str, content_type: &str) -> StorageResult<()>;

    /// Upload a local file under a key.
    async fn put_file(&self, path: &Path, key: &str, content_type: &str) -> StorageResult<()>;

    /// Delete an object. Returns `Ok(false)` if the key was already gone.
    async fn delete(&self, key: &str) -> StorageResult<bool>;

    /// Check whether an object exists.
    async fn exists(&self, key: &str) -> StorageResult<bool>;
}

/// Guess a content type from a file extension.
pub fn content_type_for(path: &Path) -> &'static str {
    match path.extension().and_then(|e| e.to_str()) {
        Some("mp4") => "video/mp4",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("m3u8") => "application/vnd.apple.mpegurl",
        Some("ts") => "video/mp2t",
        _ => "application/octet-stream",
    }
}

/// Upload every regular file under `dir`, keyed by its path relative to
/// `dir` joined onto `key_prefix`.
///
/// Used by the segment stage, whose engine produces a manifest plus an
/// unknown number of segment files.
pub async fn put_dir(
    store: &dyn ObjectStore,
    dir: &Path,
    key_prefix: &str,
) -> StorageResult<Vec<String>> {
    let mut uploaded = Vec::new();
    let mut pending: Vec<PathBuf> = vec![dir.to_path_buf()];

    while let Some(current) = pending.pop() {
        let mut entries = tokio::fs::read_dir(&current).await?;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            let file_type = entry.file_type().await?;
            if file_type.is_dir() {
                pending.push(path);
            } else if file_type.is_file() {
                let relative = path
                    .strip_prefix(dir)
                    .map_err(|_| StorageError::InvalidKey(path.display().to_string()))?;
                let key = format!("{}/{}", key_prefix, relative.to_string_lossy());
                debug!("Uploading {} to {}", path.display(), key);
                store.put_file(&path, &key, content_type_for(&path)).await?;
                uploaded.push(key);
            }
        }
    }

    uploaded.sort();
    Ok(uploaded)
}

/// In-memory object store used in tests and local development.
#[derive(Default)]
pub struct MemoryStore {
    objects: Mutex<HashMap<String, (Vec<u8>, String)>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// All keys currently present, sorted.
    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<_> = self.objects.lock().unwrap().keys().cloned().collect();
        keys.sort();
        keys
    }

    /// Content type recorded for a key, if present.
    pub fn content_type(&self, key: &str) -> Option<String> {
        self.objects.lock().unwrap().get(key).map(|(_, ct)| ct.clone())
    }
}

#[async_trait]
impl ObjectStore for MemoryStore {
    async fn fetch_bytes(&self, key: &str) -> StorageResult<Vec<u8>> {
        self.objects
            .lock()
            .unwrap()
            .get(key)
            .map(|(data, _)| data.clone())
            .ok_or_else(|| StorageError::not_found(key))
    }

    async fn fetch_to_file(&self, key: &str, path: &Path) -> StorageResult<()> {
        let bytes = self.fetch_bytes(key).await?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(path, bytes).await?;
        Ok(())
    }

    async fn put_bytes(&self, data: Vec<u8>, key: &str, content_type: &str) -> StorageResult<()> {
        self.objects
            .lock()
            .unwrap()
            .insert(key.to_string(), (data, content_type.to_string()));
        Ok(())
    }

    async fn put_file(&self, path: &Path, key: &str, content_type: &str) -> StorageResult<()> {
        let data = tokio::fs::read(path).await?;
        self.put_bytes(data, key, content_type).await
    }

    async fn delete(&self, key: &str) -> StorageResult<bool> {
        Ok(self.objects.lock().unwrap().remove(key).is_some())
    }

    async fn exists(&self, key: &str) -> StorageResult<bool> {
        Ok(self.objects.lock().unwrap().contains_key(key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn delete_of_missing_key_is_a_no_op() {
        let store = MemoryStore::new();
        store
            .put_bytes(b"data".to_vec(), "users/u1/videos/v1/vid", "video/mp4")
            .await
            .unwrap();

        assert!(store.delete("users/u1/videos/v1/vid").await.unwrap());
        // Second delete tolerated, reported as a no-op
        assert!(!store.delete("users/u1/videos/v1/vid").await.unwrap());
    }

    #[tokio::test]
    async fn put_dir_uploads_relative_keys() {
        let dir = tempfile::tempdir().unwrap();
        tokio::fs::create_dir_all(dir.path().join("hls")).await.unwrap();
        tokio::fs::write(dir.path().join("hls/vid.m3u8"), b"#EXTM3U").await.unwrap();
        tokio::fs::write(dir.path().join("hls/vid0.ts"), b"seg").await.unwrap();

        let store = MemoryStore::new();
        let uploaded = put_dir(&store, dir.path(), "users/u1/videos/v1")
            .await
            .unwrap();

        assert_eq!(
            uploaded,
            vec![
                "users/u1/videos/v1/hls/vid.m3u8".to_string(),
                "users/u1/videos/v1/hls/vid0.ts".to_string(),
            ]
        );
        assert_eq!(
            store.content_type("users/u1/videos/v1/hls/vid.m3u8").unwrap(),
            "application/vnd.apple.mpegurl"
        );
    }
}

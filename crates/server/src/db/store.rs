//! Document stores: whole-collection persistence of JSON arrays.
//!
//! A store knows nothing about record shape. It loads and saves a
//! `Vec<serde_json::Value>` per path; typed decoding happens in
//! [`Database`](super::Database).

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};
use uuid::Uuid;

/// Errors raised by a [`DocumentStore`].
#[derive(Debug, Error)]
pub enum StoreError {
    /// The backing file could not be read or written.
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The backing file does not hold a JSON array.
    #[error("malformed collection {path}: {source}")]
    Malformed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// The operation did not complete within the configured timeout.
    #[error("timed out accessing {path}")]
    Timeout { path: PathBuf },
}

impl StoreError {
    pub(crate) fn io(path: &Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Persistence of a whole collection at a path.
///
/// Implementations must treat a missing collection as empty and must
/// replace a collection in one step on `save` (readers never observe a
/// half-written collection).
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Load every record stored at `path`.
    async fn load(&self, path: &Path) -> Result<Vec<Value>, StoreError>;

    /// Replace the records stored at `path`.
    async fn save(&self, path: &Path, records: &[Value]) -> Result<(), StoreError>;
}

// =============================================================================
// File Store
// =============================================================================

/// Store backed by one JSON file per collection.
///
/// Saves are atomic: the collection is written to a sibling temp file,
/// fsynced, and renamed over the target.
#[derive(Debug, Clone, Copy, Default)]
pub struct FileStore;

impl FileStore {
    /// Create a file store.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

#[async_trait]
impl DocumentStore for FileStore {
    async fn load(&self, path: &Path) -> Result<Vec<Value>, StoreError> {
        let bytes = match tokio::fs::read(path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "Collection file missing, treating as empty");
                return Ok(Vec::new());
            }
            Err(e) => return Err(StoreError::io(path, e)),
        };

        serde_json::from_slice(&bytes).map_err(|source| StoreError::Malformed {
            path: path.to_path_buf(),
            source,
        })
    }

    async fn save(&self, path: &Path, records: &[Value]) -> Result<(), StoreError> {
        let bytes = serde_json::to_vec_pretty(records).map_err(|source| StoreError::Malformed {
            path: path.to_path_buf(),
            source,
        })?;

        let parent = path.parent().filter(|p| !p.as_os_str().is_empty());
        if let Some(dir) = parent {
            tokio::fs::create_dir_all(dir)
                .await
                .map_err(|e| StoreError::io(dir, e))?;
        }

        let temp_path = temp_path_for(path);
        if let Err(e) = write_synced(&temp_path, &bytes).await {
            if let Err(cleanup) = tokio::fs::remove_file(&temp_path).await {
                warn!(path = %temp_path.display(), error = %cleanup, "Failed to remove temp file");
            }
            return Err(e);
        }

        tokio::fs::rename(&temp_path, path)
            .await
            .map_err(|e| StoreError::io(path, e))?;

        #[cfg(unix)]
        if let Some(dir) = parent {
            let dir_handle = tokio::fs::File::open(dir)
                .await
                .map_err(|e| StoreError::io(dir, e))?;
            dir_handle
                .sync_all()
                .await
                .map_err(|e| StoreError::io(dir, e))?;
        }

        debug!(path = %path.display(), records = records.len(), "Collection saved");
        Ok(())
    }
}

/// Hidden temp file next to `path`, unique per save.
fn temp_path_for(path: &Path) -> PathBuf {
    let file_name = path
        .file_name()
        .map_or_else(|| "collection".into(), |n| n.to_string_lossy());
    path.with_file_name(format!(".{file_name}.{}.tmp", Uuid::new_v4().simple()))
}

async fn write_synced(path: &Path, bytes: &[u8]) -> Result<(), StoreError> {
    let mut file = tokio::fs::File::create(path)
        .await
        .map_err(|e| StoreError::io(path, e))?;
    file.write_all(bytes)
        .await
        .map_err(|e| StoreError::io(path, e))?;
    file.sync_all().await.map_err(|e| StoreError::io(path, e))
}

// =============================================================================
// Memory Store
// =============================================================================

/// In-process store keyed by path, for tests and dry runs.
#[derive(Debug, Default)]
pub struct MemoryStore {
    collections: Mutex<HashMap<PathBuf, Vec<Value>>>,
}

impl MemoryStore {
    /// Create an empty memory store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-populate the collection at `path`.
    #[must_use]
    pub fn with_collection(self, path: impl Into<PathBuf>, records: Vec<Value>) -> Self {
        self.collections
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(path.into(), records);
        self
    }

    /// Snapshot of the collection at `path`, if it was ever saved.
    #[must_use]
    pub fn snapshot(&self, path: &Path) -> Option<Vec<Value>> {
        self.collections
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(path)
            .cloned()
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn load(&self, path: &Path) -> Result<Vec<Value>, StoreError> {
        Ok(self.snapshot(path).unwrap_or_default())
    }

    async fn save(&self, path: &Path, records: &[Value]) -> Result<(), StoreError> {
        self.collections
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(path.to_path_buf(), records.to_vec());
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_file_store_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let records = FileStore::new()
            .load(&dir.path().join("products.json"))
            .await
            .unwrap();
        assert!(records.is_empty());
    }

    #[tokio::test]
    async fn test_file_store_malformed_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("products.json");
        std::fs::write(&path, "{ not json").unwrap();

        let err = FileStore::new().load(&path).await.unwrap_err();
        assert!(matches!(err, StoreError::Malformed { .. }));
    }

    #[tokio::test]
    async fn test_file_store_object_is_malformed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("carts.json");
        std::fs::write(&path, r#"{"_id": "cart1"}"#).unwrap();

        let err = FileStore::new().load(&path).await.unwrap_err();
        assert!(matches!(err, StoreError::Malformed { .. }));
    }

    #[tokio::test]
    async fn test_file_store_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("carts.json");
        let records = vec![json!({"_id": "cart1", "products": ["p1", "p1"]})];

        let store = FileStore::new();
        store.save(&path, &records).await.unwrap();
        assert_eq!(store.load(&path).await.unwrap(), records);
    }

    #[tokio::test]
    async fn test_file_store_save_load_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("products.json");
        let records = vec![
            json!({"_id": "a", "name": "Lamp", "price": 12.5, "extra": {"k": [1, 2]}}),
            json!({"_id": "b", "name": "Desk"}),
        ];

        let store = FileStore::new();
        store.save(&path, &records).await.unwrap();
        let first = std::fs::read(&path).unwrap();

        let loaded = store.load(&path).await.unwrap();
        store.save(&path, &loaded).await.unwrap();
        let second = std::fs::read(&path).unwrap();

        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_file_store_leaves_no_temp_files() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("products.json");

        let store = FileStore::new();
        store.save(&path, &[json!({"_id": "a"})]).await.unwrap();
        store.save(&path, &[json!({"_id": "b"})]).await.unwrap();

        let names: Vec<String> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["products.json".to_string()]);
    }

    #[tokio::test]
    async fn test_memory_store_roundtrip() {
        let path = Path::new("mem/products.json");
        let store = MemoryStore::new().with_collection(path, vec![json!({"_id": "a"})]);

        assert_eq!(store.load(path).await.unwrap().len(), 1);
        store.save(path, &[]).await.unwrap();
        assert_eq!(store.snapshot(path), Some(Vec::new()));
        assert!(store.load(Path::new("other")).await.unwrap().is_empty());
    }
}

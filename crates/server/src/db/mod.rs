//! Data access over flat-file JSON collections.
//!
//! # Collections
//!
//! - `products` - Product documents with nested reviews (`data/products.json`)
//! - `carts` - Cart documents holding product ids (`data/carts.json`)
//!
//! Every mutation is a read-modify-write of the whole collection: load,
//! transform in memory, save. A per-path async mutex is held across that
//! cycle so concurrent writers within one process cannot lose updates.
//! Reads outside a mutation take no lock; atomic saves mean they see either
//! the old or the new collection.
//!
//! Records a mutation leaves untouched are written back exactly as they
//! were loaded, so fields and formatting this crate does not model survive.

pub mod carts;
pub mod export;
pub mod locks;
pub mod products;
pub mod store;

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;
use tokio::sync::OwnedMutexGuard;

use jsonshop_core::{Cart, Product, ProductNameError, RatingError};

pub use carts::{CartRepository, ExpandedCart};
pub use export::{CSV_FIELDS, CsvStream};
pub use locks::KeyedLocks;
pub use products::ProductRepository;
pub use store::{DocumentStore, FileStore, MemoryStore, StoreError};

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// The backing store failed (I/O, malformed file, timeout).
    #[error("storage error: {0}")]
    Storage(#[from] StoreError),

    /// A stored record does not decode to its domain type.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    /// Input failed field validation.
    #[error("validation failed: {0}")]
    Validation(String),

    /// Constraint violation (e.g., duplicate id).
    #[error("constraint violation: {0}")]
    Conflict(String),
}

impl RepositoryError {
    pub(crate) fn not_found(entity: &'static str, id: &impl ToString) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }
}

impl From<ProductNameError> for RepositoryError {
    fn from(err: ProductNameError) -> Self {
        Self::Validation(err.to_string())
    }
}

impl From<RatingError> for RepositoryError {
    fn from(err: RatingError) -> Self {
        Self::Validation(err.to_string())
    }
}

/// A record stored in a collection, identified by its `_id`.
pub(crate) trait Document: Serialize + DeserializeOwned + Clone + PartialEq {
    fn key(&self) -> &str;
}

impl Document for Product {
    fn key(&self) -> &str {
        self.id.as_str()
    }
}

impl Document for Cart {
    fn key(&self) -> &str {
        self.id.as_str()
    }
}

/// Where each collection lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectionPaths {
    pub products: PathBuf,
    pub carts: PathBuf,
}

impl CollectionPaths {
    /// Both collections under one directory, using the default file names.
    #[must_use]
    pub fn in_dir(dir: &Path) -> Self {
        Self {
            products: dir.join("products.json"),
            carts: dir.join("carts.json"),
        }
    }
}

/// Handle to the product and cart collections.
///
/// Cheaply cloneable via `Arc`; all clones share one lock registry.
#[derive(Clone)]
pub struct Database {
    inner: Arc<DatabaseInner>,
}

struct DatabaseInner {
    store: Arc<dyn DocumentStore>,
    locks: KeyedLocks,
    paths: CollectionPaths,
    timeout: Duration,
}

impl Database {
    /// Default bound on a single store call.
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

    /// Create a database over `store`.
    ///
    /// # Arguments
    ///
    /// * `store` - Backing document store
    /// * `paths` - Location of each collection within the store
    /// * `timeout` - Bound applied to every `load`/`save` call
    #[must_use]
    pub fn new(store: Arc<dyn DocumentStore>, paths: CollectionPaths, timeout: Duration) -> Self {
        Self {
            inner: Arc::new(DatabaseInner {
                store,
                locks: KeyedLocks::new(),
                paths,
                timeout,
            }),
        }
    }

    /// Database over an in-memory store, for tests.
    #[must_use]
    pub fn in_memory() -> Self {
        Self::new(
            Arc::new(MemoryStore::new()),
            CollectionPaths::in_dir(Path::new("memory")),
            Self::DEFAULT_TIMEOUT,
        )
    }

    /// Product repository.
    #[must_use]
    pub const fn products(&self) -> ProductRepository<'_> {
        ProductRepository::new(self)
    }

    /// Cart repository.
    #[must_use]
    pub const fn carts(&self) -> CartRepository<'_> {
        CartRepository::new(self)
    }

    /// Collection locations.
    #[must_use]
    pub fn paths(&self) -> &CollectionPaths {
        &self.inner.paths
    }

    /// Verify both collections can be loaded.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Storage` if either collection is unreadable.
    pub async fn check(&self) -> Result<(), RepositoryError> {
        self.load_raw(&self.inner.paths.products).await?;
        self.load_raw(&self.inner.paths.carts).await?;
        Ok(())
    }

    /// Load and decode every record of a collection.
    pub(crate) async fn read<T: DeserializeOwned>(
        &self,
        path: &Path,
    ) -> Result<Vec<T>, RepositoryError> {
        let raw = self.load_raw(path).await?;
        decode_all(path, &raw)
    }

    /// Run one read-modify-write cycle on a collection.
    ///
    /// The collection's lock is held for the whole cycle, including a save
    /// that is still running after the timeout fired. If `f` returns an
    /// error nothing is written.
    pub(crate) async fn modify<T, R, F>(&self, path: &Path, f: F) -> Result<R, RepositoryError>
    where
        T: Document,
        F: FnOnce(&mut Vec<T>) -> Result<R, RepositoryError>,
    {
        let guard = tokio::time::timeout(self.inner.timeout, self.inner.locks.acquire(path))
            .await
            .map_err(|_| StoreError::Timeout {
                path: path.to_path_buf(),
            })?;

        let raw = self.load_raw(path).await?;
        let loaded: Vec<T> = decode_all(path, &raw)?;
        let mut records = loaded.clone();
        let result = f(&mut records)?;

        let encoded = encode_all(path, &records, &loaded, &raw)?;
        self.save_locked(guard, path, encoded).await?;

        Ok(result)
    }

    async fn load_raw(&self, path: &Path) -> Result<Vec<Value>, StoreError> {
        tokio::time::timeout(self.inner.timeout, self.inner.store.load(path))
            .await
            .map_err(|_| StoreError::Timeout {
                path: path.to_path_buf(),
            })?
    }

    /// Save on a task that owns `guard`, so the lock is released only once
    /// the write has finished, whether or not the caller stopped waiting.
    async fn save_locked(
        &self,
        guard: OwnedMutexGuard<()>,
        path: &Path,
        records: Vec<Value>,
    ) -> Result<(), StoreError> {
        let store = Arc::clone(&self.inner.store);
        let owned_path = path.to_path_buf();
        let save = tokio::spawn(async move {
            let _guard = guard;
            store.save(&owned_path, &records).await
        });

        match tokio::time::timeout(self.inner.timeout, save).await {
            Ok(Ok(result)) => result,
            Ok(Err(join_error)) => Err(StoreError::io(path, std::io::Error::other(join_error))),
            Err(_) => {
                tracing::warn!(
                    path = %path.display(),
                    "Save outlived its timeout; lock held until it finishes"
                );
                Err(StoreError::Timeout {
                    path: path.to_path_buf(),
                })
            }
        }
    }
}

impl std::fmt::Debug for Database {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Database")
            .field("paths", &self.inner.paths)
            .field("timeout", &self.inner.timeout)
            .finish_non_exhaustive()
    }
}

fn decode_all<T: DeserializeOwned>(path: &Path, raw: &[Value]) -> Result<Vec<T>, RepositoryError> {
    raw.iter()
        .enumerate()
        .map(|(index, value)| {
            T::deserialize(value).map_err(|e| {
                RepositoryError::DataCorruption(format!(
                    "record {index} in {}: {e}",
                    path.display()
                ))
            })
        })
        .collect()
}

/// Encode `records`, reusing the stored value of any record that is
/// unchanged since it was loaded.
fn encode_all<T: Document>(
    path: &Path,
    records: &[T],
    loaded: &[T],
    raw: &[Value],
) -> Result<Vec<Value>, RepositoryError> {
    let mut stored: HashMap<&str, (&T, &Value)> = HashMap::with_capacity(loaded.len());
    for (record, value) in loaded.iter().zip(raw) {
        stored.entry(record.key()).or_insert((record, value));
    }

    records
        .iter()
        .map(|record| match stored.get(record.key()) {
            Some((original, value)) if *original == record => Ok((*value).clone()),
            _ => serde_json::to_value(record),
        })
        .collect::<Result<Vec<Value>, _>>()
        .map_err(|e| {
            RepositoryError::DataCorruption(format!("failed to encode {}: {e}", path.display()))
        })
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use jsonshop_core::ProductInput;
    use serde_json::json;
    use std::sync::atomic::{AtomicBool, Ordering};

    /// Store that never answers, to exercise the timeout.
    struct StalledStore;

    #[async_trait]
    impl DocumentStore for StalledStore {
        async fn load(&self, _path: &Path) -> Result<Vec<Value>, StoreError> {
            std::future::pending().await
        }

        async fn save(&self, _path: &Path, _records: &[Value]) -> Result<(), StoreError> {
            std::future::pending().await
        }
    }

    /// Store whose saves always fail.
    struct ReadOnlyStore(MemoryStore);

    #[async_trait]
    impl DocumentStore for ReadOnlyStore {
        async fn load(&self, path: &Path) -> Result<Vec<Value>, StoreError> {
            self.0.load(path).await
        }

        async fn save(&self, path: &Path, _records: &[Value]) -> Result<(), StoreError> {
            Err(StoreError::Io {
                path: path.to_path_buf(),
                source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read-only"),
            })
        }
    }

    /// Store whose first save takes longer than the database timeout.
    struct SlowFirstSave {
        inner: MemoryStore,
        delay: Duration,
        delayed: AtomicBool,
    }

    #[async_trait]
    impl DocumentStore for SlowFirstSave {
        async fn load(&self, path: &Path) -> Result<Vec<Value>, StoreError> {
            self.inner.load(path).await
        }

        async fn save(&self, path: &Path, records: &[Value]) -> Result<(), StoreError> {
            if !self.delayed.swap(true, Ordering::SeqCst) {
                tokio::time::sleep(self.delay).await;
            }
            self.inner.save(path, records).await
        }
    }

    #[tokio::test]
    async fn test_store_timeout_is_typed() {
        let db = Database::new(
            Arc::new(StalledStore),
            CollectionPaths::in_dir(Path::new("stalled")),
            Duration::from_millis(20),
        );

        let err = db.products().get_all(None).await.unwrap_err();
        assert!(matches!(
            err,
            RepositoryError::Storage(StoreError::Timeout { .. })
        ));
    }

    #[tokio::test]
    async fn test_save_failure_propagates() {
        let paths = CollectionPaths::in_dir(Path::new("ro"));
        let store = MemoryStore::new().with_collection(
            paths.carts.clone(),
            vec![json!({"_id": "cart1", "products": []})],
        );
        let db = Database::new(
            Arc::new(ReadOnlyStore(store)),
            paths,
            Database::DEFAULT_TIMEOUT,
        );

        let err = db
            .carts()
            .add_item(&"cart1".into(), "p1".into())
            .await
            .unwrap_err();
        assert!(matches!(err, RepositoryError::Storage(StoreError::Io { .. })));
    }

    #[tokio::test]
    async fn test_undecodable_record_is_corruption() {
        let paths = CollectionPaths::in_dir(Path::new("bad"));
        let store = MemoryStore::new()
            .with_collection(paths.products.clone(), vec![json!({"name": "no id"})]);
        let db = Database::new(Arc::new(store), paths, Database::DEFAULT_TIMEOUT);

        let err = db.products().get_all(None).await.unwrap_err();
        assert!(matches!(err, RepositoryError::DataCorruption(_)));
    }

    #[tokio::test]
    async fn test_check_reports_malformed_file() {
        let dir = tempfile::tempdir().unwrap();
        let paths = CollectionPaths::in_dir(dir.path());
        std::fs::write(&paths.carts, "not json").unwrap();
        let db = Database::new(Arc::new(FileStore::new()), paths, Database::DEFAULT_TIMEOUT);

        assert!(matches!(
            db.check().await,
            Err(RepositoryError::Storage(StoreError::Malformed { .. }))
        ));
    }

    #[tokio::test]
    async fn test_timed_out_save_keeps_lock_until_written() {
        let paths = CollectionPaths::in_dir(Path::new("slow"));
        let store = Arc::new(SlowFirstSave {
            inner: MemoryStore::new().with_collection(
                paths.carts.clone(),
                vec![json!({"_id": "cart1", "products": []})],
            ),
            delay: Duration::from_millis(300),
            delayed: AtomicBool::new(false),
        });
        let db = Database::new(store.clone(), paths.clone(), Duration::from_millis(200));

        let first = db.carts().add_item(&"cart1".into(), "p1".into()).await;
        assert!(matches!(
            first,
            Err(RepositoryError::Storage(StoreError::Timeout { .. }))
        ));

        // The next writer waits for the late save and builds on it
        db.carts()
            .add_item(&"cart1".into(), "p2".into())
            .await
            .unwrap();

        let saved = store.inner.snapshot(&paths.carts).unwrap();
        assert_eq!(saved[0]["products"], json!(["p1", "p2"]));
    }

    #[tokio::test]
    async fn test_untouched_records_are_written_back_verbatim() {
        let paths = CollectionPaths::in_dir(Path::new("legacy"));
        let old_lamp = json!({
            "_id": "old",
            "name": "Old Lamp",
            "price": 12,
            "stock": 7,
            "createdAt": "2020-10-10T10:00:00.000Z",
            "updatedAt": "2020-10-10T10:00:00.000Z",
            "reviews": [{
                "_id": "r1",
                "rate": "5",
                "comment": "ok",
                "createdAt": "2020-10-11T00:00:00Z"
            }]
        });
        let bobs_cart = json!({"_id": "c0", "owner": "bob", "products": ["old"]});
        let store = Arc::new(
            MemoryStore::new()
                .with_collection(paths.products.clone(), vec![old_lamp.clone()])
                .with_collection(
                    paths.carts.clone(),
                    vec![bobs_cart.clone(), json!({"_id": "cart1", "products": []})],
                ),
        );
        let db = Database::new(store.clone(), paths.clone(), Database::DEFAULT_TIMEOUT);

        db.products()
            .create(ProductInput {
                name: Some("Espresso Cup".to_string()),
                ..Default::default()
            })
            .await
            .unwrap();
        db.carts()
            .add_item(&"cart1".into(), "old".into())
            .await
            .unwrap();

        let products = store.snapshot(&paths.products).unwrap();
        assert_eq!(products.len(), 2);
        assert_eq!(
            serde_json::to_string(&products[0]).unwrap(),
            serde_json::to_string(&old_lamp).unwrap()
        );
        let carts = store.snapshot(&paths.carts).unwrap();
        assert_eq!(carts[0], bobs_cart);
        assert_eq!(carts[1]["products"], json!(["old"]));

        // A touched record keeps its unmodelled fields and timestamp format
        db.products()
            .update(
                &"old".into(),
                ProductInput {
                    name: Some("Older Lamp".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        let products = store.snapshot(&paths.products).unwrap();
        assert_eq!(products[0]["stock"], 7);
        assert_eq!(products[0]["price"], 12);
        assert_eq!(products[0]["createdAt"], "2020-10-10T10:00:00.000Z");
        assert_eq!(products[0]["reviews"][0]["rate"], 5);
    }

    #[test]
    fn test_error_display() {
        let err = RepositoryError::not_found("product", &"abc");
        assert_eq!(err.to_string(), "product not found: abc");
    }
}

use std::{
    fs,
    io::Write,
    path::{Path, PathBuf},
    time::Duration
};

use tempfile::NamedTempFile;
use thiserror::Error;
use tokio::{sync::Mutex, time::timeout};
use tracing::{info, warn};

use crate::store::{
    catalog::{self, CatalogError},
    store_structs::RatingStore
};

pub const DEFAULT_LOCK_WAIT: Duration = Duration::from_secs(10);

#[derive(Debug, Error)]
pub enum StoreError {
    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error("could not acquire the store lock within {0:?}")]
    LockTimeout(Duration),

    #[error("failed to access the store file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to serialize the store: {0}")]
    Serialize(#[from] serde_json::Error)
}

/// Lock-guarded JSON-file store.
///
/// One instance owns the backing file; callers submitting batches share it
/// (behind an `Arc` in a long-running service) so that
/// [`with_exclusive_access`](JsonStore::with_exclusive_access) serializes
/// every read-modify-write cycle. Persistence writes a temp file in the
/// store's directory and renames it over the target, so readers that skip
/// the lock observe fully-old or fully-new content, never a torn document.
pub struct JsonStore {
    store_path: PathBuf,
    catalog_path: PathBuf,
    gate: Mutex<()>,
    lock_wait: Duration
}

impl JsonStore {
    pub fn new(store_path: impl Into<PathBuf>, catalog_path: impl Into<PathBuf>) -> JsonStore {
        JsonStore {
            store_path: store_path.into(),
            catalog_path: catalog_path.into(),
            gate: Mutex::new(()),
            lock_wait: DEFAULT_LOCK_WAIT
        }
    }

    /// Bounds the wait for the exclusive gate. Requests that cannot acquire
    /// the lock in time fail with [`StoreError::LockTimeout`].
    pub fn with_lock_wait(mut self, lock_wait: Duration) -> JsonStore {
        self.lock_wait = lock_wait;
        self
    }

    pub fn store_path(&self) -> &Path {
        &self.store_path
    }

    /// Runs `batch_fn` with exclusive ownership of the store.
    ///
    /// Under the gate: load the current store (initializing from the
    /// catalog when the file is absent or corrupt), sync newly-discovered
    /// catalog ids, invoke `batch_fn`, recompute the aggregate stats and
    /// persist atomically. Everything between acquire and release is
    /// synchronous; concurrent callers block until the gate is free. An
    /// error anywhere before the persist step leaves the on-disk store
    /// exactly as it was.
    pub async fn with_exclusive_access<T, F>(&self, batch_fn: F) -> Result<T, StoreError>
    where
        F: FnOnce(&mut RatingStore) -> T
    {
        let _guard = timeout(self.lock_wait, self.gate.lock())
            .await
            .map_err(|_| StoreError::LockTimeout(self.lock_wait))?;

        let item_ids = catalog::load_catalog(&self.catalog_path)?;
        let mut store = self.load_or_init(&item_ids)?;
        store.sync_catalog(&item_ids);

        let result = batch_fn(&mut store);

        store.recompute_stats();
        self.persist(&store)?;

        Ok(result)
    }

    /// Lock-free snapshot for read-only consumers such as score dashboards.
    /// May trail a concurrent writer; a missing or unreadable document is
    /// reported as `None`, never as malformed data.
    pub fn read(&self) -> Result<Option<RatingStore>, StoreError> {
        if !self.store_path.exists() {
            return Ok(None);
        }

        let content = fs::read_to_string(&self.store_path)?;
        match serde_json::from_str(&content) {
            Ok(store) => Ok(Some(store)),
            Err(e) => {
                warn!(error = %e, "store snapshot is not parseable, reporting as absent");
                Ok(None)
            }
        }
    }

    fn load_or_init(&self, item_ids: &[String]) -> Result<RatingStore, StoreError> {
        if !self.store_path.exists() {
            info!(path = %self.store_path.display(), "store file absent, initializing from catalog");
            return Ok(RatingStore::from_catalog(item_ids));
        }

        let content = fs::read_to_string(&self.store_path)?;
        match serde_json::from_str::<RatingStore>(&content) {
            Ok(store) => Ok(store),
            Err(e) => {
                warn!(error = %e, "store file is corrupt, reinitializing from catalog");
                Ok(RatingStore::from_catalog(item_ids))
            }
        }
    }

    /// Full buffered rewrite: serialize to a temp file beside the store,
    /// flush, then rename over the target.
    fn persist(&self, store: &RatingStore) -> Result<(), StoreError> {
        let directory = self.store_path.parent().unwrap_or(Path::new("."));
        let mut staged = NamedTempFile::new_in(directory)?;

        serde_json::to_writer(&mut staged, store)?;
        staged.flush()?;
        staged.persist(&self.store_path).map_err(|e| StoreError::Io(e.error))?;

        Ok(())
    }
}

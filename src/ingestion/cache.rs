//! Process-wide memoization of loaded datasets.

use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

use crate::error::IngestionResult;

use super::loader::{load_sessions, LoadOptions, LoadedDataset};

/// Caches [`LoadedDataset`]s by source path.
///
/// Paths are keyed in canonical form when they resolve, so `./s.csv` and `s.csv` share an entry.
/// A path that does not resolve (a missing source) is keyed as given.
///
/// Each distinct path is read at most once until it is invalidated. Cached entries are shared
/// behind an [`Arc`] and never mutated; derive subsets with the processing functions instead.
/// Failed loads are not cached, so a later call retries. A missing source is a successful load
/// (an empty dataset) and is cached like any other.
#[derive(Default)]
pub struct DatasetCache {
    entries: Mutex<HashMap<PathBuf, Arc<LoadedDataset>>>,
}

impl fmt::Debug for DatasetCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DatasetCache")
            .field("entries", &self.len())
            .finish()
    }
}

impl DatasetCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the cached dataset for `path`, loading it with `options` on first access.
    pub fn get_or_load(&self, path: impl AsRef<Path>, options: &LoadOptions) -> IngestionResult<Arc<LoadedDataset>> {
        let path = path.as_ref();
        let key = cache_key(path);
        let mut entries = self.lock();
        if let Some(hit) = entries.get(&key) {
            tracing::debug!(path = %path.display(), "dataset cache hit");
            return Ok(Arc::clone(hit));
        }

        let loaded = Arc::new(load_sessions(path, options)?);
        entries.insert(key, Arc::clone(&loaded));
        Ok(loaded)
    }

    /// Drop the entry for `path`. Returns `true` if one was cached.
    pub fn invalidate(&self, path: impl AsRef<Path>) -> bool {
        self.lock().remove(&cache_key(path.as_ref())).is_some()
    }

    /// Drop every entry.
    pub fn clear(&self) {
        self.lock().clear();
    }

    /// Number of cached paths.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// `true` when nothing is cached.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<PathBuf, Arc<LoadedDataset>>> {
        // Entries are only inserted whole, so a poisoned map is still consistent.
        self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

fn cache_key(path: &Path) -> PathBuf {
    fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}

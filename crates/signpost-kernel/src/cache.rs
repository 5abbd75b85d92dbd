//! Shared resource file cache.
//!
//! Memoizes parsed resource files by normalized [`FileId`], delegating the
//! first load of each file to a [`ResourceLoader`]. One cache is shared by
//! every session; entries live until explicitly invalidated (hot reload).
//!
//! Concurrent first loads of the same file are allowed to race. Both produce
//! the same parsed content, and the last insert wins.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use dashmap::DashMap;
use signpost_types::{FileId, ResourceFile};
use tracing::Instrument;

use crate::error::{NavError, NavResult};
use crate::loader::ResourceLoader;

/// Point-in-time cache counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Lookups answered from memory.
    pub hits: u64,
    /// Lookups that went to the loader.
    pub misses: u64,
    /// Loader calls that produced a file.
    pub loads: u64,
    /// Files currently resident.
    pub resident: usize,
}

/// Process-wide memo of parsed resource files.
pub struct ResourceCache {
    loader: Arc<dyn ResourceLoader>,
    entries: DashMap<FileId, Arc<ResourceFile>>,
    hits: AtomicU64,
    misses: AtomicU64,
    loads: AtomicU64,
}

impl std::fmt::Debug for ResourceCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResourceCache")
            .field("loader", &self.loader.describe())
            .field("resident", &self.entries.len())
            .finish()
    }
}

impl ResourceCache {
    /// Create an empty cache in front of a loader.
    pub fn new(loader: Arc<dyn ResourceLoader>) -> Self {
        Self {
            loader,
            entries: DashMap::new(),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            loads: AtomicU64::new(0),
        }
    }

    /// Convenience constructor returning the shared handle.
    pub fn shared(loader: impl ResourceLoader + 'static) -> Arc<Self> {
        Arc::new(Self::new(Arc::new(loader)))
    }

    /// Get a file, loading it on first use.
    ///
    /// A loader `NotFound` becomes `ResolutionError::MissingFile`; any other
    /// loader failure is returned as `NavError::Loader` and nothing is cached.
    pub async fn load(&self, id: &FileId) -> NavResult<Arc<ResourceFile>> {
        // Fast path: already resident
        if let Some(file) = self.get(id) {
            self.hits.fetch_add(1, Ordering::Relaxed);
            return Ok(file);
        }

        self.misses.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(file = %id, "cache miss");

        let loaded = self
            .loader
            .load_file(id)
            .instrument(tracing::debug_span!("cache.load", file = %id))
            .await;
        let file = match loaded {
            Ok(file) => file,
            Err(e) => {
                let err = NavError::from(e);
                if !err.is_recoverable() {
                    tracing::warn!(file = %id, error = %err, "resource loader failed");
                }
                return Err(err);
            }
        };

        if file.id() != id {
            return Err(NavError::Loader(crate::LoaderError::malformed(
                id,
                format!("loader returned file {}", file.id()),
            )));
        }

        self.loads.fetch_add(1, Ordering::Relaxed);
        let file = Arc::new(file);
        self.entries.insert(id.clone(), Arc::clone(&file));
        Ok(file)
    }

    /// Get a file only if it is already resident. Never performs I/O.
    pub fn get(&self, id: &FileId) -> Option<Arc<ResourceFile>> {
        self.entries.get(id).map(|entry| Arc::clone(entry.value()))
    }

    pub fn is_resident(&self, id: &FileId) -> bool {
        self.entries.contains_key(id)
    }

    /// Drop one entry so the next `load` re-reads it.
    ///
    /// Returns `true` if the file was resident.
    pub fn invalidate(&self, id: &FileId) -> bool {
        let removed = self.entries.remove(id).is_some();
        if removed {
            tracing::debug!(file = %id, "invalidated cached resource file");
        }
        removed
    }

    /// Drop every entry.
    pub fn clear(&self) {
        self.entries.clear();
    }

    /// Warm the cache. Returns the ids that failed with their errors.
    pub async fn preload<'a>(
        &self,
        ids: impl IntoIterator<Item = &'a FileId>,
    ) -> Vec<(FileId, NavError)> {
        let mut failures = Vec::new();
        for id in ids {
            if let Err(e) = self.load(id).await {
                failures.push((id.clone(), e));
            }
        }
        failures
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            loads: self.loads.load(Ordering::Relaxed),
            resident: self.entries.len(),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

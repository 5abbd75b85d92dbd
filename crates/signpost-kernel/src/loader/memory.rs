//! In-memory resource loader.
//!
//! Used for tests and for menus compiled into a binary. Counts every
//! `load_file` call so callers can verify cache behavior.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use parking_lot::RwLock;
use signpost_types::{FileId, ResourceFile};

use super::ResourceLoader;
use crate::error::{LoaderError, LoaderResult};

/// In-memory resource loader.
///
/// Thread-safe via internal `RwLock`. Files can be added or removed while
/// navigators are running.
#[derive(Debug, Default)]
pub struct MemoryLoader {
    files: RwLock<HashMap<FileId, ResourceFile>>,
    loads: RwLock<HashMap<FileId, usize>>,
    total_loads: AtomicUsize,
}

impl MemoryLoader {
    /// Create an empty loader.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a loader pre-populated with files.
    pub fn with_files(files: impl IntoIterator<Item = ResourceFile>) -> Self {
        let loader = Self::new();
        for file in files {
            loader.insert(file);
        }
        loader
    }

    /// Add or replace a file.
    pub fn insert(&self, file: ResourceFile) {
        self.files.write().insert(file.id().clone(), file);
    }

    /// Remove a file. Returns `true` if it existed.
    pub fn remove(&self, id: &FileId) -> bool {
        self.files.write().remove(id).is_some()
    }

    /// Number of `load_file` calls for one id, including failed ones.
    pub fn load_count(&self, id: &FileId) -> usize {
        self.loads.read().get(id).copied().unwrap_or(0)
    }

    /// Number of `load_file` calls overall.
    pub fn total_loads(&self) -> usize {
        self.total_loads.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl ResourceLoader for MemoryLoader {
    async fn load_file(&self, id: &FileId) -> LoaderResult<ResourceFile> {
        self.total_loads.fetch_add(1, Ordering::Relaxed);
        *self.loads.write().entry(id.clone()).or_insert(0) += 1;

        self.files
            .read()
            .get(id)
            .cloned()
            .ok_or_else(|| LoaderError::NotFound(id.clone()))
    }

    fn describe(&self) -> String {
        format!("memory ({} files)", self.files.read().len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use signpost_types::{Block, BlockId};

    fn file(id: &str) -> ResourceFile {
        ResourceFile::new(
            FileId::parse(id).unwrap(),
            [Block::new(BlockId::new("main").unwrap())],
            None,
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_load_existing() {
        let loader = MemoryLoader::with_files([file("main/menu")]);
        let id = FileId::parse("main/menu").unwrap();
        let loaded = loader.load_file(&id).await.unwrap();
        assert_eq!(loaded.id(), &id);
        assert_eq!(loader.load_count(&id), 1);
    }

    #[tokio::test]
    async fn test_missing_is_not_found() {
        let loader = MemoryLoader::new();
        let id = FileId::parse("nope").unwrap();
        let err = loader.load_file(&id).await.unwrap_err();
        assert!(matches!(err, LoaderError::NotFound(ref f) if *f == id));
        assert_eq!(loader.total_loads(), 1);
    }

    #[tokio::test]
    async fn test_remove() {
        let loader = MemoryLoader::with_files([file("a")]);
        let id = FileId::parse("a").unwrap();
        assert!(loader.remove(&id));
        assert!(!loader.remove(&id));
        assert!(loader.load_file(&id).await.is_err());
    }
}

//! Resource loading.
//!
//! The navigation core never touches storage itself. A [`ResourceLoader`]
//! turns a [`FileId`] into a parsed [`ResourceFile`], or reports that the file
//! does not exist. Key components:
//!
//! - [`ResourceLoader`] - Core trait: one method, two semantic outcomes
//! - [`MemoryLoader`] - In-memory files (for tests and embedded menus)
//! - [`LocalLoader`] - TOML files under a workspace root (with path security)

mod local;
mod memory;

use async_trait::async_trait;
use signpost_types::{FileId, ResourceFile};

use crate::error::LoaderResult;

pub use local::{LocalLoader, RESOURCE_EXTENSION, parse_resource};
pub use memory::MemoryLoader;

/// Loads parsed resource files by identifier.
///
/// Implementations return [`LoaderError::NotFound`](crate::LoaderError::NotFound)
/// when the identifier does not exist; any other error is treated as an
/// opaque storage failure.
#[async_trait]
pub trait ResourceLoader: Send + Sync {
    /// Load and parse one resource file.
    async fn load_file(&self, id: &FileId) -> LoaderResult<ResourceFile>;

    /// Short description for logs (e.g. the workspace root).
    fn describe(&self) -> String {
        "resource loader".to_string()
    }
}

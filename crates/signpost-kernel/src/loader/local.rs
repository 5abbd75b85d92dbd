//! Local filesystem resource loader.
//!
//! Serves TOML resource documents from a workspace root. File id components
//! map to directories: `folder/target` is read from
//! `<root>/folder/target.toml`.
//!
//! ```toml
//! entry = "main"                  # optional, defaults to the first block
//!
//! [blocks.main]
//! content = "Welcome"             # any TOML value, passed through opaquely
//! links = ["./settings", "@.admin.panel:users"]
//!
//! [blocks.users]
//! permission = "users.manage"     # optional capability label
//! content = { title = "Users" }
//! ```

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use indexmap::IndexMap;
use serde::Deserialize;
use signpost_types::{Block, BlockId, FileId, ResourceFile};

use super::ResourceLoader;
use crate::error::{LoaderError, LoaderResult};

/// Extension of resource documents on disk.
pub const RESOURCE_EXTENSION: &str = "toml";

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawFile {
    entry: Option<String>,
    #[serde(default)]
    blocks: IndexMap<String, RawBlock>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawBlock {
    #[serde(default)]
    content: Option<serde_json::Value>,
    permission: Option<String>,
    #[serde(default)]
    links: Vec<String>,
}

/// Parse a TOML resource document.
///
/// Block order follows the document. Structural problems (no blocks, a bad
/// block name, an entry naming a missing block) are reported as
/// [`LoaderError::Malformed`].
pub fn parse_resource(id: &FileId, text: &str) -> LoaderResult<ResourceFile> {
    let raw: RawFile = toml::from_str(text).map_err(|e| LoaderError::malformed(id, e))?;

    let mut blocks = Vec::with_capacity(raw.blocks.len());
    for (name, raw_block) in raw.blocks {
        let block_id = BlockId::new(name).map_err(|e| LoaderError::malformed(id, e))?;
        blocks.push(Block {
            id: block_id,
            content: raw_block.content.unwrap_or(serde_json::Value::Null),
            required_permission: raw_block.permission,
            links: raw_block.links,
        });
    }

    let entry = raw
        .entry
        .map(BlockId::new)
        .transpose()
        .map_err(|e| LoaderError::malformed(id, e))?;

    ResourceFile::new(id.clone(), blocks, entry).map_err(|e| LoaderError::malformed(id, e))
}

/// Local filesystem resource loader.
///
/// Path security is enforced: a resolved path must stay under `root`.
#[derive(Debug, Clone)]
pub struct LocalLoader {
    root: PathBuf,
}

impl LocalLoader {
    /// Create a loader rooted at the given directory.
    ///
    /// The root is canonicalized at construction time so paths reported by
    /// file watchers can be mapped back to ids.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root: PathBuf = root.into();
        let root = dunce::canonicalize(&root).unwrap_or(root);
        Self { root }
    }

    /// Get the root path.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// On-disk path for a file id.
    pub fn path_for(&self, id: &FileId) -> PathBuf {
        let mut path = self.root.clone();
        for component in id.components() {
            path.push(component);
        }
        path.set_extension(RESOURCE_EXTENSION);
        path
    }

    /// Map an on-disk path back to a file id.
    ///
    /// Returns `None` for paths outside the root, without the resource
    /// extension, or with components that are not valid names.
    pub fn file_id_for(&self, path: &Path) -> Option<FileId> {
        let rel = path.strip_prefix(&self.root).ok()?;
        if rel.extension()?.to_str()? != RESOURCE_EXTENSION {
            return None;
        }
        let rel = rel.with_extension("");
        let components: Option<Vec<&str>> = rel
            .components()
            .map(|c| match c {
                std::path::Component::Normal(s) => s.to_str(),
                _ => None,
            })
            .collect();
        FileId::from_components(components?).ok()
    }

    /// Verify a path has not escaped the root via symlinks.
    fn check_contained(&self, path: &Path) -> LoaderResult<()> {
        let canonical = dunce::canonicalize(path)?;
        if !canonical.starts_with(&self.root) {
            return Err(LoaderError::PathEscapesRoot(format!(
                "{} is not under {}",
                canonical.display(),
                self.root.display()
            )));
        }
        Ok(())
    }

    /// All resource files under the root, sorted by id.
    pub async fn list_files(&self) -> LoaderResult<Vec<FileId>> {
        let mut found = Vec::new();
        let mut pending = vec![self.root.clone()];

        while let Some(dir) = pending.pop() {
            let mut entries = tokio::fs::read_dir(&dir).await?;
            while let Some(entry) = entries.next_entry().await? {
                let path = entry.path();
                if entry.file_type().await?.is_dir() {
                    pending.push(path);
                } else if let Some(id) = self.file_id_for(&path) {
                    found.push(id);
                }
            }
        }

        found.sort();
        Ok(found)
    }
}

#[async_trait]
impl ResourceLoader for LocalLoader {
    async fn load_file(&self, id: &FileId) -> LoaderResult<ResourceFile> {
        let path = self.path_for(id);

        let text = match tokio::fs::read_to_string(&path).await {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(LoaderError::NotFound(id.clone()));
            }
            Err(e) => return Err(LoaderError::Io(e)),
        };
        self.check_contained(&path)?;

        tracing::debug!(file = %id, path = %path.display(), "read resource file");
        parse_resource(id, &text)
    }

    fn describe(&self) -> String {
        format!("local ({})", self.root.display())
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const MENU: &str = r#"
entry = "main"

[blocks.intro]
content = "hello"

[blocks.main]
content = { title = "Main menu" }
links = ["./settings", "@.admin.panel:users"]

[blocks.users]
permission = "users.manage"
"#;

    fn fid(s: &str) -> FileId {
        FileId::parse(s).unwrap()
    }

    async fn setup() -> (LocalLoader, TempDir) {
        let dir = TempDir::new().unwrap();
        tokio::fs::create_dir_all(dir.path().join("main")).await.unwrap();
        tokio::fs::write(dir.path().join("main/menu.toml"), MENU)
            .await
            .unwrap();
        let loader = LocalLoader::new(dir.path());
        (loader, dir)
    }

    #[test]
    fn test_parse_resource() {
        let file = parse_resource(&fid("main/menu"), MENU).unwrap();
        assert_eq!(file.entry().as_str(), "main");
        let order: Vec<&str> = file.blocks().map(|b| b.id.as_str()).collect();
        assert_eq!(order, vec!["intro", "main", "users"]);

        let main = file.block_named("main").unwrap();
        assert_eq!(main.links.len(), 2);
        assert_eq!(main.content["title"], "Main menu");

        let users = file.block_named("users").unwrap();
        assert_eq!(users.required_permission.as_deref(), Some("users.manage"));
        assert!(users.content.is_null());
    }

    #[test]
    fn test_parse_entry_defaults_to_first() {
        let file = parse_resource(&fid("x"), "[blocks.only]\ncontent = 1\n").unwrap();
        assert_eq!(file.entry().as_str(), "only");
    }

    #[test]
    fn test_parse_rejects_empty_document() {
        let err = parse_resource(&fid("x"), "").unwrap_err();
        assert!(matches!(err, LoaderError::Malformed { .. }));
    }

    #[test]
    fn test_parse_rejects_unknown_entry() {
        let err = parse_resource(&fid("x"), "entry = \"gone\"\n[blocks.a]\n").unwrap_err();
        assert!(matches!(err, LoaderError::Malformed { .. }));
    }

    #[test]
    fn test_parse_rejects_bad_block_name() {
        let err = parse_resource(&fid("x"), "[blocks.\"a b\"]\n").unwrap_err();
        assert!(matches!(err, LoaderError::Malformed { .. }));
    }

    #[test]
    fn test_parse_rejects_unknown_fields() {
        let err = parse_resource(&fid("x"), "[blocks.a]\nperm = \"x\"\n").unwrap_err();
        assert!(matches!(err, LoaderError::Malformed { .. }));
    }

    #[tokio::test]
    async fn test_load_file() {
        let (loader, _dir) = setup().await;
        let file = loader.load_file(&fid("main/menu")).await.unwrap();
        assert_eq!(file.id(), &fid("main/menu"));
        assert_eq!(file.len(), 3);
    }

    #[tokio::test]
    async fn test_missing_file_is_not_found() {
        let (loader, _dir) = setup().await;
        let err = loader.load_file(&fid("nonexistent/file")).await.unwrap_err();
        assert!(matches!(err, LoaderError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_path_mapping_roundtrip() {
        let (loader, _dir) = setup().await;
        let id = fid("main/menu");
        let path = loader.path_for(&id);
        assert!(path.ends_with("main/menu.toml"));
        assert_eq!(loader.file_id_for(&path), Some(id));
        assert_eq!(loader.file_id_for(&loader.root().join("notes.txt")), None);
        assert_eq!(loader.file_id_for(Path::new("/elsewhere/x.toml")), None);
    }

    #[tokio::test]
    async fn test_list_files() {
        let (loader, dir) = setup().await;
        tokio::fs::write(dir.path().join("top.toml"), "[blocks.a]\n")
            .await
            .unwrap();
        tokio::fs::write(dir.path().join("README.md"), "ignored")
            .await
            .unwrap();
        let files = loader.list_files().await.unwrap();
        assert_eq!(files, vec![fid("main/menu"), fid("top")]);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_symlink_escape_blocked() {
        let (loader, dir) = setup().await;
        let outside = TempDir::new().unwrap();
        tokio::fs::write(outside.path().join("secret.toml"), "[blocks.a]\n")
            .await
            .unwrap();
        std::os::unix::fs::symlink(
            outside.path().join("secret.toml"),
            dir.path().join("leak.toml"),
        )
        .unwrap();

        let err = loader.load_file(&fid("leak")).await.unwrap_err();
        assert!(matches!(err, LoaderError::PathEscapesRoot(_)));
    }
}

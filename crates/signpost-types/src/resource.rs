//! Parsed resource files and their blocks.
//!
//! A `ResourceFile` is the in-memory form of one resource document: an
//! ordered map of uniquely named blocks plus a designated entry block. Files
//! are produced by a resource loader and owned by the resource cache; the
//! resolver only reads them.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::ids::{BlockId, FileId};

/// The addressable unit of content within a resource file.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Block {
    pub id: BlockId,
    /// Opaque payload handed to the renderer. The navigation core never
    /// inspects it.
    #[serde(default)]
    pub content: serde_json::Value,
    /// Capability label required to enter this block. `None` means ungated.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required_permission: Option<String>,
    /// Outbound link expressions, kept raw. Resolved only when followed.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub links: Vec<String>,
}

impl Block {
    /// An empty, ungated block.
    pub fn new(id: BlockId) -> Self {
        Self {
            id,
            content: serde_json::Value::Null,
            required_permission: None,
            links: Vec::new(),
        }
    }

    pub fn with_content(mut self, content: impl Into<serde_json::Value>) -> Self {
        self.content = content.into();
        self
    }

    pub fn with_permission(mut self, label: impl Into<String>) -> Self {
        self.required_permission = Some(label.into());
        self
    }

    pub fn with_link(mut self, link: impl Into<String>) -> Self {
        self.links.push(link.into());
        self
    }

    /// Whether entering this block needs an authorization check.
    pub fn is_gated(&self) -> bool {
        self.required_permission.is_some()
    }
}

/// Structural problems found while assembling a [`ResourceFile`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ResourceError {
    #[error("resource file {0} has no blocks")]
    NoBlocks(FileId),
    #[error("resource file {file} defines block {block} twice")]
    DuplicateBlock { file: FileId, block: BlockId },
    #[error("resource file {file} names entry block {block}, which it does not define")]
    UnknownEntry { file: FileId, block: BlockId },
}

/// A parsed resource document.
///
/// Invariants, checked by [`ResourceFile::new`]:
/// - at least one block
/// - block ids unique
/// - the entry block exists
#[derive(Clone, Debug, PartialEq)]
pub struct ResourceFile {
    id: FileId,
    blocks: IndexMap<BlockId, Block>,
    entry: BlockId,
}

impl ResourceFile {
    /// Assemble a file from blocks in document order.
    ///
    /// When `entry` is `None` the first block is the entry block.
    pub fn new(
        id: FileId,
        blocks: impl IntoIterator<Item = Block>,
        entry: Option<BlockId>,
    ) -> Result<Self, ResourceError> {
        let mut map = IndexMap::new();
        for block in blocks {
            if map.contains_key(&block.id) {
                return Err(ResourceError::DuplicateBlock {
                    file: id,
                    block: block.id,
                });
            }
            map.insert(block.id.clone(), block);
        }

        let entry = match entry {
            Some(entry) if map.contains_key(&entry) => entry,
            Some(entry) => return Err(ResourceError::UnknownEntry { file: id, block: entry }),
            None => match map.keys().next() {
                Some(first) => first.clone(),
                None => return Err(ResourceError::NoBlocks(id)),
            },
        };

        Ok(Self {
            id,
            blocks: map,
            entry,
        })
    }

    pub fn id(&self) -> &FileId {
        &self.id
    }

    /// The designated default/entry block id.
    pub fn entry(&self) -> &BlockId {
        &self.entry
    }

    /// The entry block itself.
    pub fn entry_block(&self) -> &Block {
        // invariant: entry always names a block in the map
        &self.blocks[&self.entry]
    }

    pub fn block(&self, id: &BlockId) -> Option<&Block> {
        self.blocks.get(id)
    }

    /// Look up a block by raw name.
    pub fn block_named(&self, name: &str) -> Option<&Block> {
        self.blocks
            .iter()
            .find(|(id, _)| id.as_str() == name)
            .map(|(_, block)| block)
    }

    pub fn contains(&self, id: &BlockId) -> bool {
        self.blocks.contains_key(id)
    }

    /// Blocks in document order.
    pub fn blocks(&self) -> impl Iterator<Item = &Block> {
        self.blocks.values()
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }
}

// ============================================================================
// Tests
// ============================================================================

//! Navigation targets and the context a resolution is relative to.

use serde::{Deserialize, Serialize};

use crate::ids::{BlockId, FileId};

/// A concrete destination: one block in one file.
///
/// Only produced once both the file and the block are known to exist.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NavigationTarget {
    pub file: FileId,
    pub block: BlockId,
}

impl NavigationTarget {
    pub fn new(file: FileId, block: BlockId) -> Self {
        Self { file, block }
    }
}

impl std::fmt::Display for NavigationTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.file, self.block)
    }
}

/// Where the user currently is. Immutable input to one resolution.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NavigationContext {
    pub current_file: FileId,
    pub current_block: BlockId,
}

impl NavigationContext {
    pub fn new(current_file: FileId, current_block: BlockId) -> Self {
        Self {
            current_file,
            current_block,
        }
    }

    /// The location this context points at.
    pub fn location(&self) -> NavigationTarget {
        NavigationTarget::new(self.current_file.clone(), self.current_block.clone())
    }
}

impl From<NavigationTarget> for NavigationContext {
    fn from(target: NavigationTarget) -> Self {
        Self {
            current_file: target.file,
            current_block: target.block,
        }
    }
}

//! Per-session breadcrumb trail.
//!
//! An ordered stack of visited locations. The top entry is where the user
//! is now; the bottom entry is where they landed. Ordering is insertion
//! order only, and repeated visits are never merged.
//!
//! A trail with exactly one entry cannot be popped: going back from the
//! landing location is a [`StateError::Underflow`], never an empty trail.

use serde::{Deserialize, Serialize};
use signpost_types::{BlockId, FileId, NavigationContext, NavigationTarget};

use crate::error::StateError;

/// One visited location.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BreadcrumbEntry {
    pub file: FileId,
    pub block: BlockId,
}

impl BreadcrumbEntry {
    pub fn target(&self) -> NavigationTarget {
        NavigationTarget::new(self.file.clone(), self.block.clone())
    }

    pub fn context(&self) -> NavigationContext {
        NavigationContext::new(self.file.clone(), self.block.clone())
    }
}

impl From<NavigationTarget> for BreadcrumbEntry {
    fn from(target: NavigationTarget) -> Self {
        Self {
            file: target.file,
            block: target.block,
        }
    }
}

impl std::fmt::Display for BreadcrumbEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.file, self.block)
    }
}

/// Ordered history of visited locations, bottom (landing) to top (current).
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BreadcrumbStack {
    entries: Vec<BreadcrumbEntry>,
}

impl BreadcrumbStack {
    pub fn new() -> Self {
        Self::default()
    }

    /// A trail that has landed at `entry`.
    pub fn landed_at(entry: BreadcrumbEntry) -> Self {
        Self {
            entries: vec![entry],
        }
    }

    /// Record a forward navigation.
    pub fn push(&mut self, entry: BreadcrumbEntry) {
        self.entries.push(entry);
    }

    /// Remove the top entry and return the newly exposed one.
    ///
    /// Fails with `Underflow` (leaving the trail untouched) when fewer than
    /// two entries remain.
    pub fn pop(&mut self) -> Result<&BreadcrumbEntry, StateError> {
        if self.entries.len() < 2 {
            return Err(StateError::Underflow {
                depth: self.entries.len(),
            });
        }
        self.entries.pop();
        // at least one entry remains
        self.entries.last().ok_or(StateError::Underflow { depth: 0 })
    }

    /// The current location, if the session has landed.
    pub fn peek(&self) -> Option<&BreadcrumbEntry> {
        self.entries.last()
    }

    /// Look `levels` entries below the top. `peek_at(0)` is `peek()`.
    pub fn peek_at(&self, levels: usize) -> Option<&BreadcrumbEntry> {
        self.entries
            .len()
            .checked_sub(levels)
            .and_then(|n| n.checked_sub(1))
            .and_then(|i| self.entries.get(i))
    }

    pub fn depth(&self) -> usize {
        self.entries.len()
    }

    pub fn is_landed(&self) -> bool {
        !self.entries.is_empty()
    }

    /// Whether `back` would succeed.
    pub fn can_go_back(&self) -> bool {
        self.entries.len() >= 2
    }

    /// Entries from landing location to current.
    pub fn trail(&self) -> impl DoubleEndedIterator<Item = &BreadcrumbEntry> + ExactSizeIterator {
        self.entries.iter()
    }

    /// Discard all history and land at `entry`.
    pub fn reset(&mut self, entry: BreadcrumbEntry) {
        self.entries.clear();
        self.entries.push(entry);
    }
}

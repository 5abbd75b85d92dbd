//! Shared identifiers and data types for signpost navigation.
//!
//! A leaf crate with **no internal signpost dependencies**. It defines the
//! vocabulary the navigation kernel resolves over, including the link
//! expression grammar, which is part of the persisted resource format.
//!
//! # Relationships
//!
//! ```text
//! ResourceFile (FileId)
//!     └── Block (BlockId), one of which is the entry block
//!           └── required_permission (optional capability label)
//!           └── links (raw LinkExpression strings)
//!
//! LinkExpression + NavigationContext ──resolve──▶ NavigationTarget (FileId + BlockId)
//!
//! Principal (PrincipalId) ── roles + permissions ──▶ checked against a gated Block
//! ```
//!
//! # Key Types
//!
//! |------------------------|-----------------------------------------------|
//! | Type                   | Purpose                                       |
//! |------------------------|-----------------------------------------------|
//! | [`FileId`]             | Normalized workspace-absolute file identifier |
//! | [`BlockId`]            | Block name within a file                      |
//! | [`LinkExpression`]     | Parsed navigation instruction                 |
//! | [`ResourceFile`]       | Parsed resource document                      |
//! | [`Block`]              | Addressable unit of content                   |
//! | [`Principal`]          | Actor with roles + permissions                |
//! | [`NavigationTarget`]   | Resolved destination                          |
//! | [`NavigationContext`]  | Current file + block                          |
//! | [`SessionId`]          | Which navigation session                      |
//! |------------------------|-----------------------------------------------|

pub mod ids;
pub mod link;
pub mod principal;
pub mod resource;
pub mod target;

pub use ids::{BlockId, FileId, IdError, PrincipalId, SessionId};
pub use link::{
    BLOCK_DELIMITER, LinkExpression, LinkKind, PathSegment, SyntaxError, SyntaxErrorKind, parse,
};
pub use principal::Principal;
pub use resource::{Block, ResourceError, ResourceFile};
pub use target::{NavigationContext, NavigationTarget};

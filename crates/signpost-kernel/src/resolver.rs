//! Context resolution: link expression + current location → concrete target.
//!
//! Resolution runs in two phases:
//!
//! 1. **Path arithmetic** ([`target_file`]): compute the target `FileId` from
//!    the expression kind and segments. Pure; no I/O.
//! 2. **Existence**: fetch the file through the [`ResourceCache`] and pick the
//!    block (explicit reference or the file's entry block).
//!
//! Segments collapse left to right with conventional path semantics. A
//! parent token with nothing left to pop is an error, never clamped.
//!
//! A bare same-level name (`./Block2`) is first looked up as a block of the
//! current file. Only when no such block exists is it read as a sibling file.

use std::sync::Arc;

use signpost_types::{
    FileId, LinkExpression, LinkKind, NavigationContext, NavigationTarget, PathSegment,
    ResourceFile,
};

use crate::cache::ResourceCache;
use crate::error::{NavResult, ResolutionError};

/// Whether a resolution stayed inside the current file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "kebab-case")]
pub enum Locality {
    IntraFile,
    InterFile,
}

/// A resolved target together with the file that contains it.
#[derive(Debug, Clone)]
pub struct Resolution {
    pub target: NavigationTarget,
    pub file: Arc<ResourceFile>,
    pub locality: Locality,
}

/// Compute the target file id for an expression. No I/O.
///
/// - workspace-absolute: segments from the workspace root
/// - home-relative: segments beside `home`
/// - same-level-relative: segments beside `current`
/// - parent-relative: segments one level above `current`'s location
pub fn target_file(
    expr: &LinkExpression,
    current: &FileId,
    home: &FileId,
) -> Result<FileId, ResolutionError> {
    let above_root = || ResolutionError::AboveRoot {
        raw: expr.to_string(),
        from: current.clone(),
    };

    let mut path: Vec<&str> = match expr.kind {
        LinkKind::WorkspaceAbsolute => Vec::new(),
        LinkKind::HomeRelative => home.dir(),
        LinkKind::SameLevelRelative => current.dir(),
        LinkKind::ParentRelative => {
            let mut dir = current.dir();
            dir.pop().ok_or_else(above_root)?;
            dir
        }
    };

    for segment in &expr.segments {
        match segment {
            PathSegment::Name(name) => path.push(name),
            PathSegment::Current => {}
            PathSegment::Parent => {
                path.pop().ok_or_else(above_root)?;
            }
        }
    }

    FileId::from_components(path).map_err(|source| ResolutionError::InvalidTarget {
        raw: expr.to_string(),
        source,
    })
}

/// Turns parsed expressions into targets against a shared cache.
#[derive(Debug, Clone)]
pub struct Resolver {
    cache: Arc<ResourceCache>,
    home: FileId,
}

impl Resolver {
    pub fn new(cache: Arc<ResourceCache>, home: FileId) -> Self {
        Self { cache, home }
    }

    pub fn home(&self) -> &FileId {
        &self.home
    }

    pub fn cache(&self) -> &Arc<ResourceCache> {
        &self.cache
    }

    /// Resolve to a target only.
    pub async fn resolve(
        &self,
        expr: &LinkExpression,
        ctx: &NavigationContext,
    ) -> NavResult<NavigationTarget> {
        self.resolve_detailed(expr, ctx).await.map(|r| r.target)
    }

    /// Resolve to a target, keeping a handle on the containing file.
    pub async fn resolve_detailed(
        &self,
        expr: &LinkExpression,
        ctx: &NavigationContext,
    ) -> NavResult<Resolution> {
        if expr.is_bare_same_level() {
            // An unloadable current file just means no block of that name.
            let current = self.cache.load(&ctx.current_file).await.ok();
            let found = current.and_then(|file| {
                let block = file.block_named(expr.last_name())?.id.clone();
                Some((file, block))
            });
            if let Some((current, block)) = found {
                let target = NavigationTarget::new(ctx.current_file.clone(), block);
                tracing::debug!(location = %target, "resolved bare name to block of current file");
                return Ok(Resolution {
                    target,
                    file: current,
                    locality: Locality::IntraFile,
                });
            }
        }

        let file_id = target_file(expr, &ctx.current_file, &self.home)?;
        let locality = if file_id == ctx.current_file {
            Locality::IntraFile
        } else {
            Locality::InterFile
        };

        // Intra-file targets are normally resident, so this is a cache hit.
        let file = self.cache.load(&file_id).await?;

        let block = match &expr.block_ref {
            Some(block) if file.contains(block) => block.clone(),
            Some(block) => {
                return Err(ResolutionError::MissingBlock {
                    file: file_id,
                    block: block.clone(),
                }
                .into());
            }
            None => file.entry().clone(),
        };

        let target = NavigationTarget::new(file_id, block);
        tracing::debug!(location = %target, %locality, "resolved link expression");
        Ok(Resolution {
            target,
            file,
            locality,
        })
    }
}

// ============================================================================
// Tests
// ============================================================================

//! Permission gate: may this principal enter this block?
//!
//! A block without `required_permission` is always enterable. Otherwise the
//! principal needs the label as a direct permission, as a role of the same
//! name, or through a role that a [`RoleMapping`] expands to it.
//!
//! The gate is pure. It runs after resolution and before any session or
//! breadcrumb mutation.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use signpost_types::{Block, NavigationTarget, Principal};

use crate::error::PermissionError;

/// Expands roles into the permissions they grant.
///
/// Supplied by the surrounding authorization system.
pub trait RoleMapping: Send + Sync {
    /// Whether `role` grants the capability `label`.
    fn grants(&self, role: &str, label: &str) -> bool;
}

/// A fixed role → permissions table, typically loaded from config.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StaticRoleMap {
    roles: BTreeMap<String, BTreeSet<String>>,
}

impl StaticRoleMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add permissions to a role.
    pub fn grant(
        mut self,
        role: impl Into<String>,
        labels: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        self.roles
            .entry(role.into())
            .or_default()
            .extend(labels.into_iter().map(Into::into));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.roles.is_empty()
    }
}

impl RoleMapping for StaticRoleMap {
    fn grants(&self, role: &str, label: &str) -> bool {
        self.roles
            .get(role)
            .is_some_and(|labels| labels.contains(label))
    }
}

/// Result of a gate evaluation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    Allowed,
    /// Carries the missing capability label.
    Denied { missing: String },
}

impl Decision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Decision::Allowed)
    }
}

/// Evaluates block permission requirements.
#[derive(Clone, Default)]
pub struct PermissionGate {
    roles: Option<Arc<dyn RoleMapping>>,
}

impl std::fmt::Debug for PermissionGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PermissionGate")
            .field("role_mapping", &self.roles.is_some())
            .finish()
    }
}

impl PermissionGate {
    /// A gate without role expansion.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_role_mapping(roles: Arc<dyn RoleMapping>) -> Self {
        Self { roles: Some(roles) }
    }

    /// Decide whether `principal` may enter `block` at `target`.
    pub fn authorize(
        &self,
        target: &NavigationTarget,
        block: &Block,
        principal: &Principal,
    ) -> Decision {
        let Some(required) = block.required_permission.as_deref() else {
            return Decision::Allowed;
        };

        if principal.has_permission(required) || principal.has_role(required) {
            return Decision::Allowed;
        }

        let expanded = self.roles.as_ref().is_some_and(|mapping| {
            principal
                .roles
                .iter()
                .any(|role| mapping.grants(role, required))
        });
        if expanded {
            return Decision::Allowed;
        }

        tracing::debug!(
            location = %target,
            principal = %principal.username,
            required,
            "permission gate denied entry"
        );
        Decision::Denied {
            missing: required.to_string(),
        }
    }

    /// [`authorize`](Self::authorize) as a `Result`.
    pub fn check(
        &self,
        target: &NavigationTarget,
        block: &Block,
        principal: &Principal,
    ) -> Result<(), PermissionError> {
        match self.authorize(target, block, principal) {
            Decision::Allowed => Ok(()),
            Decision::Denied { missing } => Err(PermissionError {
                target: target.clone(),
                required: missing,
            }),
        }
    }
}

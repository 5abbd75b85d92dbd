//! Principal types.
//!
//! A `Principal` is the authenticated actor attempting a navigation. How
//! roles and permissions get granted is decided elsewhere; the navigation
//! core treats the principal as a read-only capability set.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::ids::PrincipalId;

/// An actor with a set of roles and directly granted permissions.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    pub id: PrincipalId,
    /// Short handle used in logs: "amy", "anonymous".
    pub username: String,
    #[serde(default)]
    pub roles: BTreeSet<String>,
    #[serde(default)]
    pub permissions: BTreeSet<String>,
}

impl Principal {
    /// Create a principal with a fresh ID and no capabilities.
    pub fn new(username: impl Into<String>) -> Self {
        Self {
            id: PrincipalId::new(),
            username: username.into(),
            roles: BTreeSet::new(),
            permissions: BTreeSet::new(),
        }
    }

    /// The well-known anonymous principal.
    pub fn anonymous() -> Self {
        Self {
            id: PrincipalId::anonymous(),
            username: "anonymous".into(),
            roles: BTreeSet::new(),
            permissions: BTreeSet::new(),
        }
    }

    pub fn with_role(mut self, role: impl Into<String>) -> Self {
        self.roles.insert(role.into());
        self
    }

    pub fn with_permission(mut self, label: impl Into<String>) -> Self {
        self.permissions.insert(label.into());
        self
    }

    pub fn has_role(&self, role: &str) -> bool {
        self.roles.contains(role)
    }

    pub fn has_permission(&self, label: &str) -> bool {
        self.permissions.contains(label)
    }
}

impl std::fmt::Display for Principal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.username, self.id.short())
    }
}

// ============================================================================
// Tests
// ============================================================================

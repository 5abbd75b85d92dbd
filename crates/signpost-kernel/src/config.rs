//! Navigator configuration.
//!
//! Read from a TOML file (conventionally `signpost.toml`):
//!
//! ```toml
//! workspace_root = "menus"
//! home = "main/menu"
//! watch = true
//!
//! [denial]
//! policy = "redirect"
//! fallback = "@.system.errors:denied"
//!
//! [roles]
//! admin = ["users.manage", "audit.view"]
//!
//! [principal]
//! username = "amy"
//! roles = ["admin"]
//! ```
//!
//! A relative `workspace_root` is resolved against the directory of the
//! config file it came from.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use signpost_types::{FileId, IdError, LinkExpression, Principal, SyntaxError};
use thiserror::Error;

use crate::cache::ResourceCache;
use crate::gate::StaticRoleMap;
use crate::navigator::{DenialPolicy, Navigator};

/// Default config file name looked up by the CLI.
pub const DEFAULT_CONFIG_FILE: &str = "signpost.toml";

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid home file '{home}': {source}")]
    InvalidHome {
        home: String,
        #[source]
        source: IdError,
    },

    #[error("invalid denial fallback: {0}")]
    InvalidFallback(#[from] SyntaxError),

    #[error("{0}")]
    Invalid(String),
}

/// How gate denials are handled.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DenialMode {
    #[default]
    Fail,
    Redirect,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DenialConfig {
    #[serde(default)]
    pub policy: DenialMode,
    /// Link expression to redirect to. Required for `redirect`.
    #[serde(default)]
    pub fallback: Option<String>,
}

/// Stand-in authorization collaborator for single-user front ends.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PrincipalConfig {
    #[serde(default = "default_username")]
    pub username: String,
    #[serde(default)]
    pub roles: Vec<String>,
    #[serde(default)]
    pub permissions: Vec<String>,
}

impl Default for PrincipalConfig {
    fn default() -> Self {
        Self {
            username: default_username(),
            roles: Vec::new(),
            permissions: Vec::new(),
        }
    }
}

fn default_username() -> String {
    "anonymous".to_string()
}

fn default_workspace_root() -> PathBuf {
    PathBuf::from(".")
}

fn default_home() -> String {
    "main".to_string()
}

/// Top-level navigator configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NavigatorConfig {
    /// Directory served by the local loader.
    #[serde(default = "default_workspace_root")]
    pub workspace_root: PathBuf,
    /// Home file id; `~.` expressions resolve beside it.
    #[serde(default = "default_home")]
    pub home: String,
    /// Invalidate cache entries when files change on disk.
    #[serde(default)]
    pub watch: bool,
    #[serde(default)]
    pub denial: DenialConfig,
    /// Role → permissions expansion.
    #[serde(default)]
    pub roles: BTreeMap<String, Vec<String>>,
    #[serde(default)]
    pub principal: PrincipalConfig,
}

impl Default for NavigatorConfig {
    fn default() -> Self {
        Self {
            workspace_root: default_workspace_root(),
            home: default_home(),
            watch: false,
            denial: DenialConfig::default(),
            roles: BTreeMap::new(),
            principal: PrincipalConfig::default(),
        }
    }
}

impl NavigatorConfig {
    /// Parse and validate a TOML document.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a file, resolving a relative `workspace_root` against the
    /// file's directory.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| ConfigError::Io {
                path: path.to_path_buf(),
                source,
            })?;

        let mut config = Self::from_toml_str(&text)?;
        if config.workspace_root.is_relative() {
            let base = path.parent().unwrap_or_else(|| Path::new("."));
            config.workspace_root = base.join(&config.workspace_root);
        }

        tracing::debug!(
            config = %path.display(),
            root = %config.workspace_root.display(),
            home = %config.home,
            "loaded navigator config"
        );
        Ok(config)
    }

    /// Check cross-field constraints.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.home_id()?;
        self.denial_policy()?;
        if self.denial.policy == DenialMode::Fail && self.denial.fallback.is_some() {
            tracing::warn!("denial fallback is ignored unless policy = \"redirect\"");
        }
        Ok(())
    }

    pub fn home_id(&self) -> Result<FileId, ConfigError> {
        FileId::parse(&self.home).map_err(|source| ConfigError::InvalidHome {
            home: self.home.clone(),
            source,
        })
    }

    pub fn denial_policy(&self) -> Result<DenialPolicy, ConfigError> {
        match self.denial.policy {
            DenialMode::Fail => Ok(DenialPolicy::Fail),
            DenialMode::Redirect => {
                let raw = self.denial.fallback.as_deref().ok_or_else(|| {
                    ConfigError::Invalid("denial policy \"redirect\" requires a fallback".into())
                })?;
                Ok(DenialPolicy::Redirect {
                    fallback: LinkExpression::parse(raw)?,
                })
            }
        }
    }

    pub fn role_map(&self) -> StaticRoleMap {
        self.roles
            .iter()
            .fold(StaticRoleMap::new(), |map, (role, labels)| {
                map.grant(role.as_str(), labels.iter().map(String::as_str))
            })
    }

    /// The configured principal.
    pub fn principal(&self) -> Principal {
        let p = &self.principal;
        let principal = p
            .roles
            .iter()
            .fold(Principal::new(p.username.as_str()), |acc, role| acc.with_role(role.as_str()));
        p.permissions
            .iter()
            .fold(principal, |acc, label| acc.with_permission(label.as_str()))
    }

    /// Build a navigator over `cache` with this configuration's home, role
    /// mapping and denial policy.
    pub fn build_navigator(&self, cache: Arc<ResourceCache>) -> Result<Navigator, ConfigError> {
        let mut navigator =
            Navigator::new(cache, self.home_id()?).with_denial_policy(self.denial_policy()?);
        let roles = self.role_map();
        if !roles.is_empty() {
            navigator = navigator.with_role_mapping(Arc::new(roles));
        }
        Ok(navigator)
    }
}

//! # signpost-kernel
//!
//! Navigation core for signpost.
//!
//! A navigation takes a raw link expression, the user's current location and
//! their principal, and either moves the session somewhere new or explains
//! why it could not:
//!
//! ```text
//! raw ──parse──► LinkExpression ──resolve──► NavigationTarget ──gate──► commit
//!                                   │                                     │
//!                              ResourceCache                    BreadcrumbStack
//!                              (shared, lazy)                   + session keys
//! ```
//!
//! - [`ResourceLoader`] / [`LocalLoader`] / [`MemoryLoader`] - where files come from
//! - [`ResourceCache`] - process-wide memo of parsed files
//! - [`Resolver`] - expression + context → target
//! - [`PermissionGate`] - may this principal enter this block?
//! - [`BreadcrumbStack`] / [`SessionState`] - per-session history and keys
//! - [`Navigator`] - the façade; every call is one transaction
//! - [`CacheWatcher`] - hot reload
//! - [`lint`] - broken link detection

pub mod breadcrumbs;
pub mod cache;
pub mod config;
pub mod error;
pub mod gate;
pub mod lint;
pub mod loader;
pub mod navigator;
pub mod resolver;
pub mod session;
pub mod watch;

pub use breadcrumbs::{BreadcrumbEntry, BreadcrumbStack};
pub use cache::{CacheStats, ResourceCache};
pub use config::{ConfigError, DEFAULT_CONFIG_FILE, DenialMode, NavigatorConfig};
pub use error::{
    LoaderError, LoaderResult, NavError, NavResult, PermissionError, ResolutionError, StateError,
};
pub use gate::{Decision, PermissionGate, RoleMapping, StaticRoleMap};
pub use lint::{LinkIssue, is_dangling, lint_file, lint_links};
pub use loader::{LocalLoader, MemoryLoader, ResourceLoader, parse_resource};
pub use navigator::{DenialPolicy, NavigationOutcome, Navigator, Renderer};
pub use resolver::{Locality, Resolution, Resolver, target_file};
pub use session::{BACK_MARKER, KEY_BLOCK, KEY_EXPRESSION, KEY_FILE, SessionState};
pub use watch::{CacheWatcher, ChangeKind, WatchError};

//! Navigation error types.
//!
//! Every failure in the navigation core is a value returned to the caller.
//! Only [`NavError::Loader`] signals something outside navigation semantics
//! (storage unavailable, unreadable file); it is propagated unchanged.

use std::io;

use signpost_types::{BlockId, FileId, IdError, NavigationTarget, SyntaxError};
use thiserror::Error;

/// Failure reported by a [`ResourceLoader`](crate::loader::ResourceLoader).
#[derive(Debug, Error)]
pub enum LoaderError {
    /// The identifier does not exist in storage.
    #[error("resource file not found: {0}")]
    NotFound(FileId),

    /// The file exists but could not be parsed into a resource.
    #[error("malformed resource file {file}: {reason}")]
    Malformed { file: FileId, reason: String },

    /// Path escapes the workspace root (security violation).
    #[error("path escapes workspace root: {0}")]
    PathEscapesRoot(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Other error.
    #[error("{0}")]
    Other(String),
}

impl LoaderError {
    /// Create a Malformed error.
    pub fn malformed(file: &FileId, reason: impl ToString) -> Self {
        Self::Malformed {
            file: file.clone(),
            reason: reason.to_string(),
        }
    }

    /// Create an Other error.
    pub fn other(msg: impl Into<String>) -> Self {
        Self::Other(msg.into())
    }
}

/// Loader result type.
pub type LoaderResult<T> = Result<T, LoaderError>;

/// The expression was well formed but names nothing that exists.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolutionError {
    #[error("resource file not found: {0}")]
    MissingFile(FileId),

    #[error("block {block} not found in {file}")]
    MissingBlock { file: FileId, block: BlockId },

    /// Parent traversal ascended past the workspace root.
    #[error("'{raw}' ascends above the workspace root from {from}")]
    AboveRoot { raw: String, from: FileId },

    #[error("'{raw}' does not resolve to a valid file id: {source}")]
    InvalidTarget {
        raw: String,
        #[source]
        source: IdError,
    },
}

/// The principal lacks the capability the target block requires.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("permission '{required}' required to enter {target}")]
pub struct PermissionError {
    pub target: NavigationTarget,
    pub required: String,
}

/// The breadcrumb trail cannot perform the requested transition.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StateError {
    /// Back navigation from the initial landing location (or before landing).
    #[error("cannot go back: breadcrumb trail has depth {depth}")]
    Underflow { depth: usize },
}

/// Umbrella error returned by the navigator.
#[derive(Debug, Error)]
pub enum NavError {
    #[error(transparent)]
    Syntax(#[from] SyntaxError),

    #[error(transparent)]
    Resolution(#[from] ResolutionError),

    #[error(transparent)]
    Permission(#[from] PermissionError),

    #[error(transparent)]
    State(#[from] StateError),

    /// Opaque loader failure unrelated to missing-file semantics.
    #[error("resource loader failed: {0}")]
    Loader(#[source] LoaderError),
}

impl NavError {
    /// Short category label for structured logs.
    pub fn category(&self) -> &'static str {
        match self {
            NavError::Syntax(_) => "syntax",
            NavError::Resolution(_) => "resolution",
            NavError::Permission(_) => "permission",
            NavError::State(_) => "state",
            NavError::Loader(_) => "loader",
        }
    }

    /// Everything except an opaque loader failure is an expected outcome of
    /// user navigation.
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, NavError::Loader(_))
    }
}

/// A missing file is a resolution outcome; everything else from the loader
/// stays opaque.
impl From<LoaderError> for NavError {
    fn from(e: LoaderError) -> Self {
        match e {
            LoaderError::NotFound(file) => NavError::Resolution(ResolutionError::MissingFile(file)),
            other => NavError::Loader(other),
        }
    }
}

/// Navigation result type.
pub type NavResult<T> = Result<T, NavError>;

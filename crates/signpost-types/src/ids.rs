//! Typed identifiers for principals, sessions, resource files, and blocks.
//!
//! `PrincipalId` and `SessionId` wrap UUIDv7 (time-ordered, globally unique)
//! and display as standard UUID text for logging. The `short()` form is for
//! human-facing output only, never a lookup key.
//!
//! `FileId` and `BlockId` are name-based. A `FileId` is the normalized,
//! workspace-absolute identifier of a resource file (`"folder/target"`), so
//! every link expression that lands on the same file produces an equal key.
//! A `BlockId` names one block inside a file.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A principal identifier (UUIDv7, or UUIDv5 for sentinels).
#[derive(Clone, Copy, Hash, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PrincipalId(uuid::Uuid);

/// A navigation session identifier (UUIDv7).
#[derive(Clone, Copy, Hash, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(uuid::Uuid);

// ── Shared UUID behavior ────────────────────────────────────────────────────

macro_rules! impl_uuid_id {
    ($T:ident, $name:literal) => {
        impl $T {
            /// Create a new time-ordered ID (UUIDv7).
            pub fn new() -> Self {
                Self(uuid::Uuid::now_v7())
            }

            /// First 8 hex characters, for human display only.
            pub fn short(&self) -> String {
                self.0.as_simple().to_string()[..8].to_string()
            }

            /// Parse from a hex string (32 chars, no hyphens) or standard UUID format.
            pub fn parse(s: &str) -> Result<Self, uuid::Error> {
                uuid::Uuid::parse_str(s).map(Self)
            }

            /// A nil (all-zero) ID for sentinel values.
            pub fn nil() -> Self {
                Self(uuid::Uuid::nil())
            }

            /// Check if this is the nil ID.
            pub fn is_nil(&self) -> bool {
                self.0.is_nil()
            }
        }

        impl Default for $T {
            fn default() -> Self {
                Self::new()
            }
        }

        impl From<uuid::Uuid> for $T {
            fn from(u: uuid::Uuid) -> Self {
                Self(u)
            }
        }

        impl fmt::Display for $T {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl fmt::Debug for $T {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", $name, self.short())
            }
        }
    };
}

impl_uuid_id!(PrincipalId, "PrincipalId");
impl_uuid_id!(SessionId, "SessionId");

/// Fixed namespace for deriving deterministic PrincipalIds via UUIDv5.
const SIGNPOST_PRINCIPAL_NS: uuid::Uuid = uuid::uuid!("3f1c9b2e-5d7a-4c86-9e0b-a4d2f61c8b73");

impl PrincipalId {
    /// The well-known anonymous principal (no roles, no permissions).
    ///
    /// Deterministic: same value every time (UUIDv5 derived from `b"anonymous"`).
    pub fn anonymous() -> Self {
        Self(uuid::Uuid::new_v5(&SIGNPOST_PRINCIPAL_NS, b"anonymous"))
    }
}

// ── Names ───────────────────────────────────────────────────────────────────

/// Error from constructing a name-based identifier.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IdError {
    #[error("empty identifier")]
    Empty,
    #[error("empty path component in '{0}'")]
    EmptyComponent(String),
    #[error("invalid character {ch:?} in '{name}'")]
    InvalidCharacter { name: String, ch: char },
}

/// Whether `c` may appear in a file-path component or block name.
pub fn is_name_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '-'
}

/// Validate a single name (file-path component or block id).
pub fn validate_name(name: &str) -> Result<(), IdError> {
    if name.is_empty() {
        return Err(IdError::Empty);
    }
    if let Some(ch) = name.chars().find(|c| !is_name_char(*c)) {
        return Err(IdError::InvalidCharacter {
            name: name.to_string(),
            ch,
        });
    }
    Ok(())
}

/// Identifier of a block within a resource file.
#[derive(Clone, Hash, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct BlockId(String);

impl BlockId {
    /// Create a block ID, validating the name.
    pub fn new(name: impl Into<String>) -> Result<Self, IdError> {
        let name = name.into();
        validate_name(&name)?;
        Ok(Self(name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for BlockId {
    type Error = IdError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<BlockId> for String {
    fn from(id: BlockId) -> String {
        id.0
    }
}

impl std::str::FromStr for BlockId {
    type Err = IdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl fmt::Display for BlockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for BlockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BlockId({})", self.0)
    }
}

/// Normalized workspace-absolute identifier of a resource file.
///
/// Stored as its `/`-joined components. The workspace root itself is not a
/// file, so a `FileId` always has at least one component.
#[derive(Clone, Hash, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct FileId(String);

impl FileId {
    /// Separator between components in the canonical form.
    pub const SEPARATOR: char = '/';

    /// Parse a canonical file id such as `"folder/target"`.
    ///
    /// A single leading `/` is tolerated and dropped.
    pub fn parse(s: &str) -> Result<Self, IdError> {
        let trimmed = s.strip_prefix(Self::SEPARATOR).unwrap_or(s);
        if trimmed.is_empty() {
            return Err(IdError::Empty);
        }
        for component in trimmed.split(Self::SEPARATOR) {
            if component.is_empty() {
                return Err(IdError::EmptyComponent(s.to_string()));
            }
            validate_name(component)?;
        }
        Ok(Self(trimmed.to_string()))
    }

    /// Build a file id from already-split components.
    pub fn from_components<I, S>(components: I) -> Result<Self, IdError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut joined = String::new();
        for component in components {
            let component = component.as_ref();
            validate_name(component)?;
            if !joined.is_empty() {
                joined.push(Self::SEPARATOR);
            }
            joined.push_str(component);
        }
        if joined.is_empty() {
            return Err(IdError::Empty);
        }
        Ok(Self(joined))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Path components, root first.
    pub fn components(&self) -> impl Iterator<Item = &str> {
        self.0.split(Self::SEPARATOR)
    }

    /// Components of the containing location (everything but the last).
    pub fn dir(&self) -> Vec<&str> {
        let mut parts: Vec<&str> = self.components().collect();
        parts.pop();
        parts
    }

    /// The final component (the file's own name).
    pub fn name(&self) -> &str {
        self.0
            .rsplit(Self::SEPARATOR)
            .next()
            .unwrap_or(self.0.as_str())
    }

    /// Number of components.
    pub fn depth(&self) -> usize {
        self.components().count()
    }
}

impl TryFrom<String> for FileId {
    type Error = IdError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(&s)
    }
}

impl From<FileId> for String {
    fn from(id: FileId) -> String {
        id.0
    }
}

impl std::str::FromStr for FileId {
    type Err = IdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for FileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for FileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FileId({})", self.0)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    // ── UUID ids ────────────────────────────────────────────────────────

    #[test]
    fn test_new_is_unique() {
        assert_ne!(SessionId::new(), SessionId::new());
    }

    #[test]
    fn test_short_is_8_chars() {
        assert_eq!(PrincipalId::new().short().len(), 8);
    }

    #[test]
    fn test_parse_uuid_format() {
        let id = SessionId::new();
        let parsed = SessionId::parse(&id.to_string()).unwrap();
        assert_eq!(id, parsed);
    }

    #[test]
    fn test_anonymous_principal_is_deterministic() {
        assert_eq!(PrincipalId::anonymous(), PrincipalId::anonymous());
        assert_ne!(PrincipalId::anonymous(), PrincipalId::new());
        assert!(!PrincipalId::anonymous().is_nil());
    }

    #[test]
    fn test_debug_shows_type_and_short() {
        let debug = format!("{:?}", SessionId::new());
        assert!(debug.starts_with("SessionId("));
        assert_eq!(debug.len(), "SessionId(".len() + 8 + 1);
    }

    // ── BlockId ─────────────────────────────────────────────────────────

    #[test]
    fn test_block_id_accepts_names() {
        assert_eq!(BlockId::new("AdminBlock").unwrap().as_str(), "AdminBlock");
        assert!(BlockId::new("block_2-b").is_ok());
    }

    #[test]
    fn test_block_id_rejects_bad_names() {
        assert_eq!(BlockId::new(""), Err(IdError::Empty));
        assert!(matches!(
            BlockId::new("a:b"),
            Err(IdError::InvalidCharacter { ch: ':', .. })
        ));
        assert!(BlockId::new("has space").is_err());
    }

    #[test]
    fn test_block_id_serde_rejects_invalid() {
        let ok: BlockId = serde_json::from_str("\"main\"").unwrap();
        assert_eq!(ok.as_str(), "main");
        assert!(serde_json::from_str::<BlockId>("\"a.b\"").is_err());
    }

    // ── FileId ──────────────────────────────────────────────────────────

    #[test]
    fn test_file_id_parse() {
        let id = FileId::parse("folder/target").unwrap();
        assert_eq!(id.as_str(), "folder/target");
        assert_eq!(id.name(), "target");
        assert_eq!(id.dir(), vec!["folder"]);
        assert_eq!(id.depth(), 2);
    }

    #[test]
    fn test_file_id_leading_slash_is_dropped() {
        assert_eq!(FileId::parse("/main").unwrap(), FileId::parse("main").unwrap());
    }

    #[test]
    fn test_file_id_rejects_empty_components() {
        assert_eq!(FileId::parse(""), Err(IdError::Empty));
        assert!(matches!(FileId::parse("a//b"), Err(IdError::EmptyComponent(_))));
        assert!(FileId::parse("a/").is_err());
    }

    #[test]
    fn test_file_id_root_level_has_empty_dir() {
        let id = FileId::parse("menu").unwrap();
        assert!(id.dir().is_empty());
        assert_eq!(id.name(), "menu");
    }

    #[test]
    fn test_file_id_from_components_matches_parse() {
        let built = FileId::from_components(["a", "b", "c"]).unwrap();
        assert_eq!(built, FileId::parse("a/b/c").unwrap());
        assert_eq!(
            FileId::from_components(Vec::<String>::new()),
            Err(IdError::Empty)
        );
    }

    #[test]
    fn test_file_id_json_is_plain_string() {
        let id = FileId::parse("a/b").unwrap();
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"a/b\"");
        let parsed: FileId = serde_json::from_str("\"a/b\"").unwrap();
        assert_eq!(parsed, id);
    }

    #[test]
    fn test_file_id_postcard_roundtrip() {
        let id = FileId::parse("main/menu").unwrap();
        let bytes = postcard::to_stdvec(&id).unwrap();
        let parsed: FileId = postcard::from_bytes(&bytes).unwrap();
        assert_eq!(id, parsed);
    }
}

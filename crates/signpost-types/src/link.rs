//! Link expressions: the navigation instructions embedded in resource files.
//!
//! # Grammar
//!
//! ```text
//! expression := prefix path [ ":" block ]
//! prefix     := "@." | "~." | "../" | "./"
//! path       := segment { sep segment }
//! ```
//!
//! | Prefix | Kind                  | Separator | Traversal tokens |
//! |--------|-----------------------|-----------|------------------|
//! | `@.`   | workspace-absolute    | `.`       | none             |
//! | `~.`   | home-relative         | `.`       | none             |
//! | `./`   | same-level-relative   | `/`       | `.` and `..`     |
//! | `../`  | parent-relative       | `/`       | `.` and `..`     |
//!
//! Prefixes are matched longest-first, so `../` is never read as `./`.
//! The final segment must be a name. This grammar is part of the persisted
//! resource format; changes here must stay backwards compatible.
//!
//! Parsing is purely lexical. Whether the named file or block exists is
//! decided later by the resolver.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::ids::{BlockId, IdError, is_name_char};

/// Delimiter between the file path and an explicit block reference.
pub const BLOCK_DELIMITER: char = ':';

/// Which of the four prefix forms an expression uses.
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
    strum::IntoStaticStr,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum LinkKind {
    /// `@.`: resolved from the workspace root.
    WorkspaceAbsolute,
    /// `~.`: resolved beside the designated home file.
    HomeRelative,
    /// `./`: resolved beside the current file.
    SameLevelRelative,
    /// `../`: resolved one level above the current file's location.
    ParentRelative,
}

/// Prefix table in match order (longest first).
const PREFIXES: [(&str, LinkKind); 4] = [
    ("../", LinkKind::ParentRelative),
    ("./", LinkKind::SameLevelRelative),
    ("@.", LinkKind::WorkspaceAbsolute),
    ("~.", LinkKind::HomeRelative),
];

impl LinkKind {
    /// The literal prefix token.
    pub const fn prefix(self) -> &'static str {
        match self {
            LinkKind::WorkspaceAbsolute => "@.",
            LinkKind::HomeRelative => "~.",
            LinkKind::SameLevelRelative => "./",
            LinkKind::ParentRelative => "../",
        }
    }

    /// Separator between path segments for this form.
    pub const fn separator(self) -> char {
        match self {
            LinkKind::WorkspaceAbsolute | LinkKind::HomeRelative => '.',
            LinkKind::SameLevelRelative | LinkKind::ParentRelative => '/',
        }
    }

    /// Whether resolution depends on the current file.
    pub const fn is_context_relative(self) -> bool {
        matches!(
            self,
            LinkKind::SameLevelRelative | LinkKind::ParentRelative
        )
    }
}

/// One component of an expression's path.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PathSegment {
    /// A named directory or file.
    Name(String),
    /// `..` ascends one level.
    Parent,
    /// `.` stays at the current level.
    Current,
}

impl PathSegment {
    pub fn as_name(&self) -> Option<&str> {
        match self {
            PathSegment::Name(n) => Some(n),
            _ => None,
        }
    }
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathSegment::Name(n) => f.write_str(n),
            PathSegment::Parent => f.write_str(".."),
            PathSegment::Current => f.write_str("."),
        }
    }
}

/// A parsed navigation instruction.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LinkExpression {
    pub kind: LinkKind,
    /// Path segments after the prefix, in source order. Never empty; the last
    /// one is always a [`PathSegment::Name`].
    pub segments: Vec<PathSegment>,
    /// Explicit block; `None` means the target file's entry block.
    pub block_ref: Option<BlockId>,
}

impl LinkExpression {
    /// Parse a raw expression string.
    pub fn parse(raw: &str) -> Result<Self, SyntaxError> {
        parse(raw)
    }

    /// The final named segment: the target file's name, or for a bare
    /// same-level expression possibly a block of the current file.
    pub fn last_name(&self) -> &str {
        self.segments
            .last()
            .and_then(PathSegment::as_name)
            .unwrap_or_default()
    }

    /// True for a same-level expression with a single name and no block
    /// reference, e.g. `./Block2`. Such a name may address a block of the
    /// current file rather than a sibling file.
    pub fn is_bare_same_level(&self) -> bool {
        self.kind == LinkKind::SameLevelRelative
            && self.block_ref.is_none()
            && self.segments.len() == 1
    }
}

impl FromStr for LinkExpression {
    type Err = SyntaxError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse(s)
    }
}

impl fmt::Display for LinkExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.kind.prefix())?;
        let sep = self.kind.separator();
        for (i, segment) in self.segments.iter().enumerate() {
            if i > 0 {
                write!(f, "{sep}")?;
            }
            write!(f, "{segment}")?;
        }
        if let Some(block) = &self.block_ref {
            write!(f, "{BLOCK_DELIMITER}{block}")?;
        }
        Ok(())
    }
}

// ── Errors ──────────────────────────────────────────────────────────────────

/// What is structurally wrong with an expression.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SyntaxErrorKind {
    #[error("expected one of the prefixes '@.', '~.', './', '../'")]
    UnknownPrefix,
    #[error("no path segments after the prefix")]
    EmptyPath,
    #[error("empty segment at position {position}")]
    EmptySegment { position: usize },
    #[error("invalid character {ch:?}")]
    InvalidCharacter { ch: char },
    #[error("empty block reference after ':'")]
    EmptyBlockRef,
    #[error("path must end in a name, not a traversal token")]
    DanglingTraversal,
}

/// A malformed link expression. Carries the offending input verbatim.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid link expression '{raw}': {kind}")]
pub struct SyntaxError {
    pub raw: String,
    pub kind: SyntaxErrorKind,
}

impl SyntaxError {
    fn new(raw: &str, kind: SyntaxErrorKind) -> Self {
        Self {
            raw: raw.to_string(),
            kind,
        }
    }
}

// ── Parser ──────────────────────────────────────────────────────────────────

/// Parse a raw link expression.
///
/// Surrounding whitespace is ignored; whitespace anywhere else is an invalid
/// character.
pub fn parse(raw: &str) -> Result<LinkExpression, SyntaxError> {
    let input = raw.trim();

    let (kind, rest) = PREFIXES
        .iter()
        .find_map(|&(prefix, kind)| input.strip_prefix(prefix).map(|rest| (kind, rest)))
        .ok_or_else(|| SyntaxError::new(raw, SyntaxErrorKind::UnknownPrefix))?;

    let (path, block_ref) = match rest.split_once(BLOCK_DELIMITER) {
        Some((path, block)) => {
            let block = BlockId::new(block).map_err(|e| {
                let kind = match e {
                    IdError::InvalidCharacter { ch, .. } => SyntaxErrorKind::InvalidCharacter { ch },
                    _ => SyntaxErrorKind::EmptyBlockRef,
                };
                SyntaxError::new(raw, kind)
            })?;
            (path, Some(block))
        }
        None => (rest, None),
    };

    if path.is_empty() {
        return Err(SyntaxError::new(raw, SyntaxErrorKind::EmptyPath));
    }

    let mut segments = Vec::new();
    for (position, token) in path.split(kind.separator()).enumerate() {
        let segment = match token {
            "" => {
                return Err(SyntaxError::new(
                    raw,
                    SyntaxErrorKind::EmptySegment { position },
                ));
            }
            ".." if kind.is_context_relative() => PathSegment::Parent,
            "." if kind.is_context_relative() => PathSegment::Current,
            name => {
                check_name(raw, name)?;
                PathSegment::Name(name.to_string())
            }
        };
        segments.push(segment);
    }

    if !matches!(segments.last(), Some(PathSegment::Name(_))) {
        return Err(SyntaxError::new(raw, SyntaxErrorKind::DanglingTraversal));
    }

    Ok(LinkExpression {
        kind,
        segments,
        block_ref,
    })
}

fn check_name(raw: &str, name: &str) -> Result<(), SyntaxError> {
    match name.chars().find(|c| !is_name_char(*c)) {
        Some(ch) => Err(SyntaxError::new(
            raw,
            SyntaxErrorKind::InvalidCharacter { ch },
        )),
        None => Ok(()),
    }
}

// ============================================================================
// Tests
// ============================================================================

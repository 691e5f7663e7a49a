use crate::project::RelativePath;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A word exactly as typed. No case folding is applied anywhere.
pub type Word = String;

/// The breadth at which an ignore decision applies.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Scope {
    Global,
    Language(String),
    Project,
    Extension(String),
    Path(RelativePath),
}

impl Scope {
    pub fn kind(&self) -> ScopeKind {
        match self {
            Scope::Global => ScopeKind::Global,
            Scope::Language(_) => ScopeKind::Language,
            Scope::Project => ScopeKind::Project,
            Scope::Extension(_) => ScopeKind::Extension,
            Scope::Path(_) => ScopeKind::Path,
        }
    }

    /// Global, language and extension decisions follow the user across projects.
    pub fn is_global(&self) -> bool {
        self.kind().is_global()
    }

    pub fn key(&self) -> Option<&str> {
        match self {
            Scope::Global | Scope::Project => None,
            Scope::Language(lang) => Some(lang),
            Scope::Extension(ext) => Some(ext),
            Scope::Path(path) => Some(path.as_str()),
        }
    }

    /// Build a scope of the given kind from a key. Keyed kinds return `None`
    /// when no key is supplied.
    pub fn from_kind(kind: ScopeKind, key: Option<&str>) -> Option<Self> {
        match (kind, key) {
            (ScopeKind::Global, _) => Some(Scope::Global),
            (ScopeKind::Project, _) => Some(Scope::Project),
            (ScopeKind::Language, Some(lang)) => Some(Scope::Language(short_lang(lang).to_string())),
            (ScopeKind::Extension, Some(ext)) => Some(Scope::Extension(ext.to_string())),
            (ScopeKind::Path, Some(path)) => Some(Scope::Path(RelativePath::from(path))),
            _ => None,
        }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.key() {
            Some(key) => write!(f, "{}({})", self.kind(), key),
            None => write!(f, "{}", self.kind()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScopeKind {
    Global,
    Language,
    Project,
    Extension,
    Path,
}

impl ScopeKind {
    pub fn is_global(self) -> bool {
        matches!(
            self,
            ScopeKind::Global | ScopeKind::Language | ScopeKind::Extension
        )
    }
}

impl FromStr for ScopeKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "global" => Ok(ScopeKind::Global),
            "language" | "lang" => Ok(ScopeKind::Language),
            "project" => Ok(ScopeKind::Project),
            "extension" | "ext" => Ok(ScopeKind::Extension),
            "path" | "file" => Ok(ScopeKind::Path),
            _ => Err(format!("Unknown scope: {}", s)),
        }
    }
}

impl fmt::Display for ScopeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ScopeKind::Global => "global",
            ScopeKind::Language => "language",
            ScopeKind::Project => "project",
            ScopeKind::Extension => "extension",
            ScopeKind::Path => "path",
        };
        write!(f, "{}", name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct IgnoreEntry {
    pub scope: Scope,
    pub word: Word,
}

impl IgnoreEntry {
    pub fn new(scope: Scope, word: impl Into<Word>) -> Self {
        Self {
            scope,
            word: word.into(),
        }
    }
}

/// A decision to exclude whole files from checking.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SkipRule {
    SkipPath(RelativePath),
    SkipFileName(String),
    SkipPattern(String),
}

impl fmt::Display for SkipRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipRule::SkipPath(path) => write!(f, "path {}", path),
            SkipRule::SkipFileName(name) => write!(f, "name {}", name),
            SkipRule::SkipPattern(glob) => write!(f, "pattern {}", glob),
        }
    }
}

/// Dictionary providers disagree on tag separators (`en_US`, `en-US`), so
/// language keys only keep what comes before the first `-` or `_`.
pub fn short_lang(lang: &str) -> &str {
    lang.split(['-', '_']).next().unwrap_or(lang)
}

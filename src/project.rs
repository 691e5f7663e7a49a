use crate::error::{Error, Result};
use std::borrow::Cow;
use std::fmt;
use std::path::{Component, Path, PathBuf};

/// Name of the project-local store file (TOML generation).
pub const LOCAL_TOML_FILE: &str = "spellscope-ignore.toml";
/// Name of the project-local store file (SQLite generation).
pub const LOCAL_DB_FILE: &str = "spellscope-ignore.db";
/// Name of the per-project configuration file.
pub const PROJECT_CONFIG_FILE: &str = ".spellscope.toml";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Project {
    root: PathBuf,
}

impl Project {
    pub fn new(root: &Path) -> Result<Self> {
        let absolute = std::path::absolute(root).map_err(|e| Error::io(root, e))?;
        let root = normalize(&absolute)
            .ok_or_else(|| Error::Path(format!("{} climbs above the filesystem root", absolute.display())))?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn local_toml_path(&self) -> PathBuf {
        self.root.join(LOCAL_TOML_FILE)
    }

    pub fn local_db_path(&self) -> PathBuf {
        self.root.join(LOCAL_DB_FILE)
    }

    pub fn config_path(&self) -> PathBuf {
        self.root.join(PROJECT_CONFIG_FILE)
    }

    /// Express `path` relative to the project root. Relative inputs are taken
    /// to be relative to the root already. `..` components are resolved
    /// lexically, and anything that ends up outside the root is an error.
    pub fn relative_path(&self, path: &Path) -> Result<RelativePath> {
        let outside = || {
            Error::Path(format!(
                "{} is outside of project {}",
                path.display(),
                self.root.display()
            ))
        };
        let normalized = normalize(path).ok_or_else(outside)?;
        if normalized.is_relative() {
            return Ok(RelativePath::new(&normalized));
        }
        let stripped = normalized.strip_prefix(&self.root).map_err(|_| outside())?;
        Ok(RelativePath::new(stripped))
    }
}

/// Resolve `.` and `..` without touching the filesystem. `None` when a `..`
/// climbs above the start of the path.
fn normalize(path: &Path) -> Option<PathBuf> {
    let mut out = PathBuf::new();
    let mut depth = 0usize;
    for component in path.components() {
        match component {
            Component::Prefix(_) | Component::RootDir => out.push(component),
            Component::CurDir => {}
            Component::ParentDir => {
                depth = depth.checked_sub(1)?;
                out.pop();
            }
            Component::Normal(part) => {
                out.push(part);
                depth += 1;
            }
        }
    }
    Some(out)
}

/// A file path relative to the project root, always stored with `/` separators.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RelativePath(String);

impl RelativePath {
    pub fn new(path: &Path) -> Self {
        let parts: Vec<Cow<'_, str>> = path
            .components()
            .filter_map(|c| match c {
                Component::Normal(part) => Some(part.to_string_lossy()),
                _ => None,
            })
            .collect();
        Self(parts.join("/"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn file_name(&self) -> &str {
        self.0.rsplit('/').next().unwrap_or(&self.0)
    }

    pub fn extension(&self) -> Option<&str> {
        Path::new(self.file_name())
            .extension()
            .and_then(|e| e.to_str())
    }
}

impl From<&str> for RelativePath {
    fn from(s: &str) -> Self {
        Self::new(Path::new(s))
    }
}

impl AsRef<Path> for RelativePath {
    fn as_ref(&self) -> &Path {
        Path::new(&self.0)
    }
}

impl fmt::Display for RelativePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

use crate::error::{Error, Result};
use crate::project::{RelativePath, LOCAL_DB_FILE, LOCAL_TOML_FILE, PROJECT_CONFIG_FILE};
use crate::store::entries::LocalEntries;
use ignore::gitignore::{Gitignore, GitignoreBuilder};
use std::collections::BTreeSet;
use std::path::Path;

/// Compiled view of the project's skip rules.
#[derive(Debug, Clone)]
pub struct SkipMatcher {
    patterns: Gitignore,
    names: BTreeSet<String>,
    paths: BTreeSet<String>,
}

impl Default for SkipMatcher {
    fn default() -> Self {
        Self {
            patterns: Gitignore::empty(),
            names: BTreeSet::new(),
            paths: BTreeSet::new(),
        }
    }
}

impl SkipMatcher {
    pub fn new(local: &LocalEntries) -> Result<Self> {
        let patterns = compile(local.patterns.iter().map(String::as_str))?;
        Ok(Self {
            patterns,
            names: local.skip_names.clone(),
            paths: local.skip_paths.clone(),
        })
    }

    pub fn is_skipped(&self, path: &RelativePath) -> bool {
        let name = path.file_name();
        if name == LOCAL_TOML_FILE || name == LOCAL_DB_FILE || path.as_str() == PROJECT_CONFIG_FILE
        {
            return true;
        }
        if self.paths.contains(path.as_str()) || self.names.contains(name) {
            return true;
        }
        self.patterns
            .matched_path_or_any_parents(path.as_str(), false)
            .is_ignore()
    }
}

/// Patterns are matched against project-relative paths, so the matcher is
/// rooted at `.` and never strips a prefix.
fn compile<'a>(globs: impl Iterator<Item = &'a str>) -> Result<Gitignore> {
    let mut builder = GitignoreBuilder::new(Path::new("."));
    for glob in globs {
        builder.add_line(None, glob).map_err(|source| Error::Pattern {
            pattern: glob.to_string(),
            source,
        })?;
    }
    builder.build().map_err(|source| Error::Pattern {
        pattern: String::new(),
        source,
    })
}

/// Reject a glob before it reaches persisted state.
pub fn validate_pattern(glob: &str) -> Result<()> {
    compile(std::iter::once(glob)).map(|_| ())
}

use crate::scope::{short_lang, IgnoreEntry, Scope, SkipRule};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

type Keyed = BTreeMap<String, BTreeSet<String>>;

/// Decisions that follow the user across projects.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GlobalEntries {
    #[serde(default)]
    pub global: BTreeSet<String>,

    #[serde(default)]
    pub lang: Keyed,

    #[serde(default)]
    pub extensions: Keyed,
}

/// Decisions that live with the project.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LocalEntries {
    #[serde(default)]
    pub patterns: BTreeSet<String>,

    #[serde(default)]
    pub project: BTreeSet<String>,

    #[serde(default)]
    pub paths: Keyed,

    #[serde(default)]
    pub skip_names: BTreeSet<String>,

    #[serde(default)]
    pub skip_paths: BTreeSet<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Entries {
    pub global: GlobalEntries,
    pub local: LocalEntries,
}

fn keyed_insert(map: &mut Keyed, key: &str, word: &str) -> bool {
    map.entry(key.to_string())
        .or_default()
        .insert(word.to_string())
}

fn keyed_remove(map: &mut Keyed, key: &str, word: &str) -> bool {
    let Some(words) = map.get_mut(key) else {
        return false;
    };
    let removed = words.remove(word);
    if words.is_empty() {
        map.remove(key);
    }
    removed
}

fn keyed_contains(map: &Keyed, key: &str, word: &str) -> bool {
    map.get(key).is_some_and(|words| words.contains(word))
}

impl Entries {
    /// Returns true if the entry was not present before.
    pub fn insert(&mut self, entry: &IgnoreEntry) -> bool {
        let word = entry.word.as_str();
        match &entry.scope {
            Scope::Global => self.global.global.insert(word.to_string()),
            Scope::Language(lang) => keyed_insert(&mut self.global.lang, short_lang(lang), word),
            Scope::Extension(ext) => keyed_insert(&mut self.global.extensions, ext, word),
            Scope::Project => self.local.project.insert(word.to_string()),
            Scope::Path(path) => keyed_insert(&mut self.local.paths, path.as_str(), word),
        }
    }

    /// Returns true if the entry was present.
    pub fn remove(&mut self, entry: &IgnoreEntry) -> bool {
        let word = entry.word.as_str();
        match &entry.scope {
            Scope::Global => self.global.global.remove(word),
            Scope::Language(lang) => keyed_remove(&mut self.global.lang, short_lang(lang), word),
            Scope::Extension(ext) => keyed_remove(&mut self.global.extensions, ext, word),
            Scope::Project => self.local.project.remove(word),
            Scope::Path(path) => keyed_remove(&mut self.local.paths, path.as_str(), word),
        }
    }

    pub fn contains(&self, entry: &IgnoreEntry) -> bool {
        let word = entry.word.as_str();
        match &entry.scope {
            Scope::Global => self.global.global.contains(word),
            Scope::Language(lang) => keyed_contains(&self.global.lang, short_lang(lang), word),
            Scope::Extension(ext) => keyed_contains(&self.global.extensions, ext, word),
            Scope::Project => self.local.project.contains(word),
            Scope::Path(path) => keyed_contains(&self.local.paths, path.as_str(), word),
        }
    }

    pub fn insert_skip(&mut self, rule: &SkipRule) -> bool {
        match rule {
            SkipRule::SkipPath(path) => self.local.skip_paths.insert(path.to_string()),
            SkipRule::SkipFileName(name) => self.local.skip_names.insert(name.clone()),
            SkipRule::SkipPattern(glob) => self.local.patterns.insert(glob.clone()),
        }
    }

    pub fn remove_skip(&mut self, rule: &SkipRule) -> bool {
        match rule {
            SkipRule::SkipPath(path) => self.local.skip_paths.remove(path.as_str()),
            SkipRule::SkipFileName(name) => self.local.skip_names.remove(name),
            SkipRule::SkipPattern(glob) => self.local.patterns.remove(glob),
        }
    }

    pub fn contains_skip(&self, rule: &SkipRule) -> bool {
        match rule {
            SkipRule::SkipPath(path) => self.local.skip_paths.contains(path.as_str()),
            SkipRule::SkipFileName(name) => self.local.skip_names.contains(name),
            SkipRule::SkipPattern(glob) => self.local.patterns.contains(glob),
        }
    }

    pub fn len(&self) -> usize {
        let keyed = |map: &Keyed| map.values().map(BTreeSet::len).sum::<usize>();
        self.global.global.len()
            + keyed(&self.global.lang)
            + keyed(&self.global.extensions)
            + self.local.project.len()
            + keyed(&self.local.paths)
            + self.local.patterns.len()
            + self.local.skip_names.len()
            + self.local.skip_paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_is_idempotent() {
        let mut entries = Entries::default();
        let entry = IgnoreEntry::new(Scope::Extension("rs".to_string()), "fn");
        assert!(entries.insert(&entry));
        assert!(!entries.insert(&entry));
        assert_eq!(entries.len(), 1);
    }

    #[test]
    fn test_remove_prunes_empty_keys() {
        let mut entries = Entries::default();
        let entry = IgnoreEntry::new(Scope::Path("a/b.txt".into()), "foo");
        entries.insert(&entry);
        assert!(entries.remove(&entry));
        assert!(entries.local.paths.is_empty());
        assert!(!entries.remove(&entry));
    }

    #[test]
    fn test_language_keys_are_shortened() {
        let mut entries = Entries::default();
        entries.insert(&IgnoreEntry::new(Scope::Language("en_US".to_string()), "colour"));
        assert!(entries.global.lang.contains_key("en"));
        assert!(entries.contains(&IgnoreEntry::new(Scope::Language("en-GB".to_string()), "colour")));
    }
}

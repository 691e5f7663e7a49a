pub mod entries;
pub mod skip;
pub mod undo;

use crate::backend::Backend;
use crate::error::Result;
use crate::project::RelativePath;
use crate::scope::{short_lang, IgnoreEntry, Scope, ScopeKind, SkipRule};
use entries::Entries;
use std::collections::{BTreeMap, BTreeSet};
use skip::SkipMatcher;
use tracing::{debug, info, warn};
use undo::UndoRecord;

/// Owns every ignore and skip decision, resolves them, and is the only
/// writer to the backend.
pub struct ScopeStore<B: Backend> {
    backend: B,
    entries: Entries,
    skips: SkipMatcher,
    undo: Option<UndoRecord>,
}

impl<B: Backend> ScopeStore<B> {
    /// Load everything from `backend`. A store that cannot be parsed is an
    /// error, never an empty store.
    pub fn load(mut backend: B) -> Result<Self> {
        let entries = backend.load()?;
        let skips = SkipMatcher::new(&entries.local)?;
        let undo = backend.load_undo()?;
        info!(
            backend = %backend.describe(),
            entries = entries.len(),
            pending_undo = undo.is_some(),
            "loaded ignore store"
        );
        Ok(Self {
            backend,
            entries,
            skips,
            undo,
        })
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn entries(&self) -> &Entries {
        &self.entries
    }

    /// Should `word`, found invalid in `path` while checking `lang`, be
    /// suppressed? Any single matching scope is enough.
    pub fn is_ignored(&self, word: &str, path: &RelativePath, lang: &str) -> bool {
        let global = &self.entries.global;
        let local = &self.entries.local;

        if global.global.contains(word) {
            return true;
        }

        if global
            .lang
            .get(short_lang(lang))
            .is_some_and(|words| words.contains(word))
        {
            return true;
        }

        if local.project.contains(word) {
            return true;
        }

        if let Some(ext) = path.extension() {
            if global
                .extensions
                .get(ext)
                .is_some_and(|words| words.contains(word))
            {
                return true;
            }
        }

        local
            .paths
            .get(path.as_str())
            .is_some_and(|words| words.contains(word))
    }

    pub fn is_skipped(&self, path: &RelativePath) -> bool {
        self.skips.is_skipped(path)
    }

    /// Insert `word` at `scope`. Inserting an existing pair changes nothing
    /// on disk but still becomes the pending undo record, whose undo is then
    /// a no-op as well.
    pub fn add_ignore(&mut self, scope: Scope, word: &str) -> Result<()> {
        let entry = IgnoreEntry::new(scope, word);
        let inserted = !self.entries.contains(&entry);
        self.clear_persisted_undo()?;
        if inserted {
            let mut next = self.entries.clone();
            next.insert(&entry);
            self.commit(next, entry.scope.is_global())?;
            debug!(scope = %entry.scope, word, "ignored");
        } else {
            debug!(scope = %entry.scope, word, "already ignored");
        }
        self.remember(UndoRecord::Ignore { entry, inserted });
        Ok(())
    }

    /// Returns false if the entry was not there.
    pub fn remove_ignore(&mut self, scope: Scope, word: &str) -> Result<bool> {
        let entry = IgnoreEntry::new(scope, word);
        let mut next = self.entries.clone();
        if !next.remove(&entry) {
            return Ok(false);
        }
        self.clear_persisted_undo()?;
        self.commit(next, entry.scope.is_global())?;
        self.undo = None;
        debug!(scope = %entry.scope, word, "removed ignore");
        Ok(true)
    }

    pub fn add_skip(&mut self, rule: SkipRule) -> Result<()> {
        if let SkipRule::SkipPattern(glob) = &rule {
            skip::validate_pattern(glob)?;
        }
        let inserted = !self.entries.contains_skip(&rule);
        self.clear_persisted_undo()?;
        if inserted {
            let mut next = self.entries.clone();
            next.insert_skip(&rule);
            self.commit(next, false)?;
            debug!(%rule, "skip rule added");
        } else {
            debug!(%rule, "already skipped");
        }
        self.remember(UndoRecord::Skip { rule, inserted });
        Ok(())
    }

    pub fn remove_skip(&mut self, rule: &SkipRule) -> Result<bool> {
        let mut next = self.entries.clone();
        if !next.remove_skip(rule) {
            return Ok(false);
        }
        self.clear_persisted_undo()?;
        self.commit(next, false)?;
        self.undo = None;
        debug!(%rule, "skip rule removed");
        Ok(true)
    }

    /// Reverse the pending record, if any. Returns what was undone. The
    /// record stays pending when persisting the reversal fails.
    pub fn undo(&mut self) -> Result<Option<UndoRecord>> {
        let Some(record) = self.undo.clone() else {
            debug!("nothing to undo");
            return Ok(None);
        };
        let mut next = self.entries.clone();
        if record.revert(&mut next) {
            self.commit(next, record.touches_global())?;
        }
        self.undo = None;
        if let Err(e) = self.backend.save_undo(None) {
            warn!(error = %e, "undone record is still persisted");
        }
        debug!(?record, "undone");
        Ok(Some(record))
    }

    pub fn pending_undo(&self) -> Option<&UndoRecord> {
        self.undo.as_ref()
    }

    /// Entries of one kind, optionally narrowed to one key (language,
    /// extension or path). Unkeyed kinds ignore `key`.
    pub fn list(&self, kind: ScopeKind, key: Option<&str>) -> Vec<IgnoreEntry> {
        let global = &self.entries.global;
        let local = &self.entries.local;
        match kind {
            ScopeKind::Global => plain(&global.global, Scope::Global),
            ScopeKind::Project => plain(&local.project, Scope::Project),
            ScopeKind::Language => keyed(&global.lang, key.map(short_lang), |k| {
                Scope::Language(k.to_string())
            }),
            ScopeKind::Extension => keyed(&global.extensions, key, |k| {
                Scope::Extension(k.to_string())
            }),
            ScopeKind::Path => keyed(&local.paths, key, |k| Scope::Path(RelativePath::from(k))),
        }
    }

    pub fn skip_rules(&self) -> Vec<SkipRule> {
        let local = &self.entries.local;
        let paths = local
            .skip_paths
            .iter()
            .map(|p| SkipRule::SkipPath(RelativePath::from(p.as_str())));
        let names = local.skip_names.iter().cloned().map(SkipRule::SkipFileName);
        let patterns = local.patterns.iter().cloned().map(SkipRule::SkipPattern);
        paths.chain(names).chain(patterns).collect()
    }

    /// Runs ahead of every mutation. The in-memory record survives until the
    /// mutation itself succeeds.
    fn clear_persisted_undo(&mut self) -> Result<()> {
        if self.undo.is_some() {
            self.backend.save_undo(None)?;
        }
        Ok(())
    }

    fn remember(&mut self, record: UndoRecord) {
        if let Err(e) = self.backend.save_undo(Some(&record)) {
            warn!(error = %e, "pending undo kept in memory only");
        }
        self.undo = Some(record);
    }

    /// Persist `next` and only then make it the live state, so a failed write
    /// leaves memory exactly as it was.
    fn commit(&mut self, next: Entries, global: bool) -> Result<()> {
        if global {
            self.backend.save_global(&next.global)?;
            self.entries = next;
        } else {
            let skips = SkipMatcher::new(&next.local)?;
            self.backend.save_local(&next.local)?;
            self.entries = next;
            self.skips = skips;
        }
        Ok(())
    }
}

fn plain(words: &BTreeSet<String>, scope: Scope) -> Vec<IgnoreEntry> {
    words
        .iter()
        .map(|w| IgnoreEntry::new(scope.clone(), w.as_str()))
        .collect()
}

fn keyed(
    map: &BTreeMap<String, BTreeSet<String>>,
    key: Option<&str>,
    make: impl Fn(&str) -> Scope,
) -> Vec<IgnoreEntry> {
    let mut out = Vec::new();
    for (k, words) in map {
        if key.is_some_and(|key| key != k.as_str()) {
            continue;
        }
        let scope = make(k);
        out.extend(words.iter().map(|w| IgnoreEntry::new(scope.clone(), w.as_str())));
    }
    out
}

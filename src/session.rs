//! Request/response surface an editor integration drives.
//!
//! A [`Session`] holds one open buffer at a time. Every call that can change
//! what should be reported (an ignore, a skip, an undo, a replacement)
//! recomputes the buffer's [`ErrorIndex`] before returning, so callers never
//! navigate with offsets from before the change.

use crate::backend::Backend;
use crate::error::{Error, Result};
use crate::index::{ErrorIndex, ErrorRecord};
use crate::project::{Project, RelativePath};
use crate::scope::{short_lang, IgnoreEntry, Scope, ScopeKind, SkipRule};
use crate::source::SpellSource;
use crate::store::undo::UndoRecord;
use crate::store::ScopeStore;
use serde::Serialize;
use std::path::Path;
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BufferStatus {
    pub skipped: bool,
    pub error_count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Replacement {
    pub word: String,
    pub replacement: String,
    pub start: usize,
}

struct Buffer {
    path: RelativePath,
    language: String,
    text: String,
    skipped: bool,
    index: ErrorIndex,
}

impl Buffer {
    fn status(&self) -> BufferStatus {
        BufferStatus {
            skipped: self.skipped,
            error_count: self.index.count(),
        }
    }
}

pub struct Session<B: Backend, S: SpellSource> {
    project: Project,
    store: ScopeStore<B>,
    source: S,
    buffer: Option<Buffer>,
}

/// Skip check first: a skipped buffer never reaches the spell source.
fn refresh<B: Backend, S: SpellSource>(store: &ScopeStore<B>, source: &S, buffer: &mut Buffer) {
    buffer.skipped = store.is_skipped(&buffer.path);
    buffer.index = if buffer.skipped {
        ErrorIndex::default()
    } else {
        let tokens = source.tokenize(&buffer.text, &buffer.language);
        ErrorIndex::compute(&tokens, &buffer.path, &buffer.language, store)
    };
    debug!(
        path = %buffer.path,
        skipped = buffer.skipped,
        errors = buffer.index.count(),
        "buffer checked"
    );
}

impl<B: Backend, S: SpellSource> Session<B, S> {
    pub fn new(project: Project, store: ScopeStore<B>, source: S) -> Self {
        Self {
            project,
            store,
            source,
            buffer: None,
        }
    }

    pub fn project(&self) -> &Project {
        &self.project
    }

    pub fn store(&self) -> &ScopeStore<B> {
        &self.store
    }

    pub fn open(&mut self, path: &Path, language: &str, text: impl Into<String>) -> Result<BufferStatus> {
        let mut buffer = Buffer {
            path: self.project.relative_path(path)?,
            language: language.to_string(),
            text: text.into(),
            skipped: false,
            index: ErrorIndex::default(),
        };
        refresh(&self.store, &self.source, &mut buffer);
        let status = buffer.status();
        self.buffer = Some(buffer);
        Ok(status)
    }

    pub fn close(&mut self) {
        self.buffer = None;
    }

    pub fn status(&self) -> Option<BufferStatus> {
        self.buffer.as_ref().map(Buffer::status)
    }

    pub fn path(&self) -> Option<&RelativePath> {
        self.buffer.as_ref().map(|b| &b.path)
    }

    pub fn text(&self) -> Option<&str> {
        self.buffer.as_ref().map(|b| b.text.as_str())
    }

    pub fn errors(&self) -> &[ErrorRecord] {
        match &self.buffer {
            Some(buffer) => buffer.index.errors(),
            None => &[],
        }
    }

    pub fn next(&self, cursor: usize) -> Option<&ErrorRecord> {
        self.buffer.as_ref().and_then(|b| b.index.next(cursor))
    }

    pub fn previous(&self, cursor: usize) -> Option<&ErrorRecord> {
        self.buffer.as_ref().and_then(|b| b.index.previous(cursor))
    }

    pub fn error_at(&self, cursor: usize) -> Option<&ErrorRecord> {
        self.buffer.as_ref().and_then(|b| b.index.error_at(cursor))
    }

    /// Ignore the error under `cursor` at the scope of `kind`, keyed from the
    /// open buffer. Returns the stored entry, or `None` when there is no error
    /// under the cursor or the buffer has no extension for an extension scope.
    pub fn ignore(&mut self, kind: ScopeKind, cursor: usize) -> Result<Option<IgnoreEntry>> {
        let buffer = self.buffer.as_ref().ok_or(Error::NoBuffer)?;
        let Some(error) = buffer.index.error_at(cursor) else {
            warn!(cursor, "no spelling error under cursor");
            return Ok(None);
        };
        let scope = match kind {
            ScopeKind::Global => Scope::Global,
            ScopeKind::Language => Scope::Language(short_lang(&buffer.language).to_string()),
            ScopeKind::Project => Scope::Project,
            ScopeKind::Path => Scope::Path(buffer.path.clone()),
            ScopeKind::Extension => match buffer.path.extension() {
                Some(ext) => Scope::Extension(ext.to_string()),
                None => {
                    warn!(path = %buffer.path, "file has no extension");
                    return Ok(None);
                }
            },
        };
        let entry = IgnoreEntry::new(scope, error.word.as_str());
        self.store.add_ignore(entry.scope.clone(), &entry.word)?;
        self.recompute();
        Ok(Some(entry))
    }

    pub fn skip_file(&mut self) -> Result<()> {
        let path = self.buffer.as_ref().ok_or(Error::NoBuffer)?.path.clone();
        self.skip(SkipRule::SkipPath(path))
    }

    pub fn skip_name(&mut self) -> Result<()> {
        let buffer = self.buffer.as_ref().ok_or(Error::NoBuffer)?;
        let name = buffer.path.file_name().to_string();
        self.skip(SkipRule::SkipFileName(name))
    }

    pub fn skip_pattern(&mut self, glob: &str) -> Result<()> {
        self.skip(SkipRule::SkipPattern(glob.to_string()))
    }

    fn skip(&mut self, rule: SkipRule) -> Result<()> {
        self.store.add_skip(rule)?;
        self.recompute();
        Ok(())
    }

    pub fn undo(&mut self) -> Result<Option<UndoRecord>> {
        let undone = self.store.undo()?;
        self.recompute();
        Ok(undone)
    }

    /// Ranked replacements for the error under `cursor`.
    pub fn suggestions(&self, cursor: usize) -> Vec<String> {
        let Some(buffer) = &self.buffer else {
            return Vec::new();
        };
        buffer
            .index
            .error_at(cursor)
            .map(|e| self.source.suggest(&e.word, &buffer.language))
            .unwrap_or_default()
    }

    /// Replace the error under `cursor` with `replacement`, or with the best
    /// suggestion when none is given. The ignore store is not touched.
    pub fn replace(&mut self, cursor: usize, replacement: Option<&str>) -> Result<Option<Replacement>> {
        let buffer = self.buffer.as_ref().ok_or(Error::NoBuffer)?;
        let Some(error) = buffer.index.error_at(cursor).cloned() else {
            warn!(cursor, "no spelling error under cursor");
            return Ok(None);
        };
        let replacement = match replacement {
            Some(r) => r.to_string(),
            None => match self.source.suggest(&error.word, &buffer.language).into_iter().next() {
                Some(best) => best,
                None => {
                    debug!(word = %error.word, "no suggestion");
                    return Ok(None);
                }
            },
        };

        if let Some(buffer) = self.buffer.as_mut() {
            buffer.text.replace_range(error.start..error.end, &replacement);
        }
        self.recompute();
        Ok(Some(Replacement {
            word: error.word,
            replacement,
            start: error.start,
        }))
    }

    fn recompute(&mut self) {
        if let Some(buffer) = self.buffer.as_mut() {
            refresh(&self.store, &self.source, buffer);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::MemoryBackend;
    use crate::source::Token;
    use std::cell::Cell;

    /// Flags a fixed set of words as invalid and counts tokenize calls.
    struct FakeSource {
        invalid: Vec<&'static str>,
        calls: Cell<usize>,
    }

    impl FakeSource {
        fn new(invalid: &[&'static str]) -> Self {
            Self {
                invalid: invalid.to_vec(),
                calls: Cell::new(0),
            }
        }
    }

    impl SpellSource for FakeSource {
        fn tokenize(&self, text: &str, _language: &str) -> Vec<Token> {
            self.calls.set(self.calls.get() + 1);
            let mut tokens = Vec::new();
            let mut offset = 0;
            for word in text.split_inclusive(|c: char| !c.is_alphanumeric()) {
                let trimmed = word.trim_end_matches(|c: char| !c.is_alphanumeric());
                if !trimmed.is_empty() {
                    tokens.push(Token::new(trimmed, offset, !self.invalid.contains(&trimmed)));
                }
                offset += word.len();
            }
            tokens
        }

        fn suggest(&self, word: &str, _language: &str) -> Vec<String> {
            match word {
                "missstake" => vec!["mistake".to_string(), "misstate".to_string()],
                _ => Vec::new(),
            }
        }
    }

    fn session(invalid: &[&'static str]) -> Session<MemoryBackend, FakeSource> {
        let project = Project::new(Path::new("/project")).unwrap();
        let store = ScopeStore::load(MemoryBackend::new()).unwrap();
        Session::new(project, store, FakeSource::new(invalid))
    }

    const TEXT: &str = "There is a missstake here\nand an othhher one there";

    #[test]
    fn test_open_and_navigate() {
        let mut session = session(&["missstake", "othhher"]);
        let status = session.open(Path::new("notes.txt"), "en", TEXT).unwrap();
        assert_eq!(status, BufferStatus { skipped: false, error_count: 2 });

        let first = session.next(0).unwrap().clone();
        assert_eq!((first.word.as_str(), first.start), ("missstake", 11));
        assert_eq!(session.next(first.start).unwrap().word, "othhher");
        assert_eq!(session.previous(first.start).unwrap().word, "othhher");
    }

    #[test]
    fn test_ignore_for_project_recomputes() {
        let mut session = session(&["missstake", "othhher"]);
        session.open(Path::new("notes.txt"), "en", TEXT).unwrap();

        let entry = session.ignore(ScopeKind::Project, 11).unwrap().unwrap();
        assert_eq!(entry, IgnoreEntry::new(Scope::Project, "missstake"));
        assert_eq!(session.status().unwrap().error_count, 1);

        session.undo().unwrap();
        assert_eq!(session.status().unwrap().error_count, 2);
    }

    #[test]
    fn test_ignore_without_error_under_cursor() {
        let mut session = session(&["missstake"]);
        session.open(Path::new("notes.txt"), "en", TEXT).unwrap();
        assert_eq!(session.ignore(ScopeKind::Global, 0).unwrap(), None);
        assert!(session.store().entries().is_empty());
    }

    #[test]
    fn test_ignore_keys_from_buffer() {
        let mut session = session(&["missstake"]);
        session.open(Path::new("/project/docs/a.md"), "en_GB", TEXT).unwrap();

        let entry = session.ignore(ScopeKind::Language, 11).unwrap().unwrap();
        assert_eq!(entry.scope, Scope::Language("en".to_string()));
        session.undo().unwrap();

        let entry = session.ignore(ScopeKind::Path, 11).unwrap().unwrap();
        assert_eq!(entry.scope, Scope::Path("docs/a.md".into()));
        session.undo().unwrap();

        let entry = session.ignore(ScopeKind::Extension, 11).unwrap().unwrap();
        assert_eq!(entry.scope, Scope::Extension("md".to_string()));
    }

    #[test]
    fn test_skipped_file_is_never_tokenized() {
        let mut session = session(&["missstake"]);
        session.skip_pattern("*.lock").unwrap();

        let status = session.open(Path::new("foo.lock"), "en", TEXT).unwrap();
        assert_eq!(status, BufferStatus { skipped: true, error_count: 0 });
        assert_eq!(session.source.calls.get(), 0);
        assert!(session.next(0).is_none());
    }

    #[test]
    fn test_skip_name_then_undo() {
        let mut session = session(&["missstake"]);
        session.open(Path::new("sub/Cargo.lock"), "en", TEXT).unwrap();
        session.skip_name().unwrap();
        assert!(session.status().unwrap().skipped);

        session.undo().unwrap();
        assert_eq!(session.status().unwrap(), BufferStatus { skipped: false, error_count: 1 });
    }

    #[test]
    fn test_replace_with_best_suggestion_shifts_offsets() {
        let mut session = session(&["missstake", "othhher"]);
        session.open(Path::new("notes.txt"), "en", TEXT).unwrap();
        let before = session.errors()[1].start;

        let done = session.replace(11, None).unwrap().unwrap();
        assert_eq!(done.replacement, "mistake");
        assert!(session.text().unwrap().starts_with("There is a mistake here"));
        assert_eq!(session.errors().len(), 1);
        assert_eq!(session.errors()[0].start, before - 2);
        assert!(session.store().entries().is_empty());
    }

    #[test]
    fn test_replace_without_suggestion_is_a_no_op() {
        let mut session = session(&["othhher"]);
        session.open(Path::new("notes.txt"), "en", TEXT).unwrap();
        let start = session.errors()[0].start;
        assert_eq!(session.replace(start, None).unwrap(), None);
        assert_eq!(session.text().unwrap(), TEXT);
    }

    #[test]
    fn test_calls_without_buffer() {
        let mut session = session(&[]);
        assert!(matches!(session.skip_file(), Err(Error::NoBuffer)));
        assert!(session.errors().is_empty());
        assert!(session.suggestions(0).is_empty());
    }
}

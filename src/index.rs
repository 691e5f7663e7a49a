use crate::backend::Backend;
use crate::project::RelativePath;
use crate::source::Token;
use crate::store::ScopeStore;
use serde::Serialize;

/// One reported misspelling in an open buffer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorRecord {
    pub word: String,
    pub start: usize,
    pub end: usize,
}

/// Reported errors of one buffer, ordered by start offset. Any edit to the
/// buffer invalidates it; build a fresh one with [`ErrorIndex::compute`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ErrorIndex {
    errors: Vec<ErrorRecord>,
}

impl ErrorIndex {
    pub fn compute<B: Backend>(
        tokens: &[Token],
        path: &RelativePath,
        language: &str,
        store: &ScopeStore<B>,
    ) -> Self {
        let mut errors: Vec<ErrorRecord> = tokens
            .iter()
            .filter(|t| !t.valid)
            .filter(|t| !store.is_ignored(&t.word, path, language))
            .map(|t| ErrorRecord {
                word: t.word.clone(),
                start: t.start,
                end: t.end,
            })
            .collect();
        errors.sort_by_key(|e| e.start);
        Self { errors }
    }

    pub fn errors(&self) -> &[ErrorRecord] {
        &self.errors
    }

    pub fn count(&self) -> usize {
        self.errors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// First error starting strictly after `cursor`, wrapping to the first
    /// error of the buffer.
    pub fn next(&self, cursor: usize) -> Option<&ErrorRecord> {
        let idx = self.errors.partition_point(|e| e.start <= cursor);
        self.errors.get(idx).or_else(|| self.errors.first())
    }

    /// Last error starting strictly before `cursor`, wrapping to the last
    /// error of the buffer.
    pub fn previous(&self, cursor: usize) -> Option<&ErrorRecord> {
        let idx = self.errors.partition_point(|e| e.start < cursor);
        match idx {
            0 => self.errors.last(),
            _ => self.errors.get(idx - 1),
        }
    }

    /// The error whose range contains `cursor`, its start offset included.
    pub fn error_at(&self, cursor: usize) -> Option<&ErrorRecord> {
        let idx = self.errors.partition_point(|e| e.start <= cursor);
        idx.checked_sub(1)
            .and_then(|i| self.errors.get(i))
            .filter(|e| cursor < e.end)
    }
}

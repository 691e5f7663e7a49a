pub mod sqlite;
pub mod toml_file;

use crate::error::Result;
use crate::store::entries::{Entries, GlobalEntries, LocalEntries};
use crate::store::undo::UndoRecord;

pub use self::sqlite::SqliteBackend;
pub use self::toml_file::TomlBackend;

/// Persistence contract shared by every storage generation.
///
/// `load` reads everything at once. The `save_*` methods replace one half of
/// the stored state atomically: after an `Ok` the new state is durable, after
/// an `Err` the previous state is still what a fresh `load` returns.
pub trait Backend {
    fn load(&mut self) -> Result<Entries>;

    fn save_global(&mut self, global: &GlobalEntries) -> Result<()>;

    fn save_local(&mut self, local: &LocalEntries) -> Result<()>;

    /// The pending undo record left by an earlier process on this project.
    fn load_undo(&mut self) -> Result<Option<UndoRecord>>;

    /// Replace the pending undo record. `None` clears it.
    fn save_undo(&mut self, undo: Option<&UndoRecord>) -> Result<()>;

    fn describe(&self) -> String;
}

/// Keeps everything in memory. Used by tests and by callers that want a
/// throwaway store.
#[derive(Debug, Default, Clone)]
pub struct MemoryBackend {
    entries: Entries,
    undo: Option<UndoRecord>,
    saves: usize,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entries(entries: Entries) -> Self {
        Self {
            entries,
            ..Self::default()
        }
    }

    pub fn entries(&self) -> &Entries {
        &self.entries
    }

    pub fn undo(&self) -> Option<&UndoRecord> {
        self.undo.as_ref()
    }

    /// Number of successful entry saves so far.
    pub fn saves(&self) -> usize {
        self.saves
    }
}

impl Backend for MemoryBackend {
    fn load(&mut self) -> Result<Entries> {
        Ok(self.entries.clone())
    }

    fn save_global(&mut self, global: &GlobalEntries) -> Result<()> {
        self.entries.global = global.clone();
        self.saves += 1;
        Ok(())
    }

    fn save_local(&mut self, local: &LocalEntries) -> Result<()> {
        self.entries.local = local.clone();
        self.saves += 1;
        Ok(())
    }

    fn load_undo(&mut self) -> Result<Option<UndoRecord>> {
        Ok(self.undo.clone())
    }

    fn save_undo(&mut self, undo: Option<&UndoRecord>) -> Result<()> {
        self.undo = undo.cloned();
        Ok(())
    }

    fn describe(&self) -> String {
        "memory".to_string()
    }
}

impl<B: Backend + ?Sized> Backend for Box<B> {
    fn load(&mut self) -> Result<Entries> {
        (**self).load()
    }

    fn save_global(&mut self, global: &GlobalEntries) -> Result<()> {
        (**self).save_global(global)
    }

    fn save_local(&mut self, local: &LocalEntries) -> Result<()> {
        (**self).save_local(local)
    }

    fn load_undo(&mut self) -> Result<Option<UndoRecord>> {
        (**self).load_undo()
    }

    fn save_undo(&mut self, undo: Option<&UndoRecord>) -> Result<()> {
        (**self).save_undo(undo)
    }

    fn describe(&self) -> String {
        (**self).describe()
    }
}

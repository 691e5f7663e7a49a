pub mod backend;
pub mod cli;
pub mod config;
pub mod error;
pub mod index;
pub mod project;
pub mod scope;
pub mod session;
pub mod source;
pub mod store;

pub use backend::{Backend, MemoryBackend, SqliteBackend, TomlBackend};
pub use config::{BackendKind, Config};
pub use error::{Error, Result};
pub use index::{ErrorIndex, ErrorRecord};
pub use project::{Project, RelativePath};
pub use scope::{IgnoreEntry, Scope, ScopeKind, SkipRule, Word};
pub use session::{BufferStatus, Session};
pub use source::{SpellSource, Token, WordListSource};
pub use store::undo::UndoRecord;
pub use store::ScopeStore;

use crate::backend::Backend;
use crate::error::{Error, Result};
use crate::store::entries::{Entries, GlobalEntries, LocalEntries};
use crate::store::undo::{StoredUndo, UndoRecord};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::debug;

/// Hierarchical generation: one TOML file in the user data directory and one
/// at the project root. The pending undo record lives beside the global file
/// (`global.state.toml`) and remembers which project it was made in.
#[derive(Debug, Clone)]
pub struct TomlBackend {
    global_path: PathBuf,
    local_path: PathBuf,
    state_path: PathBuf,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct UndoState {
    project: PathBuf,
    pending: StoredUndo,
}

impl TomlBackend {
    pub fn new(global_path: PathBuf, local_path: PathBuf) -> Self {
        let state_path = global_path.with_extension("state.toml");
        Self {
            global_path,
            local_path,
            state_path,
        }
    }

    pub fn global_path(&self) -> &Path {
        &self.global_path
    }

    pub fn local_path(&self) -> &Path {
        &self.local_path
    }

    pub fn state_path(&self) -> &Path {
        &self.state_path
    }
}

fn read<T: DeserializeOwned + Default>(path: &Path) -> Result<T> {
    if !path.exists() {
        return Ok(T::default());
    }
    let contents = fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
    toml::from_str(&contents).map_err(|e| Error::config(path, e))
}

/// Serialize `value` next to `path` and rename it into place, so readers see
/// either the old file or the new one.
pub(crate) fn write_atomic<T: Serialize>(value: &T, path: &Path) -> Result<()> {
    let contents = toml::to_string_pretty(value).map_err(|e| Error::config(path, e))?;
    let parent = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    fs::create_dir_all(parent).map_err(|e| Error::io(parent, e))?;

    let mut temp = NamedTempFile::new_in(parent).map_err(|e| Error::io(parent, e))?;
    temp.write_all(contents.as_bytes())
        .map_err(|e| Error::io(temp.path(), e))?;
    temp.as_file()
        .sync_all()
        .map_err(|e| Error::io(temp.path(), e))?;
    temp.persist(path).map_err(|e| Error::io(path, e.error))?;
    Ok(())
}

impl Backend for TomlBackend {
    fn load(&mut self) -> Result<Entries> {
        let global = read(&self.global_path)?;
        let local = read(&self.local_path)?;
        Ok(Entries { global, local })
    }

    fn save_global(&mut self, global: &GlobalEntries) -> Result<()> {
        write_atomic(global, &self.global_path)
    }

    fn save_local(&mut self, local: &LocalEntries) -> Result<()> {
        write_atomic(local, &self.local_path)
    }

    fn load_undo(&mut self) -> Result<Option<UndoRecord>> {
        if !self.state_path.exists() {
            return Ok(None);
        }
        let contents =
            fs::read_to_string(&self.state_path).map_err(|e| Error::io(&self.state_path, e))?;
        let state: UndoState =
            toml::from_str(&contents).map_err(|e| Error::config(&self.state_path, e))?;
        if state.project != self.local_path {
            debug!(project = %state.project.display(), "pending undo belongs to another project");
            return Ok(None);
        }
        UndoRecord::try_from(state.pending)
            .map(Some)
            .map_err(|e| Error::config(&self.state_path, e))
    }

    fn save_undo(&mut self, undo: Option<&UndoRecord>) -> Result<()> {
        match undo {
            Some(record) => {
                let state = UndoState {
                    project: self.local_path.clone(),
                    pending: StoredUndo::from(record),
                };
                write_atomic(&state, &self.state_path)
            }
            None => match fs::remove_file(&self.state_path) {
                Err(e) if e.kind() != ErrorKind::NotFound => Err(Error::io(&self.state_path, e)),
                _ => Ok(()),
            },
        }
    }

    fn describe(&self) -> String {
        format!(
            "toml (global: {}, local: {})",
            self.global_path.display(),
            self.local_path.display()
        )
    }
}

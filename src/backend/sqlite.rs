// Paths are stored as their `/`-separated relative form, never as OS strings,
// so a database written on one platform reads back on another.

use crate::backend::Backend;
use crate::error::{Error, Result};
use crate::store::entries::{Entries, GlobalEntries, LocalEntries};
use crate::store::undo::{StoredUndo, UndoRecord};
use rusqlite::{params, Connection, ErrorCode, OptionalExtension, Transaction};
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};

const GLOBAL_SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS ignored (
    word TEXT NOT NULL PRIMARY KEY
);
CREATE TABLE IF NOT EXISTS ignored_for_lang (
    word TEXT NOT NULL,
    lang TEXT NOT NULL,
    UNIQUE(word, lang)
);
CREATE TABLE IF NOT EXISTS ignored_for_extension (
    word TEXT NOT NULL,
    extension TEXT NOT NULL,
    UNIQUE(word, extension)
);
CREATE TABLE IF NOT EXISTS pending_undo (
    project TEXT NOT NULL,
    kind TEXT NOT NULL,
    key TEXT,
    value TEXT NOT NULL,
    inserted INTEGER NOT NULL
);
";

const LOCAL_SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS ignored_for_project (
    word TEXT NOT NULL PRIMARY KEY
);
CREATE TABLE IF NOT EXISTS ignored_for_path (
    word TEXT NOT NULL,
    path TEXT NOT NULL,
    UNIQUE(word, path)
);
CREATE TABLE IF NOT EXISTS skipped_patterns (
    pattern TEXT NOT NULL PRIMARY KEY
);
CREATE TABLE IF NOT EXISTS skipped_file_names (
    file_name TEXT NOT NULL PRIMARY KEY
);
CREATE TABLE IF NOT EXISTS skipped_paths (
    path TEXT NOT NULL PRIMARY KEY
);
";

struct Db {
    path: PathBuf,
    connection: Option<Connection>,
}

/// A file that is not a database at all is a configuration problem, not
/// a transient one.
fn classify(path: &Path, e: rusqlite::Error) -> Error {
    match e.sqlite_error_code() {
        Some(ErrorCode::NotADatabase) | Some(ErrorCode::DatabaseCorrupt) => Error::config(path, e),
        _ => Error::database(path, e),
    }
}

impl Db {
    /// Files that do not exist yet are only created by the first save.
    fn open(path: &Path) -> Result<Self> {
        let mut db = Self {
            path: path.to_path_buf(),
            connection: None,
        };
        if path.exists() {
            db.connect()?;
        }
        Ok(db)
    }

    fn in_memory() -> Result<Self> {
        let path = PathBuf::from(":memory:");
        let connection = Connection::open_in_memory().map_err(|e| Error::database(&path, e))?;
        Ok(Self {
            path,
            connection: Some(connection),
        })
    }

    fn connect(&mut self) -> Result<&mut Connection> {
        let connection = match self.connection.take() {
            Some(connection) => connection,
            None => {
                if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
                    fs::create_dir_all(parent).map_err(|e| Error::io(parent, e))?;
                }
                Connection::open(&self.path).map_err(|e| Error::database(&self.path, e))?
            }
        };
        Ok(self.connection.insert(connection))
    }

    /// Tables that exist with another shape than ours make the store
    /// unreadable, the same as a malformed TOML file.
    fn read_error(&self, e: rusqlite::Error) -> Error {
        match &e {
            rusqlite::Error::InvalidColumnType(..)
            | rusqlite::Error::FromSqlConversionFailure(..)
            | rusqlite::Error::InvalidColumnIndex(_) => Error::config(&self.path, e),
            _ if e.sqlite_error_code() == Some(ErrorCode::Unknown) => Error::config(&self.path, e),
            _ => classify(&self.path, e),
        }
    }

    fn migrate(&self, schema: &str) -> Result<()> {
        match &self.connection {
            Some(connection) => connection
                .execute_batch(schema)
                .map_err(|e| classify(&self.path, e)),
            None => Ok(()),
        }
    }

    fn words(&self, sql: &str) -> Result<BTreeSet<String>> {
        let Some(connection) = &self.connection else {
            return Ok(BTreeSet::new());
        };
        let run = || -> rusqlite::Result<BTreeSet<String>> {
            let mut stmt = connection.prepare(sql)?;
            let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;
            rows.collect()
        };
        run().map_err(|e| self.read_error(e))
    }

    fn keyed(&self, sql: &str) -> Result<BTreeMap<String, BTreeSet<String>>> {
        let mut map: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
        let Some(connection) = &self.connection else {
            return Ok(map);
        };
        let run = || -> rusqlite::Result<Vec<(String, String)>> {
            let mut stmt = connection.prepare(sql)?;
            let rows = stmt.query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?;
            rows.collect()
        };
        for (key, word) in run().map_err(|e| self.read_error(e))? {
            map.entry(key).or_default().insert(word);
        }
        Ok(map)
    }

    fn pending(&self, project: &str) -> Result<Option<StoredUndo>> {
        let Some(connection) = &self.connection else {
            return Ok(None);
        };
        let row = connection
            .query_row(
                "SELECT project, kind, key, value, inserted FROM pending_undo LIMIT 1",
                [],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        StoredUndo {
                            kind: row.get(1)?,
                            key: row.get(2)?,
                            value: row.get(3)?,
                            inserted: row.get(4)?,
                        },
                    ))
                },
            )
            .optional()
            .map_err(|e| self.read_error(e))?;
        Ok(row.and_then(|(owner, stored)| (owner == project).then_some(stored)))
    }

    /// Replace the table contents inside one transaction. Dropping the
    /// transaction on error rolls everything back.
    fn replace<F>(&mut self, schema: &str, fill: F) -> Result<()>
    where
        F: FnOnce(&Transaction<'_>) -> rusqlite::Result<()>,
    {
        let path = self.path.clone();
        let connection = self.connect()?;
        connection
            .execute_batch(schema)
            .map_err(|e| classify(&path, e))?;
        let tx = connection
            .transaction()
            .map_err(|e| Error::database(&path, e))?;
        fill(&tx).map_err(|e| Error::database(&path, e))?;
        tx.commit().map_err(|e| Error::database(&path, e))
    }
}

fn insert_words(tx: &Transaction<'_>, sql: &str, words: &BTreeSet<String>) -> rusqlite::Result<()> {
    let mut stmt = tx.prepare(sql)?;
    for word in words {
        stmt.execute(params![word])?;
    }
    Ok(())
}

fn insert_keyed(
    tx: &Transaction<'_>,
    sql: &str,
    map: &BTreeMap<String, BTreeSet<String>>,
) -> rusqlite::Result<()> {
    let mut stmt = tx.prepare(sql)?;
    for (key, words) in map {
        for word in words {
            stmt.execute(params![word, key])?;
        }
    }
    Ok(())
}

/// Relational generation: one SQLite database in the user data directory and
/// one at the project root. The pending undo record is a single row of the
/// global database, tagged with the project database it was made for.
pub struct SqliteBackend {
    global: Db,
    local: Db,
}

impl SqliteBackend {
    pub fn open(global_path: &Path, local_path: &Path) -> Result<Self> {
        Ok(Self {
            global: Db::open(global_path)?,
            local: Db::open(local_path)?,
        })
    }

    pub fn in_memory() -> Result<Self> {
        Ok(Self {
            global: Db::in_memory()?,
            local: Db::in_memory()?,
        })
    }
}

impl Backend for SqliteBackend {
    fn load(&mut self) -> Result<Entries> {
        self.global.migrate(GLOBAL_SCHEMA)?;
        self.local.migrate(LOCAL_SCHEMA)?;

        let global = GlobalEntries {
            global: self.global.words("SELECT word FROM ignored")?,
            lang: self.global.keyed("SELECT lang, word FROM ignored_for_lang")?,
            extensions: self
                .global
                .keyed("SELECT extension, word FROM ignored_for_extension")?,
        };
        let local = LocalEntries {
            patterns: self.local.words("SELECT pattern FROM skipped_patterns")?,
            project: self.local.words("SELECT word FROM ignored_for_project")?,
            paths: self.local.keyed("SELECT path, word FROM ignored_for_path")?,
            skip_names: self.local.words("SELECT file_name FROM skipped_file_names")?,
            skip_paths: self.local.words("SELECT path FROM skipped_paths")?,
        };
        Ok(Entries { global, local })
    }

    fn save_global(&mut self, global: &GlobalEntries) -> Result<()> {
        self.global.replace(GLOBAL_SCHEMA, |tx| {
            tx.execute_batch(
                "DELETE FROM ignored; DELETE FROM ignored_for_lang; DELETE FROM ignored_for_extension;",
            )?;
            insert_words(tx, "INSERT INTO ignored (word) VALUES (?1)", &global.global)?;
            insert_keyed(
                tx,
                "INSERT INTO ignored_for_lang (word, lang) VALUES (?1, ?2)",
                &global.lang,
            )?;
            insert_keyed(
                tx,
                "INSERT INTO ignored_for_extension (word, extension) VALUES (?1, ?2)",
                &global.extensions,
            )
        })
    }

    fn save_local(&mut self, local: &LocalEntries) -> Result<()> {
        self.local.replace(LOCAL_SCHEMA, |tx| {
            tx.execute_batch(
                "DELETE FROM ignored_for_project; DELETE FROM ignored_for_path;
                 DELETE FROM skipped_patterns; DELETE FROM skipped_file_names;
                 DELETE FROM skipped_paths;",
            )?;
            insert_words(
                tx,
                "INSERT INTO ignored_for_project (word) VALUES (?1)",
                &local.project,
            )?;
            insert_keyed(
                tx,
                "INSERT INTO ignored_for_path (word, path) VALUES (?1, ?2)",
                &local.paths,
            )?;
            insert_words(
                tx,
                "INSERT INTO skipped_patterns (pattern) VALUES (?1)",
                &local.patterns,
            )?;
            insert_words(
                tx,
                "INSERT INTO skipped_file_names (file_name) VALUES (?1)",
                &local.skip_names,
            )?;
            insert_words(
                tx,
                "INSERT INTO skipped_paths (path) VALUES (?1)",
                &local.skip_paths,
            )
        })
    }

    fn load_undo(&mut self) -> Result<Option<UndoRecord>> {
        self.global.migrate(GLOBAL_SCHEMA)?;
        let project = self.local.path.to_string_lossy().into_owned();
        match self.global.pending(&project)? {
            Some(stored) => UndoRecord::try_from(stored)
                .map(Some)
                .map_err(|e| Error::config(&self.global.path, e)),
            None => Ok(None),
        }
    }

    fn save_undo(&mut self, undo: Option<&UndoRecord>) -> Result<()> {
        if undo.is_none() && self.global.connection.is_none() {
            return Ok(());
        }
        let project = self.local.path.to_string_lossy().into_owned();
        let stored = undo.map(StoredUndo::from);
        self.global.replace(GLOBAL_SCHEMA, |tx| {
            tx.execute("DELETE FROM pending_undo", [])?;
            if let Some(stored) = &stored {
                tx.execute(
                    "INSERT INTO pending_undo (project, kind, key, value, inserted)
                     VALUES (?1, ?2, ?3, ?4, ?5)",
                    params![project, stored.kind, stored.key, stored.value, stored.inserted],
                )?;
            }
            Ok(())
        })
    }

    fn describe(&self) -> String {
        format!(
            "sqlite (global: {}, local: {})",
            self.global.path.display(),
            self.local.path.display()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scope::{IgnoreEntry, Scope};
    use tempfile::tempdir;

    fn sample() -> Entries {
        let mut entries = Entries::default();
        entries.global.global.insert("foo".to_string());
        entries
            .global
            .lang
            .entry("fr".to_string())
            .or_default()
            .insert("bonjourr".to_string());
        entries.local.project.insert("skyspell".to_string());
        entries
            .local
            .paths
            .entry("docs/a.md".to_string())
            .or_default()
            .insert("qux".to_string());
        entries.local.skip_names.insert("Cargo.lock".to_string());
        entries.local.skip_paths.insert("notes.txt".to_string());
        entries.local.patterns.insert("*.min.js".to_string());
        entries
    }

    #[test]
    fn test_in_memory_round_trip() {
        let mut backend = SqliteBackend::in_memory().unwrap();
        assert!(backend.load().unwrap().is_empty());

        let entries = sample();
        backend.save_global(&entries.global).unwrap();
        backend.save_local(&entries.local).unwrap();
        assert_eq!(backend.load().unwrap(), entries);
    }

    #[test]
    fn test_replace_all_drops_removed_rows() {
        let mut backend = SqliteBackend::in_memory().unwrap();
        backend.load().unwrap();
        let mut entries = sample();
        backend.save_local(&entries.local).unwrap();

        entries.local.skip_names.clear();
        backend.save_local(&entries.local).unwrap();
        assert!(backend.load().unwrap().local.skip_names.is_empty());
    }

    #[test]
    fn test_reopen_from_disk() {
        let dir = tempdir().unwrap();
        let global = dir.path().join("data").join("global.db");
        let local = dir.path().join("spellscope-ignore.db");
        let entries = sample();
        {
            let mut backend = SqliteBackend::open(&global, &local).unwrap();
            backend.load().unwrap();
            backend.save_global(&entries.global).unwrap();
            backend.save_local(&entries.local).unwrap();
        }
        let mut reopened = SqliteBackend::open(&global, &local).unwrap();
        assert_eq!(reopened.load().unwrap(), entries);
    }

    #[test]
    fn test_loading_does_not_create_files() {
        let dir = tempdir().unwrap();
        let global = dir.path().join("data").join("global.db");
        let local = dir.path().join("spellscope-ignore.db");
        let mut backend = SqliteBackend::open(&global, &local).unwrap();
        assert!(backend.load().unwrap().is_empty());
        assert_eq!(backend.load_undo().unwrap(), None);
        backend.save_undo(None).unwrap();
        assert!(!global.exists());
        assert!(!local.exists());

        backend.save_local(&sample().local).unwrap();
        assert!(local.exists());
        assert!(!global.exists());
    }

    #[test]
    fn test_pending_undo_is_per_project() {
        let dir = tempdir().unwrap();
        let global = dir.path().join("global.db");
        let local = dir.path().join("a").join("spellscope-ignore.db");
        let record = UndoRecord::Ignore {
            entry: IgnoreEntry::new(Scope::Global, "foo"),
            inserted: true,
        };
        {
            let mut backend = SqliteBackend::open(&global, &local).unwrap();
            backend.save_undo(Some(&record)).unwrap();
        }

        let mut same = SqliteBackend::open(&global, &local).unwrap();
        assert_eq!(same.load_undo().unwrap(), Some(record));

        let other_local = dir.path().join("b").join("spellscope-ignore.db");
        let mut other = SqliteBackend::open(&global, &other_local).unwrap();
        assert_eq!(other.load_undo().unwrap(), None);

        same.save_undo(None).unwrap();
        assert_eq!(same.load_undo().unwrap(), None);
    }

    #[test]
    fn test_tables_of_another_shape_are_a_config_error() {
        let dir = tempdir().unwrap();
        let global = dir.path().join("global.db");
        let local = dir.path().join("spellscope-ignore.db");
        Connection::open(&global)
            .unwrap()
            .execute_batch("CREATE TABLE ignored (term TEXT);")
            .unwrap();

        let mut backend = SqliteBackend::open(&global, &local).unwrap();
        match backend.load() {
            Err(Error::Config { path, .. }) => assert_eq!(path, global),
            other => panic!("expected config error, got {:?}", other),
        }
    }

    #[test]
    fn test_rows_of_the_wrong_type_are_a_config_error() {
        let dir = tempdir().unwrap();
        let global = dir.path().join("global.db");
        let local = dir.path().join("spellscope-ignore.db");
        Connection::open(&local)
            .unwrap()
            .execute_batch(
                "CREATE TABLE ignored_for_project (word BLOB NOT NULL PRIMARY KEY);
                 INSERT INTO ignored_for_project (word) VALUES (X'FFFE');",
            )
            .unwrap();

        let mut backend = SqliteBackend::open(&global, &local).unwrap();
        assert!(matches!(backend.load(), Err(Error::Config { .. })));
    }

    #[test]
    fn test_garbage_file_is_a_config_error() {
        let dir = tempdir().unwrap();
        let global = dir.path().join("global.db");
        let local = dir.path().join("spellscope-ignore.db");
        fs::write(&local, "not a database\n".repeat(1024)).unwrap();

        let mut backend = SqliteBackend::open(&global, &local).unwrap();
        assert!(matches!(backend.load(), Err(Error::Config { .. })));
    }
}

use spellscope::{
    Backend, Project, RelativePath, Scope, ScopeKind, ScopeStore, Session, SkipRule, SqliteBackend,
    TomlBackend, WordListSource,
};
use std::fs;
use std::path::Path;
use tempfile::tempdir;

const TEXT: &str = "There is a missstake here\nand an othhher one there";

fn source() -> WordListSource {
    WordListSource::from_words(["there", "is", "mistake", "here", "and", "an", "other", "one"])
        .unwrap()
}

fn toml_backend(dir: &Path) -> TomlBackend {
    TomlBackend::new(dir.join("global.toml"), dir.join("spellscope-ignore.toml"))
}

fn sqlite_backend(dir: &Path) -> SqliteBackend {
    SqliteBackend::open(&dir.join("global.db"), &dir.join("spellscope-ignore.db")).unwrap()
}

fn global_survives_reload<B: Backend>(open: impl Fn() -> B) {
    let mut store = ScopeStore::load(open()).unwrap();
    store.add_ignore(Scope::Global, "foo").unwrap();
    drop(store);

    let store = ScopeStore::load(open()).unwrap();
    for path in ["a.rs", "docs/b.md", "Makefile"] {
        assert!(store.is_ignored("foo", &RelativePath::from(path), "de_DE"));
    }
}

#[test]
fn test_global_ignore_survives_reload_toml() {
    let dir = tempdir().unwrap();
    global_survives_reload(|| toml_backend(dir.path()));
}

#[test]
fn test_global_ignore_survives_reload_sqlite() {
    let dir = tempdir().unwrap();
    global_survives_reload(|| sqlite_backend(dir.path()));
}

#[test]
fn test_extension_ignore_does_not_leak() {
    let dir = tempdir().unwrap();
    let mut store = ScopeStore::load(toml_backend(dir.path())).unwrap();
    store
        .add_ignore(Scope::Extension("rs".to_string()), "fn")
        .unwrap();

    assert!(store.is_ignored("fn", &"src/main.rs".into(), "en"));
    assert!(!store.is_ignored("fn", &"notes.txt".into(), "en"));
}

#[test]
fn test_pattern_from_local_file_skips_buffer() {
    let dir = tempdir().unwrap();
    fs::write(
        dir.path().join("spellscope-ignore.toml"),
        "patterns = [\"*.lock\"]\n",
    )
    .unwrap();
    let store = ScopeStore::load(toml_backend(dir.path())).unwrap();
    let project = Project::new(dir.path()).unwrap();

    let mut session = Session::new(project, store, source());
    let status = session
        .open(Path::new("foo.lock"), "en_US", "zzzz qqqq")
        .unwrap();
    assert!(status.skipped);
    assert_eq!(status.error_count, 0);
    assert!(session.errors().is_empty());
}

#[test]
fn test_project_ignore_drops_one_error() {
    let dir = tempdir().unwrap();
    let store = ScopeStore::load(toml_backend(dir.path())).unwrap();
    let project = Project::new(dir.path()).unwrap();
    let mut session = Session::new(project, store, source());

    let status = session.open(Path::new("notes.txt"), "en_US", TEXT).unwrap();
    assert_eq!(status.error_count, 2);

    let cursor = TEXT.find("missstake").unwrap();
    let entry = session.ignore(ScopeKind::Project, cursor).unwrap().unwrap();
    assert_eq!(entry.scope, Scope::Project);

    assert_eq!(session.status().unwrap().error_count, 1);
    let remaining = &session.errors()[0];
    assert_eq!(remaining.word, "othhher");
    assert_eq!(remaining.start, TEXT.find("othhher").unwrap());

    let reloaded = ScopeStore::load(toml_backend(dir.path())).unwrap();
    assert!(reloaded.is_ignored("missstake", &"other.md".into(), "fr"));
}

#[test]
fn test_replace_then_navigate_uses_fresh_offsets() {
    let dir = tempdir().unwrap();
    let store = ScopeStore::load(sqlite_backend(dir.path())).unwrap();
    let project = Project::new(dir.path()).unwrap();
    let mut session = Session::new(project, store, source());
    session.open(Path::new("notes.txt"), "en_US", TEXT).unwrap();

    let replaced = session.replace(11, None).unwrap().unwrap();
    assert_eq!(replaced.replacement, "mistake");
    assert_eq!(session.errors().len(), 1);

    let next = session.next(0).unwrap();
    assert_eq!(next.word, "othhher");
    assert_eq!(next.start, TEXT.find("othhher").unwrap() - 2);
    assert!(session.store().entries().is_empty());
}

#[test]
fn test_skip_then_undo_restores_errors() {
    let dir = tempdir().unwrap();
    let store = ScopeStore::load(toml_backend(dir.path())).unwrap();
    let project = Project::new(dir.path()).unwrap();
    let mut session = Session::new(project, store, source());
    session.open(Path::new("docs/notes.txt"), "en_US", TEXT).unwrap();

    session.skip_file().unwrap();
    assert!(session.status().unwrap().skipped);
    assert_eq!(
        session.store().skip_rules(),
        vec![SkipRule::SkipPath("docs/notes.txt".into())]
    );

    session.undo().unwrap();
    let status = session.status().unwrap();
    assert!(!status.skipped);
    assert_eq!(status.error_count, 2);

    let reloaded = ScopeStore::load(toml_backend(dir.path())).unwrap();
    assert!(reloaded.skip_rules().is_empty());
}

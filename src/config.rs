use crate::backend::{Backend, SqliteBackend, TomlBackend};
use crate::error::{Error, Result};
use crate::project::Project;
use crate::source::WordListSource;
use crate::store::ScopeStore;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Overrides where the user-wide store lives.
pub const GLOBAL_PATH_ENV: &str = "SPELLSCOPE_GLOBAL_PATH";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    #[default]
    Toml,
    Sqlite,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Config {
    pub language: String,
    pub backend: BackendKind,
    pub global_path: Option<PathBuf>,
    pub max_suggestions: usize,
    pub dictionary: Option<PathBuf>,
}

/// What a config file may set. Absent keys leave the lower layer alone.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    language: Option<String>,
    backend: Option<BackendKind>,
    global_path: Option<PathBuf>,
    max_suggestions: Option<usize>,
    dictionary: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            language: "en_US".to_string(),
            backend: BackendKind::Toml,
            global_path: None,
            max_suggestions: 5,
            dictionary: None,
        }
    }
}

impl Config {
    /// Load configuration with priority: local config > global config > defaults.
    /// Callers apply CLI overrides on the returned value.
    pub fn load(project: &Project) -> Result<Self> {
        let mut config = Self::default();

        if let Some(global_path) = Self::global_config_path() {
            if global_path.exists() {
                config = config.merge(Self::from_file(&global_path)?);
            }
        }

        let local_path = project.config_path();
        if local_path.exists() {
            config = config.merge(Self::from_file(&local_path)?);
        }

        debug!(?config, "configuration loaded");
        Ok(config)
    }

    fn from_file(path: &Path) -> Result<ConfigFile> {
        let contents = fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
        toml::from_str(&contents).map_err(|e| Error::config(path, e))
    }

    fn merge(mut self, other: ConfigFile) -> Self {
        if let Some(language) = other.language {
            self.language = language;
        }
        if let Some(backend) = other.backend {
            self.backend = backend;
        }
        if other.global_path.is_some() {
            self.global_path = other.global_path;
        }
        if let Some(max) = other.max_suggestions {
            self.max_suggestions = max;
        }
        if other.dictionary.is_some() {
            self.dictionary = other.dictionary;
        }
        self
    }

    pub fn global_config_path() -> Option<PathBuf> {
        ProjectDirs::from("", "", "spellscope").map(|dirs| dirs.config_dir().join("config.toml"))
    }

    pub fn data_dir() -> Option<PathBuf> {
        ProjectDirs::from("", "", "spellscope").map(|dirs| dirs.data_dir().to_path_buf())
    }

    /// Environment first, then config, then the user data directory.
    pub fn global_store_path(&self) -> Result<PathBuf> {
        if let Ok(value) = std::env::var(GLOBAL_PATH_ENV) {
            return Ok(PathBuf::from(value));
        }
        if let Some(path) = &self.global_path {
            return Ok(path.clone());
        }
        let file_name = match self.backend {
            BackendKind::Toml => "global.toml",
            BackendKind::Sqlite => "global.db",
        };
        Self::data_dir()
            .map(|dir| dir.join(file_name))
            .ok_or(Error::NoDataDir)
    }

    pub fn open_backend(&self, project: &Project) -> Result<Box<dyn Backend>> {
        let global = self.global_store_path()?;
        let backend: Box<dyn Backend> = match self.backend {
            BackendKind::Toml => Box::new(TomlBackend::new(global, project.local_toml_path())),
            BackendKind::Sqlite => Box::new(SqliteBackend::open(&global, &project.local_db_path())?),
        };
        Ok(backend)
    }

    pub fn open_store(&self, project: &Project) -> Result<ScopeStore<Box<dyn Backend>>> {
        ScopeStore::load(self.open_backend(project)?)
    }

    /// The word list SpellSource, if a dictionary is configured.
    pub fn spell_source(&self) -> Result<Option<WordListSource>> {
        self.dictionary
            .as_deref()
            .map(|path| {
                WordListSource::load(path)
                    .map(|source| source.with_max_suggestions(self.max_suggestions))
            })
            .transpose()
    }
}

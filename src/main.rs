use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use spellscope::cli::output::{self, ErrorReport, OutputFormat};
use spellscope::{
    Backend, BackendKind, Config, Project, RelativePath, Scope, ScopeKind, ScopeStore, Session,
    SkipRule, UndoRecord,
};
use std::fs;
use std::path::{Path, PathBuf};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

#[derive(Parser, Debug)]
#[command(name = "spellscope")]
#[command(version, about = "Scope-resolved ignore lists for spell checking", long_about = None)]
struct Cli {
    /// Project root holding the local ignore store
    #[arg(short, long, global = true, default_value = ".")]
    project: PathBuf,

    /// Language of the checked text (e.g., en_US, en_GB)
    #[arg(short, long, global = true)]
    language: Option<String>,

    /// Persistence generation for the ignore store
    #[arg(long, global = true, value_parser = parse_backend)]
    backend: Option<BackendKind>,

    /// Word list used to spell check (one word per line)
    #[arg(short, long, global = true)]
    dictionary: Option<PathBuf>,

    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,

    /// Output format (text, json)
    #[arg(short = 'o', long, global = true, default_value = "text")]
    format: OutputFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Check a file and list the errors that are not ignored
    Check {
        file: PathBuf,

        /// Exit with code 0 even if errors are found
        #[arg(long)]
        no_fail: bool,
    },
    /// List ignored words, or every entry and skip rule when no kind is given
    List {
        kind: Option<ScopeKind>,
        /// Language, extension or path to narrow keyed scopes
        key: Option<String>,
    },
    /// Ignore a word at the given scope
    Ignore {
        kind: ScopeKind,
        word: String,
        /// Language, extension or path for keyed scopes
        #[arg(short, long)]
        key: Option<String>,
    },
    /// Stop checking some files
    Skip {
        #[command(subcommand)]
        rule: SkipCommand,
    },
    /// Revert the last ignore or skip made in this project
    Undo,
}

#[derive(Subcommand, Debug)]
enum SkipCommand {
    /// Skip one file
    Path { path: PathBuf },
    /// Skip every file with this name
    Name { name: String },
    /// Skip files matching a gitignore-style glob
    Pattern { glob: String },
}

fn parse_backend(s: &str) -> std::result::Result<BackendKind, String> {
    match s.to_lowercase().as_str() {
        "toml" => Ok(BackendKind::Toml),
        "sqlite" => Ok(BackendKind::Sqlite),
        _ => Err(format!("Unknown backend: {}", s)),
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_filter(filter);
    tracing_subscriber::registry().with(layer).init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing();

    if cli.no_color {
        colored::control::set_override(false);
    }

    let project = Project::new(&cli.project).context("Failed to resolve project root")?;
    let mut config = Config::load(&project).context("Failed to load configuration")?;
    if let Some(language) = &cli.language {
        config.language = language.clone();
    }
    if let Some(backend) = cli.backend {
        config.backend = backend;
    }
    if let Some(dictionary) = &cli.dictionary {
        config.dictionary = Some(dictionary.clone());
    }

    let mut store = config
        .open_store(&project)
        .context("Failed to open ignore store")?;

    match cli.command {
        Commands::Check { file, no_fail } => {
            let errors = check(&config, project, store, &file, !cli.no_color, cli.format)?;
            if errors > 0 && !no_fail {
                std::process::exit(1);
            }
        }
        Commands::List { kind, key } => {
            let kinds = match kind {
                Some(kind) => vec![kind],
                None => vec![
                    ScopeKind::Global,
                    ScopeKind::Language,
                    ScopeKind::Extension,
                    ScopeKind::Project,
                    ScopeKind::Path,
                ],
            };
            let entries: Vec<_> = kinds
                .into_iter()
                .flat_map(|k| store.list(k, key.as_deref()))
                .collect();
            print!("{}", output::render_entries(&entries, cli.format));
            if kind.is_none() && cli.format == OutputFormat::Text {
                print!("{}", output::render_skip_rules(&store.skip_rules()));
            }
        }
        Commands::Ignore { kind, word, key } => {
            let key = match (kind, key) {
                (ScopeKind::Language, None) => Some(config.language.clone()),
                (ScopeKind::Path, Some(path)) => {
                    Some(relative_to(&project, Path::new(&path))?.as_str().to_string())
                }
                (_, key) => key,
            };
            let Some(scope) = Scope::from_kind(kind, key.as_deref()) else {
                bail!("Scope '{}' needs --key", kind);
            };
            store
                .add_ignore(scope.clone(), &word)
                .with_context(|| format!("Failed to ignore '{}'", word))?;
            println!("Ignored '{}' for {}", word, scope);
        }
        Commands::Skip { rule } => {
            let rule = match rule {
                SkipCommand::Path { path } => SkipRule::SkipPath(relative_to(&project, &path)?),
                SkipCommand::Name { name } => SkipRule::SkipFileName(name),
                SkipCommand::Pattern { glob } => SkipRule::SkipPattern(glob),
            };
            store
                .add_skip(rule.clone())
                .with_context(|| format!("Failed to add skip rule {}", rule))?;
            println!("Added {}", rule);
        }
        Commands::Undo => match store.undo().context("Failed to undo")? {
            Some(UndoRecord::Ignore { entry, .. }) => {
                println!("Undone: ignore '{}' for {}", entry.word, entry.scope)
            }
            Some(UndoRecord::Skip { rule, .. }) => println!("Undone: skip {}", rule),
            None => println!("Nothing to undo"),
        },
    }

    Ok(())
}

/// Resolve a command-line path against the working directory, then against
/// the project root.
fn relative_to(project: &Project, path: &Path) -> Result<RelativePath> {
    let absolute = std::path::absolute(path)
        .with_context(|| format!("Failed to resolve {}", path.display()))?;
    Ok(project.relative_path(&absolute)?)
}

fn check<B: Backend>(
    config: &Config,
    project: Project,
    store: ScopeStore<B>,
    file: &Path,
    colored: bool,
    format: OutputFormat,
) -> Result<usize> {
    let path = relative_to(&project, file)?;
    if store.is_skipped(&path) {
        print!(
            "{}",
            output::render_errors(path.as_str(), true, &[], colored, format)
        );
        if format == OutputFormat::Json {
            println!();
        }
        return Ok(0);
    }

    let Some(source) = config.spell_source().context("Failed to load dictionary")? else {
        bail!("No dictionary configured. Use --dictionary or set `dictionary` in .spellscope.toml");
    };
    let text = fs::read_to_string(file)
        .with_context(|| format!("Failed to read file: {}", file.display()))?;

    let mut session = Session::new(project, store, source);
    let status = session.open(path.as_ref(), &config.language, text)?;

    let text = session.text().unwrap_or_default();
    let reports: Vec<ErrorReport> = session
        .errors()
        .iter()
        .map(|e| ErrorReport::new(text, e, session.suggestions(e.start)))
        .collect();

    print!(
        "{}",
        output::render_errors(path.as_str(), status.skipped, &reports, colored, format)
    );
    if format == OutputFormat::Json {
        println!();
    } else if !status.skipped {
        output::print_check_summary(status.error_count, colored);
    }

    Ok(status.error_count)
}

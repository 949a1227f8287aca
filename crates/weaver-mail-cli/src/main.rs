use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use miette::{Diagnostic, IntoDiagnostic, NamedSource, Result, SourceOffset, SourceSpan};
use weaver_mail_core::{
    Command, EditSession, Outcome, PersistedTree, Tree, audit, serialize, tree_from_json_str,
};
use weaver_mail_renderer::{CompileOptions, compile_with};

mod config;

use config::Config;

#[derive(Parser)]
#[command(version, about = "Weaver Mail - build email layouts from component trees", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Path to a KDL config file
    #[arg(long, global = true, env = "WEAVER_MAIL_CONFIG")]
    config: Option<PathBuf>,

    /// Pretty-print JSON output
    #[arg(long, global = true)]
    pretty: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print an empty tree
    New {
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Apply a JSON array of commands to a tree and print the result
    Apply {
        /// Persisted tree JSON
        tree: PathBuf,

        /// JSON array of commands, e.g. [{"op": "addComponent", "type": "text", "parentId": "root"}]
        commands: PathBuf,

        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Compile a tree to an HTML email document
    Compile {
        /// Persisted tree JSON
        tree: PathBuf,

        /// Document title, overriding the config file
        #[arg(long)]
        title: Option<String>,

        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Report structural problems in a persisted tree without repairing it
    Validate {
        /// Persisted tree JSON
        tree: PathBuf,
    },
}

#[derive(thiserror::Error, Debug, Diagnostic)]
enum CliError {
    #[error("could not read {}", path.display())]
    #[diagnostic(code(weaver_mail::cli::read))]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("could not write {}", path.display())]
    #[diagnostic(code(weaver_mail::cli::write))]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid command list: {source}")]
    #[diagnostic(
        code(weaver_mail::cli::commands),
        help("expected a JSON array of objects tagged with \"op\"")
    )]
    Commands {
        #[source]
        source: serde_json::Error,
        #[source_code]
        src: NamedSource<String>,
        #[label("here")]
        location: Option<SourceSpan>,
    },

    #[error("tree has {0} structural problem(s)")]
    #[diagnostic(code(weaver_mail::cli::invalid_tree))]
    Invalid(usize),
}

fn main() -> Result<()> {
    init_miette()?;
    init_tracing();

    let cli = Cli::parse();
    let config = Config::load(cli.config.as_deref())?;
    let pretty = cli.pretty || config.pretty;

    match cli.command {
        Commands::New { output } => {
            let json = tree_json(&Tree::new(), pretty)?;
            emit(output.as_deref(), &json)?;
        }
        Commands::Apply {
            tree,
            commands,
            output,
        } => {
            let tree = load_tree(&tree)?;
            let commands = parse_commands(&read(&commands)?, &commands.display().to_string())?;
            let tree = apply_commands(tree, &commands);
            emit(output.as_deref(), &tree_json(&tree, pretty)?)?;
        }
        Commands::Compile {
            tree,
            title,
            output,
        } => {
            let tree = load_tree(&tree)?;
            let options = CompileOptions {
                title: title.or(config.title).map(Into::into),
            };
            emit(output.as_deref(), &compile_with(&tree, &options))?;
        }
        Commands::Validate { tree } => {
            let name = tree.display().to_string();
            let persisted = PersistedTree::from_json_str(&read(&tree)?)?;
            let problems = audit(&persisted);
            if !problems.is_empty() {
                for problem in &problems {
                    eprintln!("✗ {problem}");
                }
                return Err(CliError::Invalid(problems.len()).into());
            }
            println!("✓ {name} is valid ({} nodes)", persisted.nodes.len());
        }
    }

    Ok(())
}

fn read(path: &Path) -> Result<String, CliError> {
    std::fs::read_to_string(path).map_err(|source| CliError::Read {
        path: path.to_path_buf(),
        source,
    })
}

fn load_tree(path: &Path) -> Result<Tree> {
    let src = read(path)?;
    let tree = tree_from_json_str(&src, &path.display().to_string())?;
    tracing::debug!(path = %path.display(), nodes = tree.len(), "tree loaded");
    Ok(tree)
}

fn parse_commands(src: &str, name: &str) -> Result<Vec<Command>, CliError> {
    serde_json::from_str(src).map_err(|source| {
        let location = (source.line() > 0).then(|| {
            SourceSpan::new(
                SourceOffset::from_location(src, source.line(), source.column()),
                0,
            )
        });
        CliError::Commands {
            source,
            src: NamedSource::new(name, src.to_owned()),
            location,
        }
    })
}

/// Run every command in order through an edit session. Skipped commands are
/// reported and do not stop the run.
fn apply_commands(tree: Tree, commands: &[Command]) -> Tree {
    let mut session = EditSession::new(tree);
    for (index, command) in commands.iter().enumerate() {
        match session.apply(command) {
            Outcome::Applied { created: Some(id) } => {
                tracing::info!(index, op = command.name(), %id, "created");
            }
            Outcome::Applied { created: None } => {
                tracing::info!(index, op = command.name(), "applied");
            }
            Outcome::Skipped(reason) => {
                tracing::warn!(index, op = command.name(), %reason, "skipped");
            }
        }
    }
    session.tree().clone()
}

fn tree_json(tree: &Tree, pretty: bool) -> Result<String> {
    let persisted = serialize(tree);
    let json = if pretty {
        persisted.to_json_string_pretty()?
    } else {
        persisted.to_json_string()?
    };
    Ok(json)
}

fn emit(output: Option<&Path>, contents: &str) -> Result<()> {
    match output {
        Some(path) => {
            if let Some(parent) = path.parent() {
                if !parent.as_os_str().is_empty() && !parent.exists() {
                    std::fs::create_dir_all(parent).into_diagnostic()?;
                }
            }
            std::fs::write(path, contents).map_err(|source| CliError::Write {
                path: path.to_path_buf(),
                source,
            })?;
            tracing::info!(path = %path.display(), bytes = contents.len(), "written");
        }
        None => println!("{contents}"),
    }
    Ok(())
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn init_miette() -> Result<()> {
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .with_cause_chain()
                .color(true)
                .context_lines(5)
                .tab_width(2)
                .break_words(true)
                .build(),
        )
    }))
    .into_diagnostic()?;
    miette::set_panic_hook();
    Ok(())
}

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use coderag::analysis::dead_code::find_dead_code;
use coderag::analysis::hierarchy::TypeHierarchy;
use coderag::analysis::references::{find_callers, lookup_symbol, preview_rename, symbol_definitions};
use coderag::config::Config;
use coderag::indexer::symbols::SymbolKind;
use coderag::knowledge::KnowledgeStore;
use coderag::workspace::Workspace;
use serde::Serialize;
use serde_json::json;
use std::path::PathBuf;
use tracing::info;

#[derive(Parser)]
#[command(name = "coderag")]
#[command(about = "Local incremental code intelligence: semantic search, knowledge base and structural views", long_about = None)]
#[command(version)]
struct Cli {
    /// Project root
    #[arg(long, env = "PROJECT_ROOT", default_value = ".")]
    root: PathBuf,

    /// Data directory (default: <root>/.coderag)
    #[arg(long, env = "CODERAG_DATA_DIR")]
    data_dir: Option<String>,

    /// Embedding model name
    #[arg(long, env = "CODERAG_MODEL")]
    model: Option<String>,

    /// Embedding provider: onnx or hash
    #[arg(long)]
    provider: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Index the project and library roots, or one directory of the project
    Index {
        /// Directory inside the project
        path: Option<PathBuf>,
    },

    /// Semantic code search
    Search {
        query: String,

        #[arg(short = 'k', long)]
        top_k: Option<usize>,

        #[arg(short, long)]
        language: Option<String>,

        /// Only search this scope (`project` or a library scope)
        #[arg(long)]
        scope: Option<String>,
    },

    /// Index and knowledge status
    Status,

    /// Drop indexed chunks and file hashes
    Clear {
        /// Only clear this scope
        #[arg(long)]
        scope: Option<String>,
    },

    /// Find symbols by name
    Symbols {
        query: String,

        #[arg(long)]
        kind: Option<SymbolKind>,

        #[arg(short, long)]
        language: Option<String>,

        /// Include full definition bodies of exact matches
        #[arg(long)]
        body: bool,
    },

    /// Lines calling a function or method
    Callers {
        name: String,

        #[arg(short, long)]
        language: Option<String>,
    },

    /// Imports of a file and the files importing it
    Deps { file: PathBuf },

    /// Files nothing imports, entry points excluded
    Orphans,

    /// Files importing any of the given files
    Impact {
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },

    /// Symbols and importers affected by uncommitted changes
    Diff {
        /// Git revision to diff against (default: HEAD)
        reference: Option<String>,
    },

    /// Type inheritance graph
    Hierarchy {
        /// Only this type and its edges
        #[arg(long = "type")]
        type_name: Option<String>,
    },

    /// Functions and methods referenced nowhere else
    DeadCode {
        #[arg(short, long)]
        language: Option<String>,
    },

    /// Preview renaming an identifier
    Rename {
        old_name: String,
        new_name: String,

        #[arg(short, long)]
        language: Option<String>,
    },

    /// Knowledge base
    Knowledge {
        /// Use the global store instead of the project one
        #[arg(long)]
        global: bool,

        #[command(subcommand)]
        command: KnowledgeCommands,
    },

    /// Save or load the context snapshot
    Snapshot {
        #[command(subcommand)]
        command: SnapshotCommands,
    },

    /// Index status, knowledge, languages and recent history
    Summary,
}

#[derive(Subcommand)]
enum KnowledgeCommands {
    /// Add an entry
    Add {
        title: String,
        content: String,

        #[arg(short, long)]
        category: Option<String>,

        /// Comma-separated tags
        #[arg(short, long, value_delimiter = ',')]
        tags: Vec<String>,
    },

    /// Search entries above the relevance floor
    Search {
        query: String,

        #[arg(short = 'k', long, default_value_t = 5)]
        top_k: usize,

        #[arg(short, long)]
        category: Option<String>,

        /// Keep hits below the relevance floor
        #[arg(long)]
        all: bool,
    },

    /// List entries, newest first
    List {
        #[arg(short, long)]
        category: Option<String>,
    },

    /// Remove an entry by id
    Remove { id: String },

    /// Drop near-duplicate entries
    Compact {
        /// Cosine similarity threshold (default from config)
        #[arg(long)]
        threshold: Option<f32>,
    },

    /// Export entries as markdown
    Export {
        #[arg(short, long)]
        category: Option<String>,
    },
}

#[derive(Subcommand)]
enum SnapshotCommands {
    /// Save a JSON object
    Save { json: String },

    /// Print the saved snapshot
    Load,
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn load_config(cli: &Cli) -> Result<Config> {
    let mut config = Config::discover(&cli.root)?;
    if let Some(dir) = &cli.data_dir {
        config.data_dir = dir.clone();
    }
    if let Some(model) = &cli.model {
        config.embedding.model = model.clone();
    }
    if let Some(provider) = &cli.provider {
        config.embedding.provider = provider.clone();
    }
    config.validate()?;
    Ok(config)
}

fn knowledge_store(ws: &Workspace, global: bool) -> Result<&KnowledgeStore> {
    if !global {
        return Ok(ws.knowledge());
    }
    ws.global_knowledge()
        .context("no global store configured (set global_dir in coderag.json)")
}

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr; stdout carries JSON.
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    // 1. Load config
    let config = load_config(&cli)?;

    // 2. Open scopes
    let ws = Workspace::open(&cli.root, config)
        .await
        .context("failed to open workspace")?;
    info!(root = %ws.root().display(), "coderag ready");

    // 3. Dispatch
    match cli.command {
        Commands::Index { path } => match path {
            Some(path) => {
                let dir = ws.root().join(path);
                print_json(&ws.project().index_directory(Some(dir.as_path())).await?)?;
            }
            None => print_json(&ws.index_all().await)?,
        },
        Commands::Search {
            query,
            top_k,
            language,
            scope,
        } => {
            let results = ws
                .search_with_knowledge(&query, top_k, language.as_deref(), scope.as_deref())
                .await?;
            print_json(&results)?;
        }
        Commands::Status => {
            let scopes = ws.statuses().await;
            let knowledge = ws.knowledge().status().await?;
            print_json(&json!({ "scopes": scopes, "knowledge": knowledge }))?;
        }
        Commands::Clear { scope } => {
            let mut cleared = Vec::new();
            for s in std::iter::once(ws.project()).chain(ws.libraries()) {
                if scope.as_deref().is_none_or(|name| name == s.name()) {
                    s.clear().await?;
                    cleared.push(s.name().to_string());
                }
            }
            if cleared.is_empty() {
                bail!("unknown scope {:?}", scope.unwrap_or_default());
            }
            print_json(&json!({ "cleared": cleared }))?;
        }
        Commands::Symbols {
            query,
            kind,
            language,
            body,
        } => {
            let sources = ws.sources(None);
            let symbols = lookup_symbol(&sources, &query, kind, language.as_deref());
            if body {
                let definitions = symbol_definitions(&sources, &query);
                print_json(&json!({ "symbols": symbols, "definitions": definitions }))?;
            } else {
                print_json(&symbols)?;
            }
        }
        Commands::Callers { name, language } => {
            let sources = ws.sources(language.as_deref());
            print_json(&find_callers(&sources, &name, None)?)?;
        }
        Commands::Deps { file } => {
            print_json(&ws.dependency_resolver().file_dependencies(&file)?)?;
        }
        Commands::Orphans => print_json(&ws.dependency_resolver().find_orphans())?,
        Commands::Impact { files } => {
            print_json(&ws.dependency_resolver().impacted_by(&files))?;
        }
        Commands::Diff { reference } => {
            print_json(&ws.analyze_diff(reference.as_deref()).await?)?;
        }
        Commands::Hierarchy { type_name } => {
            let graph = TypeHierarchy::build(&ws.sources(None));
            match type_name {
                Some(name) => {
                    let focused = graph
                        .focus(&name)
                        .with_context(|| format!("type {name:?} not found"))?;
                    print_json(&focused)?;
                }
                None => print_json(&graph)?,
            }
        }
        Commands::DeadCode { language } => {
            print_json(&find_dead_code(&ws.sources(None), language.as_deref()))?;
        }
        Commands::Rename {
            old_name,
            new_name,
            language,
        } => {
            let sources = ws.sources(language.as_deref());
            print_json(&preview_rename(&sources, &old_name, &new_name, None)?)?;
        }
        Commands::Knowledge { global, command } => {
            let store = knowledge_store(&ws, global)?;
            match command {
                KnowledgeCommands::Add {
                    title,
                    content,
                    category,
                    tags,
                } => {
                    let entry = store.add(&title, &content, category.as_deref(), tags).await?;
                    print_json(&entry)?;
                }
                KnowledgeCommands::Search {
                    query,
                    top_k,
                    category,
                    all,
                } => {
                    let hits = if all {
                        store.search(&query, top_k, category.as_deref()).await?
                    } else {
                        store.search_relevant(&query, top_k, category.as_deref()).await?
                    };
                    print_json(&hits)?;
                }
                KnowledgeCommands::List { category } => {
                    print_json(&store.list(category.as_deref()).await?)?;
                }
                KnowledgeCommands::Remove { id } => {
                    let removed = store.remove(&id).await?;
                    print_json(&json!({ "id": id, "removed": removed }))?;
                }
                KnowledgeCommands::Compact { threshold } => {
                    print_json(&store.compact(threshold).await?)?;
                }
                KnowledgeCommands::Export { category } => {
                    println!("{}", store.export(category.as_deref()).await?);
                }
            }
        }
        Commands::Snapshot { command } => match command {
            SnapshotCommands::Save { json } => {
                let data = serde_json::from_str(&json).context("snapshot is not valid JSON")?;
                let path = ws.save_snapshot(data).await?;
                print_json(&json!({ "saved": path.display().to_string() }))?;
            }
            SnapshotCommands::Load => match ws.load_snapshot()? {
                Some(snapshot) => print_json(&snapshot)?,
                None => bail!("no snapshot found"),
            },
        },
        Commands::Summary => print_json(&ws.project_summary().await)?,
    }

    Ok(())
}

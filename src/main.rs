//! memguard - project memory for code assistants
//!
//! Validates files against the project's memory corpus, renders context
//! bundles, manages memories and serves the HTTP API.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use memguard::{
    api::{build_app, AppState},
    config::MemguardConfig,
    engine::Engine,
    memory::{Importance, JsonFileStore, MemoryCategory, MemoryRecordBuilder, MemoryStore},
    validation::PatternLibrary,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "memguard")]
#[command(version)]
#[command(about = "Project memory for code assistants: context injection and rule validation")]
struct Cli {
    /// Configuration file path
    #[arg(short, long, env = "MEMGUARD_CONFIG")]
    config: Option<PathBuf>,

    /// Memory store file (overrides the configured path)
    #[arg(long, env = "MEMGUARD_STORE")]
    store: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Emit logs as JSON
    #[arg(long)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a file against the memory corpus
    Validate {
        file: PathBuf,

        /// Language tag (inferred from the extension when omitted)
        #[arg(short, long)]
        language: Option<String>,

        /// Files to learn common code patterns from before validating
        #[arg(long = "baseline")]
        baseline: Vec<PathBuf>,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show which memories are selected for a file and why
    Select {
        file: PathBuf,

        #[arg(short, long)]
        language: Option<String>,

        #[arg(long)]
        json: bool,
    },

    /// Print the context bundle for a file
    Context {
        file: PathBuf,

        #[arg(short, long)]
        language: Option<String>,

        /// Token budget (defaults to the configured one)
        #[arg(short, long)]
        budget: Option<usize>,
    },

    /// Manage stored memories
    Memory {
        #[command(subcommand)]
        action: MemoryAction,
    },

    /// Start the HTTP API
    Serve {
        /// Host to bind to (defaults to the configured one)
        #[arg(long)]
        host: Option<String>,

        /// Port to listen on (defaults to the configured one)
        #[arg(long)]
        port: Option<u16>,
    },

    /// Show configuration
    Config {
        /// Show default configuration
        #[arg(long)]
        default: bool,
    },
}

#[derive(Subcommand)]
enum MemoryAction {
    /// Add a memory
    Add {
        content: String,

        /// Category, e.g. architecture, code-style, business-rule
        #[arg(short, long, default_value = "other")]
        category: String,

        /// low, medium, high or critical
        #[arg(short, long, default_value = "medium")]
        importance: String,

        #[arg(short, long = "tag")]
        tags: Vec<String>,

        /// Related file paths
        #[arg(short, long = "file")]
        files: Vec<String>,
    },

    /// List all memories
    List,

    /// Search memories by text
    Search {
        query: String,

        /// Rank by word overlap instead of substring match
        #[arg(long)]
        fuzzy: bool,
    },

    /// Remove a memory by id
    Remove { id: String },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_level = if cli.verbose { "debug" } else { "info" };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| format!("memguard={},tower_http=info", log_level).into());
    tracing_subscriber::registry()
        .with(filter)
        .with(cli.json_logs.then(|| tracing_subscriber::fmt::layer().json()))
        .with((!cli.json_logs).then(|| tracing_subscriber::fmt::layer().with_writer(std::io::stderr)))
        .init();

    let mut config = MemguardConfig::load_or_default(cli.config.as_deref())?;
    if let Some(store) = cli.store {
        config.store.path = store;
    }

    match cli.command {
        Commands::Validate {
            file,
            language,
            baseline,
            json,
        } => {
            let passed = run_validate(&config, &file, language.as_deref(), &baseline, json).await?;
            if !passed {
                std::process::exit(1);
            }
        }
        Commands::Select { file, language, json } => {
            run_select(&config, &file, language.as_deref(), json).await?;
        }
        Commands::Context {
            file,
            language,
            budget,
        } => {
            run_context(&config, &file, language.as_deref(), budget).await?;
        }
        Commands::Memory { action } => {
            run_memory(&config, action).await?;
        }
        Commands::Serve { host, port } => {
            let host = host.unwrap_or_else(|| config.server.host.clone());
            let port = port.unwrap_or(config.server.port);
            run_server(&config, &host, port).await?;
        }
        Commands::Config { default } => {
            show_config(if default { None } else { Some(&config) })?;
        }
    }

    Ok(())
}

async fn open_store(config: &MemguardConfig) -> Result<JsonFileStore> {
    JsonFileStore::open(&config.store.path)
        .await
        .with_context(|| format!("Failed to open memory store {}", config.store.path.display()))
}

async fn run_validate(
    config: &MemguardConfig,
    file: &Path,
    language: Option<&str>,
    baseline: &[PathBuf],
    json: bool,
) -> Result<bool> {
    let path = file.to_string_lossy().to_string();
    let code = tokio::fs::read_to_string(file)
        .await
        .with_context(|| format!("Failed to read {}", file.display()))?;
    let language = Engine::resolve_language(language, &path);
    let corpus = open_store(config).await?.load_all().await?;

    let mut library = PatternLibrary::new(config.patterns.clone());
    for other in baseline {
        match tokio::fs::read_to_string(other).await {
            Ok(text) => {
                library.learn_file(&language, &other.to_string_lossy(), &text);
            }
            Err(e) => {
                tracing::warn!(path = %other.display(), error = %e, "Skipping unreadable baseline file");
            }
        }
    }

    let engine = Engine::new(config);
    let report = engine.validate(&code, &path, &language, &corpus, Some(&library));

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        for diagnostic in &report.diagnostics {
            println!("{}:{}", path, diagnostic);
        }
        println!("{}", report.summary);
    }
    Ok(report.passed)
}

async fn run_select(config: &MemguardConfig, file: &Path, language: Option<&str>, json: bool) -> Result<()> {
    let path = file.to_string_lossy().to_string();
    let language = Engine::resolve_language(language, &path);
    let corpus = open_store(config).await?.load_all().await?;

    let engine = Engine::new(config);
    let features = engine.features(&path, &language, None);
    let selected = engine.select(&corpus, &features);

    if json {
        println!("{}", serde_json::to_string_pretty(&selected)?);
        return Ok(());
    }
    if selected.is_empty() {
        println!("No memories selected for {}", path);
    }
    for scored in &selected {
        println!(
            "{:>7.1}  [{}] {} ({})",
            scored.score,
            scored.record.importance.as_str(),
            scored.record.excerpt(70),
            scored.record.id
        );
    }
    Ok(())
}

async fn run_context(
    config: &MemguardConfig,
    file: &Path,
    language: Option<&str>,
    budget: Option<usize>,
) -> Result<()> {
    let path = file.to_string_lossy().to_string();
    let language = Engine::resolve_language(language, &path);
    let corpus = open_store(config).await?.load_all().await?;

    let engine = Engine::new(config);
    let features = engine.features(&path, &language, None);
    let bundle = engine.context(&corpus, &features, budget);
    if !bundle.text.is_empty() {
        println!("{}", bundle.text);
    }
    tracing::info!(
        tokens = bundle.tokens,
        included = bundle.included,
        forced = bundle.forced,
        skipped = bundle.skipped,
        "Context bundle rendered"
    );
    Ok(())
}

async fn run_memory(config: &MemguardConfig, action: MemoryAction) -> Result<()> {
    let store = open_store(config).await?;
    match action {
        MemoryAction::Add {
            content,
            category,
            importance,
            tags,
            files,
        } => {
            let category = MemoryCategory::parse(&category)
                .with_context(|| format!("Unknown category: {}", category))?;
            let importance = Importance::parse(&importance)
                .with_context(|| format!("Unknown importance: {}", importance))?;
            let mut builder = MemoryRecordBuilder::new(category)
                .content(content)
                .importance(importance)
                .tags(tags);
            for file in files {
                builder = builder.related_file(file);
            }
            let record = builder.build()?;
            let id = record.id.clone();
            store.add(record).await?;
            println!("{}", id);
        }
        MemoryAction::List => {
            print_records(&store.load_all().await?);
        }
        MemoryAction::Search { query, fuzzy } => {
            let records = if fuzzy {
                store.fuzzy_search(&query).await?
            } else {
                store.search(&query).await?
            };
            print_records(&records);
        }
        MemoryAction::Remove { id } => {
            let removed = store.delete(&id).await?;
            println!("Removed {}", removed.id);
        }
    }
    Ok(())
}

fn print_records(records: &[memguard::MemoryRecord]) {
    for record in records {
        println!(
            "{}  {:<13} {:<8} {}",
            record.id,
            record.category.as_str(),
            record.importance.as_str(),
            record.excerpt(70)
        );
    }
}

async fn run_server(config: &MemguardConfig, host: &str, port: u16) -> Result<()> {
    let store: Arc<dyn MemoryStore> = Arc::new(open_store(config).await?);
    let app = build_app(AppState::new(config, store), &config.server.cors_origins)
        .layer(tower_http::trace::TraceLayer::new_for_http());

    let addr = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    tracing::info!(%addr, store = %config.store.path.display(), "memguard API listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("Shutting down...");
        })
        .await?;
    Ok(())
}

fn show_config(config: Option<&MemguardConfig>) -> Result<()> {
    let config = config.cloned().unwrap_or_default();
    let toml = toml::to_string_pretty(&config)?;
    println!("{}", toml);
    Ok(())
}

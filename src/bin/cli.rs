//! Memory Assistant CLI
//!
//! Command-line interface for status checks, migrations, and ad-hoc
//! remember/recall against the configured index.

use clap::{Parser, Subcommand};
use console::style;
use memory_assistant::config::{
    config_path, read_config_snapshot, save_config, validate_config, Config, StorageBackendType,
};
use memory_assistant::core::{parse_entities, Importance};
use memory_assistant::database::{connect_index, init_pool_for_migrations, migrations, open_index};
use memory_assistant::logging::init_tracing;
use memory_assistant::memory::{build_embedder, MemoryService, RecallOptions, RememberRequest};
use memory_assistant::VERSION;

#[derive(Parser)]
#[command(
    name = "memory-assistant",
    version = VERSION,
    about = "Memory Assistant - semantic memory store",
    long_about = None
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check configuration and index reachability
    Status,

    /// Create the pgvector schema
    Migrate,

    /// Store a statement
    Remember {
        /// The statement to remember
        text: String,
        /// Category tag
        #[arg(short, long)]
        category: Option<String>,
        /// Comma-separated entities
        #[arg(short, long)]
        entities: Option<String>,
        /// low, medium or high
        #[arg(short, long, default_value = "medium")]
        importance: Importance,
    },

    /// Recall statements similar to a query
    Recall {
        /// Natural-language query
        query: String,
        /// Only match this category
        #[arg(short, long)]
        category: Option<String>,
        /// Maximum number of matches
        #[arg(short = 'k', long)]
        top_k: Option<usize>,
        /// Minimum cosine similarity
        #[arg(short, long, allow_negative_numbers = true)]
        min_relevance: Option<f32>,
    },

    /// Show the effective configuration
    Config {
        /// Only print the config file path
        #[arg(long)]
        path: bool,
        /// Write a default config file if none exists
        #[arg(long)]
        init: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = Config::from_env()?;
    init_tracing(&config.log);

    match cli.command {
        Commands::Status => check_status(&config).await,
        Commands::Migrate => run_migrations(&config).await,
        Commands::Remember {
            text,
            category,
            entities,
            importance,
        } => remember(&config, text, category, entities, importance).await,
        Commands::Recall {
            query,
            category,
            top_k,
            min_relevance,
        } => recall(&config, &query, category, top_k, min_relevance).await,
        Commands::Config { path, init } => show_config(&config, path, init),
    }
}

async fn build_service(config: &Config) -> anyhow::Result<MemoryService> {
    if config.storage.backend == StorageBackendType::Memory {
        println!(
            "{} In-memory index: nothing persists after this command. Set DATABASE_URL to use PostgreSQL.",
            style("⚠").yellow()
        );
    }

    let embedder = build_embedder(&config.embedding).await?;
    let index = open_index(config).await?;
    Ok(MemoryService::new(embedder, index, config.recall.clone())?)
}

async fn check_status(config: &Config) -> anyhow::Result<()> {
    println!("\n{}", style("Memory Assistant Status").cyan().bold());
    println!("   Version: {}", VERSION);
    println!(
        "   Embeddings: {} ({}, {} dims)",
        style(&config.embedding.provider).cyan(),
        config.embedding.model,
        config.embedding.dimensions
    );
    println!("   Storage: {}", style(&config.storage.backend).cyan());

    let validation = validate_config(config);
    for issue in &validation.errors {
        println!("   {} {}", style("✗").red(), issue);
    }
    for issue in &validation.warnings {
        println!("   {} {}", style("⚠").yellow(), issue);
    }
    if validation.valid {
        println!("   {} Configuration valid", style("✓").green());
    }

    print!("   {} Index... ", style("○").dim());
    match connect_index(config).await {
        Ok(index) => match index.describe().await {
            Ok(stats) => println!(
                "{} {} memories, {} dims",
                style("✓").green(),
                stats.total_records,
                stats.dimension
            ),
            Err(e) => println!("{} {}", style("✗").red(), e),
        },
        Err(e) => println!("{} {}", style("✗").red(), e),
    }

    println!();
    Ok(())
}

async fn run_migrations(config: &Config) -> anyhow::Result<()> {
    let pg = config
        .storage
        .postgres
        .as_ref()
        .ok_or_else(|| anyhow::anyhow!("PostgreSQL not configured. Set DATABASE_URL."))?;

    println!("{} Running migrations...", style("→").cyan());
    let pool = init_pool_for_migrations(pg).await?;
    migrations::run(&pool, config.embedding.dimensions).await?;
    println!("{} Migrations complete", style("✓").green());
    Ok(())
}

async fn remember(
    config: &Config,
    text: String,
    category: Option<String>,
    entities: Option<String>,
    importance: Importance,
) -> anyhow::Result<()> {
    let service = build_service(config).await?;

    let mut request = RememberRequest::new(text).with_importance(importance);
    if let Some(category) = category {
        request = request.with_category(category);
    }
    if let Some(entities) = entities {
        request = request.with_entities(parse_entities(&entities));
    }

    let record = service.remember(request).await?;
    println!("{} Stored memory {}", style("✓").green(), style(record.id).cyan());
    Ok(())
}

async fn recall(
    config: &Config,
    query: &str,
    category: Option<String>,
    top_k: Option<usize>,
    min_relevance: Option<f32>,
) -> anyhow::Result<()> {
    let service = build_service(config).await?;

    let mut options = RecallOptions::new();
    if let Some(category) = category {
        options = options.with_category(category);
    }
    if let Some(top_k) = top_k {
        options = options.with_top_k(top_k);
    }
    if let Some(min_relevance) = min_relevance {
        options = options.with_min_relevance(min_relevance);
    }

    let results = service.recall(query, options).await?;
    if results.is_empty() {
        println!("{} No relevant memories", style("ℹ").blue());
        return Ok(());
    }

    for result in results {
        let meta = &result.metadata;
        println!(
            "{} {}  {}",
            style(format!("{:.3}", result.score)).green(),
            meta.text,
            style(format!(
                "[{} | {} | {}]",
                meta.category.as_deref().unwrap_or("-"),
                meta.importance,
                meta.created_at.format("%Y-%m-%d %H:%M")
            ))
            .dim()
        );
        if !meta.entities.is_empty() {
            println!("      └─ {}", style(meta.entities.join(", ")).cyan());
        }
    }
    Ok(())
}

fn show_config(config: &Config, path_only: bool, init: bool) -> anyhow::Result<()> {
    let path = config_path();

    if init {
        if path.exists() {
            println!("{} {} already exists", style("ℹ").blue(), path.display());
        } else {
            save_config(&Config::default(), &path)?;
            println!("{} Wrote {}", style("✓").green(), path.display());
        }
        return Ok(());
    }

    if path_only {
        println!("{}", path.display());
        return Ok(());
    }

    let snapshot = read_config_snapshot(&path);
    println!(
        "{} {} ({})",
        style("Config file:").bold(),
        snapshot.path.display(),
        if snapshot.exists { "found" } else { "not found, using defaults" }
    );
    for issue in snapshot.issues.iter().filter(|_| snapshot.exists) {
        println!("   {} {}", style("✗").red(), issue);
    }

    // Secrets are skipped during serialization
    println!("{}", serde_json::to_string_pretty(config)?);
    Ok(())
}

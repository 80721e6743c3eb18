//! bm25d: Command-line interface for the BM25 index microservice

use anyhow::{Context, Result};
use bm25d::api::create_router;
use bm25d::api::handlers::AppState;
use bm25d::chunk::Chunk;
use bm25d::config::ServiceConfig;
use bm25d::index::Bm25Params;
use bm25d::storage::IndexStorage;
use bm25d::store::IndexStore;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// bm25d: BM25 indexing and search service
#[derive(Parser)]
#[command(name = "bm25d")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to a TOML config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP server
    Serve {
        /// Listen port (overrides config)
        #[arg(short, long)]
        port: Option<u16>,

        /// Storage directory for persisted indices (overrides config)
        #[arg(short, long)]
        storage_dir: Option<String>,
    },
    /// Build an index from a JSON file of chunks (offline)
    Create {
        /// Collection name
        collection: String,

        /// Path to a JSON array of {id, text, metadata} chunks
        #[arg(short, long)]
        input: PathBuf,

        /// Storage directory for persisted indices
        #[arg(short, long)]
        storage_dir: Option<String>,
    },
    /// Search a persisted index (offline, for testing)
    Search {
        /// Collection name
        collection: String,

        /// Search query
        query: String,

        /// Number of results to return
        #[arg(short, long, default_value = "10")]
        top_k: usize,

        /// Storage directory for persisted indices
        #[arg(short, long)]
        storage_dir: Option<String>,
    },
}

/// Assemble the effective config from file, env, and CLI overrides
fn resolve_config(
    config_path: Option<&PathBuf>,
    port: Option<u16>,
    storage_dir: Option<&str>,
) -> Result<ServiceConfig> {
    let base = match config_path {
        Some(path) => ServiceConfig::from_file(path)?,
        None => ServiceConfig::default(),
    };
    let mut config = base.merge_with(&ServiceConfig::from_env());

    if let Some(port) = port {
        config = config.with_port(port);
    }
    if let Some(dir) = storage_dir {
        config = config.with_storage_dir(dir);
    }

    config.validate()?;
    Ok(config)
}

fn build_store(config: &ServiceConfig) -> Result<IndexStore> {
    let storage = IndexStorage::new(config.storage_dir())
        .context("Failed to open index storage directory")?;
    Ok(IndexStore::new(storage, config.bm25_params()))
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| log_level.to_string()),
        ))
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();

    match cli.command {
        Commands::Serve { port, storage_dir } => {
            let config = resolve_config(cli.config.as_ref(), port, storage_dir.as_deref())?;
            let store = Arc::new(build_store(&config)?);
            let state = AppState { store };

            let addr = format!("{}:{}", config.listen_addr(), config.port());
            let listener = tokio::net::TcpListener::bind(&addr)
                .await
                .with_context(|| format!("Failed to bind {}", addr))?;

            tracing::info!(
                "bm25d {} listening on {} (storage: {})",
                bm25d::VERSION,
                addr,
                config.storage_dir()
            );

            axum::serve(listener, create_router(state)).await?;
            Ok(())
        }
        Commands::Create {
            collection,
            input,
            storage_dir,
        } => {
            let config = resolve_config(cli.config.as_ref(), None, storage_dir.as_deref())?;
            let store = build_store(&config)?;

            let content = std::fs::read_to_string(&input)
                .with_context(|| format!("Failed to read {}", input.display()))?;
            let chunks: Vec<Chunk> =
                serde_json::from_str(&content).context("Failed to parse chunks JSON")?;

            let outcome = store.create(&collection, &chunks, true, true).await?;
            println!("Indexed '{}': {:?}", collection, outcome);
            Ok(())
        }
        Commands::Search {
            collection,
            query,
            top_k,
            storage_dir,
        } => {
            let config = resolve_config(cli.config.as_ref(), None, storage_dir.as_deref())?;
            let store = build_store(&config)?;

            let results = store.search(&collection, &query, top_k, None).await?;

            if results.is_empty() {
                println!("No results found for '{}'", query);
            } else {
                println!("Found {} results for '{}':\n", results.len(), query);
                for hit in &results {
                    println!("{}. [score: {:.4}] {}", hit.rank, hit.score, hit.chunk_id);
                    if !hit.metadata.is_null() {
                        println!("   {}", hit.metadata);
                    }
                }
            }
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parsing_serve() {
        let cli = Cli::try_parse_from(["bm25d", "serve", "--port", "8080"]);
        assert!(cli.is_ok());
    }

    #[test]
    fn test_cli_parsing_search() {
        let cli = Cli::try_parse_from(["bm25d", "search", "notes.md", "cat", "--top-k", "5"]);
        assert!(cli.is_ok());
        if let Ok(parsed) = cli {
            if let Commands::Search { top_k, query, .. } = parsed.command {
                assert_eq!(top_k, 5);
                assert_eq!(query, "cat");
            }
        }
    }

    #[test]
    fn test_cli_parsing_create() {
        let cli = Cli::try_parse_from([
            "bm25d",
            "create",
            "notes.md",
            "--input",
            "chunks.json",
            "--storage-dir",
            "/tmp/indices",
        ]);
        assert!(cli.is_ok());
    }

    #[test]
    fn test_resolve_config_cli_overrides() {
        let config = resolve_config(None, Some(9000), Some("/tmp/x")).unwrap();
        assert_eq!(config.port(), 9000);
        assert_eq!(config.storage_dir(), "/tmp/x");
    }
}

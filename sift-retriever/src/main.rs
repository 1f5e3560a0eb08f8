use clap::{Parser, Subcommand};
use sift_embed::{EmbedConfig, OpenAiEmbeddingClient};
use sift_retriever::engine::{RetrievalConfig, RetrievalEngine};
use std::path::PathBuf;
use std::process;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

/// A CLI tool to build and query a semantic index over a document directory.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Directory containing the corpus documents (.pdf, .txt, .md)
    #[arg(short, long, default_value = ".")]
    directory: PathBuf,

    /// Override the cache file location (default: <directory>/.sift-cache.json)
    #[arg(long)]
    cache_path: Option<PathBuf>,

    /// Skip the on-disk cache entirely
    #[arg(long)]
    no_cache: bool,

    /// Embedding model to request
    #[arg(long)]
    model: Option<String>,

    /// Deadline in seconds for a full corpus build
    #[arg(long)]
    build_timeout: Option<u64>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Load, chunk, and embed the corpus, then persist the cache
    Build,
    /// Search the corpus for a natural-language query
    Search {
        /// Query text
        query: String,
        /// Maximum number of chunks ranked before grouping by file
        #[arg(short, long, default_value_t = 8)]
        top_k: usize,
        /// Minimum similarity for a chunk to surface
        #[arg(long, default_value_t = 0.25)]
        min_similarity: f32,
    },
    /// Show what the indexed corpus contains, grouped by file
    Summary,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run().await {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

async fn run() -> anyhow::Result<()> {
    let args = Args::parse();

    let embed_config = match &args.model {
        Some(model) => EmbedConfig::new(model.clone()),
        None => EmbedConfig::default(),
    };
    let provider = Arc::new(OpenAiEmbeddingClient::new(embed_config)?);

    let mut config = RetrievalConfig::new(&args.directory).with_cache_enabled(!args.no_cache);
    if let Some(path) = &args.cache_path {
        config = config.with_cache_path(path);
    }
    if let Some(seconds) = args.build_timeout {
        config = config.with_build_timeout(Duration::from_secs(seconds));
    }
    if let Commands::Search {
        top_k,
        min_similarity,
        ..
    } = &args.command
    {
        config = config.with_top_k(*top_k).with_min_similarity(*min_similarity);
    }

    let engine = RetrievalEngine::new(config, provider);

    match args.command {
        Commands::Build => {
            let index = engine.build().await?;
            println!(
                "Indexed {} chunks from {} documents (model: {})",
                index.len(),
                index.document_summary().total_documents,
                index.model_id()
            );
            Ok(())
        }
        Commands::Search { query, .. } => {
            engine.build().await?;
            let response = engine.search(&query).await?;
            println!("{}", serde_json::to_string_pretty(&response)?);
            Ok(())
        }
        Commands::Summary => {
            engine.build().await?;
            let output = serde_json::json!({
                "documents": engine.document_summary().await?,
                "corpus": engine.summary().await?,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
            Ok(())
        }
    }
}

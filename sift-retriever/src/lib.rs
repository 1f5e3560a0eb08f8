//! Semantic document retrieval over a directory of PDF and text files.
//!
//! The pipeline: [`loader`] walks a corpus directory and extracts page text,
//! `sift-chunk` splits pages into overlapping chunks, `sift-embed` turns
//! chunks into vectors, [`index`] ranks them by cosine similarity, [`cache`]
//! persists the embedded corpus across restarts, and [`engine`] orchestrates
//! the whole thing behind build/search/summary operations.
//!
//! ```no_run
//! use sift_retriever::engine::{RetrievalConfig, RetrievalEngine};
//! use sift_embed::{EmbedConfig, OpenAiEmbeddingClient};
//! use std::sync::Arc;
//!
//! # async fn run() -> anyhow::Result<()> {
//! let provider = Arc::new(OpenAiEmbeddingClient::new(EmbedConfig::default())?);
//! let engine = RetrievalEngine::new(RetrievalConfig::new("./docs"), provider);
//!
//! engine.build().await?;
//! let response = engine.search("warranty period for turbine blades").await?;
//! println!("{}", serde_json::to_string_pretty(&response)?);
//! # Ok(())
//! # }
//! ```

pub mod cache;
pub mod engine;
pub mod index;
pub mod loader;
pub mod search;

pub use cache::{CacheError, CorpusCache};
pub use engine::{BuildError, CorpusIndex, RetrievalConfig, RetrievalEngine, SearchError};
pub use index::{cosine_similarity, EmbeddedChunk, LinearIndex, Ranked, SimilarityIndex};
pub use loader::{load_documents, Document, DocumentSetSummary, LoadError, Page};
pub use search::{CorpusSummary, KeyInsight, Relevance, SearchResponse};

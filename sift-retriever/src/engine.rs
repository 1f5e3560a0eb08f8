//! Retrieval orchestration: corpus builds, query search, and summaries.
//!
//! [`RetrievalEngine`] owns the whole pipeline. A build loads documents,
//! chunks every page, embeds the chunks in bounded concurrent batches, and
//! publishes a fresh immutable [`CorpusIndex`]; searches and summaries run
//! against whichever index is currently published. Rebuilds swap the index
//! atomically, so readers never observe a half-built corpus.

use crate::cache::CorpusCache;
use crate::index::{EmbeddedChunk, LinearIndex, Ranked, SimilarityIndex};
use crate::loader::{self, DocumentSetSummary, LoadError};
use crate::search::{CorpusSummary, KeyInsight, Relevance, SearchResponse};
use chrono::{DateTime, Utc};
use futures::StreamExt;
use itertools::Itertools;
use sift_chunk::{Chunk, ChunkSource, Chunker};
use sift_embed::{EmbedError, EmbeddingProvider};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{info, warn};

/// Tuning knobs for one engine instance. Construct with
/// [`RetrievalConfig::new`] and override via the `with_*` builders.
#[derive(Debug, Clone)]
pub struct RetrievalConfig {
    /// Directory holding the corpus documents.
    pub directory: PathBuf,
    /// Where the embedded-corpus cache lives.
    pub cache_path: PathBuf,
    /// Soft chunk size bound, in characters.
    pub max_chunk_chars: usize,
    /// Overlap carried between consecutive chunks, in characters.
    pub overlap_chars: usize,
    /// How many chunks a search ranks before grouping by file.
    pub top_k: usize,
    /// Chunks below this similarity never surface in results.
    pub min_similarity: f32,
    /// Similarities strictly above this tier as high relevance.
    pub high_relevance: f32,
    /// Chunks per embedding request.
    pub embed_batch_size: usize,
    /// Embedding requests allowed in flight at once.
    pub max_concurrent_batches: usize,
    /// Deadline for a single embedding batch; `None` disables it.
    pub embed_timeout: Option<Duration>,
    /// Deadline for a whole corpus build; `None` disables it.
    pub build_timeout: Option<Duration>,
    /// Whether builds consult and refresh the on-disk cache.
    pub use_cache: bool,
}

impl RetrievalConfig {
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        let directory = directory.into();
        let cache_path = directory.join(".sift-cache.json");
        Self {
            directory,
            cache_path,
            max_chunk_chars: 1000,
            overlap_chars: 200,
            top_k: 8,
            min_similarity: 0.25,
            high_relevance: 0.8,
            embed_batch_size: 16,
            max_concurrent_batches: 4,
            embed_timeout: None,
            build_timeout: None,
            use_cache: true,
        }
    }

    pub fn with_cache_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.cache_path = path.into();
        self
    }

    pub fn with_chunking(mut self, max_chars: usize, overlap_chars: usize) -> Self {
        self.max_chunk_chars = max_chars;
        self.overlap_chars = overlap_chars;
        self
    }

    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }

    pub fn with_min_similarity(mut self, min_similarity: f32) -> Self {
        self.min_similarity = min_similarity;
        self
    }

    pub fn with_high_relevance(mut self, high_relevance: f32) -> Self {
        self.high_relevance = high_relevance;
        self
    }

    pub fn with_embed_batch_size(mut self, batch_size: usize) -> Self {
        self.embed_batch_size = batch_size.max(1);
        self
    }

    pub fn with_max_concurrent_batches(mut self, batches: usize) -> Self {
        self.max_concurrent_batches = batches.max(1);
        self
    }

    pub fn with_embed_timeout(mut self, timeout: Duration) -> Self {
        self.embed_timeout = Some(timeout);
        self
    }

    pub fn with_build_timeout(mut self, timeout: Duration) -> Self {
        self.build_timeout = Some(timeout);
        self
    }

    pub fn with_cache_enabled(mut self, use_cache: bool) -> Self {
        self.use_cache = use_cache;
        self
    }
}

/// Errors from building (or rebuilding) the corpus index.
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error(transparent)]
    Load(#[from] LoadError),

    #[error("no supported documents found in {directory}")]
    NoDocuments { directory: PathBuf },

    /// Every embedding batch failed, so there is nothing to index.
    #[error("no chunks could be embedded")]
    NoChunksEmbedded,

    #[error("corpus build exceeded the {0:?} deadline")]
    Timeout(Duration),
}

/// Errors from querying the engine.
#[derive(Debug, thiserror::Error)]
pub enum SearchError {
    #[error("failed to embed query: {0}")]
    QueryEmbedding(#[from] EmbedError),

    #[error("no corpus index has been built yet")]
    NotBuilt,
}

/// An immutable, queryable snapshot of an embedded corpus.
pub struct CorpusIndex {
    index: LinearIndex,
    documents: DocumentSetSummary,
    model_id: String,
    built_at: DateTime<Utc>,
}

impl CorpusIndex {
    fn new(chunks: Vec<EmbeddedChunk>, documents: DocumentSetSummary, model_id: String) -> Self {
        Self {
            index: LinearIndex::new(chunks),
            documents,
            model_id,
            built_at: Utc::now(),
        }
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    pub fn chunks(&self) -> &[EmbeddedChunk] {
        self.index.chunks()
    }

    /// Model that produced every embedding in this index.
    pub fn model_id(&self) -> &str {
        &self.model_id
    }

    pub fn built_at(&self) -> DateTime<Utc> {
        self.built_at
    }

    pub fn summary(&self) -> CorpusSummary {
        CorpusSummary::from_chunks(self.chunks())
    }

    /// Load-time totals for the documents this index was built from.
    pub fn document_summary(&self) -> &DocumentSetSummary {
        &self.documents
    }

    fn rank(&self, query: &[f32], k: usize) -> Vec<Ranked> {
        self.index.rank(query, k)
    }
}

/// The retrieval pipeline: build once, search many times.
pub struct RetrievalEngine {
    config: RetrievalConfig,
    provider: Arc<dyn EmbeddingProvider>,
    cache: CorpusCache,
    chunker: Chunker,
    current: RwLock<Option<Arc<CorpusIndex>>>,
}

impl RetrievalEngine {
    pub fn new(config: RetrievalConfig, provider: Arc<dyn EmbeddingProvider>) -> Self {
        let cache = CorpusCache::new(&config.cache_path);
        let chunker = Chunker::new(config.max_chunk_chars, config.overlap_chars);
        Self {
            config,
            provider,
            cache,
            chunker,
            current: RwLock::new(None),
        }
    }

    pub fn config(&self) -> &RetrievalConfig {
        &self.config
    }

    /// Build the corpus index and publish it, replacing any previous index.
    ///
    /// A valid cache for the provider's model skips loading and embedding
    /// entirely. With `build_timeout` set, a build that overruns fails with
    /// [`BuildError::Timeout`] and leaves the previously published index (and
    /// any previous cache) untouched.
    pub async fn build(&self) -> Result<Arc<CorpusIndex>, BuildError> {
        match self.config.build_timeout {
            Some(limit) => tokio::time::timeout(limit, self.build_inner())
                .await
                .map_err(|_| BuildError::Timeout(limit))?,
            None => self.build_inner().await,
        }
    }

    async fn build_inner(&self) -> Result<Arc<CorpusIndex>, BuildError> {
        let model_id = self.provider.model_id().to_string();

        if self.config.use_cache {
            if let Some((document_summary, chunks)) = self.cache.load(&model_id).await {
                if !chunks.is_empty() {
                    info!(chunks = chunks.len(), "Restored corpus index from cache");
                    return Ok(self.publish(chunks, document_summary, model_id).await);
                }
            }
        }

        let documents = loader::load_documents(&self.config.directory).await?;
        if documents.is_empty() {
            return Err(BuildError::NoDocuments {
                directory: self.config.directory.clone(),
            });
        }
        let document_summary = DocumentSetSummary::from_documents(&documents);

        let mut chunks: Vec<Chunk> = Vec::new();
        for document in &documents {
            for page in &document.pages {
                let source = ChunkSource {
                    file_name: &document.file_name,
                    file_type: document.file_type,
                    page_number: page.page_number,
                };
                chunks.extend(self.chunker.chunk_page(&page.text, &source));
            }
        }
        info!(
            documents = documents.len(),
            chunks = chunks.len(),
            "Chunked corpus, starting embedding"
        );

        let embedded = self.embed_chunks(chunks).await;
        if embedded.is_empty() {
            return Err(BuildError::NoChunksEmbedded);
        }

        if self.config.use_cache {
            if let Err(e) = self.cache.save(&document_summary, &embedded, &model_id).await {
                // Cache failures never fail a build; the index is already usable.
                warn!(error = %e, "Could not persist corpus cache");
            }
        }

        Ok(self.publish(embedded, document_summary, model_id).await)
    }

    /// Embed chunks in batches, `max_concurrent_batches` requests in flight.
    /// A failed or timed-out batch is logged and dropped; surviving chunks
    /// stay in corpus order because the stream is buffered, not unordered.
    async fn embed_chunks(&self, chunks: Vec<Chunk>) -> Vec<EmbeddedChunk> {
        let provider = Arc::clone(&self.provider);
        let embed_timeout = self.config.embed_timeout;

        let batches = futures::stream::iter(
            chunks
                .chunks(self.config.embed_batch_size)
                .enumerate()
                .map(|(batch_number, batch)| {
                    let provider = Arc::clone(&provider);
                    async move {
                        let texts: Vec<String> =
                            batch.iter().map(|chunk| chunk.content.clone()).collect();
                        let result = match embed_timeout {
                            Some(limit) => {
                                match tokio::time::timeout(limit, provider.embed_texts(&texts))
                                    .await
                                {
                                    Ok(result) => result,
                                    Err(_) => Err(EmbedError::Timeout(limit)),
                                }
                            }
                            None => provider.embed_texts(&texts).await,
                        };
                        (batch_number, batch, result)
                    }
                }),
        )
        .buffered(self.config.max_concurrent_batches)
        .collect::<Vec<_>>()
        .await;

        let mut embedded = Vec::new();
        for (batch_number, batch, result) in batches {
            match result {
                Ok(result) if result.len() == batch.len() => {
                    embedded.extend(
                        batch
                            .iter()
                            .cloned()
                            .zip(result.embeddings)
                            .map(|(chunk, embedding)| EmbeddedChunk { chunk, embedding }),
                    );
                }
                Ok(result) => {
                    warn!(
                        batch = batch_number,
                        expected = batch.len(),
                        got = result.len(),
                        "Dropping embedding batch with mismatched count"
                    );
                }
                Err(e) => {
                    warn!(
                        batch = batch_number,
                        chunks = batch.len(),
                        error = %e,
                        "Dropping failed embedding batch"
                    );
                }
            }
        }
        embedded
    }

    async fn publish(
        &self,
        chunks: Vec<EmbeddedChunk>,
        documents: DocumentSetSummary,
        model_id: String,
    ) -> Arc<CorpusIndex> {
        let index = Arc::new(CorpusIndex::new(chunks, documents, model_id));
        *self.current.write().await = Some(Arc::clone(&index));
        index
    }

    /// The currently published index, if a build has succeeded.
    pub async fn current_index(&self) -> Option<Arc<CorpusIndex>> {
        self.current.read().await.clone()
    }

    /// Search the published index. Fails with [`SearchError::NotBuilt`] until
    /// a build has succeeded.
    pub async fn search(&self, query: &str) -> Result<SearchResponse, SearchError> {
        let index = self.current_index().await.ok_or(SearchError::NotBuilt)?;
        self.search_index(&index, query).await
    }

    /// Search a specific index snapshot. Useful when the caller wants results
    /// pinned to one build while rebuilds happen concurrently.
    pub async fn search_index(
        &self,
        index: &CorpusIndex,
        query: &str,
    ) -> Result<SearchResponse, SearchError> {
        if index.is_empty() {
            return Ok(SearchResponse::not_found(query));
        }

        let query_embedding = self.provider.embed_text(query).await?;
        let matches: Vec<Ranked> = index
            .rank(&query_embedding, self.config.top_k)
            .into_iter()
            .filter(|r| r.score >= self.config.min_similarity)
            .collect();
        let total_results = matches.len();

        // One insight per file: ranked order is descending, so the first
        // chunk seen for a file is that file's best match.
        let insights: Vec<KeyInsight> = matches
            .into_iter()
            .unique_by(|r| index.chunks()[r.position].chunk.file_name.clone())
            .map(|r| {
                let chunk = &index.chunks()[r.position].chunk;
                KeyInsight {
                    file_name: chunk.file_name.clone(),
                    file_type: chunk.file_type,
                    page_number: chunk.page_number,
                    content: chunk.content.clone(),
                    similarity: r.score,
                    relevance: Relevance::from_similarity(r.score, self.config.high_relevance),
                }
            })
            .collect();

        if insights.is_empty() {
            info!(query, "Search found nothing above the similarity floor");
            return Ok(SearchResponse::not_found(query));
        }

        info!(
            query,
            matches = total_results,
            files = insights.len(),
            "Search found results"
        );
        Ok(SearchResponse::hits(query, total_results, insights))
    }

    /// Summarize the published index. Fails with [`SearchError::NotBuilt`]
    /// until a build has succeeded.
    pub async fn summary(&self) -> Result<CorpusSummary, SearchError> {
        let index = self.current_index().await.ok_or(SearchError::NotBuilt)?;
        Ok(index.summary())
    }

    /// Load-time document totals for the published index. Fails with
    /// [`SearchError::NotBuilt`] until a build has succeeded.
    pub async fn document_summary(&self) -> Result<DocumentSetSummary, SearchError> {
        let index = self.current_index().await.ok_or(SearchError::NotBuilt)?;
        Ok(index.document_summary().clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = RetrievalConfig::new("/corpus/docs");
        assert_eq!(config.cache_path, PathBuf::from("/corpus/docs/.sift-cache.json"));
        assert_eq!(config.max_chunk_chars, 1000);
        assert_eq!(config.overlap_chars, 200);
        assert_eq!(config.top_k, 8);
        assert_eq!(config.min_similarity, 0.25);
        assert_eq!(config.high_relevance, 0.8);
        assert_eq!(config.embed_batch_size, 16);
        assert_eq!(config.max_concurrent_batches, 4);
        assert!(config.embed_timeout.is_none());
        assert!(config.build_timeout.is_none());
        assert!(config.use_cache);
    }

    #[test]
    fn test_config_builders() {
        let config = RetrievalConfig::new("/corpus/docs")
            .with_cache_path("/tmp/cache.json")
            .with_chunking(500, 50)
            .with_top_k(3)
            .with_min_similarity(0.5)
            .with_high_relevance(0.9)
            .with_embed_batch_size(0)
            .with_max_concurrent_batches(0)
            .with_embed_timeout(Duration::from_secs(5))
            .with_build_timeout(Duration::from_secs(60))
            .with_cache_enabled(false);

        assert_eq!(config.cache_path, PathBuf::from("/tmp/cache.json"));
        assert_eq!(config.max_chunk_chars, 500);
        assert_eq!(config.top_k, 3);
        // Zero batch sizes are clamped to 1 so chunking never panics.
        assert_eq!(config.embed_batch_size, 1);
        assert_eq!(config.max_concurrent_batches, 1);
        assert_eq!(config.embed_timeout, Some(Duration::from_secs(5)));
        assert!(!config.use_cache);
    }
}

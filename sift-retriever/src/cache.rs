//! On-disk cache of an embedded corpus.
//!
//! The cache is a single self-describing JSON blob holding the document
//! summary, the chunk sequence, the build timestamp, and the embedding
//! model identifier. A
//! cache is only served back for the exact model it was built with; any
//! mismatch, missing file, or parse failure is a miss, never an error the
//! caller has to handle.

use crate::index::EmbeddedChunk;
use crate::loader::DocumentSetSummary;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Bumped whenever the on-disk layout changes; older blobs become misses.
pub const CACHE_FORMAT_VERSION: u32 = 1;

/// Errors from writing the cache. Reads never error — every failure mode on
/// load is a miss.
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error("failed to serialize cache record: {source}")]
    Serialize {
        #[from]
        source: serde_json::Error,
    },

    #[error("failed to write cache to {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Serialized snapshot of an embedded corpus.
#[derive(Debug, Serialize, Deserialize)]
struct CacheRecord {
    version: u32,
    model_id: String,
    built_at: DateTime<Utc>,
    documents: DocumentSetSummary,
    chunks: Vec<EmbeddedChunk>,
}

/// Persists and restores the embedded chunk sequence for a corpus.
#[derive(Debug, Clone)]
pub struct CorpusCache {
    path: PathBuf,
}

impl CorpusCache {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Atomically overwrite the cache with the given chunk sequence.
    ///
    /// The record is written to a temporary file in the same directory and
    /// renamed into place, so a crash mid-write leaves any previous valid
    /// cache intact.
    pub async fn save(
        &self,
        documents: &DocumentSetSummary,
        chunks: &[EmbeddedChunk],
        model_id: &str,
    ) -> Result<(), CacheError> {
        let record = CacheRecord {
            version: CACHE_FORMAT_VERSION,
            model_id: model_id.to_string(),
            built_at: Utc::now(),
            documents: documents.clone(),
            chunks: chunks.to_vec(),
        };
        let bytes = serde_json::to_vec(&record)?;

        let path = self.path.clone();
        tokio::task::spawn_blocking(move || write_atomically(&path, &bytes))
            .await
            .map_err(|e| CacheError::Io {
                path: self.path.clone(),
                source: std::io::Error::other(e),
            })??;

        info!(
            path = %self.path.display(),
            chunks = chunks.len(),
            model_id,
            "Saved corpus cache"
        );
        Ok(())
    }

    /// Load the cached document summary and chunk sequence for `model_id`,
    /// or `None` on any kind of miss: no cache file, unreadable bytes,
    /// unknown format version, or a cache built with a different model.
    pub async fn load(
        &self,
        model_id: &str,
    ) -> Option<(DocumentSetSummary, Vec<EmbeddedChunk>)> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "No corpus cache present");
                return None;
            }
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Could not read corpus cache");
                return None;
            }
        };

        let record: CacheRecord = match serde_json::from_slice(&bytes) {
            Ok(record) => record,
            Err(e) => {
                warn!(
                    path = %self.path.display(),
                    error = %e,
                    "Corpus cache is corrupt, treating as a miss"
                );
                return None;
            }
        };

        if record.version != CACHE_FORMAT_VERSION {
            warn!(
                found = record.version,
                expected = CACHE_FORMAT_VERSION,
                "Corpus cache has an unknown format version, treating as a miss"
            );
            return None;
        }

        if record.model_id != model_id {
            warn!(
                cached = %record.model_id,
                requested = %model_id,
                "Corpus cache was built with a different embedding model, treating as a miss"
            );
            return None;
        }

        info!(
            path = %self.path.display(),
            documents = record.documents.total_documents,
            chunks = record.chunks.len(),
            built_at = %record.built_at,
            "Loaded corpus cache"
        );
        Some((record.documents, record.chunks))
    }
}

fn write_atomically(path: &Path, bytes: &[u8]) -> Result<(), CacheError> {
    let directory = path.parent().unwrap_or_else(|| Path::new("."));
    std::fs::create_dir_all(directory).map_err(|source| CacheError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let mut temp = tempfile::NamedTempFile::new_in(directory).map_err(|source| CacheError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    temp.write_all(bytes).map_err(|source| CacheError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    temp.persist(path).map_err(|e| CacheError::Io {
        path: path.to_path_buf(),
        source: e.error,
    })?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::DocumentSummary;
    use sift_chunk::{Chunk, ChunkMetadata, FileType};
    use tempfile::tempdir;

    fn sample_documents() -> DocumentSetSummary {
        DocumentSetSummary {
            total_documents: 2,
            total_pages: 4,
            total_words: 12,
            documents: vec![
                DocumentSummary {
                    file_name: "manual.pdf".to_string(),
                    file_type: FileType::Pdf,
                    total_pages: 3,
                    total_words: 6,
                },
                DocumentSummary {
                    file_name: "terms.txt".to_string(),
                    file_type: FileType::Text,
                    total_pages: 1,
                    total_words: 6,
                },
            ],
        }
    }

    fn sample_chunks() -> Vec<EmbeddedChunk> {
        vec![
            EmbeddedChunk {
                chunk: Chunk {
                    content: "The turbine manual covers bearing wear.".to_string(),
                    file_name: "manual.pdf".to_string(),
                    file_type: FileType::Pdf,
                    page_number: 3,
                    chunk_index: 0,
                    metadata: ChunkMetadata {
                        word_count: 6,
                        char_count: 40,
                    },
                },
                embedding: vec![0.123456789, -0.987654321, 0.5],
            },
            EmbeddedChunk {
                chunk: Chunk {
                    content: "Invoices are due within thirty days.".to_string(),
                    file_name: "terms.txt".to_string(),
                    file_type: FileType::Text,
                    page_number: 1,
                    chunk_index: 1,
                    metadata: ChunkMetadata {
                        word_count: 6,
                        char_count: 36,
                    },
                },
                embedding: vec![f32::MIN_POSITIVE, 1.0e-20, 3.4e38],
            },
        ]
    }

    #[tokio::test]
    async fn test_round_trip_is_bit_exact() {
        let dir = tempdir().unwrap();
        let cache = CorpusCache::new(dir.path().join("corpus.json"));
        let documents = sample_documents();
        let chunks = sample_chunks();

        cache
            .save(&documents, &chunks, "text-embedding-3-small")
            .await
            .unwrap();
        let (restored_documents, restored) =
            cache.load("text-embedding-3-small").await.unwrap();

        assert_eq!(restored_documents, documents);
        assert_eq!(restored, chunks);
        for (restored, original) in restored.iter().zip(chunks.iter()) {
            for (a, b) in restored.embedding.iter().zip(original.embedding.iter()) {
                assert_eq!(a.to_bits(), b.to_bits());
            }
        }
    }

    #[tokio::test]
    async fn test_missing_file_is_a_miss() {
        let dir = tempdir().unwrap();
        let cache = CorpusCache::new(dir.path().join("absent.json"));
        assert!(cache.load("any-model").await.is_none());
    }

    #[tokio::test]
    async fn test_model_mismatch_is_a_miss() {
        let dir = tempdir().unwrap();
        let cache = CorpusCache::new(dir.path().join("corpus.json"));

        cache
            .save(&sample_documents(), &sample_chunks(), "model-a")
            .await
            .unwrap();
        assert!(cache.load("model-b").await.is_none());
        assert!(cache.load("model-a").await.is_some());
    }

    #[tokio::test]
    async fn test_corrupt_bytes_are_a_miss() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("corpus.json");
        std::fs::write(&path, b"{ definitely not a cache").unwrap();

        let cache = CorpusCache::new(&path);
        assert!(cache.load("model-a").await.is_none());
    }

    #[tokio::test]
    async fn test_unknown_version_is_a_miss() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("corpus.json");
        std::fs::write(
            &path,
            br#"{"version": 99, "model_id": "model-a", "built_at": "2026-01-01T00:00:00Z",
                 "documents": {"total_documents": 0, "total_pages": 0, "total_words": 0, "documents": []},
                 "chunks": []}"#,
        )
        .unwrap();

        let cache = CorpusCache::new(&path);
        assert!(cache.load("model-a").await.is_none());
    }

    #[tokio::test]
    async fn test_save_overwrites_previous_cache() {
        let dir = tempdir().unwrap();
        let cache = CorpusCache::new(dir.path().join("corpus.json"));
        let documents = sample_documents();
        let chunks = sample_chunks();

        cache.save(&documents, &chunks, "model-a").await.unwrap();
        cache
            .save(&documents, &chunks[..1], "model-a")
            .await
            .unwrap();

        let (_, restored) = cache.load("model-a").await.unwrap();
        assert_eq!(restored.len(), 1);
    }
}

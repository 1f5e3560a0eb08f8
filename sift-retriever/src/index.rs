//! In-memory similarity index over embedded chunks.
//!
//! The index is built once per corpus and never mutated afterwards; rebuilds
//! produce a fresh index and swap it in wholesale, so concurrent `rank`
//! calls need no locking.

use serde::{Deserialize, Serialize};
use sift_chunk::Chunk;

/// A chunk paired with the embedding that was generated for it. Immutable
/// once constructed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbeddedChunk {
    pub chunk: Chunk,
    pub embedding: Vec<f32>,
}

/// One ranked result: a position into the corpus chunk sequence plus its
/// cosine similarity to the query.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ranked {
    pub position: usize,
    pub score: f32,
}

/// Ranking interface over an embedded corpus.
///
/// Kept separate from the concrete scan so a faster (e.g. approximate
/// nearest neighbor) index can be substituted without touching callers;
/// corpus sizes here are small enough that the linear scan is fine.
pub trait SimilarityIndex: Send + Sync {
    /// Rank the `k` most similar chunks to `query`, descending by cosine
    /// similarity, ties broken by (file_name, page_number, chunk_index)
    /// ascending. Never mutates the index.
    fn rank(&self, query: &[f32], k: usize) -> Vec<Ranked>;

    /// Number of chunks in the index.
    fn len(&self) -> usize;

    /// `true` when the index holds no chunks.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Cosine similarity dot(a,b)/(‖a‖·‖b‖). Defined as 0.0 when either vector
/// has zero norm (or the lengths differ): never NaN, never panics.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }

    let mut dot = 0.0f32;
    let mut norm_a = 0.0f32;
    let mut norm_b = 0.0f32;
    for (x, y) in a.iter().zip(b.iter()) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot / (norm_a.sqrt() * norm_b.sqrt())
}

/// O(n)-per-query index: a full scan over the chunk sequence.
pub struct LinearIndex {
    chunks: Vec<EmbeddedChunk>,
}

impl LinearIndex {
    pub fn new(chunks: Vec<EmbeddedChunk>) -> Self {
        Self { chunks }
    }

    pub fn chunks(&self) -> &[EmbeddedChunk] {
        &self.chunks
    }
}

impl SimilarityIndex for LinearIndex {
    fn rank(&self, query: &[f32], k: usize) -> Vec<Ranked> {
        let mut scored: Vec<Ranked> = self
            .chunks
            .iter()
            .enumerate()
            .map(|(position, embedded)| Ranked {
                position,
                score: cosine_similarity(query, &embedded.embedding),
            })
            .collect();

        // total_cmp keeps the sort total even for pathological inputs;
        // the identity tuple makes equal scores deterministic.
        scored.sort_by(|a, b| {
            b.score
                .total_cmp(&a.score)
                .then_with(|| {
                    self.chunks[a.position]
                        .chunk
                        .identity()
                        .cmp(&self.chunks[b.position].chunk.identity())
                })
        });

        scored.truncate(k);
        scored
    }

    fn len(&self) -> usize {
        self.chunks.len()
    }
}

//! Search response shaping: relevance tiers, per-file insights, and the
//! corpus summary view.

use crate::index::EmbeddedChunk;
use itertools::Itertools;
use serde::Serialize;
use sift_chunk::FileType;
use std::collections::BTreeSet;

/// Coarse relevance tier derived from cosine similarity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Relevance {
    High,
    Medium,
}

impl Relevance {
    /// `High` strictly above `high_threshold`, `Medium` otherwise. Callers
    /// filter out low-similarity chunks before tiering, so there is no low
    /// tier.
    pub fn from_similarity(similarity: f32, high_threshold: f32) -> Self {
        if similarity > high_threshold {
            Relevance::High
        } else {
            Relevance::Medium
        }
    }
}

/// One surfaced result: the best-matching chunk of a single file.
#[derive(Debug, Clone, Serialize)]
pub struct KeyInsight {
    pub file_name: String,
    pub file_type: FileType,
    pub page_number: u32,
    pub content: String,
    pub similarity: f32,
    pub relevance: Relevance,
}

/// The full answer to one search query.
#[derive(Debug, Clone, Serialize)]
pub struct SearchResponse {
    pub query: String,
    pub found: bool,
    /// Ranked chunk matches above the similarity floor, counted before
    /// grouping by file; can exceed `key_insights.len()`.
    pub total_results: usize,
    pub key_insights: Vec<KeyInsight>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl SearchResponse {
    /// A hit: one insight per matching file, best first. `total_results` is
    /// the number of chunk matches the insights were distilled from.
    pub fn hits(query: &str, total_results: usize, key_insights: Vec<KeyInsight>) -> Self {
        let summary = format!(
            "Found {} relevant documents with information about '{query}'",
            key_insights.len()
        );
        Self {
            query: query.to_string(),
            found: true,
            total_results,
            key_insights,
            summary: Some(summary),
            message: None,
        }
    }

    /// A miss: no chunk cleared the similarity floor (or the corpus is
    /// empty).
    pub fn not_found(query: &str) -> Self {
        Self {
            query: query.to_string(),
            found: false,
            total_results: 0,
            key_insights: Vec::new(),
            summary: None,
            message: Some(format!("No relevant information found for '{query}'")),
        }
    }
}

/// Per-file totals inside a [`CorpusSummary`].
#[derive(Debug, Clone, Serialize)]
pub struct FileSummary {
    pub file_name: String,
    pub file_type: FileType,
    pub chunks: usize,
    pub total_words: usize,
    /// Distinct page numbers that contributed chunks, ascending.
    pub pages: Vec<u32>,
}

/// What the corpus currently holds, grouped by file.
#[derive(Debug, Clone, Serialize)]
pub struct CorpusSummary {
    pub total_chunks: usize,
    pub total_files: usize,
    pub files: Vec<FileSummary>,
}

impl CorpusSummary {
    /// Summarize an embedded chunk sequence. Files appear in first-seen
    /// order, which the loader guarantees is sorted path order.
    pub fn from_chunks(chunks: &[EmbeddedChunk]) -> Self {
        let grouped = chunks
            .iter()
            .chunk_by(|embedded| embedded.chunk.file_name.as_str());
        let files: Vec<FileSummary> = grouped
            .into_iter()
            .map(|(file_name, group)| {
                let mut file_type = FileType::Text;
                let mut chunk_count = 0;
                let mut total_words = 0;
                let mut pages = BTreeSet::new();
                for embedded in group {
                    file_type = embedded.chunk.file_type;
                    chunk_count += 1;
                    total_words += embedded.chunk.metadata.word_count;
                    pages.insert(embedded.chunk.page_number);
                }
                FileSummary {
                    file_name: file_name.to_string(),
                    file_type,
                    chunks: chunk_count,
                    total_words,
                    pages: pages.into_iter().collect(),
                }
            })
            .collect();

        Self {
            total_chunks: chunks.len(),
            total_files: files.len(),
            files,
        }
    }
}

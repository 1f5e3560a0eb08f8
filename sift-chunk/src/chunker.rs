//! Sentence-boundary chunking of page text.
//!
//! The algorithm is a greedy accumulator: sentences are appended to a running
//! buffer until the next sentence would push the buffer past `max_chars`, at
//! which point the buffer is emitted as a chunk and the next buffer is seeded
//! with the trailing `overlap_chars` characters of the emitted chunk. The
//! overlap keeps context that straddles a chunk boundary retrievable from
//! either side.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

/// Sentence boundaries: one or more terminal punctuation marks. The
/// punctuation itself is consumed by the split, matching how the chunks are
/// later re-joined with single spaces.
static SENTENCE_BOUNDARY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[.!?]+").expect("sentence boundary pattern is valid"));

/// The kind of source file a chunk was extracted from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileType {
    Pdf,
    Text,
}

impl std::fmt::Display for FileType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FileType::Pdf => write!(f, "pdf"),
            FileType::Text => write!(f, "text"),
        }
    }
}

/// Derived counts cached on each chunk at creation time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkMetadata {
    pub word_count: usize,
    pub char_count: usize,
}

/// Where a page of text came from. Borrowed by the chunker so callers do not
/// clone the file name once per page.
#[derive(Debug, Clone, Copy)]
pub struct ChunkSource<'a> {
    pub file_name: &'a str,
    pub file_type: FileType,
    /// 1-based page number within the source document.
    pub page_number: u32,
}

/// A bounded span of text from one page: the unit of embedding and retrieval.
///
/// A chunk's identity is the tuple `(file_name, page_number, chunk_index)`.
/// Chunks are immutable once created; rebuilding a corpus replaces them
/// rather than mutating them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chunk {
    pub content: String,
    pub file_name: String,
    pub file_type: FileType,
    /// 1-based page number within the source document.
    pub page_number: u32,
    /// 0-based position of this chunk within its page.
    pub chunk_index: u32,
    pub metadata: ChunkMetadata,
}

impl Chunk {
    /// Identity tuple used for deterministic tie-breaking when ranking.
    pub fn identity(&self) -> (&str, u32, u32) {
        (&self.file_name, self.page_number, self.chunk_index)
    }
}

/// Splits page text into overlapping, size-bounded chunks along sentence
/// boundaries.
///
/// `max_chars` is a soft bound: a single sentence longer than `max_chars` is
/// emitted whole rather than split mid-sentence. The trailing partial buffer
/// is always emitted as a final chunk.
#[derive(Debug, Clone)]
pub struct Chunker {
    max_chars: usize,
    overlap_chars: usize,
}

impl Default for Chunker {
    fn default() -> Self {
        Self::new(1000, 200)
    }
}

impl Chunker {
    pub fn new(max_chars: usize, overlap_chars: usize) -> Self {
        Self {
            max_chars,
            overlap_chars,
        }
    }

    pub fn max_chars(&self) -> usize {
        self.max_chars
    }

    pub fn overlap_chars(&self) -> usize {
        self.overlap_chars
    }

    /// Split one page of text into ordered chunks.
    ///
    /// Returns an empty vector for text with no sentences (empty or
    /// whitespace-only input). `chunk_index` is assigned 0-based in emission
    /// order. For identical input and parameters the output is byte-for-byte
    /// reproducible.
    pub fn chunk_page(&self, text: &str, source: &ChunkSource<'_>) -> Vec<Chunk> {
        let sentences: Vec<&str> = SENTENCE_BOUNDARY
            .split(text)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .collect();

        let mut chunks: Vec<Chunk> = Vec::new();
        let mut current = String::new();

        for sentence in sentences {
            let would_overflow = char_count(&current) + char_count(sentence) > self.max_chars;
            if would_overflow && !current.is_empty() {
                let closed = self.finish(&current, source, chunks.len() as u32);
                let seed = tail_chars(&current, self.overlap_chars).to_string();
                chunks.push(closed);
                current = format!("{seed} {sentence}");
            } else if current.is_empty() {
                current.push_str(sentence);
            } else {
                current.push(' ');
                current.push_str(sentence);
            }
        }

        if !current.trim().is_empty() {
            let closed = self.finish(&current, source, chunks.len() as u32);
            chunks.push(closed);
        }

        chunks
    }

    fn finish(&self, buffer: &str, source: &ChunkSource<'_>, chunk_index: u32) -> Chunk {
        let content = buffer.trim().to_string();
        let metadata = ChunkMetadata {
            word_count: content.split_whitespace().count(),
            char_count: char_count(&content),
        };
        Chunk {
            content,
            file_name: source.file_name.to_string(),
            file_type: source.file_type,
            page_number: source.page_number,
            chunk_index,
            metadata,
        }
    }
}

fn char_count(s: &str) -> usize {
    s.chars().count()
}

/// The last `n` characters of `s`, respecting UTF-8 boundaries.
fn tail_chars(s: &str, n: usize) -> &str {
    let total = char_count(s);
    if total <= n {
        return s;
    }
    s.char_indices()
        .nth(total - n)
        .map(|(idx, _)| &s[idx..])
        .unwrap_or(s)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn source() -> ChunkSource<'static> {
        ChunkSource {
            file_name: "doc.txt",
            file_type: FileType::Text,
            page_number: 1,
        }
    }

    #[test]
    fn test_short_text_single_chunk() {
        let chunker = Chunker::default();
        let chunks = chunker.chunk_page("One sentence. Another sentence!", &source());

        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].content, "One sentence Another sentence");
        assert_eq!(chunks[0].chunk_index, 0);
        assert_eq!(chunks[0].metadata.word_count, 4);
        assert_eq!(chunks[0].metadata.char_count, 29);
    }

    #[test]
    fn test_empty_and_whitespace_text() {
        let chunker = Chunker::default();
        assert!(chunker.chunk_page("", &source()).is_empty());
        assert!(chunker.chunk_page("   \n\n  ", &source()).is_empty());
        assert!(chunker.chunk_page("...!!!", &source()).is_empty());
    }

    #[test]
    fn test_splits_when_over_max_chars() {
        let chunker = Chunker::new(60, 10);
        let text = (0..10)
            .map(|i| format!("Sentence number {i} has several words in it."))
            .collect::<Vec<_>>()
            .join(" ");

        let chunks = chunker.chunk_page(&text, &source());
        assert!(chunks.len() > 1);
        for (i, chunk) in chunks.iter().enumerate() {
            assert_eq!(chunk.chunk_index, i as u32);
            assert_eq!(chunk.page_number, 1);
            assert_eq!(chunk.file_name, "doc.txt");
        }
    }

    #[test]
    fn test_overlap_seeds_next_chunk() {
        let chunker = Chunker::new(40, 8);
        let text = "The first sentence is fairly long here. Short tail.";
        let chunks = chunker.chunk_page(text, &source());

        assert_eq!(chunks.len(), 2);
        let tail: String = chunks[0].content.chars().rev().take(8).collect();
        let tail: String = tail.chars().rev().collect();
        assert!(
            chunks[1].content.starts_with(&tail),
            "second chunk {:?} should start with overlap {:?}",
            chunks[1].content,
            tail
        );
    }

    #[test]
    fn test_oversized_sentence_kept_whole() {
        let chunker = Chunker::new(20, 5);
        let long = "This single sentence is much longer than the twenty character budget.";
        let chunks = chunker.chunk_page(long, &source());

        assert_eq!(chunks.len(), 1);
        assert_eq!(
            chunks[0].content,
            "This single sentence is much longer than the twenty character budget"
        );
    }

    #[test]
    fn test_trailing_buffer_always_emitted() {
        let chunker = Chunker::new(50, 10);
        let text = "A chunk-filling sentence with plenty of words inside. Tiny end.";
        let chunks = chunker.chunk_page(text, &source());

        assert!(chunks.len() >= 2);
        assert!(chunks.last().unwrap().content.contains("Tiny end"));
    }

    #[test]
    fn test_deterministic() {
        let chunker = Chunker::new(80, 16);
        let text = "Alpha beta gamma. Delta epsilon zeta! Eta theta iota? Kappa lambda mu. \
                    Nu xi omicron pi. Rho sigma tau upsilon.";

        let first = chunker.chunk_page(text, &source());
        let second = chunker.chunk_page(text, &source());
        assert_eq!(first, second);
    }

    #[test]
    fn test_multibyte_overlap_is_boundary_safe() {
        let chunker = Chunker::new(30, 6);
        let text = "Müller prüft die Turbinenschaufeln gründlich. Danach folgt die Prüfung der Lager.";
        // Must not panic slicing through a multi-byte character.
        let chunks = chunker.chunk_page(text, &source());
        assert!(!chunks.is_empty());
    }

    #[test]
    fn test_tail_chars() {
        assert_eq!(tail_chars("abcdef", 3), "def");
        assert_eq!(tail_chars("ab", 5), "ab");
        assert_eq!(tail_chars("äöü", 2), "öü");
    }
}

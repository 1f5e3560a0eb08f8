//! # sift-chunk
//!
//! Sentence-boundary chunking for the sift document retrieval system.
//!
//! This crate turns a page of extracted document text into a sequence of
//! overlapping, size-bounded [`Chunk`]s suitable for embedding. Chunk
//! boundaries follow sentence boundaries (`.`, `!`, `?`) so that a chunk is
//! always a run of whole sentences; the size limit is a soft bound because a
//! single sentence is never split.
//!
//! ## Quick Start
//!
//! ```
//! use sift_chunk::{Chunker, ChunkSource, FileType};
//!
//! let chunker = Chunker::default();
//! let source = ChunkSource {
//!     file_name: "manual.txt",
//!     file_type: FileType::Text,
//!     page_number: 1,
//! };
//!
//! let chunks = chunker.chunk_page("First sentence. Second sentence.", &source);
//! assert_eq!(chunks.len(), 1);
//! assert_eq!(chunks[0].chunk_index, 0);
//! assert_eq!(chunks[0].page_number, 1);
//! ```
//!
//! Chunking is deterministic: the same text and parameters always produce
//! byte-identical chunks, which keeps cached embeddings reusable across runs.

pub mod chunker;

pub use chunker::{Chunk, ChunkMetadata, ChunkSource, Chunker, FileType};

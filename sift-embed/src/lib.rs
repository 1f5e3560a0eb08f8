//! # sift-embed
//!
//! Embedding client for the sift document retrieval system.
//!
//! The crate exposes a small provider abstraction, [`EmbeddingProvider`],
//! and one concrete implementation, [`OpenAiEmbeddingClient`], which talks to
//! any OpenAI-compatible `/embeddings` endpoint over HTTP. The client is
//! stateless and model-pinned: every provider reports the exact model
//! identifier it embeds with, and that identifier travels with cached
//! corpora so a cache built under one model is never served for another.
//!
//! ## Quick Start
//!
//! ```no_run
//! use sift_embed::{EmbedConfig, EmbeddingProvider, OpenAiEmbeddingClient};
//!
//! # async fn example() -> sift_embed::Result<()> {
//! let config = EmbedConfig::default().with_api_key("sk-...");
//! let client = OpenAiEmbeddingClient::new(config)?;
//!
//! let texts = vec!["Hello world".to_string(), "How are you?".to_string()];
//! let result = client.embed_texts(&texts).await?;
//! println!("{} embeddings of dimension {}", result.len(), result.dimension);
//! # Ok(())
//! # }
//! ```
//!
//! ## Error Handling
//!
//! All operations return [`Result<T>`] using the crate's [`EmbedError`] type.
//! Retries are deliberately the consumer's responsibility: a transport
//! failure surfaces immediately and the caller decides whether to skip the
//! item or abort the whole run.

pub mod config;
pub mod error;
pub mod provider;

pub use config::EmbedConfig;
pub use error::{EmbedError, Result};
pub use provider::{EmbeddingProvider, EmbeddingResult, OpenAiEmbeddingClient};

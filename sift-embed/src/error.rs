//! Error types for the embedding client.

use std::time::Duration;

/// Result type for embedding operations.
pub type Result<T> = std::result::Result<T, EmbedError>;

/// Errors raised while calling the embedding service.
///
/// Per-item recovery policy belongs to the caller: the retrieval engine drops
/// a chunk whose embedding fails and only aborts a build when no chunk at all
/// could be embedded.
#[derive(Debug, thiserror::Error)]
pub enum EmbedError {
    /// No API key was configured or found in the environment.
    #[error("no API key configured: set OPENAI_API_KEY or provide one via EmbedConfig")]
    MissingApiKey,

    /// Transport-level failure (connection, TLS, malformed HTTP).
    #[error("transport error calling embedding service: {source}")]
    Transport {
        #[from]
        source: reqwest::Error,
    },

    /// The service answered with a non-success status.
    #[error("embedding service returned HTTP {status}: {message}")]
    Api { status: u16, message: String },

    /// The service answered 2xx but the body did not match the wire contract.
    #[error("malformed embedding response: {message}")]
    InvalidResponse { message: String },

    /// A caller-supplied deadline elapsed before the service answered.
    #[error("embedding request timed out after {0:?}")]
    Timeout(Duration),
}

impl EmbedError {
    /// Create an [`EmbedError::InvalidResponse`] with a custom message.
    pub fn invalid_response(message: impl Into<String>) -> Self {
        Self::InvalidResponse {
            message: message.into(),
        }
    }
}

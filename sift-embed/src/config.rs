//! Configuration for the embedding client.

use crate::error::{EmbedError, Result};
use std::time::Duration;

/// Default API base for OpenAI-compatible embedding services.
pub const DEFAULT_API_BASE: &str = "https://api.openai.com/v1";

/// Default embedding model.
pub const DEFAULT_MODEL: &str = "text-embedding-3-small";

/// Environment variable consulted when no API key is set explicitly.
pub const API_KEY_ENV_VAR: &str = "OPENAI_API_KEY";

/// Configuration for [`OpenAiEmbeddingClient`](crate::OpenAiEmbeddingClient).
///
/// Secrets are never hardcoded: the API key is either injected explicitly
/// via [`with_api_key`](Self::with_api_key) or read from `OPENAI_API_KEY`
/// when the client is constructed.
#[derive(Clone)]
pub struct EmbedConfig {
    /// Base URL of the embedding service (no trailing slash).
    pub api_base: String,
    /// Model identifier sent with every request and reported by the provider.
    pub model: String,
    /// Per-request timeout applied by the HTTP client.
    pub request_timeout: Option<Duration>,
    api_key: Option<String>,
}

impl Default for EmbedConfig {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
            model: DEFAULT_MODEL.to_string(),
            request_timeout: None,
            api_key: None,
        }
    }
}

impl std::fmt::Debug for EmbedConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmbedConfig")
            .field("api_base", &self.api_base)
            .field("model", &self.model)
            .field("request_timeout", &self.request_timeout)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

impl EmbedConfig {
    /// Create a configuration for the given model with the default API base.
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            ..Self::default()
        }
    }

    /// Set the base URL of the embedding service (builder style).
    pub fn with_api_base(self, api_base: impl Into<String>) -> Self {
        Self {
            api_base: api_base.into(),
            ..self
        }
    }

    /// Set the API key explicitly (builder style).
    pub fn with_api_key(self, api_key: impl Into<String>) -> Self {
        Self {
            api_key: Some(api_key.into()),
            ..self
        }
    }

    /// Set the per-request timeout (builder style).
    pub fn with_request_timeout(self, timeout: Duration) -> Self {
        Self {
            request_timeout: Some(timeout),
            ..self
        }
    }

    /// Resolve the API key from the config or the `OPENAI_API_KEY`
    /// environment variable.
    pub fn resolve_api_key(&self) -> Result<String> {
        if let Some(key) = &self.api_key {
            return Ok(key.clone());
        }
        std::env::var(API_KEY_ENV_VAR)
            .ok()
            .filter(|key| !key.trim().is_empty())
            .ok_or(EmbedError::MissingApiKey)
    }

    /// URL of the embeddings endpoint.
    pub fn embeddings_url(&self) -> String {
        format!("{}/embeddings", self.api_base.trim_end_matches('/'))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = EmbedConfig::default();
        assert_eq!(config.api_base, DEFAULT_API_BASE);
        assert_eq!(config.model, DEFAULT_MODEL);
        assert!(config.request_timeout.is_none());
    }

    #[test]
    fn test_builder_methods() {
        let config = EmbedConfig::new("text-embedding-3-large")
            .with_api_base("http://localhost:8080/v1/")
            .with_api_key("sk-test")
            .with_request_timeout(Duration::from_secs(5));

        assert_eq!(config.model, "text-embedding-3-large");
        assert_eq!(config.embeddings_url(), "http://localhost:8080/v1/embeddings");
        assert_eq!(config.resolve_api_key().unwrap(), "sk-test");
        assert_eq!(config.request_timeout, Some(Duration::from_secs(5)));
    }

    #[test]
    fn test_debug_redacts_api_key() {
        let config = EmbedConfig::default().with_api_key("sk-very-secret");
        let rendered = format!("{config:?}");
        assert!(!rendered.contains("sk-very-secret"));
        assert!(rendered.contains("<redacted>"));
    }

    #[test]
    fn test_explicit_key_wins_over_env() {
        let config = EmbedConfig::default().with_api_key("sk-explicit");
        assert_eq!(config.resolve_api_key().unwrap(), "sk-explicit");
    }
}

//! Embedding provider trait and the OpenAI-compatible HTTP implementation.

use crate::config::EmbedConfig;
use crate::error::{EmbedError, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Result of embedding generation.
#[derive(Debug, Clone, PartialEq)]
pub struct EmbeddingResult {
    /// The generated embeddings, one per input text, in input order.
    pub embeddings: Vec<Vec<f32>>,
    /// The dimension of each embedding vector.
    pub dimension: usize,
}

impl EmbeddingResult {
    /// Create a result from a vector of embeddings. The dimension is
    /// inferred from the first embedding; an empty result has dimension 0.
    pub fn new(embeddings: Vec<Vec<f32>>) -> Self {
        let dimension = embeddings.first().map(|e| e.len()).unwrap_or(0);
        Self {
            embeddings,
            dimension,
        }
    }

    /// Number of embedding vectors in this result.
    pub fn len(&self) -> usize {
        self.embeddings.len()
    }

    /// `true` if this result contains no embedding vectors.
    pub fn is_empty(&self) -> bool {
        self.embeddings.is_empty()
    }
}

/// Trait for embedding providers that turn text into fixed-length vectors.
///
/// Batch embedding is purely a performance optimization: `embed_texts`
/// must return results in input order, and a provider is free to implement
/// `embed_text` on top of it. Providers are stateless and model-pinned —
/// [`model_id`](Self::model_id) always reports the model that produced the
/// vectors, which downstream cache validation depends on.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Generate an embedding for a single text.
    async fn embed_text(&self, text: &str) -> Result<Vec<f32>>;

    /// Generate embeddings for multiple texts. Output order matches input
    /// order.
    async fn embed_texts(&self, texts: &[String]) -> Result<EmbeddingResult>;

    /// Identifier of the embedding model this provider is pinned to.
    fn model_id(&self) -> &str;

    /// Name of this provider implementation.
    fn provider_name(&self) -> &str;
}

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingDatum>,
}

#[derive(Deserialize)]
struct EmbeddingDatum {
    index: usize,
    embedding: Vec<f32>,
}

/// Embedding client for OpenAI-compatible `/embeddings` endpoints.
#[derive(Debug, Clone)]
pub struct OpenAiEmbeddingClient {
    config: EmbedConfig,
    api_key: String,
    http: reqwest::Client,
}

impl OpenAiEmbeddingClient {
    /// Build a client from the given configuration. Fails fast when no API
    /// key can be resolved so that a misconfigured service is caught before
    /// the first corpus build.
    pub fn new(config: EmbedConfig) -> Result<Self> {
        let api_key = config.resolve_api_key()?;

        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = config.request_timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder.build()?;

        Ok(Self {
            config,
            api_key,
            http,
        })
    }

    async fn request_embeddings(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let url = self.config.embeddings_url();
        let request = EmbeddingRequest {
            model: &self.config.model,
            input: texts,
        };

        tracing::debug!(
            model = %self.config.model,
            inputs = texts.len(),
            "Requesting embeddings"
        );

        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| self.map_transport_error(e))?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(EmbedError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let body: EmbeddingResponse = response
            .json()
            .await
            .map_err(|e| EmbedError::invalid_response(e.to_string()))?;

        collate(body.data, texts.len())
    }

    fn map_transport_error(&self, error: reqwest::Error) -> EmbedError {
        match (error.is_timeout(), self.config.request_timeout) {
            (true, Some(timeout)) => EmbedError::Timeout(timeout),
            _ => EmbedError::Transport { source: error },
        }
    }
}

/// Re-order response data by its `index` field and verify one embedding came
/// back per input. Services may legally answer out of order.
fn collate(mut data: Vec<EmbeddingDatum>, expected: usize) -> Result<Vec<Vec<f32>>> {
    if data.len() != expected {
        return Err(EmbedError::invalid_response(format!(
            "expected {expected} embeddings, got {}",
            data.len()
        )));
    }

    data.sort_by_key(|datum| datum.index);
    for (position, datum) in data.iter().enumerate() {
        if datum.index != position {
            return Err(EmbedError::invalid_response(format!(
                "embedding indices are not contiguous: found {} at position {position}",
                datum.index
            )));
        }
    }

    Ok(data.into_iter().map(|datum| datum.embedding).collect())
}

#[async_trait]
impl EmbeddingProvider for OpenAiEmbeddingClient {
    async fn embed_text(&self, text: &str) -> Result<Vec<f32>> {
        let texts = [text.to_string()];
        let mut embeddings = self.request_embeddings(&texts).await?;
        embeddings
            .pop()
            .ok_or_else(|| EmbedError::invalid_response("no embedding generated for text"))
    }

    async fn embed_texts(&self, texts: &[String]) -> Result<EmbeddingResult> {
        if texts.is_empty() {
            return Ok(EmbeddingResult::new(vec![]));
        }
        let embeddings = self.request_embeddings(texts).await?;
        Ok(EmbeddingResult::new(embeddings))
    }

    fn model_id(&self) -> &str {
        &self.config.model
    }

    fn provider_name(&self) -> &str {
        "openai"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn datum(index: usize, embedding: Vec<f32>) -> EmbeddingDatum {
        EmbeddingDatum { index, embedding }
    }

    #[test]
    fn test_embedding_result() {
        let result = EmbeddingResult::new(vec![vec![0.1, 0.2, 0.3], vec![0.4, 0.5, 0.6]]);
        assert_eq!(result.len(), 2);
        assert_eq!(result.dimension, 3);
        assert!(!result.is_empty());

        let empty = EmbeddingResult::new(vec![]);
        assert!(empty.is_empty());
        assert_eq!(empty.dimension, 0);
    }

    #[test]
    fn test_collate_reorders_by_index() {
        let data = vec![
            datum(2, vec![3.0]),
            datum(0, vec![1.0]),
            datum(1, vec![2.0]),
        ];
        let collated = collate(data, 3).unwrap();
        assert_eq!(collated, vec![vec![1.0], vec![2.0], vec![3.0]]);
    }

    #[test]
    fn test_collate_rejects_count_mismatch() {
        let data = vec![datum(0, vec![1.0])];
        assert!(matches!(
            collate(data, 2),
            Err(EmbedError::InvalidResponse { .. })
        ));
    }

    #[test]
    fn test_collate_rejects_gappy_indices() {
        let data = vec![datum(0, vec![1.0]), datum(2, vec![2.0])];
        assert!(matches!(
            collate(data, 2),
            Err(EmbedError::InvalidResponse { .. })
        ));
    }

    #[test]
    fn test_response_parsing() {
        let body = r#"{
            "object": "list",
            "data": [
                {"object": "embedding", "index": 0, "embedding": [0.25, -0.5]},
                {"object": "embedding", "index": 1, "embedding": [1.0, 0.0]}
            ],
            "model": "text-embedding-3-small"
        }"#;
        let parsed: EmbeddingResponse = serde_json::from_str(body).unwrap();
        let collated = collate(parsed.data, 2).unwrap();
        assert_eq!(collated[0], vec![0.25, -0.5]);
        assert_eq!(collated[1], vec![1.0, 0.0]);
    }

    #[test]
    fn test_client_requires_api_key() {
        // Only run the negative case when the ambient environment has no key,
        // so the test stays hermetic on developer machines.
        if std::env::var(crate::config::API_KEY_ENV_VAR).is_err() {
            let result = OpenAiEmbeddingClient::new(EmbedConfig::default());
            assert!(matches!(result, Err(EmbedError::MissingApiKey)));
        }

        let client =
            OpenAiEmbeddingClient::new(EmbedConfig::default().with_api_key("sk-test")).unwrap();
        assert_eq!(client.provider_name(), "openai");
        assert_eq!(client.model_id(), "text-embedding-3-small");
    }
}

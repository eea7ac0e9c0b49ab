// ABOUTME: Embedding client abstraction and OpenAI implementation
// ABOUTME: Batches document texts into a single /embeddings request

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

const DEFAULT_EMBEDDING_MODEL: &str = "text-embedding-ada-002";
const DEFAULT_API_BASE: &str = "https://api.openai.com/v1";

#[derive(Error, Debug)]
pub enum EmbeddingError {
    #[error("Embedding API key not configured")]
    MissingApiKey,

    #[error("Embedding request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Embedding API returned {status}: {message}")]
    Api { status: u16, message: String },

    #[error("Embedding response missing data for input {index}")]
    MissingData { index: usize },
}

/// Turns texts into fixed-dimension vectors. One call per batch.
#[async_trait]
pub trait Embedder: Send + Sync {
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError>;
}

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Deserialize)]
struct EmbeddingData {
    index: usize,
    embedding: Vec<f32>,
}

pub struct OpenAiEmbedder {
    client: reqwest::Client,
    api_base: String,
    api_key: String,
    model: String,
}

impl OpenAiEmbedder {
    pub fn new(api_key: String) -> Self {
        Self::with_base(api_key, DEFAULT_API_BASE.to_string())
    }

    pub fn with_base(api_key: String, api_base: String) -> Self {
        Self {
            client: reqwest::Client::builder()
                .timeout(Duration::from_secs(30))
                .build()
                .unwrap_or_default(),
            api_base,
            api_key,
            model: std::env::var("AGENTDESK_EMBEDDING_MODEL")
                .unwrap_or_else(|_| DEFAULT_EMBEDDING_MODEL.to_string()),
        }
    }
}

#[async_trait]
impl Embedder for OpenAiEmbedder {
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        if self.api_key.is_empty() {
            return Err(EmbeddingError::MissingApiKey);
        }
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        debug!("Embedding batch of {} texts with {}", texts.len(), self.model);

        let response = self
            .client
            .post(format!("{}/embeddings", self.api_base))
            .bearer_auth(&self.api_key)
            .json(&EmbeddingRequest {
                model: &self.model,
                input: texts,
            })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(EmbeddingError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let body: EmbeddingResponse = response.json().await?;

        // The API may return results out of order; reassemble by index
        let mut vectors: Vec<Option<Vec<f32>>> = vec![None; texts.len()];
        for item in body.data {
            if let Some(slot) = vectors.get_mut(item.index) {
                *slot = Some(item.embedding);
            }
        }
        vectors
            .into_iter()
            .enumerate()
            .map(|(index, v)| v.ok_or(EmbeddingError::MissingData { index }))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{bearer_token, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_embed_batch_preserves_order() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/embeddings"))
            .and(bearer_token("test-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "data": [
                    {"index": 1, "embedding": [0.0, 1.0]},
                    {"index": 0, "embedding": [1.0, 0.0]}
                ]
            })))
            .mount(&server)
            .await;

        let embedder = OpenAiEmbedder::with_base("test-key".to_string(), server.uri());
        let vectors = embedder
            .embed(&["alpha".to_string(), "beta".to_string()])
            .await
            .unwrap();

        assert_eq!(vectors[0], vec![1.0, 0.0]);
        assert_eq!(vectors[1], vec![0.0, 1.0]);
    }

    #[tokio::test]
    async fn test_embed_api_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/embeddings"))
            .respond_with(ResponseTemplate::new(429).set_body_string("rate limited"))
            .mount(&server)
            .await;

        let embedder = OpenAiEmbedder::with_base("test-key".to_string(), server.uri());
        let err = embedder.embed(&["alpha".to_string()]).await.unwrap_err();
        assert!(matches!(err, EmbeddingError::Api { status: 429, .. }));
    }

    #[tokio::test]
    async fn test_missing_api_key() {
        let embedder = OpenAiEmbedder::new(String::new());
        let err = embedder.embed(&["alpha".to_string()]).await.unwrap_err();
        assert!(matches!(err, EmbeddingError::MissingApiKey));
    }

    #[tokio::test]
    async fn test_empty_input_skips_request() {
        let embedder = OpenAiEmbedder::new("key".to_string());
        assert!(embedder.embed(&[]).await.unwrap().is_empty());
    }
}

// ABOUTME: Chat completion client for OpenAI-compatible APIs
// ABOUTME: Handles request building, response parsing, and token usage

use std::env;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

const OPENAI_API_BASE: &str = "https://api.openai.com/v1";
const DEFAULT_MODEL: &str = "gpt-4o-mini";

#[derive(Debug, Error)]
pub enum AiServiceError {
    #[error("HTTP request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),

    #[error("API error {status}: {message}")]
    ApiError { status: u16, message: String },

    #[error("No API key configured")]
    NoApiKey,

    #[error("Response contained no choices")]
    EmptyResponse,
}

pub type AiServiceResult<T> = Result<T, AiServiceError>;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct Usage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

#[derive(Debug, Clone)]
pub struct ChatResponse {
    pub content: String,
    pub usage: Usage,
}

/// Produces a completion for a list of chat messages
#[async_trait]
pub trait ChatModel: Send + Sync {
    async fn complete(
        &self,
        messages: &[ChatMessage],
        temperature: f64,
    ) -> AiServiceResult<ChatResponse>;
}

#[derive(Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    temperature: f64,
}

#[derive(Deserialize)]
struct CompletionResponse {
    choices: Vec<Choice>,
    #[serde(default)]
    usage: Usage,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: String,
}

pub struct OpenAiChatModel {
    client: Client,
    api_base: String,
    api_key: Option<String>,
    model: String,
}

impl OpenAiChatModel {
    pub fn new() -> Self {
        Self::with_base(
            env::var("OPENAI_API_KEY").ok(),
            env::var("AGENTDESK_API_BASE").unwrap_or_else(|_| OPENAI_API_BASE.to_string()),
        )
    }

    pub fn with_base(api_key: Option<String>, api_base: String) -> Self {
        Self {
            client: Client::builder()
                .timeout(Duration::from_secs(120))
                .build()
                .unwrap_or_default(),
            api_base,
            api_key,
            model: env::var("AGENTDESK_CHAT_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string()),
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

impl Default for OpenAiChatModel {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ChatModel for OpenAiChatModel {
    async fn complete(
        &self,
        messages: &[ChatMessage],
        temperature: f64,
    ) -> AiServiceResult<ChatResponse> {
        let api_key = self.api_key.as_ref().ok_or(AiServiceError::NoApiKey)?;

        debug!("Chat completion with {} ({} messages)", self.model, messages.len());

        let response = self
            .client
            .post(format!("{}/chat/completions", self.api_base))
            .bearer_auth(api_key)
            .json(&CompletionRequest {
                model: &self.model,
                messages,
                temperature,
            })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(AiServiceError::ApiError {
                status: status.as_u16(),
                message,
            });
        }

        let body: CompletionResponse = response.json().await?;
        let choice = body.choices.into_iter().next().ok_or(AiServiceError::EmptyResponse)?;

        Ok(ChatResponse {
            content: choice.message.content,
            usage: body.usage,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_complete_parses_choice_and_usage() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(body_partial_json(serde_json::json!({"temperature": 0.3})))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "choices": [{"message": {"role": "assistant", "content": "Hello there"}}],
                "usage": {"prompt_tokens": 12, "completion_tokens": 3, "total_tokens": 15}
            })))
            .mount(&server)
            .await;

        let model = OpenAiChatModel::with_base(Some("test-key".to_string()), server.uri());
        let response = model
            .complete(&[ChatMessage::user("hi")], 0.3)
            .await
            .unwrap();

        assert_eq!(response.content, "Hello there");
        assert_eq!(response.usage.total_tokens, 15);
    }

    #[tokio::test]
    async fn test_complete_surfaces_api_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(500).set_body_string("upstream down"))
            .mount(&server)
            .await;

        let model = OpenAiChatModel::with_base(Some("test-key".to_string()), server.uri());
        let err = model.complete(&[ChatMessage::user("hi")], 0.7).await.unwrap_err();
        assert!(matches!(err, AiServiceError::ApiError { status: 500, .. }));
    }

    #[tokio::test]
    async fn test_complete_without_api_key() {
        let model = OpenAiChatModel::with_base(None, "http://localhost:1".to_string());
        let err = model.complete(&[ChatMessage::user("hi")], 0.7).await.unwrap_err();
        assert!(matches!(err, AiServiceError::NoApiKey));
    }
}

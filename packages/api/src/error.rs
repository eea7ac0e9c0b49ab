// ABOUTME: API error type mapping domain failures to HTTP responses
// ABOUTME: All handlers return Result<_, ApiError>

use axum::http::StatusCode;
use thiserror::Error;
use tracing::error;

use agentdesk_ai::{AiServiceError, RagError};
use agentdesk_core::ValidationError;
use agentdesk_storage::StorageError;
use agentdesk_vector::VectorError;

use crate::response::storage_status;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error("Missing or malformed Authorization header")]
    MissingToken,

    #[error("Invalid or revoked API token")]
    InvalidToken,

    #[error("Agent is inactive")]
    AgentInactive,

    #[error("Vector search failed")]
    Vector(#[from] VectorError),

    #[error("Chat completion failed")]
    Chat(#[from] AiServiceError),
}

impl From<RagError> for ApiError {
    fn from(err: RagError) -> Self {
        match err {
            RagError::Vector(e) => ApiError::Vector(e),
            RagError::Chat(e) => ApiError::Chat(e),
        }
    }
}

impl ApiError {
    pub fn status_and_message(&self) -> (StatusCode, String) {
        match self {
            ApiError::Validation(e) => (StatusCode::BAD_REQUEST, e.to_string()),
            ApiError::Storage(e) => storage_status(e),
            ApiError::MissingToken => (
                StatusCode::UNAUTHORIZED,
                "Missing or malformed Authorization header".to_string(),
            ),
            ApiError::InvalidToken => (
                StatusCode::UNAUTHORIZED,
                "Invalid or revoked API token".to_string(),
            ),
            ApiError::AgentInactive => {
                (StatusCode::FORBIDDEN, "This agent is inactive".to_string())
            }
            ApiError::Vector(e) => {
                error!("Vector search failed: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Failed to search documents".to_string(),
                )
            }
            ApiError::Chat(e) => {
                error!("Chat completion failed: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Failed to generate a response".to_string(),
                )
            }
        }
    }
}

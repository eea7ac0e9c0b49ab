// ABOUTME: HTTP request handlers for agent API token management
// ABOUTME: Tokens are shown in full exactly once, at creation time

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use tracing::info;

use crate::error::ApiError;
use crate::response::ApiResponse;
use crate::state::AppState;
use agentdesk_agents::{ApiToken, TokenUpdateInput};
use agentdesk_core::validate_token_label;

/// List an agent's tokens. Hashes are never serialized.
pub async fn list_tokens(
    State(state): State<AppState>,
    Path(agent_id): Path<String>,
) -> Result<Json<ApiResponse<Vec<ApiToken>>>, ApiError> {
    // 404 for unknown agents rather than an empty list
    state.agents.get_agent(&agent_id).await?;
    let tokens = state.tokens.list_tokens(&agent_id).await?;
    Ok(Json(ApiResponse::success(tokens)))
}

#[derive(Deserialize)]
pub struct CreateTokenRequest {
    pub label: String,
}

/// Generate a new token for an agent. The response carries the plaintext
/// token; only its hash is stored.
pub async fn create_token(
    State(state): State<AppState>,
    Path(agent_id): Path<String>,
    Json(request): Json<CreateTokenRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_token_label(&request.label)?;
    state.agents.get_agent(&agent_id).await?;

    let generated = state.tokens.create_token(&agent_id, &request.label).await?;
    info!(
        "Generated token {} for agent {}",
        generated.record.token_hint, agent_id
    );

    Ok((StatusCode::CREATED, Json(ApiResponse::success(generated))))
}

/// Update a token's label, or revoke/reactivate it
pub async fn update_token(
    State(state): State<AppState>,
    Path((agent_id, token_id)): Path<(String, String)>,
    Json(input): Json<TokenUpdateInput>,
) -> Result<Json<ApiResponse<ApiToken>>, ApiError> {
    if let Some(label) = &input.label {
        validate_token_label(label)?;
    }

    let token = state.tokens.update_token(&agent_id, &token_id, input).await?;
    Ok(Json(ApiResponse::success(token)))
}

// ABOUTME: Dashboard question-answering endpoint
// ABOUTME: Runs the RAG pipeline against a chosen agent without token auth

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::ApiError;
use crate::response::ApiResponse;
use crate::state::AppState;
use agentdesk_ai::ASK_RETRIEVAL_K;
use agentdesk_core::ValidationError;

#[derive(Deserialize)]
pub struct AskRequest {
    pub query: String,
    #[serde(rename = "agentId")]
    pub agent_id: String,
}

#[derive(Serialize)]
pub struct AskResponse {
    pub response: String,
    #[serde(rename = "documentsUsed")]
    pub documents_used: usize,
}

/// Answer a question against an agent's corpus
pub async fn ask(
    State(state): State<AppState>,
    Json(request): Json<AskRequest>,
) -> Result<Json<ApiResponse<AskResponse>>, ApiError> {
    if request.query.trim().is_empty() {
        return Err(ValidationError::Required { field: "query" }.into());
    }

    let agent = state.agents.get_agent(&request.agent_id).await?;
    if !agent.is_active {
        return Err(ApiError::AgentInactive);
    }
    info!("Ask request for agent {}", agent.id);

    let answer = state
        .rag
        .answer(
            &agent.id,
            &agent.system_prompt,
            agent.temperature,
            &request.query,
            ASK_RETRIEVAL_K,
        )
        .await?;

    Ok(Json(ApiResponse::success(AskResponse {
        response: answer.content,
        documents_used: answer.documents_used,
    })))
}

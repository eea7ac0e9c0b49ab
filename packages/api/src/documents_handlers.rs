// ABOUTME: HTTP request handlers for agent document corpora
// ABOUTME: Writes go to SQLite first, then the vector index is updated

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use tracing::{info, warn};

use crate::error::ApiError;
use crate::response::ApiResponse;
use crate::state::AppState;
use agentdesk_core::validate_document_input;
use agentdesk_documents::{AgentDocument, DocumentCreateInput};

/// List an agent's documents
pub async fn list_documents(
    State(state): State<AppState>,
    Path(agent_id): Path<String>,
) -> Result<Json<ApiResponse<Vec<AgentDocument>>>, ApiError> {
    state.agents.get_agent(&agent_id).await?;
    let documents = state.documents.list_documents(&agent_id).await?;
    Ok(Json(ApiResponse::success(documents)))
}

/// Add a document to an agent's corpus and index it
pub async fn create_document(
    State(state): State<AppState>,
    Path(agent_id): Path<String>,
    Json(input): Json<DocumentCreateInput>,
) -> Result<impl IntoResponse, ApiError> {
    validate_document_input(&input.title, &input.content)?;
    state.agents.get_agent(&agent_id).await?;

    let document = state.documents.create_document(&agent_id, input).await?;

    // Indexing failure leaves the row in place; the index backfills on next load
    if let Err(e) = state
        .vector_store
        .add_documents(&agent_id, std::slice::from_ref(&document))
        .await
    {
        warn!(
            "Document {} stored but not indexed for agent {}: {}",
            document.id, agent_id, e
        );
    }

    info!("Added document {} to agent {}", document.id, agent_id);
    Ok((StatusCode::CREATED, Json(ApiResponse::success(document))))
}

/// Delete one document and resync the agent's index
pub async fn delete_document(
    State(state): State<AppState>,
    Path((agent_id, document_id)): Path<(String, String)>,
) -> Result<Json<ApiResponse<serde_json::Value>>, ApiError> {
    state.documents.delete_document(&agent_id, &document_id).await?;
    let remaining = state.vector_store.sync_from_database(&agent_id).await?;

    info!(
        "Deleted document {} from agent {} ({} remaining)",
        document_id, agent_id, remaining
    );
    Ok(Json(ApiResponse::success(
        serde_json::json!({ "deleted": document_id, "remaining": remaining }),
    )))
}

/// Delete an agent's whole corpus and clear its index
pub async fn delete_all_documents(
    State(state): State<AppState>,
    Path(agent_id): Path<String>,
) -> Result<Json<ApiResponse<serde_json::Value>>, ApiError> {
    state.agents.get_agent(&agent_id).await?;
    let removed = state.documents.delete_all_documents(&agent_id).await?;
    state.vector_store.clear(&agent_id).await;

    info!("Deleted {} documents from agent {}", removed, agent_id);
    Ok(Json(ApiResponse::success(
        serde_json::json!({ "deleted": removed }),
    )))
}

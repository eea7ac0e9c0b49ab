// ABOUTME: HTTP request handlers for agent CRUD operations
// ABOUTME: Validates input, delegates to storage, and wraps results

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use tracing::info;

use crate::error::ApiError;
use crate::pagination::{PaginatedResponse, PaginationParams};
use crate::response::ApiResponse;
use crate::state::AppState;
use agentdesk_agents::{Agent, AgentCreateInput, AgentUpdateInput};
use agentdesk_core::validate_agent_input;

#[derive(Deserialize)]
pub struct ListAgentsQuery {
    #[serde(default, rename = "showInactive")]
    pub show_inactive: bool,
}

/// List agents, optionally including inactive ones
pub async fn list_agents(
    State(state): State<AppState>,
    Query(query): Query<ListAgentsQuery>,
    Query(pagination): Query<PaginationParams>,
) -> Result<impl IntoResponse, ApiError> {
    let (agents, total) = state
        .agents
        .list_agents(query.show_inactive, pagination.limit(), pagination.offset())
        .await?;

    Ok(Json(PaginatedResponse::new(agents, &pagination, total)))
}

/// Create a new agent
pub async fn create_agent(
    State(state): State<AppState>,
    Json(input): Json<AgentCreateInput>,
) -> Result<impl IntoResponse, ApiError> {
    validate_agent_input(&input.name, &input.description, input.temperature)?;

    let agent = state.agents.create_agent(input).await?;
    info!("Created agent {} ({})", agent.name, agent.id);

    Ok((StatusCode::CREATED, Json(ApiResponse::success(agent))))
}

/// Get a single agent by id
pub async fn get_agent(
    State(state): State<AppState>,
    Path(agent_id): Path<String>,
) -> Result<Json<ApiResponse<Agent>>, ApiError> {
    let agent = state.agents.get_agent(&agent_id).await?;
    Ok(Json(ApiResponse::success(agent)))
}

/// Update an agent's fields
pub async fn update_agent(
    State(state): State<AppState>,
    Path(agent_id): Path<String>,
    Json(input): Json<AgentUpdateInput>,
) -> Result<Json<ApiResponse<Agent>>, ApiError> {
    if input.name.is_some() || input.description.is_some() || input.temperature.is_some() {
        let current = state.agents.get_agent(&agent_id).await?;
        validate_agent_input(
            input.name.as_deref().unwrap_or(&current.name),
            input.description.as_deref().unwrap_or(&current.description),
            input.temperature.or(Some(current.temperature)),
        )?;
    }

    let agent = state.agents.update_agent(&agent_id, input).await?;
    Ok(Json(ApiResponse::success(agent)))
}

/// Delete an agent, its documents, tokens, and vector index
pub async fn delete_agent(
    State(state): State<AppState>,
    Path(agent_id): Path<String>,
) -> Result<Json<ApiResponse<serde_json::Value>>, ApiError> {
    // Tokens and documents go with the agent via foreign keys
    state.agents.delete_agent(&agent_id).await?;
    state.vector_store.clear(&agent_id).await;
    state.rate_limiters.remove_agent(&agent_id);
    info!("Deleted agent {}", agent_id);

    Ok(Json(ApiResponse::success(
        serde_json::json!({ "deleted": agent_id }),
    )))
}

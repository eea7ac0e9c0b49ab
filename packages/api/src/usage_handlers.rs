// ABOUTME: HTTP request handlers for agent usage logs and statistics

use axum::{
    extract::{Path, Query, State},
    Json,
};

use crate::error::ApiError;
use crate::pagination::{PaginatedResponse, PaginationParams};
use crate::response::ApiResponse;
use crate::state::AppState;
use agentdesk_ai::{ApiUsageLog, ApiUsageStats};

/// List an agent's usage logs, newest first
pub async fn list_usage_logs(
    State(state): State<AppState>,
    Path(agent_id): Path<String>,
    Query(pagination): Query<PaginationParams>,
) -> Result<Json<PaginatedResponse<ApiUsageLog>>, ApiError> {
    state.agents.get_agent(&agent_id).await?;

    let logs = state
        .usage_logs
        .list_logs(&agent_id, pagination.limit(), pagination.offset())
        .await?;
    let stats = state.usage_logs.get_stats(&agent_id).await?;

    Ok(Json(PaginatedResponse::new(
        logs,
        &pagination,
        stats.total_requests,
    )))
}

/// Aggregate usage statistics for an agent
pub async fn get_usage_stats(
    State(state): State<AppState>,
    Path(agent_id): Path<String>,
) -> Result<Json<ApiResponse<ApiUsageStats>>, ApiError> {
    state.agents.get_agent(&agent_id).await?;
    let stats = state.usage_logs.get_stats(&agent_id).await?;
    Ok(Json(ApiResponse::success(stats)))
}

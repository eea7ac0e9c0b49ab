// ABOUTME: HTTP API layer for Agentdesk providing REST endpoints and routing
// ABOUTME: Integration layer that depends on all domain packages

use axum::{
    routing::{delete, get, post, put},
    Json, Router,
};

pub mod agents_handlers;
pub mod ask_handlers;
pub mod documents_handlers;
pub mod error;
pub mod invoke_handlers;
pub mod pagination;
pub mod rate_limit;
pub mod response;
pub mod state;
pub mod tokens_handlers;
pub mod usage_handlers;

pub use state::AppState;


/// Creates the agents API router, nested under /api/agents
pub fn create_agents_router() -> Router<AppState> {
    Router::new()
        .route("/", get(agents_handlers::list_agents))
        .route("/", post(agents_handlers::create_agent))
        .route("/{agent_id}", get(agents_handlers::get_agent))
        .route("/{agent_id}", put(agents_handlers::update_agent))
        .route("/{agent_id}", delete(agents_handlers::delete_agent))
        // Token management
        .route("/{agent_id}/tokens", get(tokens_handlers::list_tokens))
        .route("/{agent_id}/tokens", post(tokens_handlers::create_token))
        .route(
            "/{agent_id}/tokens/{token_id}",
            put(tokens_handlers::update_token),
        )
        // Document corpus
        .route(
            "/{agent_id}/documents",
            get(documents_handlers::list_documents),
        )
        .route(
            "/{agent_id}/documents",
            post(documents_handlers::create_document),
        )
        .route(
            "/{agent_id}/documents",
            delete(documents_handlers::delete_all_documents),
        )
        .route(
            "/{agent_id}/documents/{document_id}",
            delete(documents_handlers::delete_document),
        )
        // Usage logs
        .route("/{agent_id}/usage", get(usage_handlers::list_usage_logs))
        .route(
            "/{agent_id}/usage/stats",
            get(usage_handlers::get_usage_stats),
        )
}

/// Builds the complete application router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .nest("/api/agents", create_agents_router())
        .route("/api/ask", post(ask_handlers::ask))
        .route("/api/invoke", post(invoke_handlers::invoke_agent))
        .route("/api/health", get(health))
        .with_state(state)
}

/// Liveness check
async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

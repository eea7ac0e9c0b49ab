// ABOUTME: Agentdesk server bootstrap
// ABOUTME: Wires config, database, AI clients, and the HTTP router together

use std::net::SocketAddr;
use std::sync::Arc;

use axum::http::Method;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

pub mod config;

use agentdesk_ai::OpenAiChatModel;
use agentdesk_api::{create_router, AppState};
use agentdesk_storage::connect_pool;
use agentdesk_vector::OpenAiEmbedder;
use config::Config;

pub async fn run_server() -> anyhow::Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "agentdesk=info,tower_http=warn".into()),
        )
        .init();

    let config = Config::from_env()?;

    if config.openai_api_key.is_none() {
        warn!("OPENAI_API_KEY is not set; document indexing and invocations will fail");
    }

    let pool = connect_pool(&config.database_path).await?;
    info!("Using database at {}", config.database_path.display());

    let embedder = Arc::new(OpenAiEmbedder::new(
        config.openai_api_key.clone().unwrap_or_default(),
    ));
    let chat_model = Arc::new(OpenAiChatModel::new());
    let state = AppState::new(pool, embedder, chat_model);

    // Create CORS layer
    let cors = CorsLayer::new()
        .allow_origin(config.cors_origin.parse::<axum::http::HeaderValue>()?)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers(Any);

    let app = create_router(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http());

    let addr = SocketAddr::from(([127, 0, 0, 1], config.port));
    info!("Agentdesk listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

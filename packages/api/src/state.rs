// ABOUTME: Shared application state handed to every API handler
// ABOUTME: Owns the database pool, storages, vector store, and AI clients

use std::sync::Arc;

use sqlx::SqlitePool;

use crate::rate_limit::InvokeRateLimiters;
use agentdesk_agents::{AgentStorage, TokenStorage};
use agentdesk_ai::{ChatModel, RagPipeline, UsageLogStorage};
use agentdesk_documents::DocumentStorage;
use agentdesk_vector::{AgentVectorStore, Embedder};

#[derive(Clone)]
pub struct AppState {
    pub pool: SqlitePool,
    pub agents: Arc<AgentStorage>,
    pub tokens: Arc<TokenStorage>,
    pub documents: Arc<DocumentStorage>,
    pub usage_logs: Arc<UsageLogStorage>,
    pub vector_store: Arc<AgentVectorStore>,
    pub rag: Arc<RagPipeline>,
    pub rate_limiters: InvokeRateLimiters,
}

impl AppState {
    pub fn new(
        pool: SqlitePool,
        embedder: Arc<dyn Embedder>,
        chat_model: Arc<dyn ChatModel>,
    ) -> Self {
        let documents = Arc::new(DocumentStorage::new(pool.clone()));
        let vector_store = Arc::new(AgentVectorStore::new(documents.clone(), embedder));
        let rag = Arc::new(RagPipeline::new(vector_store.clone(), chat_model));

        Self {
            agents: Arc::new(AgentStorage::new(pool.clone())),
            tokens: Arc::new(TokenStorage::new(pool.clone())),
            usage_logs: Arc::new(UsageLogStorage::new(pool.clone())),
            documents,
            vector_store,
            rag,
            rate_limiters: InvokeRateLimiters::new(),
            pool,
        }
    }
}

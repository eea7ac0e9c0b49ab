// ABOUTME: AI layer for agent question answering
// ABOUTME: Chat completion client, retrieval pipeline, and usage log storage

pub mod rag;
pub mod service;
pub mod usage_logs;

pub use rag::{RagAnswer, RagError, RagPipeline, ASK_RETRIEVAL_K, INVOKE_RETRIEVAL_K, NO_DOCUMENTS_ANSWER};
pub use service::{
    AiServiceError, AiServiceResult, ChatMessage, ChatModel, ChatResponse, OpenAiChatModel, Usage,
};
pub use usage_logs::{ApiUsageLog, ApiUsageStats, NewUsageLog, UsageLogStorage};

// ABOUTME: Agent document corpus domain for Agentdesk
// ABOUTME: CRUD storage for documents plus persisted embedding cache access

pub mod storage;
pub mod types;

pub use storage::DocumentStorage;
pub use types::{AgentDocument, DocumentCreateInput, EmbeddedDocument};

// ABOUTME: Document type definitions
// ABOUTME: Structures for agent corpus documents and their embedding cache

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One document in an agent's corpus. The embedding column is a derived
/// cache and is never serialized in API responses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentDocument {
    pub id: String,
    #[serde(rename = "agentId")]
    pub agent_id: String,
    pub title: String,
    pub content: String,
    pub metadata: serde_json::Value,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "updatedAt")]
    pub updated_at: DateTime<Utc>,
}

/// Fields accepted when ingesting a document
#[derive(Debug, Clone, Deserialize)]
pub struct DocumentCreateInput {
    pub title: String,
    pub content: String,
    pub metadata: Option<serde_json::Value>,
}

/// A document row together with its persisted embedding, if any.
/// Used when (re)building an agent's vector index.
#[derive(Debug, Clone)]
pub struct EmbeddedDocument {
    pub document: AgentDocument,
    pub embedding: Option<Vec<f32>>,
}

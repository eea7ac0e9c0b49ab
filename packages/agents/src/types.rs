// ABOUTME: Agent type definitions
// ABOUTME: Structures for agents, rate limits, and embedded API tokens

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Per-agent sliding-window rate limit configuration
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct RateLimit {
    pub requests: u32,
    #[serde(rename = "windowSeconds")]
    pub window_seconds: u64,
}

/// A named chatbot persona with its own corpus, prompt, and tokens
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Agent {
    pub id: String,
    pub name: String,
    pub description: String,
    #[serde(rename = "avatarUrl")]
    pub avatar_url: Option<String>,
    #[serde(rename = "systemPrompt")]
    pub system_prompt: String,
    #[serde(rename = "isActive")]
    pub is_active: bool,
    /// External model API key. Never serialized in responses.
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    pub temperature: f64,
    #[serde(rename = "rateLimit")]
    pub rate_limit: Option<RateLimit>,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "updatedAt")]
    pub updated_at: DateTime<Utc>,
}

/// Fields accepted when creating an agent
#[derive(Debug, Clone, Deserialize)]
pub struct AgentCreateInput {
    pub name: String,
    pub description: String,
    #[serde(rename = "avatarUrl")]
    pub avatar_url: Option<String>,
    #[serde(rename = "systemPrompt")]
    pub system_prompt: Option<String>,
    #[serde(rename = "isActive")]
    pub is_active: Option<bool>,
    #[serde(rename = "apiKey")]
    pub api_key: Option<String>,
    pub temperature: Option<f64>,
    #[serde(rename = "rateLimit")]
    pub rate_limit: Option<RateLimit>,
}

/// Fields accepted when updating an agent; absent fields are left untouched
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AgentUpdateInput {
    pub name: Option<String>,
    pub description: Option<String>,
    #[serde(rename = "avatarUrl")]
    pub avatar_url: Option<String>,
    #[serde(rename = "systemPrompt")]
    pub system_prompt: Option<String>,
    #[serde(rename = "isActive")]
    pub is_active: Option<bool>,
    #[serde(rename = "apiKey")]
    pub api_key: Option<String>,
    pub temperature: Option<f64>,
    /// Replaces the current limit; a zeroed quota removes it
    #[serde(rename = "rateLimit")]
    pub rate_limit: Option<RateLimit>,
}

/// API token belonging to one agent. The secret itself is never stored,
/// only its SHA-256 hash; `token_hint` keeps the last characters for display.
#[derive(Debug, Clone, Serialize)]
pub struct ApiToken {
    pub id: String,
    #[serde(rename = "agentId")]
    pub agent_id: String,
    #[serde(skip_serializing)]
    pub token_hash: String,
    #[serde(rename = "tokenHint")]
    pub token_hint: String,
    pub label: String,
    #[serde(rename = "isActive")]
    pub is_active: bool,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "lastUsedAt")]
    pub last_used_at: Option<DateTime<Utc>>,
    #[serde(rename = "revokedAt")]
    pub revoked_at: Option<DateTime<Utc>>,
}

/// Token generation result - includes the plaintext secret for display.
/// This is the ONLY time the plaintext is available.
#[derive(Debug, Clone, Serialize)]
pub struct TokenGeneration {
    pub token: String,
    pub record: ApiToken,
}

/// Mutable token fields: rename, or soft-revoke/re-activate
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TokenUpdateInput {
    pub label: Option<String>,
    #[serde(rename = "isActive")]
    pub is_active: Option<bool>,
}

// ABOUTME: Agent and API token domain for Agentdesk
// ABOUTME: CRUD storage for agents plus hashed bearer-token management

pub mod storage;
pub mod tokens;
pub mod types;

pub use storage::AgentStorage;
pub use tokens::TokenStorage;
pub use types::{
    Agent, AgentCreateInput, AgentUpdateInput, ApiToken, RateLimit, TokenGeneration,
    TokenUpdateInput,
};

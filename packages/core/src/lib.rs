// ABOUTME: Core constants, id generation, and input validation for Agentdesk
// ABOUTME: Foundational package shared across all Agentdesk packages

pub mod constants;
pub mod utils;
pub mod validation;

pub use constants::{agentdesk_dir, default_database_path};
pub use utils::generate_id;
pub use validation::{
    validate_agent_input, validate_document_input, validate_token_label, ValidationError,
};

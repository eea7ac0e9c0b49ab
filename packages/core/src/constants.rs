use std::env;
use std::path::PathBuf;

/// Maximum length of an agent name
pub const MAX_AGENT_NAME_LEN: usize = 50;

/// Maximum length of an agent description
pub const MAX_AGENT_DESCRIPTION_LEN: usize = 500;

/// Maximum length of a document title
pub const MAX_DOCUMENT_TITLE_LEN: usize = 200;

/// Maximum length of an API token label
pub const MAX_TOKEN_LABEL_LEN: usize = 100;

/// Default system prompt given to newly created agents
pub const DEFAULT_SYSTEM_PROMPT: &str =
    "You are a specialized assistant that answers questions based on the provided documents.";

/// Default sampling temperature for agents
pub const DEFAULT_TEMPERATURE: f64 = 0.7;

/// Get the path to the Agentdesk directory (~/.agentdesk)
pub fn agentdesk_dir() -> PathBuf {
    // First try HOME environment variable (useful for tests)
    if let Ok(home) = env::var("HOME") {
        PathBuf::from(home).join(".agentdesk")
    } else {
        // Fall back to dirs crate for normal usage
        dirs::home_dir()
            .expect("Unable to get home directory")
            .join(".agentdesk")
    }
}

/// Get the default path to the SQLite database (~/.agentdesk/agentdesk.db)
pub fn default_database_path() -> PathBuf {
    agentdesk_dir().join("agentdesk.db")
}

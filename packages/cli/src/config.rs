// ABOUTME: Environment-driven server configuration
// ABOUTME: Port, CORS origin, database path, and OpenAI credentials

use std::env;
use std::num::ParseIntError;
use std::path::PathBuf;
use thiserror::Error;

use agentdesk_core::default_database_path;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid port number: {0}")]
    InvalidPort(#[from] ParseIntError),
    #[error("Port {0} is out of valid range (1-65535)")]
    PortOutOfRange(u16),
}

#[derive(Debug)]
pub struct Config {
    pub port: u16,
    pub cors_origin: String,
    pub database_path: PathBuf,
    pub openai_api_key: Option<String>,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        let port_str = env::var("PORT").unwrap_or_else(|_| "4601".to_string());
        let port = port_str.parse::<u16>()?;
        if port == 0 {
            return Err(ConfigError::PortOutOfRange(port));
        }

        let cors_origin =
            env::var("CORS_ORIGIN").unwrap_or_else(|_| "http://localhost:5173".to_string());

        let database_path = env::var("AGENTDESK_DB_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| default_database_path());

        let openai_api_key = env::var("OPENAI_API_KEY").ok().filter(|k| !k.is_empty());

        Ok(Config {
            port,
            cors_origin,
            database_path,
            openai_api_key,
        })
    }
}

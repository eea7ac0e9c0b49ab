// ABOUTME: Input validation for agent, document, and token payloads
// ABOUTME: Length and presence checks shared by the API handlers

use thiserror::Error;

use crate::constants::{
    MAX_AGENT_DESCRIPTION_LEN, MAX_AGENT_NAME_LEN, MAX_DOCUMENT_TITLE_LEN, MAX_TOKEN_LABEL_LEN,
};

#[derive(Error, Debug, PartialEq)]
pub enum ValidationError {
    #[error("{field} is required")]
    Required { field: &'static str },
    #[error("{field} cannot be longer than {max} characters")]
    TooLong { field: &'static str, max: usize },
    #[error("temperature must be between 0 and 2")]
    TemperatureOutOfRange,
}

fn require(field: &'static str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::Required { field });
    }
    Ok(())
}

fn max_len(field: &'static str, value: &str, max: usize) -> Result<(), ValidationError> {
    if value.chars().count() > max {
        return Err(ValidationError::TooLong { field, max });
    }
    Ok(())
}

/// Validate agent name, description, and optional temperature
pub fn validate_agent_input(
    name: &str,
    description: &str,
    temperature: Option<f64>,
) -> Result<(), ValidationError> {
    require("name", name)?;
    max_len("name", name, MAX_AGENT_NAME_LEN)?;
    require("description", description)?;
    max_len("description", description, MAX_AGENT_DESCRIPTION_LEN)?;
    if let Some(t) = temperature {
        if !(0.0..=2.0).contains(&t) {
            return Err(ValidationError::TemperatureOutOfRange);
        }
    }
    Ok(())
}

/// Validate document title and content
pub fn validate_document_input(title: &str, content: &str) -> Result<(), ValidationError> {
    require("title", title)?;
    max_len("title", title, MAX_DOCUMENT_TITLE_LEN)?;
    require("content", content)?;
    Ok(())
}

/// Validate an API token label
pub fn validate_token_label(label: &str) -> Result<(), ValidationError> {
    require("label", label)?;
    max_len("label", label, MAX_TOKEN_LABEL_LEN)?;
    Ok(())
}

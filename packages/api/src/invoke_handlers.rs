// ABOUTME: Bearer-authenticated invoke endpoint for external callers
// ABOUTME: Every attempt is recorded in the usage log, successful or not

use std::time::Instant;

use axum::{
    extract::rejection::JsonRejection,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use crate::error::ApiError;
use crate::rate_limit::RateLimitExceeded;
use crate::response::ApiResponse;
use crate::state::AppState;
use agentdesk_agents::TokenStorage;
use agentdesk_ai::{NewUsageLog, INVOKE_RETRIEVAL_K};

#[derive(Deserialize)]
pub struct InvokeRequest {
    pub message: Option<String>,
}

#[derive(Serialize)]
pub struct InvokeResponse {
    pub success: bool,
    pub response: String,
    #[serde(rename = "agentId")]
    pub agent_id: String,
}

enum InvokeFailure {
    Api(ApiError),
    RateLimited(RateLimitExceeded),
}

impl From<ApiError> for InvokeFailure {
    fn from(err: ApiError) -> Self {
        InvokeFailure::Api(err)
    }
}

impl InvokeFailure {
    fn message(&self) -> String {
        match self {
            InvokeFailure::Api(err) => err.status_and_message().1,
            InvokeFailure::RateLimited(_) => "Rate limit exceeded".to_string(),
        }
    }

    fn into_response(self) -> Response {
        match self {
            InvokeFailure::Api(err) => err.into_response(),
            InvokeFailure::RateLimited(exceeded) => {
                let mut response = (
                    StatusCode::TOO_MANY_REQUESTS,
                    Json(ApiResponse::<()>::error(
                        "Rate limit exceeded. Try again later.".to_string(),
                    )),
                )
                    .into_response();

                let headers = response.headers_mut();
                let insert = |headers: &mut HeaderMap, name: &'static str, value: String| {
                    if let Ok(value) = value.parse() {
                        headers.insert(name, value);
                    }
                };
                insert(headers, "Retry-After", exceeded.retry_after_secs.to_string());
                insert(headers, "X-RateLimit-Limit", exceeded.limit.to_string());
                insert(headers, "X-RateLimit-Remaining", "0".to_string());
                insert(headers, "X-RateLimit-Reset", exceeded.retry_after_secs.to_string());
                response
            }
        }
    }
}

/// Invoke an agent with a Bearer token
pub async fn invoke_agent(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Result<Json<InvokeRequest>, JsonRejection>,
) -> Response {
    let started = Instant::now();
    let mut log = NewUsageLog {
        ip_address: client_ip(&headers),
        ..Default::default()
    };

    let result = process_invoke(&state, &headers, body, &mut log).await;
    log.duration_ms = Some(started.elapsed().as_millis() as i64);

    if let Err(e) = &result {
        log.error_message = Some(e.message());
    }
    if let Err(e) = state.usage_logs.create_log(log).await {
        error!("Failed to record usage log: {}", e);
    }

    match result {
        Ok(response) => Json(response).into_response(),
        Err(failure) => failure.into_response(),
    }
}

async fn process_invoke(
    state: &AppState,
    headers: &HeaderMap,
    body: Result<Json<InvokeRequest>, JsonRejection>,
    log: &mut NewUsageLog,
) -> Result<InvokeResponse, InvokeFailure> {
    let token = bearer_token(headers).ok_or(ApiError::MissingToken)?;
    log.token_hint = Some(TokenStorage::token_hint(token));

    let record = state
        .tokens
        .verify_token(token)
        .await
        .map_err(ApiError::from)?
        .ok_or_else(|| {
            warn!(
                "Invoke attempt with invalid token {}",
                TokenStorage::token_hint(token)
            );
            ApiError::InvalidToken
        })?;
    log.token_id = Some(record.id.clone());

    let agent = state
        .agents
        .get_agent(&record.agent_id)
        .await
        .map_err(ApiError::from)?;
    log.agent_id = Some(agent.id.clone());

    if !agent.is_active {
        return Err(ApiError::AgentInactive.into());
    }

    if let Some(rate_limit) = &agent.rate_limit {
        if let Err(exceeded) = state.rate_limiters.check(&agent.id, rate_limit) {
            warn!(
                "Rate limit exceeded for agent {} (token {})",
                agent.id, record.token_hint
            );
            return Err(InvokeFailure::RateLimited(exceeded));
        }
    }

    let message = body
        .ok()
        .and_then(|Json(request)| request.message)
        .filter(|m| !m.trim().is_empty())
        .ok_or(ApiError::Validation(
            agentdesk_core::ValidationError::Required { field: "message" },
        ))?;
    log.input_length = Some(message.len() as i64);

    let answer = state
        .rag
        .answer(
            &agent.id,
            &agent.system_prompt,
            agent.temperature,
            &message,
            INVOKE_RETRIEVAL_K,
        )
        .await
        .map_err(ApiError::from)?;

    log.success = true;
    log.output_length = Some(answer.content.len() as i64);

    if let Err(e) = state.tokens.update_last_used(&record.id).await {
        error!("Failed to update last_used_at for token {}: {}", record.id, e);
    }

    info!(
        "Invoked agent {} via token {} ({} docs used)",
        agent.id, record.token_hint, answer.documents_used
    );

    Ok(InvokeResponse {
        success: true,
        response: answer.content,
        agent_id: agent.id,
    })
}

/// Extract the Bearer token from the Authorization header
fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(axum::http::header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

/// Best-effort client IP from proxy headers
fn client_ip(headers: &HeaderMap) -> Option<String> {
    let forwarded = headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(|v| v.trim().to_string());

    forwarded.or_else(|| {
        headers
            .get("x-real-ip")
            .and_then(|v| v.to_str().ok())
            .map(|v| v.to_string())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_bearer_token_extraction() {
        let mut headers = HeaderMap::new();
        headers.insert("authorization", HeaderValue::from_static("Bearer abc123"));
        assert_eq!(bearer_token(&headers), Some("abc123"));
    }

    #[test]
    fn test_bearer_token_missing_or_malformed() {
        assert_eq!(bearer_token(&HeaderMap::new()), None);

        let mut headers = HeaderMap::new();
        headers.insert("authorization", HeaderValue::from_static("Basic abc123"));
        assert_eq!(bearer_token(&headers), None);

        let mut headers = HeaderMap::new();
        headers.insert("authorization", HeaderValue::from_static("Bearer "));
        assert_eq!(bearer_token(&headers), None);
    }

    #[test]
    fn test_client_ip_prefers_forwarded_for() {
        let mut headers = HeaderMap::new();
        headers.insert(
            "x-forwarded-for",
            HeaderValue::from_static("10.0.0.1, 10.0.0.2"),
        );
        headers.insert("x-real-ip", HeaderValue::from_static("192.168.1.1"));
        assert_eq!(client_ip(&headers), Some("10.0.0.1".to_string()));
    }
}

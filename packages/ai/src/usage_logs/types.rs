// ABOUTME: API usage logging types
// ABOUTME: One row per invoke attempt, successful or not

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiUsageLog {
    pub id: String,
    pub agent_id: Option<String>,
    pub token_id: Option<String>,
    /// Last characters of the token used, never the full token
    pub token_hint: Option<String>,
    pub success: bool,
    pub input_length: Option<i64>,
    pub output_length: Option<i64>,
    pub duration_ms: Option<i64>,
    pub error_message: Option<String>,
    pub ip_address: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Fields supplied by the invoke handler when recording an attempt
#[derive(Debug, Clone, Default)]
pub struct NewUsageLog {
    pub agent_id: Option<String>,
    pub token_id: Option<String>,
    pub token_hint: Option<String>,
    pub success: bool,
    pub input_length: Option<i64>,
    pub output_length: Option<i64>,
    pub duration_ms: Option<i64>,
    pub error_message: Option<String>,
    pub ip_address: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiUsageStats {
    pub total_requests: i64,
    pub successful_requests: i64,
    pub failed_requests: i64,
    pub avg_duration_ms: Option<f64>,
    pub total_input_length: i64,
    pub total_output_length: i64,
}

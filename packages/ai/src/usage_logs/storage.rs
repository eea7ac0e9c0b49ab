// ABOUTME: API usage log storage layer using SQLite
// ABOUTME: Append-only inserts plus per-agent listing and aggregation

use chrono::{DateTime, Utc};
use sqlx::{Row, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use super::types::{ApiUsageLog, ApiUsageStats, NewUsageLog};
use agentdesk_storage::StorageError;

pub struct UsageLogStorage {
    pool: SqlitePool,
}

impl UsageLogStorage {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Record one invoke attempt
    pub async fn create_log(&self, log: NewUsageLog) -> Result<ApiUsageLog, StorageError> {
        let id = Uuid::new_v4().to_string();
        let created_at = Utc::now();

        sqlx::query(
            r#"
            INSERT INTO api_usage_logs (
                id, agent_id, token_id, token_hint, success,
                input_length, output_length, duration_ms, error_message,
                ip_address, created_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&id)
        .bind(&log.agent_id)
        .bind(&log.token_id)
        .bind(&log.token_hint)
        .bind(log.success)
        .bind(log.input_length)
        .bind(log.output_length)
        .bind(log.duration_ms)
        .bind(&log.error_message)
        .bind(&log.ip_address)
        .bind(created_at.to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(StorageError::Sqlx)?;

        debug!("Recorded usage log {} (success: {})", id, log.success);

        Ok(ApiUsageLog {
            id,
            agent_id: log.agent_id,
            token_id: log.token_id,
            token_hint: log.token_hint,
            success: log.success,
            input_length: log.input_length,
            output_length: log.output_length,
            duration_ms: log.duration_ms,
            error_message: log.error_message,
            ip_address: log.ip_address,
            created_at,
        })
    }

    /// List an agent's usage logs, newest first
    pub async fn list_logs(
        &self,
        agent_id: &str,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<ApiUsageLog>, StorageError> {
        let rows = sqlx::query(
            "SELECT * FROM api_usage_logs WHERE agent_id = ? ORDER BY created_at DESC LIMIT ? OFFSET ?",
        )
        .bind(agent_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await
        .map_err(StorageError::Sqlx)?;

        rows.iter().map(row_to_log).collect()
    }

    /// Aggregate statistics for an agent's invoke traffic
    pub async fn get_stats(&self, agent_id: &str) -> Result<ApiUsageStats, StorageError> {
        let row = sqlx::query(
            r#"
            SELECT
                COUNT(*) as total_requests,
                COALESCE(SUM(CASE WHEN success = 1 THEN 1 ELSE 0 END), 0) as successful_requests,
                COALESCE(SUM(CASE WHEN success = 0 THEN 1 ELSE 0 END), 0) as failed_requests,
                AVG(duration_ms) as avg_duration_ms,
                COALESCE(SUM(input_length), 0) as total_input_length,
                COALESCE(SUM(output_length), 0) as total_output_length
            FROM api_usage_logs
            WHERE agent_id = ?
            "#,
        )
        .bind(agent_id)
        .fetch_one(&self.pool)
        .await
        .map_err(StorageError::Sqlx)?;

        Ok(ApiUsageStats {
            total_requests: row.try_get("total_requests").map_err(StorageError::Sqlx)?,
            successful_requests: row
                .try_get("successful_requests")
                .map_err(StorageError::Sqlx)?,
            failed_requests: row.try_get("failed_requests").map_err(StorageError::Sqlx)?,
            avg_duration_ms: row.try_get("avg_duration_ms").map_err(StorageError::Sqlx)?,
            total_input_length: row
                .try_get("total_input_length")
                .map_err(StorageError::Sqlx)?,
            total_output_length: row
                .try_get("total_output_length")
                .map_err(StorageError::Sqlx)?,
        })
    }
}

fn row_to_log(row: &sqlx::sqlite::SqliteRow) -> Result<ApiUsageLog, StorageError> {
    let created_at: String = row.try_get("created_at").map_err(StorageError::Sqlx)?;
    let created_at = DateTime::parse_from_rfc3339(&created_at)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| StorageError::Database(format!("Failed to parse timestamp: {}", e)))?;

    Ok(ApiUsageLog {
        id: row.try_get("id").map_err(StorageError::Sqlx)?,
        agent_id: row.try_get("agent_id").map_err(StorageError::Sqlx)?,
        token_id: row.try_get("token_id").map_err(StorageError::Sqlx)?,
        token_hint: row.try_get("token_hint").map_err(StorageError::Sqlx)?,
        success: row.try_get("success").map_err(StorageError::Sqlx)?,
        input_length: row.try_get("input_length").map_err(StorageError::Sqlx)?,
        output_length: row.try_get("output_length").map_err(StorageError::Sqlx)?,
        duration_ms: row.try_get("duration_ms").map_err(StorageError::Sqlx)?,
        error_message: row.try_get("error_message").map_err(StorageError::Sqlx)?,
        ip_address: row.try_get("ip_address").map_err(StorageError::Sqlx)?,
        created_at,
    })
}

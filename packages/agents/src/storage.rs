// ABOUTME: Agent storage layer using SQLite
// ABOUTME: Handles CRUD operations for agents

use chrono::{DateTime, Utc};
use sqlx::{Row, SqlitePool};
use tracing::debug;

use super::types::{Agent, AgentCreateInput, AgentUpdateInput, RateLimit};
use agentdesk_core::constants::{DEFAULT_SYSTEM_PROMPT, DEFAULT_TEMPERATURE};
use agentdesk_core::generate_id;
use agentdesk_storage::StorageError;

pub struct AgentStorage {
    pool: SqlitePool,
}

impl AgentStorage {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Create a new agent. A duplicate name maps to `StorageError::DuplicateName`.
    pub async fn create_agent(&self, input: AgentCreateInput) -> Result<Agent, StorageError> {
        let id = generate_id();
        let now = Utc::now();
        let system_prompt = input
            .system_prompt
            .filter(|p| !p.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_SYSTEM_PROMPT.to_string());
        let temperature = input.temperature.unwrap_or(DEFAULT_TEMPERATURE);
        let is_active = input.is_active.unwrap_or(true);

        debug!("Creating agent: {}", input.name);

        let result = sqlx::query(
            r#"
            INSERT INTO agents (
                id, name, description, avatar_url, system_prompt, is_active,
                api_key, temperature, rate_limit_requests, rate_limit_window_seconds,
                created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&id)
        .bind(input.name.trim())
        .bind(input.description.trim())
        .bind(&input.avatar_url)
        .bind(&system_prompt)
        .bind(is_active as i64)
        .bind(&input.api_key)
        .bind(temperature)
        .bind(input.rate_limit.map(|rl| rl.requests as i64))
        .bind(input.rate_limit.map(|rl| rl.window_seconds as i64))
        .bind(now.to_rfc3339())
        .bind(now.to_rfc3339())
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => self.get_agent(&id).await,
            Err(e) => {
                let err = StorageError::Sqlx(e);
                if err.is_unique_violation() {
                    Err(StorageError::DuplicateName(input.name.trim().to_string()))
                } else {
                    Err(err)
                }
            }
        }
    }

    /// List agents, newest first. Inactive agents are hidden unless requested.
    pub async fn list_agents(
        &self,
        show_inactive: bool,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<Agent>, i64), StorageError> {
        let filter = if show_inactive {
            ""
        } else {
            "WHERE is_active = 1"
        };

        let count_sql = format!("SELECT COUNT(*) as count FROM agents {}", filter);
        let row = sqlx::query(&count_sql)
            .fetch_one(&self.pool)
            .await
            .map_err(StorageError::Sqlx)?;
        let total: i64 = row.try_get("count").map_err(StorageError::Sqlx)?;

        let list_sql = format!(
            "SELECT * FROM agents {} ORDER BY created_at DESC LIMIT ? OFFSET ?",
            filter
        );
        let rows = sqlx::query(&list_sql)
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await
            .map_err(StorageError::Sqlx)?;

        let agents = rows
            .iter()
            .map(row_to_agent)
            .collect::<Result<Vec<_>, _>>()?;

        Ok((agents, total))
    }

    /// Get a single agent by id
    pub async fn get_agent(&self, agent_id: &str) -> Result<Agent, StorageError> {
        let row = sqlx::query("SELECT * FROM agents WHERE id = ?")
            .bind(agent_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(StorageError::Sqlx)?;

        match row {
            Some(row) => row_to_agent(&row),
            None => Err(StorageError::NotFound),
        }
    }

    /// Update an agent in place; absent fields keep their current value.
    /// Sending a rate limit with zero requests or a zero window removes
    /// the limit entirely.
    pub async fn update_agent(
        &self,
        agent_id: &str,
        input: AgentUpdateInput,
    ) -> Result<Agent, StorageError> {
        // Ensure the agent exists before applying a partial update
        let current = self.get_agent(agent_id).await?;

        let name = input.name.map(|n| n.trim().to_string());
        let rate_limit = match input.rate_limit {
            Some(rl) if rl.requests == 0 || rl.window_seconds == 0 => None,
            Some(rl) => Some(rl),
            None => current.rate_limit,
        };

        let result = sqlx::query(
            r#"
            UPDATE agents SET
                name = COALESCE(?, name),
                description = COALESCE(?, description),
                avatar_url = COALESCE(?, avatar_url),
                system_prompt = COALESCE(?, system_prompt),
                is_active = COALESCE(?, is_active),
                api_key = COALESCE(?, api_key),
                temperature = COALESCE(?, temperature),
                rate_limit_requests = ?,
                rate_limit_window_seconds = ?,
                updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(&name)
        .bind(input.description.as_deref().map(str::trim))
        .bind(&input.avatar_url)
        .bind(&input.system_prompt)
        .bind(input.is_active.map(|a| a as i64))
        .bind(&input.api_key)
        .bind(input.temperature)
        .bind(rate_limit.map(|rl| rl.requests as i64))
        .bind(rate_limit.map(|rl| rl.window_seconds as i64))
        .bind(Utc::now().to_rfc3339())
        .bind(agent_id)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => self.get_agent(agent_id).await,
            Err(e) => {
                let err = StorageError::Sqlx(e);
                if err.is_unique_violation() {
                    Err(StorageError::DuplicateName(name.unwrap_or_default()))
                } else {
                    Err(err)
                }
            }
        }
    }

    /// Delete an agent. Documents and tokens cascade via foreign keys.
    pub async fn delete_agent(&self, agent_id: &str) -> Result<(), StorageError> {
        let result = sqlx::query("DELETE FROM agents WHERE id = ?")
            .bind(agent_id)
            .execute(&self.pool)
            .await
            .map_err(StorageError::Sqlx)?;

        if result.rows_affected() == 0 {
            return Err(StorageError::NotFound);
        }

        debug!("Deleted agent: {}", agent_id);
        Ok(())
    }
}

/// Parse an RFC 3339 timestamp column
pub(crate) fn parse_timestamp(value: &str) -> Result<DateTime<Utc>, StorageError> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| StorageError::Database(format!("Failed to parse timestamp: {}", e)))
}

fn row_to_agent(row: &sqlx::sqlite::SqliteRow) -> Result<Agent, StorageError> {
    let created_at: String = row.try_get("created_at").map_err(StorageError::Sqlx)?;
    let updated_at: String = row.try_get("updated_at").map_err(StorageError::Sqlx)?;

    let requests: Option<i64> = row
        .try_get("rate_limit_requests")
        .map_err(StorageError::Sqlx)?;
    let window_seconds: Option<i64> = row
        .try_get("rate_limit_window_seconds")
        .map_err(StorageError::Sqlx)?;
    let rate_limit = match (requests, window_seconds) {
        (Some(requests), Some(window_seconds)) if requests > 0 && window_seconds > 0 => {
            Some(RateLimit {
                requests: requests as u32,
                window_seconds: window_seconds as u64,
            })
        }
        _ => None,
    };

    Ok(Agent {
        id: row.try_get("id").map_err(StorageError::Sqlx)?,
        name: row.try_get("name").map_err(StorageError::Sqlx)?,
        description: row.try_get("description").map_err(StorageError::Sqlx)?,
        avatar_url: row.try_get("avatar_url").map_err(StorageError::Sqlx)?,
        system_prompt: row.try_get("system_prompt").map_err(StorageError::Sqlx)?,
        is_active: row.try_get::<i64, _>("is_active").map_err(StorageError::Sqlx)? != 0,
        api_key: row.try_get("api_key").map_err(StorageError::Sqlx)?,
        temperature: row.try_get("temperature").map_err(StorageError::Sqlx)?,
        rate_limit,
        created_at: parse_timestamp(&created_at)?,
        updated_at: parse_timestamp(&updated_at)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use agentdesk_storage::connect_memory_pool;

    fn input(name: &str) -> AgentCreateInput {
        AgentCreateInput {
            name: name.to_string(),
            description: "A test agent".to_string(),
            avatar_url: None,
            system_prompt: None,
            is_active: None,
            api_key: None,
            temperature: None,
            rate_limit: None,
        }
    }

    #[tokio::test]
    async fn test_create_and_get_agent() {
        let pool = connect_memory_pool().await.unwrap();
        let storage = AgentStorage::new(pool);

        let agent = storage.create_agent(input("support")).await.unwrap();
        assert_eq!(agent.name, "support");
        assert!(agent.is_active);
        assert_eq!(agent.temperature, DEFAULT_TEMPERATURE);
        assert_eq!(agent.system_prompt, DEFAULT_SYSTEM_PROMPT);

        let fetched = storage.get_agent(&agent.id).await.unwrap();
        assert_eq!(fetched.id, agent.id);
    }

    #[tokio::test]
    async fn test_duplicate_name_rejected() {
        let pool = connect_memory_pool().await.unwrap();
        let storage = AgentStorage::new(pool);

        storage.create_agent(input("support")).await.unwrap();
        let err = storage.create_agent(input("support")).await.unwrap_err();
        assert!(matches!(err, StorageError::DuplicateName(name) if name == "support"));
    }

    #[tokio::test]
    async fn test_list_hides_inactive_by_default() {
        let pool = connect_memory_pool().await.unwrap();
        let storage = AgentStorage::new(pool);

        let a = storage.create_agent(input("active")).await.unwrap();
        let b = storage.create_agent(input("inactive")).await.unwrap();
        storage
            .update_agent(
                &b.id,
                AgentUpdateInput {
                    is_active: Some(false),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        let (agents, total) = storage.list_agents(false, 20, 0).await.unwrap();
        assert_eq!(total, 1);
        assert_eq!(agents[0].id, a.id);

        let (_, total_all) = storage.list_agents(true, 20, 0).await.unwrap();
        assert_eq!(total_all, 2);
    }

    #[tokio::test]
    async fn test_update_agent_partial() {
        let pool = connect_memory_pool().await.unwrap();
        let storage = AgentStorage::new(pool);

        let agent = storage.create_agent(input("support")).await.unwrap();
        let updated = storage
            .update_agent(
                &agent.id,
                AgentUpdateInput {
                    description: Some("Updated description".to_string()),
                    temperature: Some(0.2),
                    rate_limit: Some(RateLimit {
                        requests: 10,
                        window_seconds: 60,
                    }),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.name, "support");
        assert_eq!(updated.description, "Updated description");
        assert_eq!(updated.temperature, 0.2);
        assert_eq!(
            updated.rate_limit,
            Some(RateLimit {
                requests: 10,
                window_seconds: 60
            })
        );
    }

    #[tokio::test]
    async fn test_zeroed_rate_limit_clears_it() {
        let pool = connect_memory_pool().await.unwrap();
        let storage = AgentStorage::new(pool.clone());

        let agent = storage.create_agent(input("limited")).await.unwrap();
        let limited = storage
            .update_agent(
                &agent.id,
                AgentUpdateInput {
                    rate_limit: Some(RateLimit {
                        requests: 10,
                        window_seconds: 60,
                    }),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert!(limited.rate_limit.is_some());

        // An update without a rate limit keeps the existing one
        let unchanged = storage
            .update_agent(
                &agent.id,
                AgentUpdateInput {
                    description: Some("still limited".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert!(unchanged.rate_limit.is_some());

        let cleared = storage
            .update_agent(
                &agent.id,
                AgentUpdateInput {
                    rate_limit: Some(RateLimit {
                        requests: 0,
                        window_seconds: 0,
                    }),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(cleared.rate_limit, None);

        // The columns are nulled, not stored as zeroes
        let row = sqlx::query("SELECT rate_limit_requests FROM agents WHERE id = ?")
            .bind(&agent.id)
            .fetch_one(&pool)
            .await
            .unwrap();
        let requests: Option<i64> = row.try_get("rate_limit_requests").unwrap();
        assert_eq!(requests, None);
    }

    #[tokio::test]
    async fn test_update_missing_agent_is_not_found() {
        let pool = connect_memory_pool().await.unwrap();
        let storage = AgentStorage::new(pool);

        let err = storage
            .update_agent("missing", AgentUpdateInput::default())
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::NotFound));
    }

    #[tokio::test]
    async fn test_delete_agent() {
        let pool = connect_memory_pool().await.unwrap();
        let storage = AgentStorage::new(pool);

        let agent = storage.create_agent(input("support")).await.unwrap();
        storage.delete_agent(&agent.id).await.unwrap();

        assert!(matches!(
            storage.get_agent(&agent.id).await.unwrap_err(),
            StorageError::NotFound
        ));
        assert!(matches!(
            storage.delete_agent(&agent.id).await.unwrap_err(),
            StorageError::NotFound
        ));
    }
}

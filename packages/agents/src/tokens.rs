// ABOUTME: Storage operations for per-agent API tokens
// ABOUTME: Token generation, hashing, verification, and soft revocation

use base64::Engine;
use chrono::{DateTime, Utc};
use rand::Rng;
use sha2::{Digest, Sha256};
use sqlx::{Row, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use super::storage::parse_timestamp;
use super::types::{ApiToken, TokenGeneration, TokenUpdateInput};
use agentdesk_storage::StorageError;

pub struct TokenStorage {
    pool: SqlitePool,
}

impl TokenStorage {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Generate a cryptographically secure random token
    /// Returns a base64-encoded 32-byte secret
    pub fn generate_token() -> String {
        let mut rng = rand::thread_rng();
        let random_bytes: [u8; 32] = rng.gen();
        base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(random_bytes)
    }

    /// Hash a token using SHA-256
    /// This is what gets stored in the database
    pub fn hash_token(token: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(token.as_bytes());
        let result = hasher.finalize();
        hex::encode(result)
    }

    /// Last characters of a token, kept for display and usage logs
    pub fn token_hint(token: &str) -> String {
        let tail: String = token
            .chars()
            .rev()
            .take(4)
            .collect::<Vec<_>>()
            .into_iter()
            .rev()
            .collect();
        format!("...{}", tail)
    }

    /// Verify a token against a stored hash using constant-time comparison
    /// This prevents timing attacks
    pub fn verify_token_hash(token: &str, stored_hash: &str) -> bool {
        let computed_hash = Self::hash_token(token);

        use subtle::ConstantTimeEq;
        computed_hash
            .as_bytes()
            .ct_eq(stored_hash.as_bytes())
            .into()
    }

    /// Create a new API token for an agent. The plaintext secret is
    /// returned exactly once inside the `TokenGeneration`.
    pub async fn create_token(
        &self,
        agent_id: &str,
        label: &str,
    ) -> Result<TokenGeneration, StorageError> {
        let id = Uuid::new_v4().to_string();
        let token = Self::generate_token();
        let token_hash = Self::hash_token(&token);
        let token_hint = Self::token_hint(&token);
        let now = Utc::now();

        sqlx::query(
            r#"
            INSERT INTO api_tokens (id, agent_id, token_hash, token_hint, label, is_active, created_at)
            VALUES (?, ?, ?, ?, ?, 1, ?)
            "#,
        )
        .bind(&id)
        .bind(agent_id)
        .bind(&token_hash)
        .bind(&token_hint)
        .bind(label.trim())
        .bind(now.to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(StorageError::Sqlx)?;

        debug!("Created API token {} for agent {}", id, agent_id);

        let record = self.get_token(agent_id, &id).await?;
        Ok(TokenGeneration { token, record })
    }

    /// List an agent's tokens, newest first. Hashes stay internal.
    pub async fn list_tokens(&self, agent_id: &str) -> Result<Vec<ApiToken>, StorageError> {
        let rows = sqlx::query(
            "SELECT * FROM api_tokens WHERE agent_id = ? ORDER BY created_at DESC",
        )
        .bind(agent_id)
        .fetch_all(&self.pool)
        .await
        .map_err(StorageError::Sqlx)?;

        rows.iter().map(row_to_token).collect()
    }

    /// Get one token belonging to an agent
    pub async fn get_token(&self, agent_id: &str, token_id: &str) -> Result<ApiToken, StorageError> {
        let row = sqlx::query("SELECT * FROM api_tokens WHERE agent_id = ? AND id = ?")
            .bind(agent_id)
            .bind(token_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(StorageError::Sqlx)?;

        match row {
            Some(row) => row_to_token(&row),
            None => Err(StorageError::NotFound),
        }
    }

    /// Rename or soft-revoke/re-activate a token. Revoking stamps
    /// `revoked_at`; re-activating clears it. Tokens are never hard-deleted.
    pub async fn update_token(
        &self,
        agent_id: &str,
        token_id: &str,
        input: TokenUpdateInput,
    ) -> Result<ApiToken, StorageError> {
        let current = self.get_token(agent_id, token_id).await?;

        let revoked_at = match input.is_active {
            Some(false) if current.is_active => Some(Utc::now()),
            Some(true) => None,
            _ => current.revoked_at,
        };

        sqlx::query(
            r#"
            UPDATE api_tokens SET
                label = COALESCE(?, label),
                is_active = COALESCE(?, is_active),
                revoked_at = ?
            WHERE agent_id = ? AND id = ?
            "#,
        )
        .bind(input.label.as_deref().map(str::trim))
        .bind(input.is_active.map(|a| a as i64))
        .bind(revoked_at.map(|dt| dt.to_rfc3339()))
        .bind(agent_id)
        .bind(token_id)
        .execute(&self.pool)
        .await
        .map_err(StorageError::Sqlx)?;

        self.get_token(agent_id, token_id).await
    }

    /// Resolve an active token to its record, verifying the hash in
    /// constant time. Returns None for unknown or revoked tokens.
    pub async fn verify_token(&self, token: &str) -> Result<Option<ApiToken>, StorageError> {
        let token_hash = Self::hash_token(token);

        let row = sqlx::query("SELECT * FROM api_tokens WHERE token_hash = ? AND is_active = 1")
            .bind(&token_hash)
            .fetch_optional(&self.pool)
            .await
            .map_err(StorageError::Sqlx)?;

        match row {
            Some(row) => {
                let stored_hash: String = row.try_get("token_hash").map_err(StorageError::Sqlx)?;

                // Double-check with constant-time comparison
                if Self::verify_token_hash(token, &stored_hash) {
                    Ok(Some(row_to_token(&row)?))
                } else {
                    Ok(None)
                }
            }
            None => Ok(None),
        }
    }

    /// Update the last_used_at timestamp for a token
    pub async fn update_last_used(&self, token_id: &str) -> Result<(), StorageError> {
        sqlx::query("UPDATE api_tokens SET last_used_at = ? WHERE id = ?")
            .bind(Utc::now().to_rfc3339())
            .bind(token_id)
            .execute(&self.pool)
            .await
            .map_err(StorageError::Sqlx)?;

        Ok(())
    }
}

fn parse_optional_timestamp(
    value: Option<String>,
) -> Result<Option<DateTime<Utc>>, StorageError> {
    value.as_deref().map(parse_timestamp).transpose()
}

fn row_to_token(row: &sqlx::sqlite::SqliteRow) -> Result<ApiToken, StorageError> {
    let created_at: String = row.try_get("created_at").map_err(StorageError::Sqlx)?;
    let last_used_at: Option<String> = row.try_get("last_used_at").map_err(StorageError::Sqlx)?;
    let revoked_at: Option<String> = row.try_get("revoked_at").map_err(StorageError::Sqlx)?;

    Ok(ApiToken {
        id: row.try_get("id").map_err(StorageError::Sqlx)?,
        agent_id: row.try_get("agent_id").map_err(StorageError::Sqlx)?,
        token_hash: row.try_get("token_hash").map_err(StorageError::Sqlx)?,
        token_hint: row.try_get("token_hint").map_err(StorageError::Sqlx)?,
        label: row.try_get("label").map_err(StorageError::Sqlx)?,
        is_active: row.try_get::<i64, _>("is_active").map_err(StorageError::Sqlx)? != 0,
        created_at: parse_timestamp(&created_at)?,
        last_used_at: parse_optional_timestamp(last_used_at)?,
        revoked_at: parse_optional_timestamp(revoked_at)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::AgentStorage;
    use crate::types::AgentCreateInput;
    use agentdesk_storage::connect_memory_pool;

    async fn setup() -> (TokenStorage, String) {
        let pool = connect_memory_pool().await.unwrap();
        let agents = AgentStorage::new(pool.clone());
        let agent = agents
            .create_agent(AgentCreateInput {
                name: "tokened".to_string(),
                description: "agent with tokens".to_string(),
                avatar_url: None,
                system_prompt: None,
                is_active: None,
                api_key: None,
                temperature: None,
                rate_limit: None,
            })
            .await
            .unwrap();
        (TokenStorage::new(pool), agent.id)
    }

    #[test]
    fn test_generate_token_produces_unique_values() {
        let token1 = TokenStorage::generate_token();
        let token2 = TokenStorage::generate_token();

        assert_ne!(token1, token2);
        assert!(token1.len() > 32); // Base64 of 32 bytes is 43 chars
    }

    #[test]
    fn test_hash_token_is_deterministic() {
        let token = "test-token-123";
        let hash1 = TokenStorage::hash_token(token);
        let hash2 = TokenStorage::hash_token(token);

        assert_eq!(hash1, hash2);
        assert_eq!(hash1.len(), 64); // SHA-256 produces 64 hex chars
    }

    #[test]
    fn test_verify_token_hash() {
        let token = "test-token-123";
        let hash = TokenStorage::hash_token(token);

        assert!(TokenStorage::verify_token_hash(token, &hash));
        assert!(!TokenStorage::verify_token_hash("other-token", &hash));
    }

    #[test]
    fn test_token_hint_keeps_last_four() {
        assert_eq!(TokenStorage::token_hint("abcdef1234"), "...1234");
        assert_eq!(TokenStorage::token_hint("ab"), "...ab");
    }

    #[tokio::test]
    async fn test_create_and_verify_token() {
        let (tokens, agent_id) = setup().await;

        let generated = tokens.create_token(&agent_id, "production").await.unwrap();
        assert_eq!(generated.record.label, "production");
        assert!(generated.record.is_active);
        assert_eq!(
            generated.record.token_hash,
            TokenStorage::hash_token(&generated.token)
        );

        let verified = tokens.verify_token(&generated.token).await.unwrap();
        assert_eq!(verified.unwrap().agent_id, agent_id);

        assert!(tokens.verify_token("bogus").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_revoke_and_reactivate() {
        let (tokens, agent_id) = setup().await;
        let generated = tokens.create_token(&agent_id, "temp").await.unwrap();

        let revoked = tokens
            .update_token(
                &agent_id,
                &generated.record.id,
                TokenUpdateInput {
                    label: None,
                    is_active: Some(false),
                },
            )
            .await
            .unwrap();
        assert!(!revoked.is_active);
        assert!(revoked.revoked_at.is_some());

        // Revoked tokens no longer verify
        assert!(tokens.verify_token(&generated.token).await.unwrap().is_none());

        let reactivated = tokens
            .update_token(
                &agent_id,
                &generated.record.id,
                TokenUpdateInput {
                    label: Some("temp-2".to_string()),
                    is_active: Some(true),
                },
            )
            .await
            .unwrap();
        assert!(reactivated.is_active);
        assert!(reactivated.revoked_at.is_none());
        assert_eq!(reactivated.label, "temp-2");

        assert!(tokens.verify_token(&generated.token).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_update_last_used() {
        let (tokens, agent_id) = setup().await;
        let generated = tokens.create_token(&agent_id, "cron").await.unwrap();
        assert!(generated.record.last_used_at.is_none());

        tokens.update_last_used(&generated.record.id).await.unwrap();

        let record = tokens.get_token(&agent_id, &generated.record.id).await.unwrap();
        assert!(record.last_used_at.is_some());
    }

    #[tokio::test]
    async fn test_tokens_cascade_with_agent() {
        let pool = connect_memory_pool().await.unwrap();
        let agents = AgentStorage::new(pool.clone());
        let tokens = TokenStorage::new(pool.clone());

        let agent = agents
            .create_agent(AgentCreateInput {
                name: "doomed".to_string(),
                description: "to be deleted".to_string(),
                avatar_url: None,
                system_prompt: None,
                is_active: None,
                api_key: None,
                temperature: None,
                rate_limit: None,
            })
            .await
            .unwrap();
        let generated = tokens.create_token(&agent.id, "orphan").await.unwrap();

        agents.delete_agent(&agent.id).await.unwrap();
        assert!(tokens.verify_token(&generated.token).await.unwrap().is_none());
    }
}

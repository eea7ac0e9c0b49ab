// ABOUTME: Document storage layer using SQLite
// ABOUTME: CRUD for agent documents and their persisted embeddings

use chrono::{DateTime, Utc};
use sqlx::{Row, SqlitePool};
use tracing::debug;

use super::types::{AgentDocument, DocumentCreateInput, EmbeddedDocument};
use agentdesk_core::generate_id;
use agentdesk_storage::StorageError;

pub struct DocumentStorage {
    pool: SqlitePool,
}

impl DocumentStorage {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Insert a document into an agent's corpus
    pub async fn create_document(
        &self,
        agent_id: &str,
        input: DocumentCreateInput,
    ) -> Result<AgentDocument, StorageError> {
        let id = generate_id();
        let now = Utc::now();
        let metadata = input
            .metadata
            .unwrap_or_else(|| serde_json::Value::Object(Default::default()));

        sqlx::query(
            r#"
            INSERT INTO agent_documents (id, agent_id, title, content, metadata, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&id)
        .bind(agent_id)
        .bind(input.title.trim())
        .bind(&input.content)
        .bind(serde_json::to_string(&metadata)?)
        .bind(now.to_rfc3339())
        .bind(now.to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(StorageError::Sqlx)?;

        debug!("Created document {} for agent {}", id, agent_id);

        self.get_document(agent_id, &id).await
    }

    /// List an agent's documents, newest first
    pub async fn list_documents(&self, agent_id: &str) -> Result<Vec<AgentDocument>, StorageError> {
        let rows = sqlx::query(
            "SELECT * FROM agent_documents WHERE agent_id = ? ORDER BY created_at DESC",
        )
        .bind(agent_id)
        .fetch_all(&self.pool)
        .await
        .map_err(StorageError::Sqlx)?;

        rows.iter().map(row_to_document).collect()
    }

    /// Get one document belonging to an agent
    pub async fn get_document(
        &self,
        agent_id: &str,
        document_id: &str,
    ) -> Result<AgentDocument, StorageError> {
        let row = sqlx::query("SELECT * FROM agent_documents WHERE agent_id = ? AND id = ?")
            .bind(agent_id)
            .bind(document_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(StorageError::Sqlx)?;

        match row {
            Some(row) => row_to_document(&row),
            None => Err(StorageError::NotFound),
        }
    }

    /// Count documents in an agent's corpus
    pub async fn count_documents(&self, agent_id: &str) -> Result<i64, StorageError> {
        let row = sqlx::query("SELECT COUNT(*) as count FROM agent_documents WHERE agent_id = ?")
            .bind(agent_id)
            .fetch_one(&self.pool)
            .await
            .map_err(StorageError::Sqlx)?;

        row.try_get("count").map_err(StorageError::Sqlx)
    }

    /// Delete one document; the caller is responsible for resyncing the index
    pub async fn delete_document(
        &self,
        agent_id: &str,
        document_id: &str,
    ) -> Result<(), StorageError> {
        let result = sqlx::query("DELETE FROM agent_documents WHERE agent_id = ? AND id = ?")
            .bind(agent_id)
            .bind(document_id)
            .execute(&self.pool)
            .await
            .map_err(StorageError::Sqlx)?;

        if result.rows_affected() == 0 {
            return Err(StorageError::NotFound);
        }
        Ok(())
    }

    /// Delete an agent's whole corpus; returns the number of rows removed
    pub async fn delete_all_documents(&self, agent_id: &str) -> Result<u64, StorageError> {
        let result = sqlx::query("DELETE FROM agent_documents WHERE agent_id = ?")
            .bind(agent_id)
            .execute(&self.pool)
            .await
            .map_err(StorageError::Sqlx)?;

        Ok(result.rows_affected())
    }

    /// Persist an embedding for a document
    pub async fn set_embedding(
        &self,
        document_id: &str,
        embedding: &[f32],
    ) -> Result<(), StorageError> {
        sqlx::query("UPDATE agent_documents SET embedding = ? WHERE id = ?")
            .bind(serde_json::to_string(embedding)?)
            .bind(document_id)
            .execute(&self.pool)
            .await
            .map_err(StorageError::Sqlx)?;

        Ok(())
    }

    /// Drop all persisted embeddings for an agent (forces re-embedding on resync)
    pub async fn clear_embeddings(&self, agent_id: &str) -> Result<(), StorageError> {
        sqlx::query("UPDATE agent_documents SET embedding = NULL WHERE agent_id = ?")
            .bind(agent_id)
            .execute(&self.pool)
            .await
            .map_err(StorageError::Sqlx)?;

        Ok(())
    }

    /// Fetch an agent's documents together with their persisted embeddings
    pub async fn list_with_embeddings(
        &self,
        agent_id: &str,
    ) -> Result<Vec<EmbeddedDocument>, StorageError> {
        let rows = sqlx::query(
            "SELECT * FROM agent_documents WHERE agent_id = ? ORDER BY created_at ASC",
        )
        .bind(agent_id)
        .fetch_all(&self.pool)
        .await
        .map_err(StorageError::Sqlx)?;

        rows.iter()
            .map(|row| {
                let document = row_to_document(row)?;
                let raw: Option<String> = row.try_get("embedding").map_err(StorageError::Sqlx)?;
                let embedding = raw
                    .map(|json| serde_json::from_str::<Vec<f32>>(&json))
                    .transpose()?;
                Ok(EmbeddedDocument {
                    document,
                    embedding,
                })
            })
            .collect()
    }
}

fn parse_timestamp(value: &str) -> Result<DateTime<Utc>, StorageError> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| StorageError::Database(format!("Failed to parse timestamp: {}", e)))
}

fn row_to_document(row: &sqlx::sqlite::SqliteRow) -> Result<AgentDocument, StorageError> {
    let created_at: String = row.try_get("created_at").map_err(StorageError::Sqlx)?;
    let updated_at: String = row.try_get("updated_at").map_err(StorageError::Sqlx)?;
    let metadata: String = row.try_get("metadata").map_err(StorageError::Sqlx)?;

    Ok(AgentDocument {
        id: row.try_get("id").map_err(StorageError::Sqlx)?,
        agent_id: row.try_get("agent_id").map_err(StorageError::Sqlx)?,
        title: row.try_get("title").map_err(StorageError::Sqlx)?,
        content: row.try_get("content").map_err(StorageError::Sqlx)?,
        metadata: serde_json::from_str(&metadata)?,
        created_at: parse_timestamp(&created_at)?,
        updated_at: parse_timestamp(&updated_at)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use agentdesk_storage::connect_memory_pool;
    use sqlx::SqlitePool;

    async fn setup() -> (SqlitePool, String) {
        let pool = connect_memory_pool().await.unwrap();
        // Documents require an owning agent row
        sqlx::query(
            r#"
            INSERT INTO agents (id, name, description, system_prompt, is_active, temperature, created_at, updated_at)
            VALUES ('agent001', 'corpus', 'corpus test agent', 'prompt', 1, 0.7, ?, ?)
            "#,
        )
        .bind(Utc::now().to_rfc3339())
        .bind(Utc::now().to_rfc3339())
        .execute(&pool)
        .await
        .unwrap();
        (pool, "agent001".to_string())
    }

    fn input(title: &str) -> DocumentCreateInput {
        DocumentCreateInput {
            title: title.to_string(),
            content: format!("content of {}", title),
            metadata: Some(serde_json::json!({"source": "test"})),
        }
    }

    #[tokio::test]
    async fn test_create_list_and_count() {
        let (pool, agent_id) = setup().await;
        let storage = DocumentStorage::new(pool);

        storage.create_document(&agent_id, input("first")).await.unwrap();
        storage.create_document(&agent_id, input("second")).await.unwrap();

        let docs = storage.list_documents(&agent_id).await.unwrap();
        assert_eq!(docs.len(), 2);
        assert_eq!(docs[0].metadata["source"], "test");
        assert_eq!(storage.count_documents(&agent_id).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_delete_document_scoped_to_agent() {
        let (pool, agent_id) = setup().await;
        let storage = DocumentStorage::new(pool);

        let doc = storage.create_document(&agent_id, input("only")).await.unwrap();

        // Wrong agent id does not match
        assert!(matches!(
            storage.delete_document("other", &doc.id).await.unwrap_err(),
            StorageError::NotFound
        ));

        storage.delete_document(&agent_id, &doc.id).await.unwrap();
        assert_eq!(storage.count_documents(&agent_id).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_delete_all_documents() {
        let (pool, agent_id) = setup().await;
        let storage = DocumentStorage::new(pool);

        storage.create_document(&agent_id, input("a")).await.unwrap();
        storage.create_document(&agent_id, input("b")).await.unwrap();

        let removed = storage.delete_all_documents(&agent_id).await.unwrap();
        assert_eq!(removed, 2);
        assert_eq!(storage.count_documents(&agent_id).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_embedding_roundtrip() {
        let (pool, agent_id) = setup().await;
        let storage = DocumentStorage::new(pool);

        let doc = storage.create_document(&agent_id, input("vec")).await.unwrap();

        let rows = storage.list_with_embeddings(&agent_id).await.unwrap();
        assert!(rows[0].embedding.is_none());

        storage.set_embedding(&doc.id, &[0.25, -0.5, 1.0]).await.unwrap();

        let rows = storage.list_with_embeddings(&agent_id).await.unwrap();
        assert_eq!(rows[0].embedding.as_deref(), Some(&[0.25, -0.5, 1.0][..]));

        storage.clear_embeddings(&agent_id).await.unwrap();
        let rows = storage.list_with_embeddings(&agent_id).await.unwrap();
        assert!(rows[0].embedding.is_none());
    }
}

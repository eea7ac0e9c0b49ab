// ABOUTME: Per-agent in-memory vector index over persisted embeddings
// ABOUTME: SQLite rows are authoritative; the index is a rebuildable cache

use std::collections::HashMap;
use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::embeddings::{Embedder, EmbeddingError};
use agentdesk_documents::{AgentDocument, DocumentStorage};
use agentdesk_storage::StorageError;

#[derive(Error, Debug)]
pub enum VectorError {
    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Embedding(#[from] EmbeddingError),
}

/// A document matched by similarity search, highest score first
#[derive(Debug, Clone, Serialize)]
pub struct ScoredDocument {
    #[serde(flatten)]
    pub document: AgentDocument,
    pub score: f32,
}

#[derive(Clone)]
struct IndexedDocument {
    document: AgentDocument,
    embedding: Vec<f32>,
}

/// One in-memory index per agent, loaded on first use
pub struct AgentVectorStore {
    documents: Arc<DocumentStorage>,
    embedder: Arc<dyn Embedder>,
    indexes: RwLock<HashMap<String, Vec<IndexedDocument>>>,
}

impl AgentVectorStore {
    pub fn new(documents: Arc<DocumentStorage>, embedder: Arc<dyn Embedder>) -> Self {
        Self {
            documents,
            embedder,
            indexes: RwLock::new(HashMap::new()),
        }
    }

    /// Load an agent's index from the database if not already in memory.
    /// Documents missing a persisted embedding are embedded and backfilled.
    pub async fn ensure_index(&self, agent_id: &str) -> Result<(), VectorError> {
        {
            let indexes = self.indexes.read().await;
            if indexes.contains_key(agent_id) {
                return Ok(());
            }
        }
        self.load_index(agent_id).await
    }

    /// Embed new documents and append them to the agent's index
    pub async fn add_documents(
        &self,
        agent_id: &str,
        documents: &[AgentDocument],
    ) -> Result<(), VectorError> {
        if documents.is_empty() {
            return Ok(());
        }
        self.ensure_index(agent_id).await?;

        let texts: Vec<String> = documents.iter().map(|d| d.content.clone()).collect();
        let vectors = self.embedder.embed(&texts).await?;

        let mut entries = Vec::with_capacity(documents.len());
        for (document, embedding) in documents.iter().zip(vectors) {
            self.documents.set_embedding(&document.id, &embedding).await?;
            entries.push(IndexedDocument {
                document: document.clone(),
                embedding,
            });
        }

        let mut indexes = self.indexes.write().await;
        indexes.entry(agent_id.to_string()).or_default().extend(entries);
        Ok(())
    }

    /// Return the top-k documents by cosine similarity to the query.
    /// An empty corpus yields an empty result rather than an error.
    pub async fn similarity_search(
        &self,
        agent_id: &str,
        query: &str,
        k: usize,
    ) -> Result<Vec<ScoredDocument>, VectorError> {
        self.ensure_index(agent_id).await?;

        let query_vector = {
            let indexes = self.indexes.read().await;
            match indexes.get(agent_id) {
                Some(entries) if !entries.is_empty() => {}
                _ => return Ok(Vec::new()),
            }
            drop(indexes);
            let mut vectors = self.embedder.embed(&[query.to_string()]).await?;
            match vectors.pop() {
                Some(v) => v,
                None => return Ok(Vec::new()),
            }
        };

        let indexes = self.indexes.read().await;
        let entries = match indexes.get(agent_id) {
            Some(entries) => entries,
            None => return Ok(Vec::new()),
        };

        let mut scored: Vec<ScoredDocument> = entries
            .iter()
            .map(|entry| ScoredDocument {
                document: entry.document.clone(),
                score: cosine_similarity(&query_vector, &entry.embedding),
            })
            .collect();
        scored.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(k);
        Ok(scored)
    }

    /// Drop an agent's in-memory index
    pub async fn clear(&self, agent_id: &str) {
        let mut indexes = self.indexes.write().await;
        indexes.remove(agent_id);
        debug!("Cleared vector index for agent {}", agent_id);
    }

    /// Rebuild an agent's index from the database, re-embedding rows
    /// whose persisted embedding is missing
    pub async fn sync_from_database(&self, agent_id: &str) -> Result<usize, VectorError> {
        self.clear(agent_id).await;
        self.load_index(agent_id).await?;
        let indexes = self.indexes.read().await;
        Ok(indexes.get(agent_id).map(|e| e.len()).unwrap_or(0))
    }

    async fn load_index(&self, agent_id: &str) -> Result<(), VectorError> {
        let rows = self.documents.list_with_embeddings(agent_id).await?;

        let mut entries = Vec::with_capacity(rows.len());
        let mut missing: Vec<String> = Vec::new();
        for row in &rows {
            match &row.embedding {
                Some(embedding) => entries.push(IndexedDocument {
                    document: row.document.clone(),
                    embedding: embedding.clone(),
                }),
                None => missing.push(row.document.content.clone()),
            }
        }

        if !missing.is_empty() {
            warn!(
                "Backfilling {} missing embeddings for agent {}",
                missing.len(),
                agent_id
            );
            let vectors = self.embedder.embed(&missing).await?;
            let backfilled: Vec<&agentdesk_documents::EmbeddedDocument> =
                rows.iter().filter(|r| r.embedding.is_none()).collect();
            for (row, embedding) in backfilled.into_iter().zip(vectors) {
                self.documents.set_embedding(&row.document.id, &embedding).await?;
                entries.push(IndexedDocument {
                    document: row.document.clone(),
                    embedding,
                });
            }
        }

        debug!("Loaded {} documents into index for agent {}", entries.len(), agent_id);
        let mut indexes = self.indexes.write().await;
        indexes.insert(agent_id.to_string(), entries);
        Ok(())
    }
}

fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let mut dot = 0.0f32;
    let mut norm_a = 0.0f32;
    let mut norm_b = 0.0f32;
    for (x, y) in a.iter().zip(b.iter()) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a.sqrt() * norm_b.sqrt())
}

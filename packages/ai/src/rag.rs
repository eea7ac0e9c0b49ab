// ABOUTME: Retrieval-augmented answering over an agent's document corpus
// ABOUTME: Retrieves top-k documents and feeds them to the chat model as context

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::service::{AiServiceError, ChatMessage, ChatModel, Usage};
use agentdesk_vector::{AgentVectorStore, VectorError};

pub const NO_DOCUMENTS_ANSWER: &str =
    "I could not find relevant information about this question in the available documents.";

/// How many documents the invoke flow retrieves per question
pub const INVOKE_RETRIEVAL_K: usize = 5;

/// How many documents the dashboard ask flow retrieves per question
pub const ASK_RETRIEVAL_K: usize = 10;

#[derive(Debug, thiserror::Error)]
pub enum RagError {
    #[error(transparent)]
    Vector(#[from] VectorError),

    #[error(transparent)]
    Chat(#[from] AiServiceError),
}

#[derive(Debug)]
pub struct RagAnswer {
    pub content: String,
    pub usage: Usage,
    /// How many documents were retrieved as context
    pub documents_used: usize,
}

pub struct RagPipeline {
    vector_store: Arc<AgentVectorStore>,
    chat_model: Arc<dyn ChatModel>,
}

impl RagPipeline {
    pub fn new(vector_store: Arc<AgentVectorStore>, chat_model: Arc<dyn ChatModel>) -> Self {
        Self {
            vector_store,
            chat_model,
        }
    }

    /// Answer a question against an agent's corpus. When retrieval finds
    /// nothing, returns a fixed answer without calling the model.
    pub async fn answer(
        &self,
        agent_id: &str,
        system_prompt: &str,
        temperature: f64,
        question: &str,
        k: usize,
    ) -> Result<RagAnswer, RagError> {
        // Embedding failures degrade to an empty retrieval; database
        // errors still propagate.
        let documents = match self
            .vector_store
            .similarity_search(agent_id, question, k)
            .await
        {
            Ok(documents) => documents,
            Err(VectorError::Embedding(e)) => {
                warn!("Similarity search failed for agent {}: {}", agent_id, e);
                Vec::new()
            }
            Err(e) => return Err(e.into()),
        };

        if documents.is_empty() {
            debug!("No relevant documents for agent {}", agent_id);
            return Ok(RagAnswer {
                content: NO_DOCUMENTS_ANSWER.to_string(),
                usage: Usage::default(),
                documents_used: 0,
            });
        }

        let context = documents
            .iter()
            .enumerate()
            .map(|(i, doc)| {
                format!(
                    "Document {} (Source: {}):\n{}",
                    i + 1,
                    doc.document.title,
                    doc.document.content
                )
            })
            .collect::<Vec<_>>()
            .join("\n\n");

        let messages = vec![
            ChatMessage::system(system_prompt),
            ChatMessage::system(format!("Relevant context from documents:\n{}", context)),
            ChatMessage::user(question),
        ];

        info!(
            "Calling chat model for agent {} with {} context documents",
            agent_id,
            documents.len()
        );
        let response = self.chat_model.complete(&messages, temperature).await?;

        Ok(RagAnswer {
            content: response.content,
            usage: response.usage,
            documents_used: documents.len(),
        })
    }
}

// ABOUTME: Vector search for agent document corpora
// ABOUTME: OpenAI embeddings plus a per-agent in-memory cosine index

pub mod embeddings;
pub mod store;

pub use embeddings::{Embedder, EmbeddingError, OpenAiEmbedder};
pub use store::{AgentVectorStore, ScoredDocument, VectorError};

use anyhow::{Context, Result};
use embeddings::{create_embedding_provider, embed_query, EmbeddingProvider};
use llm::{LlmClient, ModelConfig};
use log::info;
use rag_core::{ApiKeys, Config, Document};
use vector_store::AnyVectorStore;

use crate::errors::ApiError;
use crate::prompt::build_prompt;

/// Retrieval and answering shared by every request handler.
pub struct RagService {
    embedder: Box<dyn EmbeddingProvider>,
    store: AnyVectorStore,
    llm: LlmClient,
    top_k: usize,
}

impl std::fmt::Debug for RagService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RagService")
            .field("embedder", &"EmbeddingProvider<...>")
            .field("store", &"AnyVectorStore<...>")
            .field("llm", &self.llm.model())
            .field("top_k", &self.top_k)
            .finish()
    }
}

impl RagService {
    pub async fn new(config: &Config, keys: &ApiKeys) -> Result<Self> {
        let embedder = create_embedding_provider(&config.embedding)
            .context("Failed to create embedding provider")?;

        let store = AnyVectorStore::connect(&config.pgvector.url, embedder.dimension())
            .await
            .context("Failed to initialize vector store")?;

        let llm = LlmClient::new(ModelConfig::for_completion(&config.llm, keys.groq.clone()))
            .context("Failed to create LLM client")?;

        Ok(Self::with_clients(embedder, store, llm, config.retrieval.top_k))
    }

    pub fn with_clients(
        embedder: Box<dyn EmbeddingProvider>,
        store: AnyVectorStore,
        llm: LlmClient,
        top_k: usize,
    ) -> Self {
        Self {
            embedder,
            store,
            llm,
            top_k,
        }
    }

    pub fn store(&self) -> &AnyVectorStore {
        &self.store
    }

    /// The `top_k` stored chunks closest to the query, most similar first.
    pub async fn retrieve(&self, query: &str) -> Result<Vec<Document>, ApiError> {
        let embedding = embed_query(self.embedder.as_ref(), query)
            .await
            .map_err(|e| ApiError::Embedding(format!("{:#}", e)))?;

        let results = self
            .store
            .search_similar(embedding, self.top_k)
            .await
            .map_err(|e| ApiError::VectorStore(format!("{:#}", e)))?;

        info!(
            "Found {} similar chunks (best similarity {:.3})",
            results.len(),
            results.first().map(|r| r.similarity).unwrap_or(0.0)
        );

        Ok(results.iter().map(|r| r.chunk.to_document()).collect())
    }

    pub async fn ask(&self, question: &str, context: &[Document]) -> Result<String, ApiError> {
        let prompt = build_prompt(question, context);

        let answer = self
            .llm
            .complete(&prompt)
            .await
            .map_err(|e| ApiError::Llm(format!("{:#}", e)))?;

        Ok(answer.trim().to_string())
    }
}

use anyhow::{Context, Result};

use crate::memory::InMemoryVectorStore;
use crate::models::{DocumentChunk, SearchResult, StoredChunk};
use crate::store::VectorStore;

/// Store selected from the configured URL: `postgres://`/`postgresql://` or `memory://`.
pub enum AnyVectorStore {
    Real(VectorStore),
    InMemory(InMemoryVectorStore),
}

impl AnyVectorStore {
    pub async fn connect(url: &str, embedding_dimensions: usize) -> Result<Self> {
        if url.starts_with("memory://") {
            tracing::info!("Using in-memory vector store");
            Ok(AnyVectorStore::InMemory(InMemoryVectorStore::new()))
        } else if url.starts_with("postgresql://") || url.starts_with("postgres://") {
            tracing::info!(
                "Initializing PostgreSQL vector store with {} dimensions",
                embedding_dimensions
            );
            let store = VectorStore::new_with_dimensions(url, embedding_dimensions)
                .await
                .context("Failed to connect to PostgreSQL vector store")?;
            Ok(AnyVectorStore::Real(store))
        } else {
            anyhow::bail!(
                "Invalid vector store URL: {}, must start with 'postgresql://' or 'memory://'",
                url
            );
        }
    }

    pub async fn insert_chunks(&self, chunks: Vec<DocumentChunk>) -> Result<Vec<StoredChunk>> {
        match self {
            AnyVectorStore::Real(store) => store.insert_chunks(chunks).await,
            AnyVectorStore::InMemory(store) => store.insert_chunks(chunks).await,
        }
    }

    pub async fn search_similar(
        &self,
        query_embedding: Vec<f32>,
        limit: usize,
    ) -> Result<Vec<SearchResult>> {
        match self {
            AnyVectorStore::Real(store) => store.search_similar(query_embedding, limit).await,
            AnyVectorStore::InMemory(store) => store.search_similar(query_embedding, limit).await,
        }
    }

    pub async fn get_document_count(&self) -> Result<i64> {
        match self {
            AnyVectorStore::Real(store) => store.get_document_count().await,
            AnyVectorStore::InMemory(store) => store.get_document_count().await,
        }
    }

    pub async fn delete_all_documents(&self) -> Result<()> {
        match self {
            AnyVectorStore::Real(store) => store.delete_all_documents().await,
            AnyVectorStore::InMemory(store) => store.delete_all_documents().await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rag_core::DocumentMetadata;

    #[tokio::test]
    async fn should_connect_to_memory_store() {
        let store = AnyVectorStore::connect("memory://", 3).await.unwrap();
        assert!(matches!(store, AnyVectorStore::InMemory(_)));
    }

    #[tokio::test]
    async fn should_reject_unknown_scheme() {
        let result = AnyVectorStore::connect("sqlite://./dev.db", 3).await;

        let error = result.err().unwrap().to_string();
        assert!(error.contains("Invalid vector store URL"));
    }

    #[tokio::test]
    async fn should_dispatch_inserts_and_searches() {
        let store = AnyVectorStore::connect("memory://", 2).await.unwrap();
        store
            .insert_chunks(vec![DocumentChunk::new(
                0,
                "hello".to_string(),
                DocumentMetadata::text(1, "a.txt"),
                vec![1.0, 0.0],
            )])
            .await
            .unwrap();

        let results = store.search_similar(vec![1.0, 0.0], 5).await.unwrap();

        assert_eq!(store.get_document_count().await.unwrap(), 1);
        assert_eq!(results[0].chunk.content, "hello");
    }
}

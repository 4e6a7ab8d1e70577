use anyhow::Result;
use tokio::sync::RwLock;

use crate::models::{DocumentChunk, SearchResult, StoredChunk};

/// In-process store used for development and tests. Brute-force cosine search.
#[derive(Default)]
pub struct InMemoryVectorStore {
    chunks: RwLock<Vec<StoredChunk>>,
}

impl InMemoryVectorStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert_chunks(&self, chunks: Vec<DocumentChunk>) -> Result<Vec<StoredChunk>> {
        let stored: Vec<StoredChunk> = chunks.into_iter().map(DocumentChunk::into_stored).collect();
        self.chunks.write().await.extend(stored.iter().cloned());
        Ok(stored)
    }

    pub async fn search_similar(
        &self,
        query_embedding: Vec<f32>,
        limit: usize,
    ) -> Result<Vec<SearchResult>> {
        let chunks = self.chunks.read().await;

        let mut scored: Vec<SearchResult> = chunks
            .iter()
            .map(|chunk| {
                let similarity = cosine_similarity(&query_embedding, &chunk.embedding);
                SearchResult::new(chunk.clone(), similarity)
            })
            .collect();

        scored.sort_by(|a, b| b.similarity.total_cmp(&a.similarity));
        scored.truncate(limit);
        Ok(scored)
    }

    pub async fn get_document_count(&self) -> Result<i64> {
        Ok(self.chunks.read().await.len() as i64)
    }

    pub async fn delete_all_documents(&self) -> Result<()> {
        self.chunks.write().await.clear();
        Ok(())
    }
}

fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }

    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        0.0
    } else {
        dot / (norm_a * norm_b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rag_core::DocumentMetadata;

    fn chunk(content: &str, embedding: Vec<f32>) -> DocumentChunk {
        DocumentChunk::new(
            0,
            content.to_string(),
            DocumentMetadata::text(1, "doc.txt"),
            embedding,
        )
    }

    #[test]
    fn should_compute_cosine_similarity() {
        assert!((cosine_similarity(&[1.0, 0.0], &[1.0, 0.0]) - 1.0).abs() < 1e-6);
        assert!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]).abs() < 1e-6);
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 0.0]), 0.0);
        assert_eq!(cosine_similarity(&[1.0], &[1.0, 0.0]), 0.0);
    }

    #[tokio::test]
    async fn should_return_empty_results_for_empty_store() {
        let store = InMemoryVectorStore::new();
        let results = store.search_similar(vec![1.0, 0.0], 5).await.unwrap();
        assert!(results.is_empty());
    }

    #[tokio::test]
    async fn should_rank_results_by_similarity() {
        let store = InMemoryVectorStore::new();
        store
            .insert_chunks(vec![
                chunk("east", vec![1.0, 0.0]),
                chunk("north", vec![0.0, 1.0]),
                chunk("north-east", vec![0.7, 0.7]),
            ])
            .await
            .unwrap();

        let results = store.search_similar(vec![0.0, 1.0], 2).await.unwrap();

        assert_eq!(results.len(), 2);
        assert_eq!(results[0].chunk.content, "north");
        assert_eq!(results[1].chunk.content, "north-east");
        assert!(results[0].similarity >= results[1].similarity);
    }

    #[tokio::test]
    async fn should_return_fewer_results_than_limit_when_store_is_small() {
        let store = InMemoryVectorStore::new();
        store
            .insert_chunks(vec![chunk("only", vec![1.0, 0.0])])
            .await
            .unwrap();

        let results = store.search_similar(vec![1.0, 0.0], 5).await.unwrap();

        assert_eq!(results.len(), 1);
    }

    #[tokio::test]
    async fn should_count_and_clear_documents() {
        let store = InMemoryVectorStore::new();
        store
            .insert_chunks(vec![chunk("a", vec![1.0]), chunk("b", vec![0.5])])
            .await
            .unwrap();
        assert_eq!(store.get_document_count().await.unwrap(), 2);

        store.delete_all_documents().await.unwrap();

        assert_eq!(store.get_document_count().await.unwrap(), 0);
    }
}

use anyhow::Result;

use crate::huggingface::MINILM_DIMENSION;

/// Offline embeddings provider for development and tests.
/// Hashes lowercase word tokens into buckets so texts sharing words land close together.
pub struct FallbackEmbeddingProvider {
    embedding_dim: usize,
}

impl FallbackEmbeddingProvider {
    pub fn new(embedding_dim: usize) -> Self {
        Self { embedding_dim }
    }

    /// Same dimension as all-MiniLM-L6-v2 so either provider can fill the same table.
    pub fn with_standard_dimension() -> Self {
        Self::new(MINILM_DIMENSION)
    }

    pub async fn embed(&self, texts: Vec<String>) -> Result<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|text| self.embed_one(text)).collect())
    }

    fn embed_one(&self, text: &str) -> Vec<f32> {
        let mut embedding = vec![0.0f32; self.embedding_dim];
        if self.embedding_dim == 0 {
            return embedding;
        }

        for token in text
            .split(|c: char| !c.is_alphanumeric())
            .filter(|token| !token.is_empty())
        {
            let bucket = (fnv1a(&token.to_lowercase()) % self.embedding_dim as u64) as usize;
            embedding[bucket] += 1.0;
        }

        let norm = embedding.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm == 0.0 {
            embedding[0] = 1.0;
        } else {
            embedding.iter_mut().for_each(|x| *x /= norm);
        }

        embedding
    }

    pub fn embedding_dimension(&self) -> usize {
        self.embedding_dim
    }
}

fn fnv1a(text: &str) -> u64 {
    text.bytes().fold(0xcbf29ce484222325, |hash, byte| {
        (hash ^ byte as u64).wrapping_mul(0x100000001b3)
    })
}

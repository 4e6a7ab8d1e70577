pub mod chunker;
pub mod fallback;
pub mod huggingface;

pub use chunker::{ChunkConfig, TextChunk, TextChunker};
pub use fallback::FallbackEmbeddingProvider;
pub use huggingface::{HuggingFaceClient, HuggingFaceConfig};
pub use rag_core::EmbeddingConfig;

use anyhow::Result;
use rag_core::ApiKeys;

type EmbedFuture<'a> =
    std::pin::Pin<Box<dyn std::future::Future<Output = Result<Vec<Vec<f32>>>> + Send + 'a>>;

pub trait EmbeddingProvider: Send + Sync {
    fn embed(&self, texts: Vec<String>) -> EmbedFuture<'_>;
    fn dimension(&self) -> usize;
}

impl EmbeddingProvider for HuggingFaceClient {
    fn embed(&self, texts: Vec<String>) -> EmbedFuture<'_> {
        Box::pin(self.embed(texts))
    }
    fn dimension(&self) -> usize {
        self.dimensions()
    }
}

impl EmbeddingProvider for FallbackEmbeddingProvider {
    fn embed(&self, texts: Vec<String>) -> EmbedFuture<'_> {
        Box::pin(self.embed(texts))
    }
    fn dimension(&self) -> usize {
        self.embedding_dimension()
    }
}

pub fn create_embedding_provider(cfg: &EmbeddingConfig) -> Result<Box<dyn EmbeddingProvider>> {
    match cfg.provider.as_str() {
        "huggingface" => {
            let defaults = HuggingFaceConfig::default();
            let hf_cfg = HuggingFaceConfig {
                api_token: ApiKeys::from_env().huggingface.unwrap_or_default(),
                model: cfg.model.clone().unwrap_or(defaults.model),
                base_url: cfg.base_url.clone().unwrap_or(defaults.base_url),
                dimensions: cfg.dimensions.unwrap_or(defaults.dimensions),
                ..HuggingFaceConfig::default()
            };
            Ok(Box::new(HuggingFaceClient::new(hf_cfg)?))
        }
        other => {
            if other != "fallback" {
                tracing::warn!(
                    "Unknown embedding provider '{}', using offline fallback embeddings",
                    other
                );
            }
            let provider = match cfg.dimensions {
                Some(dim) => FallbackEmbeddingProvider::new(dim),
                None => FallbackEmbeddingProvider::with_standard_dimension(),
            };
            Ok(Box::new(provider))
        }
    }
}

/// Embeds a single query string.
pub async fn embed_query(provider: &dyn EmbeddingProvider, text: &str) -> Result<Vec<f32>> {
    provider
        .embed(vec![text.to_string()])
        .await?
        .into_iter()
        .next()
        .ok_or_else(|| anyhow::anyhow!("Embedding provider returned no vector for the query"))
}

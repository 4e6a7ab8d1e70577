use anyhow::{Context, Result};
use embeddings::{create_embedding_provider, ChunkConfig, EmbeddingProvider, TextChunker};
use llm::{ModelConfig, VisionClient};
use rag_core::{ApiKeys, Config};
use std::path::Path;
use tracing::info;
use vector_store::{AnyVectorStore, DocumentChunk};

use crate::describe::{ImageProcessor, VisionDescriber};
use crate::imgbb::ImgbbClient;
use crate::loader::DocumentLoader;

const DEFAULT_BATCH_SIZE: usize = 32;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct IngestionReport {
    pub documents: usize,
    pub chunks: usize,
    pub stored: usize,
}

/// Load, split, embed and store every supported file in a directory.
pub struct IngestionPipeline {
    loader: DocumentLoader,
    chunker: TextChunker,
    embedder: Box<dyn EmbeddingProvider>,
    store: AnyVectorStore,
    batch_size: usize,
}

impl IngestionPipeline {
    pub fn new(
        loader: DocumentLoader,
        chunker: TextChunker,
        embedder: Box<dyn EmbeddingProvider>,
        store: AnyVectorStore,
    ) -> Self {
        Self {
            loader,
            chunker,
            embedder,
            store,
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    pub async fn from_config(config: &Config, keys: &ApiKeys) -> Result<Self> {
        let host = ImgbbClient::new(&config.image_host, keys.imgbb.clone())?;
        let vision = VisionClient::new(ModelConfig::for_vision(&config.vision, keys.groq.clone()))?;
        let images = ImageProcessor::new(
            Box::new(host),
            Box::new(VisionDescriber::new(vision, config.vision.prompt.clone())),
        );
        let loader = DocumentLoader::new(&config.data.image_dir, images);

        let chunker = TextChunker::new(ChunkConfig::with_sizes(
            config.chunking.chunk_size,
            config.chunking.chunk_overlap,
        ));

        let embedder = create_embedding_provider(&config.embedding)
            .context("Failed to create embedding provider")?;
        let store = AnyVectorStore::connect(&config.pgvector.url, embedder.dimension()).await?;

        Ok(Self::new(loader, chunker, embedder, store))
    }

    pub fn store(&self) -> &AnyVectorStore {
        &self.store
    }

    pub async fn run(&self, dir: &Path, reset: bool) -> Result<IngestionReport> {
        if reset {
            info!("Clearing existing documents from the vector store");
            self.store.delete_all_documents().await?;
        }

        let documents = self.loader.load_documents(dir).await?;
        let chunks = self.chunker.split_documents(&documents);
        info!(
            "Split {} documents into {} chunks",
            documents.len(),
            chunks.len()
        );

        let mut stored = 0;
        for (batch_index, batch) in chunks.chunks(self.batch_size).enumerate() {
            let texts: Vec<String> = batch.iter().map(|doc| doc.page_content.clone()).collect();
            let embeddings = self
                .embedder
                .embed(texts)
                .await
                .with_context(|| format!("Failed to embed batch {}", batch_index + 1))?;

            if embeddings.len() != batch.len() {
                anyhow::bail!(
                    "Embedding provider returned {} vectors for {} chunks",
                    embeddings.len(),
                    batch.len()
                );
            }

            let offset = batch_index * self.batch_size;
            let items: Vec<DocumentChunk> = batch
                .iter()
                .cloned()
                .zip(embeddings)
                .enumerate()
                .map(|(i, (doc, embedding))| DocumentChunk::from_document(offset + i, doc, embedding))
                .collect();

            stored += self.store.insert_chunks(items).await?.len();
            tracing::debug!("Stored batch {} ({} chunks so far)", batch_index + 1, stored);
        }

        info!("Stored {} chunks in the vector store", stored);
        Ok(IngestionReport {
            documents: documents.len(),
            chunks: chunks.len(),
            stored,
        })
    }
}

use chrono::{DateTime, Utc};
use rag_core::{Document, DocumentMetadata};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A chunk persisted in the store, with its identity and insertion time.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StoredChunk {
    pub id: Uuid,
    pub chunk_id: usize,
    pub content: String,
    pub metadata: DocumentMetadata,
    pub embedding: Vec<f32>,
    pub created_at: DateTime<Utc>,
}

impl StoredChunk {
    pub fn to_document(&self) -> Document {
        Document::new(self.content.clone(), self.metadata.clone())
    }
}

/// A chunk ready for insertion: content, metadata and its embedding.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentChunk {
    pub chunk_id: usize,
    pub content: String,
    pub metadata: DocumentMetadata,
    pub embedding: Vec<f32>,
}

impl DocumentChunk {
    pub fn new(
        chunk_id: usize,
        content: String,
        metadata: DocumentMetadata,
        embedding: Vec<f32>,
    ) -> Self {
        Self {
            chunk_id,
            content,
            metadata,
            embedding,
        }
    }

    pub fn from_document(chunk_id: usize, document: Document, embedding: Vec<f32>) -> Self {
        Self::new(chunk_id, document.page_content, document.metadata, embedding)
    }

    pub fn into_stored(self) -> StoredChunk {
        StoredChunk {
            id: Uuid::new_v4(),
            chunk_id: self.chunk_id,
            content: self.content,
            metadata: self.metadata,
            embedding: self.embedding,
            created_at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResult {
    pub chunk: StoredChunk,
    pub similarity: f32,
}

impl SearchResult {
    pub fn new(chunk: StoredChunk, similarity: f32) -> Self {
        Self { chunk, similarity }
    }
}

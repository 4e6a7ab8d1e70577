pub mod config;
pub mod document;

pub use config::{ApiKeys, Config, EmbeddingConfig};
pub use document::{Document, DocumentMetadata, DocumentType};

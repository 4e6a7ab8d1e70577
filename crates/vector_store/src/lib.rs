pub mod any;
pub mod memory;
pub mod models;
pub mod store;

pub use any::AnyVectorStore;
pub use memory::InMemoryVectorStore;
pub use models::{DocumentChunk, SearchResult, StoredChunk};
pub use store::{VectorStore, SCHEMA_DIMENSIONS};

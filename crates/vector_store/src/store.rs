use anyhow::{Context, Result};
use pgvector::Vector;
use rag_core::DocumentMetadata;
use sqlx::postgres::PgRow;
use sqlx::types::Json;
use sqlx::{PgPool, Row};

use crate::models::{DocumentChunk, SearchResult, StoredChunk};

/// Width of the `documents.embedding` column created by the V1 migration.
pub const SCHEMA_DIMENSIONS: usize = 384;

/// Postgres + pgvector backed store. Similarity is cosine, highest first.
pub struct VectorStore {
    pool: PgPool,
    embedding_dimensions: usize,
}

impl VectorStore {
    pub async fn new(database_url: &str) -> Result<Self> {
        Self::new_with_dimensions(database_url, SCHEMA_DIMENSIONS).await
    }

    pub async fn new_with_dimensions(
        database_url: &str,
        embedding_dimensions: usize,
    ) -> Result<Self> {
        if embedding_dimensions != SCHEMA_DIMENSIONS {
            anyhow::bail!(
                "Embedding dimension {} does not match the documents.embedding vector({}) column",
                embedding_dimensions,
                SCHEMA_DIMENSIONS
            );
        }

        let pool = PgPool::connect(database_url)
            .await
            .context("Failed to connect to PostgreSQL")?;

        db_migrations::run_migrations(database_url)
            .await
            .context("Failed to run database migrations")?;

        tracing::info!(
            "Vector store ready with {} dimensional embeddings",
            embedding_dimensions
        );

        Ok(Self {
            pool,
            embedding_dimensions,
        })
    }

    pub fn embedding_dimensions(&self) -> usize {
        self.embedding_dimensions
    }

    fn check_dimensions(&self, embedding: &[f32], what: &str) -> Result<()> {
        if embedding.len() != self.embedding_dimensions {
            return Err(anyhow::anyhow!(
                "{} dimension mismatch: expected {}, got {}",
                what,
                self.embedding_dimensions,
                embedding.len()
            ));
        }
        Ok(())
    }

    pub async fn insert_chunk(&self, chunk: DocumentChunk) -> Result<StoredChunk> {
        let mut inserted = self.insert_chunks(vec![chunk]).await?;
        inserted
            .pop()
            .ok_or_else(|| anyhow::anyhow!("Insert returned no rows"))
    }

    /// Inserts all chunks in one transaction; either every chunk lands or none does.
    pub async fn insert_chunks(&self, chunks: Vec<DocumentChunk>) -> Result<Vec<StoredChunk>> {
        for chunk in &chunks {
            self.check_dimensions(&chunk.embedding, "Embedding")?;
        }

        let mut tx = self
            .pool
            .begin()
            .await
            .context("Failed to start insert transaction")?;

        let mut stored = Vec::with_capacity(chunks.len());
        for chunk in chunks {
            let chunk = chunk.into_stored();

            sqlx::query(
                r#"
                INSERT INTO documents
                    (id, chunk_id, content, doc_type, page_number, source, metadata, embedding, created_at)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
                "#,
            )
            .bind(chunk.id)
            .bind(chunk.chunk_id as i32)
            .bind(&chunk.content)
            .bind(chunk.metadata.doc_type.to_string())
            .bind(chunk.metadata.page_number as i32)
            .bind(&chunk.metadata.source)
            .bind(Json(&chunk.metadata))
            .bind(Vector::from(chunk.embedding.clone()))
            .bind(chunk.created_at)
            .execute(&mut *tx)
            .await
            .context("Failed to insert document chunk")?;

            stored.push(chunk);
        }

        tx.commit()
            .await
            .context("Failed to commit inserted chunks")?;

        tracing::info!("Inserted {} chunks", stored.len());
        Ok(stored)
    }

    pub async fn search_similar(
        &self,
        query_embedding: Vec<f32>,
        limit: usize,
    ) -> Result<Vec<SearchResult>> {
        self.check_dimensions(&query_embedding, "Query embedding")?;

        let query_vector = Vector::from(query_embedding);

        let rows = sqlx::query(
            r#"
            SELECT
                id,
                chunk_id,
                content,
                metadata,
                embedding,
                created_at,
                1 - (embedding <=> $1) AS similarity
            FROM documents
            ORDER BY embedding <=> $1
            LIMIT $2
            "#,
        )
        .bind(query_vector)
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await
        .context("Failed to execute similarity search")?;

        tracing::debug!("Similarity search returned {} rows", rows.len());

        rows.iter().map(search_result_from_row).collect()
    }

    pub async fn get_document_count(&self) -> Result<i64> {
        let row = sqlx::query("SELECT COUNT(*) as count FROM documents")
            .fetch_one(&self.pool)
            .await
            .context("Failed to get document count")?;

        Ok(row.get("count"))
    }

    pub async fn delete_all_documents(&self) -> Result<()> {
        sqlx::query("DELETE FROM documents")
            .execute(&self.pool)
            .await
            .context("Failed to delete all documents")?;

        Ok(())
    }
}

fn search_result_from_row(row: &PgRow) -> Result<SearchResult> {
    let embedding: Vector = row.try_get("embedding").context("Missing embedding column")?;
    let Json(metadata): Json<DocumentMetadata> = row
        .try_get("metadata")
        .context("Failed to decode chunk metadata")?;
    let similarity: f64 = row.try_get("similarity")?;

    let chunk = StoredChunk {
        id: row.try_get("id")?,
        chunk_id: row.try_get::<i32, _>("chunk_id")? as usize,
        content: row.try_get("content")?,
        metadata,
        embedding: embedding.into(),
        created_at: row.try_get("created_at")?,
    };

    Ok(SearchResult::new(chunk, similarity as f32))
}

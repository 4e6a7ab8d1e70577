use anyhow::{Context, Result};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use rag_core::{Document, DocumentMetadata};
use std::path::{Path, PathBuf};
use tracing::info;

use crate::describe::ImageProcessor;
use crate::markdown::to_plain_text;
use crate::pdf::{PdfFile, PdfPage};
use crate::tables::{detect_tables, table_to_text};

/// Turns a directory of `.pdf`, `.txt` and `.md` files into documents.
pub struct DocumentLoader {
    image_dir: PathBuf,
    images: ImageProcessor,
}

impl DocumentLoader {
    pub fn new(image_dir: impl Into<PathBuf>, images: ImageProcessor) -> Self {
        Self {
            image_dir: image_dir.into(),
            images,
        }
    }

    /// Files are visited in name order; subdirectories and other extensions are skipped.
    pub async fn load_documents(&self, dir: &Path) -> Result<Vec<Document>> {
        if !dir.is_dir() {
            return Err(anyhow::anyhow!(
                "Documents directory does not exist: {}",
                dir.display()
            ));
        }

        let mut paths: Vec<PathBuf> = std::fs::read_dir(dir)
            .with_context(|| format!("Failed to read documents directory: {}", dir.display()))?
            .filter_map(|entry| entry.ok().map(|entry| entry.path()))
            .filter(|path| path.is_file())
            .collect();
        paths.sort();

        let mut documents = Vec::new();
        for path in paths {
            let extension = path
                .extension()
                .and_then(|ext| ext.to_str())
                .map(|ext| ext.to_ascii_lowercase());

            let loaded = match extension.as_deref() {
                Some("pdf") => self.load_pdf(&path).await?,
                Some("txt") => load_text(&path).await?,
                Some("md") => load_markdown(&path).await?,
                _ => {
                    tracing::debug!("Skipping unsupported file: {}", path.display());
                    continue;
                }
            };
            documents.extend(loaded);
        }

        info!(
            "Loaded total {} documents from {}",
            documents.len(),
            dir.display()
        );
        Ok(documents)
    }

    /// Text and image documents for every page, followed by table documents for every page.
    pub async fn load_pdf(&self, path: &Path) -> Result<Vec<Document>> {
        let source = path.to_string_lossy().to_string();
        let stem = path
            .file_stem()
            .map(|stem| stem.to_string_lossy().to_string())
            .unwrap_or_else(|| "document".to_string());

        let pages = PdfFile::open(path)?.pages();

        let mut documents = self.text_and_image_documents(&pages, &source, &stem).await?;
        info!(
            "Extracted {} text+image elements from {}",
            documents.len(),
            source
        );

        let tables = table_documents(&pages, &source);
        info!("Extracted {} table elements from {}", tables.len(), source);

        documents.extend(tables);
        Ok(documents)
    }

    async fn text_and_image_documents(
        &self,
        pages: &[PdfPage],
        source: &str,
        stem: &str,
    ) -> Result<Vec<Document>> {
        let mut documents = Vec::new();

        for page in pages {
            if !page.text.is_empty() {
                documents.push(Document::new(
                    page.text.clone(),
                    DocumentMetadata::text(page.number, source),
                ));
            }

            if page.images.is_empty() {
                continue;
            }
            tokio::fs::create_dir_all(&self.image_dir)
                .await
                .with_context(|| {
                    format!("Failed to create image directory: {}", self.image_dir.display())
                })?;

            for (index, image) in page.images.iter().enumerate() {
                let image_name = format!(
                    "{}_page_{}_img_{}.{}",
                    stem,
                    page.number,
                    index + 1,
                    image.ext
                );
                let image_path = self.image_dir.join(&image_name);
                tokio::fs::write(&image_path, &image.data)
                    .await
                    .with_context(|| format!("Failed to save image: {}", image_path.display()))?;

                let outcome = self.images.process(&image_path, page.number).await;

                documents.push(Document::new(
                    outcome.description,
                    DocumentMetadata::image(
                        page.number,
                        source,
                        image_name,
                        image.ext,
                        STANDARD.encode(&image.data),
                        outcome.hosted_url,
                    ),
                ));
            }
        }

        Ok(documents)
    }
}

fn table_documents(pages: &[PdfPage], source: &str) -> Vec<Document> {
    pages
        .iter()
        .flat_map(|page| {
            detect_tables(&page.marks)
                .into_iter()
                .map(|table| table_to_text(&table))
                .filter(|text| !text.trim().is_empty())
                .map(move |text| Document::new(text, DocumentMetadata::table(page.number, source)))
        })
        .collect()
}

async fn load_text(path: &Path) -> Result<Vec<Document>> {
    let content = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read file: {}", path.display()))?;

    Ok(vec![Document::new(
        content,
        DocumentMetadata::text(1, path.to_string_lossy()),
    )])
}

async fn load_markdown(path: &Path) -> Result<Vec<Document>> {
    let content = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read file: {}", path.display()))?;

    Ok(vec![Document::new(
        to_plain_text(&content),
        DocumentMetadata::text(1, path.to_string_lossy()),
    )])
}

use rag_core::Document;
use std::collections::VecDeque;

/// A text chunk with its position in the split sequence
#[derive(Debug, Clone, PartialEq)]
pub struct TextChunk {
    pub content: String,
    pub chunk_id: usize,
}

/// Configuration for text chunking. Sizes are measured in characters.
#[derive(Debug, Clone)]
pub struct ChunkConfig {
    pub chunk_size: usize,
    pub overlap_size: usize,
    /// Tried in order; the empty separator splits per character.
    pub separators: Vec<String>,
}

impl Default for ChunkConfig {
    fn default() -> Self {
        Self {
            chunk_size: 1000,
            overlap_size: 100,
            separators: vec![
                "\n\n".to_string(),
                "\n".to_string(),
                " ".to_string(),
                String::new(),
            ],
        }
    }
}

impl ChunkConfig {
    pub fn with_sizes(chunk_size: usize, overlap_size: usize) -> Self {
        Self {
            chunk_size,
            overlap_size,
            ..Self::default()
        }
    }
}

/// Recursive character splitter: prefers paragraph breaks, then lines, then words,
/// and only cuts inside a word when nothing else fits.
pub struct TextChunker {
    config: ChunkConfig,
}

impl TextChunker {
    pub fn new(config: ChunkConfig) -> Self {
        Self { config }
    }

    pub fn chunk_text(&self, text: &str) -> Vec<TextChunk> {
        if text.is_empty() {
            return vec![];
        }

        self.split_recursive(text, &self.config.separators)
            .into_iter()
            .enumerate()
            .map(|(chunk_id, content)| TextChunk { content, chunk_id })
            .collect()
    }

    /// Splits every document; each chunk carries a copy of its parent's metadata.
    pub fn split_documents(&self, documents: &[Document]) -> Vec<Document> {
        documents
            .iter()
            .flat_map(|document| {
                self.chunk_text(&document.page_content)
                    .into_iter()
                    .map(move |chunk| document.with_content(chunk.content))
            })
            .collect()
    }

    fn split_recursive(&self, text: &str, separators: &[String]) -> Vec<String> {
        let mut final_chunks = Vec::new();

        let mut separator = separators.last().map(String::as_str).unwrap_or("");
        let mut remaining: &[String] = &[];
        for (i, candidate) in separators.iter().enumerate() {
            if candidate.is_empty() {
                separator = "";
                break;
            }
            if text.contains(candidate.as_str()) {
                separator = candidate;
                remaining = &separators[i + 1..];
                break;
            }
        }

        let mut good_splits: Vec<String> = Vec::new();
        for piece in split_keeping_separator(text, separator) {
            if char_len(&piece) < self.config.chunk_size {
                good_splits.push(piece);
                continue;
            }

            if !good_splits.is_empty() {
                final_chunks.extend(self.merge_splits(&good_splits));
                good_splits.clear();
            }

            if remaining.is_empty() {
                final_chunks.push(piece);
            } else {
                final_chunks.extend(self.split_recursive(&piece, remaining));
            }
        }

        if !good_splits.is_empty() {
            final_chunks.extend(self.merge_splits(&good_splits));
        }

        final_chunks
    }

    /// Greedily packs small pieces into chunks, carrying up to `overlap_size`
    /// characters of trailing pieces into the next chunk.
    fn merge_splits(&self, splits: &[String]) -> Vec<String> {
        let chunk_size = self.config.chunk_size;
        let overlap_size = self.config.overlap_size;

        let mut chunks = Vec::new();
        let mut current: VecDeque<&str> = VecDeque::new();
        let mut total = 0usize;

        for piece in splits {
            let len = char_len(piece);

            if total + len > chunk_size {
                if total > chunk_size {
                    tracing::warn!(
                        "Created a chunk of size {}, which is longer than the specified {}",
                        total,
                        chunk_size
                    );
                }

                if !current.is_empty() {
                    if let Some(chunk) = join_trimmed(&current) {
                        chunks.push(chunk);
                    }

                    while total > overlap_size || (total + len > chunk_size && total > 0) {
                        match current.pop_front() {
                            Some(first) => total -= char_len(first),
                            None => break,
                        }
                    }
                }
            }

            current.push_back(piece);
            total += len;
        }

        if let Some(chunk) = join_trimmed(&current) {
            chunks.push(chunk);
        }

        chunks
    }
}

/// Splits at every occurrence of `separator`, keeping the separator at the
/// start of the following piece. Empty pieces are dropped.
fn split_keeping_separator(text: &str, separator: &str) -> Vec<String> {
    if separator.is_empty() {
        return text.chars().map(String::from).collect();
    }

    let mut pieces = Vec::new();
    let mut start = 0;
    for (idx, _) in text.match_indices(separator) {
        pieces.push(&text[start..idx]);
        start = idx;
    }
    pieces.push(&text[start..]);

    pieces
        .into_iter()
        .filter(|piece| !piece.is_empty())
        .map(String::from)
        .collect()
}

fn join_trimmed(pieces: &VecDeque<&str>) -> Option<String> {
    let joined: String = pieces.iter().copied().collect();
    let trimmed = joined.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

fn char_len(text: &str) -> usize {
    text.chars().count()
}

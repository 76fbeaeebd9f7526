use crate::error::IngestError;
use crate::models::{DocumentChunk, DocumentFingerprint, IngestionOptions};
use sha2::{Digest, Sha256};

#[derive(Debug, Clone, Copy)]
pub struct ChunkingConfig {
    pub max_chars: usize,
    pub overlap_chars: usize,
}

impl From<IngestionOptions> for ChunkingConfig {
    fn from(value: IngestionOptions) -> Self {
        Self {
            max_chars: value.chunk_max_chars,
            overlap_chars: value.chunk_overlap_chars,
        }
    }
}

pub fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Splits `text` into fixed-size character windows. Consecutive windows share
/// `overlap_chars` characters so local context survives a window boundary; the
/// final partial window is kept.
pub fn chunk_windows(text: &str, config: ChunkingConfig) -> Result<Vec<String>, IngestError> {
    if config.max_chars == 0 {
        return Err(IngestError::InvalidChunkConfig(
            "window size must be non-zero".to_string(),
        ));
    }
    if config.overlap_chars >= config.max_chars {
        return Err(IngestError::InvalidChunkConfig(format!(
            "overlap {} must be smaller than window {}",
            config.overlap_chars, config.max_chars
        )));
    }

    let chars: Vec<char> = text.chars().collect();
    let mut chunks = Vec::new();
    let mut start = 0usize;

    while start < chars.len() {
        let end = (start + config.max_chars).min(chars.len());
        let piece: String = chars[start..end].iter().collect();
        let trimmed = piece.trim();
        if !trimmed.is_empty() {
            chunks.push(trimmed.to_string());
        }
        if end == chars.len() {
            break;
        }
        start = start.saturating_add(config.max_chars - config.overlap_chars);
    }

    Ok(chunks)
}

/// Windows one page of text into chunks. Pages are chunked independently, so a
/// window never spans a page boundary.
pub fn build_chunks(
    document: &DocumentFingerprint,
    page: u32,
    page_text: &str,
    options: &IngestionOptions,
    global_index: u64,
) -> Result<(Vec<DocumentChunk>, u64), IngestError> {
    let config = ChunkingConfig::from(*options);
    let normalized = normalize_whitespace(page_text);

    let mut chunks = Vec::new();
    let mut cursor = global_index;

    for text in chunk_windows(&normalized, config)? {
        let chunk_id = make_chunk_id(&document.document_id, page, cursor, &text);

        chunks.push(DocumentChunk {
            chunk_id,
            document_id: document.document_id.clone(),
            source_path: document.source_path.clone(),
            title: document.document_title.clone(),
            page,
            chunk_index: cursor,
            text,
        });

        cursor = cursor.saturating_add(1);
    }

    Ok((chunks, cursor))
}

fn make_chunk_id(document_id: &str, page: u32, index: u64, text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(document_id.as_bytes());
    hasher.update(page.to_le_bytes());
    hasher.update(index.to_le_bytes());
    hasher.update(text.as_bytes());
    format!("{:x}", hasher.finalize())
}

use crate::chunking::build_chunks;
use crate::embeddings::Embedder;
use crate::error::IngestError;
use crate::extractor::extract_page_texts;
use crate::index::VectorStore;
use crate::models::{DocumentChunk, DocumentFingerprint, IngestionOptions};
use chrono::Utc;
use sha2::{Digest, Sha256};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

pub fn discover_pdf_files(folder: &Path) -> Vec<PathBuf> {
    let mut files = Vec::new();

    for entry in WalkDir::new(folder)
        .into_iter()
        .filter_map(|item| item.ok())
    {
        if !entry.file_type().is_file() {
            continue;
        }

        let is_pdf = entry
            .path()
            .extension()
            .and_then(|extension| extension.to_str())
            .is_some_and(|extension| extension.eq_ignore_ascii_case("pdf"));

        if is_pdf {
            files.push(entry.path().to_path_buf());
        }
    }

    files.sort_unstable();
    files
}

pub fn digest_file(path: &Path) -> Result<String, IngestError> {
    let bytes = fs::read(path)?;
    let mut hasher = Sha256::new();
    hasher.update(&bytes);
    Ok(format!("{:x}", hasher.finalize()))
}

/// Fingerprints, extracts, and windows every PDF under `folder` into chunks.
/// Any failing file aborts the whole run; re-running is the recovery path.
pub fn ingest_folder_chunks(
    folder: &Path,
    options: IngestionOptions,
) -> Result<Vec<DocumentChunk>, IngestError> {
    let files = discover_pdf_files(folder);

    if files.is_empty() {
        return Err(IngestError::NoDocuments(folder.display().to_string()));
    }

    let mut chunks = Vec::new();
    let mut cursor = 0u64;

    for path in files {
        let fingerprint = build_document_fingerprint(&path)?;
        let pages = extract_page_texts(&path)?;

        for page in pages {
            let (page_chunks, next_cursor) =
                build_chunks(&fingerprint, page.number, &page.text, &options, cursor)?;
            cursor = next_cursor;
            chunks.extend(page_chunks);
        }
    }

    Ok(chunks)
}

pub struct IngestionReport {
    pub documents: usize,
    pub chunks: usize,
    pub dimensions: usize,
}

/// One-shot batch job: chunk the folder, embed every chunk, build the flat
/// index, and persist it under `out_dir` (overwriting any previous store).
/// Nothing is written until every step has succeeded.
pub async fn build_vector_store<E: Embedder>(
    folder: &Path,
    options: IngestionOptions,
    embedder: &E,
    out_dir: &Path,
) -> Result<IngestionReport, IngestError> {
    let chunks = ingest_folder_chunks(folder, options)?;

    let dimensions = embedder
        .probe_dimensions()
        .await
        .map_err(|error| IngestError::Embedding(error.to_string()))?;

    let documents = chunks
        .iter()
        .map(|chunk| chunk.document_id.as_str())
        .collect::<HashSet<_>>()
        .len();

    let mut store = VectorStore::new(dimensions);
    for chunk in chunks {
        let embedding = embedder
            .embed(&chunk.text)
            .await
            .map_err(|error| IngestError::Embedding(error.to_string()))?;
        store
            .add(chunk, embedding)
            .map_err(|error| IngestError::Embedding(error.to_string()))?;
    }

    store
        .save(out_dir)
        .map_err(|error| IngestError::Persist(error.to_string()))?;

    Ok(IngestionReport {
        documents,
        chunks: store.len(),
        dimensions,
    })
}

fn build_document_fingerprint(path: &Path) -> Result<DocumentFingerprint, IngestError> {
    let checksum = digest_file(path)?;
    let name = path
        .file_name()
        .and_then(|name| name.to_str())
        .ok_or_else(|| {
            IngestError::MissingFileName(format!("path missing filename: {}", path.display()))
        })?;

    Ok(DocumentFingerprint {
        document_id: generate_document_id(path),
        document_title: name.to_string(),
        source_path: path.to_string_lossy().to_string(),
        checksum,
        ingested_at: Utc::now(),
    })
}

fn generate_document_id(path: &Path) -> String {
    let mut hasher = Sha256::new();
    hasher.update(path.to_string_lossy().as_bytes());
    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::{digest_file, discover_pdf_files, ingest_folder_chunks};
    use crate::models::IngestionOptions;
    use std::fs::{self, File};
    use std::io::Write;
    use tempfile::tempdir;

    #[test]
    fn discover_pdf_files_is_recursive() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempdir()?;
        let base = dir.path();
        let nested = base.join("nested");
        fs::create_dir(&nested)?;

        File::create(base.join("a.pdf")).and_then(|mut file| file.write_all(b"%PDF-1.4\n%fake"))?;
        File::create(nested.join("b.PDF"))
            .and_then(|mut file| file.write_all(b"%PDF-1.4\n%fake"))?;
        File::create(base.join("notes.txt")).and_then(|mut file| file.write_all(b"not a pdf"))?;

        let files = discover_pdf_files(base);
        assert_eq!(files.len(), 2);
        Ok(())
    }

    #[test]
    fn checksum_is_reproducible() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempdir()?;
        let file_path = dir.path().join("a.pdf");
        fs::write(&file_path, b"abc")?;

        let first = digest_file(&file_path)?;
        let second = digest_file(&file_path)?;
        assert_eq!(first, second);
        Ok(())
    }

    #[test]
    fn ingestion_fails_without_pdfs() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempdir()?;
        let result = ingest_folder_chunks(dir.path(), IngestionOptions::default());
        assert!(result.is_err());
        Ok(())
    }

    #[test]
    fn one_unreadable_pdf_aborts_the_whole_run() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempdir()?;
        fs::write(dir.path().join("unreadable.pdf"), b"%PDF-1.4\n%broken")?;

        let result = ingest_folder_chunks(dir.path(), IngestionOptions::default());
        assert!(result.is_err());
        Ok(())
    }
}

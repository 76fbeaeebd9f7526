pub mod attachment;
pub mod chunking;
pub mod completion;
pub mod embeddings;
pub mod error;
pub mod extractor;
pub mod index;
pub mod ingest;
pub mod models;
pub mod prompt;
pub mod retrieval;
pub mod session;

pub use attachment::{Attachment, PREVIEW_MAX_CHARS};
pub use chunking::{build_chunks, chunk_windows, normalize_whitespace, ChunkingConfig};
pub use completion::{CompletionClient, CompletionOutcome, COMPLETION_UNAVAILABLE};
pub use embeddings::{Embedder, OllamaEmbedder, DIMENSION_PROBE_TEXT};
pub use error::{ChatError, IngestError};
pub use extractor::{extract_document_text, extract_page_texts, PageText, PdfExtractor};
pub use index::{FlatIndex, VectorStore};
pub use ingest::{build_vector_store, discover_pdf_files, ingest_folder_chunks, IngestionReport};
pub use models::{
    DocumentChunk, DocumentFingerprint, IngestionOptions, Message, RetrievalOptions, Role,
};
pub use prompt::{assemble, rag_prompt, ASSISTANT_CUE, CONTEXT_MAX_CHARS};
pub use retrieval::Retriever;
pub use session::{Session, SessionStore};

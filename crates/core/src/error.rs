use thiserror::Error;

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("pdf parse error: {0}")]
    PdfParse(String),

    #[error("path has no file name: {0}")]
    MissingFileName(String),

    #[error("invalid chunking config: {0}")]
    InvalidChunkConfig(String),

    #[error("no pdf files found in {0}")]
    NoDocuments(String),

    #[error("embedding failed: {0}")]
    Embedding(String),

    #[error("failed to persist vector store: {0}")]
    Persist(String),
}

#[derive(Debug, Error)]
pub enum ChatError {
    #[error("invalid response from {backend}: {details}")]
    BackendResponse { backend: String, details: String },

    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("embedding failed: {0}")]
    Embedding(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialize error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("pdf parse error: {0}")]
    PdfParse(String),

    #[error("attachment is not valid utf-8: {0}")]
    BadEncoding(String),

    #[error("unsupported attachment type: {0}")]
    UnsupportedAttachment(String),

    #[error("vector store not found at {0}")]
    StoreNotFound(String),
}

pub type Result<T, E = IngestError> = std::result::Result<T, E>;

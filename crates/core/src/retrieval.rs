use crate::embeddings::Embedder;
use crate::error::ChatError;
use crate::index::VectorStore;
use crate::models::RetrievalOptions;

/// Folds persisted-store hits into prompt context. Queries must be embedded
/// with the same model family the store was built with.
pub struct Retriever<E: Embedder> {
    store: VectorStore,
    embedder: E,
    options: RetrievalOptions,
}

impl<E: Embedder> Retriever<E> {
    pub fn new(store: VectorStore, embedder: E) -> Self {
        Self {
            store,
            embedder,
            options: RetrievalOptions::default(),
        }
    }

    pub fn with_options(mut self, options: RetrievalOptions) -> Self {
        self.options = options;
        self
    }

    pub fn store(&self) -> &VectorStore {
        &self.store
    }

    /// Embeds the query, runs the diversity-aware search, and returns the
    /// retrieved chunk texts double-newline separated. No scores surface.
    /// An empty store yields an empty context.
    pub async fn context_for(&self, query: &str) -> Result<String, ChatError> {
        if self.store.is_empty() {
            return Ok(String::new());
        }

        let query_vector = self.embedder.embed(query).await?;
        let hits = self.store.search_mmr(&query_vector, self.options)?;

        Ok(hits
            .iter()
            .map(|chunk| chunk.text.as_str())
            .collect::<Vec<_>>()
            .join("\n\n"))
    }
}

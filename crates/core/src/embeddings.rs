use crate::error::ChatError;
use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use serde_json::Value;

/// Probe string embedded once at startup to discover the vector length the
/// configured model produces.
pub const DIMENSION_PROBE_TEXT: &str = "test";

#[async_trait]
pub trait Embedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, ChatError>;

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, ChatError> {
        let mut vectors = Vec::with_capacity(texts.len());
        for text in texts {
            vectors.push(self.embed(text).await?);
        }
        Ok(vectors)
    }

    async fn probe_dimensions(&self) -> Result<usize, ChatError> {
        Ok(self.embed(DIMENSION_PROBE_TEXT).await?.len())
    }
}

/// Client for the embeddings endpoint of an Ollama-compatible server.
///
/// The same model identifier must be used at ingestion and query time;
/// a mismatch is not detectable here and silently degrades retrieval.
pub struct OllamaEmbedder {
    client: Client,
    base_url: String,
    model: String,
}

#[derive(Debug, Serialize)]
struct EmbeddingsRequest<'a> {
    model: &'a str,
    prompt: &'a str,
}

impl OllamaEmbedder {
    pub fn new(base_url: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into(),
            model: model.into(),
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl Embedder for OllamaEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, ChatError> {
        let response = self
            .client
            .post(format!("{}/api/embeddings", self.base_url))
            .json(&EmbeddingsRequest {
                model: &self.model,
                prompt: text,
            })
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(ChatError::BackendResponse {
                backend: "embeddings".to_string(),
                details: response.status().to_string(),
            });
        }

        let payload: Value = response.json().await?;
        parse_embedding(&payload)
    }
}

fn parse_embedding(payload: &Value) -> Result<Vec<f32>, ChatError> {
    let values = payload
        .get("embedding")
        .and_then(Value::as_array)
        .ok_or_else(|| ChatError::Embedding("response has no embedding array".to_string()))?;

    let mut vector = Vec::with_capacity(values.len());
    for value in values {
        let number = value
            .as_f64()
            .ok_or_else(|| ChatError::Embedding("embedding value is not a number".to_string()))?;
        vector.push(number as f32);
    }

    if vector.is_empty() {
        return Err(ChatError::Embedding("embedding array is empty".to_string()));
    }

    Ok(vector)
}

use crate::error::ChatError;
use crate::models::{DocumentChunk, RetrievalOptions};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

pub const INDEX_FILE: &str = "index.json";
pub const CHUNKS_FILE: &str = "chunks.json";

/// Exhaustive nearest-neighbor index: every query scans every stored vector.
/// No approximation, append-only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlatIndex {
    dimensions: usize,
    vectors: Vec<Vec<f32>>,
}

impl FlatIndex {
    pub fn new(dimensions: usize) -> Self {
        Self {
            dimensions,
            vectors: Vec::new(),
        }
    }

    pub fn dimensions(&self) -> usize {
        self.dimensions
    }

    pub fn len(&self) -> usize {
        self.vectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vectors.is_empty()
    }

    pub fn add(&mut self, vector: Vec<f32>) -> Result<usize, ChatError> {
        if vector.len() != self.dimensions {
            return Err(ChatError::Embedding(format!(
                "vector dimension {} does not match index dimension {}",
                vector.len(),
                self.dimensions
            )));
        }
        self.vectors.push(vector);
        Ok(self.vectors.len() - 1)
    }

    /// Top `k` ids by squared L2 distance, closest first.
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<(usize, f32)>, ChatError> {
        if query.len() != self.dimensions {
            return Err(ChatError::Embedding(format!(
                "query dimension {} does not match index dimension {}",
                query.len(),
                self.dimensions
            )));
        }

        let mut scored: Vec<(usize, f32)> = self
            .vectors
            .iter()
            .enumerate()
            .map(|(id, vector)| (id, squared_l2(query, vector)))
            .collect();

        scored.sort_by(|left, right| left.1.total_cmp(&right.1));
        scored.truncate(k);
        Ok(scored)
    }

    /// Maximal-marginal-relevance selection: picks `top_k` ids out of the
    /// `fetch_k` nearest candidates, penalizing each candidate by its
    /// similarity to what was already picked.
    pub fn search_mmr(
        &self,
        query: &[f32],
        options: RetrievalOptions,
    ) -> Result<Vec<usize>, ChatError> {
        let pool = self.search(query, options.fetch_k)?;
        if pool.is_empty() {
            return Ok(Vec::new());
        }

        let mut remaining: Vec<usize> = pool.into_iter().map(|(id, _)| id).collect();
        let mut selected = Vec::new();

        while selected.len() < options.top_k && !remaining.is_empty() {
            let mut best_position = 0;
            let mut best_score = f32::NEG_INFINITY;

            for (position, &candidate) in remaining.iter().enumerate() {
                let relevance = cosine_similarity(query, &self.vectors[candidate]);
                let redundancy = selected
                    .iter()
                    .map(|&picked| cosine_similarity(&self.vectors[candidate], &self.vectors[picked]))
                    .fold(0.0f32, f32::max);

                let score = options.lambda * relevance - (1.0 - options.lambda) * redundancy;
                if score > best_score {
                    best_score = score;
                    best_position = position;
                }
            }

            selected.push(remaining.swap_remove(best_position));
        }

        Ok(selected)
    }
}

pub fn squared_l2(left: &[f32], right: &[f32]) -> f32 {
    left.iter()
        .zip(right)
        .map(|(a, b)| (a - b) * (a - b))
        .sum()
}

pub fn cosine_similarity(left: &[f32], right: &[f32]) -> f32 {
    let dot: f32 = left.iter().zip(right).map(|(a, b)| a * b).sum();
    let left_norm = left.iter().map(|value| value * value).sum::<f32>().sqrt();
    let right_norm = right.iter().map(|value| value * value).sum::<f32>().sqrt();

    if left_norm == 0.0 || right_norm == 0.0 {
        0.0
    } else {
        dot / (left_norm * right_norm)
    }
}

/// The flat index plus the side mapping from internal id to chunk text and
/// metadata. Write-once at ingestion time, read-only at query time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VectorStore {
    index: FlatIndex,
    chunks: BTreeMap<usize, DocumentChunk>,
}

impl VectorStore {
    pub fn new(dimensions: usize) -> Self {
        Self {
            index: FlatIndex::new(dimensions),
            chunks: BTreeMap::new(),
        }
    }

    pub fn dimensions(&self) -> usize {
        self.index.dimensions()
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    pub fn add(&mut self, chunk: DocumentChunk, embedding: Vec<f32>) -> Result<usize, ChatError> {
        let id = self.index.add(embedding)?;
        self.chunks.insert(id, chunk);
        Ok(id)
    }

    pub fn chunk(&self, id: usize) -> Option<&DocumentChunk> {
        self.chunks.get(&id)
    }

    pub fn search_mmr(
        &self,
        query: &[f32],
        options: RetrievalOptions,
    ) -> Result<Vec<&DocumentChunk>, ChatError> {
        let ids = self.index.search_mmr(query, options)?;
        Ok(ids.iter().filter_map(|id| self.chunks.get(id)).collect())
    }

    /// Persists the index and chunk mapping under `dir`, overwriting any
    /// previous store there.
    pub fn save(&self, dir: &Path) -> Result<(), ChatError> {
        fs::create_dir_all(dir)?;
        fs::write(dir.join(INDEX_FILE), serde_json::to_vec(&self.index)?)?;
        fs::write(dir.join(CHUNKS_FILE), serde_json::to_vec(&self.chunks)?)?;
        Ok(())
    }

    /// Loads a persisted store. The serialized content is trusted as-is;
    /// there is no integrity check.
    pub fn load(dir: &Path) -> Result<Self, ChatError> {
        let index_path = dir.join(INDEX_FILE);
        if !index_path.exists() {
            return Err(ChatError::StoreNotFound(dir.display().to_string()));
        }

        let index: FlatIndex = serde_json::from_slice(&fs::read(index_path)?)?;
        let chunks: BTreeMap<usize, DocumentChunk> =
            serde_json::from_slice(&fs::read(dir.join(CHUNKS_FILE))?)?;

        Ok(Self { index, chunks })
    }
}

#[cfg(test)]
mod tests {
    use super::{FlatIndex, VectorStore};
    use crate::models::{DocumentChunk, RetrievalOptions};
    use tempfile::tempdir;

    fn chunk(id: &str, text: &str) -> DocumentChunk {
        DocumentChunk {
            chunk_id: id.to_string(),
            document_id: "doc-1".to_string(),
            source_path: "/tmp/doc.pdf".to_string(),
            title: "doc.pdf".to_string(),
            page: 1,
            chunk_index: 0,
            text: text.to_string(),
        }
    }

    #[test]
    fn search_returns_nearest_first() {
        let mut index = FlatIndex::new(2);
        index.add(vec![0.0, 0.0]).unwrap();
        index.add(vec![1.0, 1.0]).unwrap();
        index.add(vec![5.0, 5.0]).unwrap();

        let hits = index.search(&[0.9, 0.9], 2).unwrap();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].0, 1);
        assert_eq!(hits[1].0, 0);
    }

    #[test]
    fn dimension_mismatch_is_rejected() {
        let mut index = FlatIndex::new(3);
        assert!(index.add(vec![1.0, 2.0]).is_err());
        assert!(index.search(&[1.0], 1).is_err());
    }

    #[test]
    fn mmr_respects_top_k_and_empty_index() {
        let mut index = FlatIndex::new(2);
        assert!(index
            .search_mmr(&[1.0, 0.0], RetrievalOptions::default())
            .unwrap()
            .is_empty());

        for value in 0..5 {
            index.add(vec![value as f32, 1.0]).unwrap();
        }

        let options = RetrievalOptions {
            top_k: 3,
            fetch_k: 100,
            lambda: 0.5,
        };
        let selected = index.search_mmr(&[0.0, 1.0], options).unwrap();
        assert_eq!(selected.len(), 3);
    }

    #[test]
    fn mmr_prefers_diverse_candidates() {
        let mut index = FlatIndex::new(2);
        index.add(vec![1.0, 0.0]).unwrap();
        index.add(vec![1.0, 0.001]).unwrap(); // near-duplicate of id 0
        index.add(vec![0.5, 0.5]).unwrap();

        let options = RetrievalOptions {
            top_k: 2,
            fetch_k: 3,
            lambda: 0.5,
        };
        let selected = index.search_mmr(&[1.0, 0.05], options).unwrap();

        assert_eq!(selected.len(), 2);
        assert!(selected.contains(&2), "the diverse vector should be selected");
        assert!(
            !(selected.contains(&0) && selected.contains(&1)),
            "the near-duplicate pair should not both be selected"
        );
    }

    #[test]
    fn store_round_trips_through_disk() {
        let dir = tempdir().expect("tempdir");

        let mut store = VectorStore::new(2);
        store.add(chunk("a", "first chunk"), vec![1.0, 0.0]).unwrap();
        store.add(chunk("b", "second chunk"), vec![0.0, 1.0]).unwrap();
        store.save(dir.path()).unwrap();

        let loaded = VectorStore::load(dir.path()).unwrap();
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded.dimensions(), 2);
        assert_eq!(loaded.chunk(0).map(|c| c.text.as_str()), Some("first chunk"));

        let hits = loaded
            .search_mmr(&[1.0, 0.1], RetrievalOptions::default())
            .unwrap();
        assert_eq!(hits[0].chunk_id, "a");
    }

    #[test]
    fn loading_a_missing_store_fails() {
        let dir = tempdir().expect("tempdir");
        assert!(VectorStore::load(&dir.path().join("nope")).is_err());
    }
}

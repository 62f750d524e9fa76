//! Brute-force, process-local vector index.
//!
//! Scores are cosine similarity: higher is closer, results sorted descending.
//! Every query scans all rows, so this is meant for small corpora, tests and
//! development. Nothing is persisted.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;
use vecdex_core::api::{
    check_batch, check_dimension, Document, Embedding, EmbeddingProvider, MetadataFilter, Result,
    SearchResult, VectorStore,
};

struct Row {
    id: String,
    vector: Embedding,
    document: Document,
}

#[derive(Default)]
struct Rows {
    /// Fixed by configuration or by the first insert.
    dimension: Option<usize>,
    items: Vec<Row>,
}

pub struct InMemoryVectorIndex {
    embeddings: Arc<dyn EmbeddingProvider>,
    rows: RwLock<Rows>,
}

impl InMemoryVectorIndex {
    pub fn new(embeddings: Arc<dyn EmbeddingProvider>) -> Self {
        let dimension = embeddings.dimension();
        Self {
            embeddings,
            rows: RwLock::new(Rows {
                dimension,
                items: Vec::new(),
            }),
        }
    }

    pub async fn len(&self) -> usize {
        self.rows.read().await.items.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.rows.read().await.items.is_empty()
    }

    pub async fn dimension(&self) -> Option<usize> {
        self.rows.read().await.dimension
    }
}

pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let mut dot = 0.0f32;
    let mut norm_a = 0.0f32;
    let mut norm_b = 0.0f32;
    for (x, y) in a.iter().zip(b) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    (dot / (norm_a.sqrt() * norm_b.sqrt())).clamp(-1.0, 1.0)
}

#[async_trait]
impl VectorStore for InMemoryVectorIndex {
    fn name(&self) -> &str {
        "memory"
    }

    fn embeddings(&self) -> &Arc<dyn EmbeddingProvider> {
        &self.embeddings
    }

    async fn add_vectors(
        &self,
        vectors: Vec<Embedding>,
        documents: Vec<Document>,
    ) -> Result<Vec<String>> {
        if vectors.is_empty() && documents.is_empty() {
            return Ok(Vec::new());
        }

        let mut rows = self.rows.write().await;
        let dimension = rows.dimension.unwrap_or(vectors.first().map(Vec::len).unwrap_or(0));
        check_batch(&vectors, &documents, Some(dimension))?;
        rows.dimension = Some(dimension);

        let ids: Vec<String> = documents
            .iter()
            .map(|_| Uuid::new_v4().to_string())
            .collect();
        rows.items.extend(
            ids.iter()
                .cloned()
                .zip(vectors)
                .zip(documents)
                .map(|((id, vector), document)| Row {
                    id,
                    vector,
                    document,
                }),
        );

        tracing::debug!(
            target: "vecdex.store",
            stage = "memory.add_vectors",
            added = ids.len(),
            total = rows.items.len()
        );
        Ok(ids)
    }

    async fn similarity_search_vector_with_score(
        &self,
        query: &[f32],
        k: usize,
        filter: Option<&MetadataFilter>,
    ) -> Result<Vec<SearchResult>> {
        let rows = self.rows.read().await;
        if k == 0 || rows.items.is_empty() {
            return Ok(Vec::new());
        }
        if let Some(dimension) = rows.dimension {
            check_dimension(dimension, [query.len()])?;
        }

        let mut scored: Vec<(f32, &Row)> = rows
            .items
            .iter()
            .filter(|row| filter.map_or(true, |f| f.matches(row.document.metadata())))
            .map(|row| (cosine_similarity(query, &row.vector), row))
            .collect();
        // Stable sort keeps insertion order among equal scores.
        scored.sort_by(|a, b| b.0.total_cmp(&a.0));
        scored.truncate(k);

        tracing::debug!(
            target: "vecdex.store",
            stage = "memory.search",
            k = k,
            returned = scored.len(),
            best_id = scored.first().map(|(_, r)| r.id.as_str()).unwrap_or("")
        );

        Ok(scored
            .into_iter()
            .map(|(score, row)| SearchResult::new(row.document.clone(), score))
            .collect())
    }
}

//! Vector store abstraction shared by the in-memory and remote backends.

pub mod client;

use std::sync::Arc;

use async_trait::async_trait;

use crate::document::{Document, SearchResult};
use crate::embedding::{Embedding, EmbeddingProvider};
use crate::error::{Result, VectorError};
use crate::filter::MetadataFilter;

pub use client::{
    CollectionDescription, CollectionField, FieldType, IndexInfo, IndexSpec, SearchHit,
    SearchRequest, VectorDbClient,
};

/// Number of results returned when a caller does not choose `k`.
pub const DEFAULT_SEARCH_K: usize = 4;

#[async_trait]
pub trait VectorStore: Send + Sync {
    fn name(&self) -> &str;

    fn embeddings(&self) -> &Arc<dyn EmbeddingProvider>;

    /// Store pre-computed vectors. Returns one freshly generated id per
    /// document, in input order.
    async fn add_vectors(
        &self,
        vectors: Vec<Embedding>,
        documents: Vec<Document>,
    ) -> Result<Vec<String>>;

    /// Return up to `k` documents nearest to `query`, restricted by `filter`.
    async fn similarity_search_vector_with_score(
        &self,
        query: &[f32],
        k: usize,
        filter: Option<&MetadataFilter>,
    ) -> Result<Vec<SearchResult>>;

    /// Release backend resources. Terminal.
    async fn close(&self) -> Result<()> {
        Ok(())
    }

    async fn add_documents(&self, documents: Vec<Document>) -> Result<Vec<String>> {
        if documents.is_empty() {
            return Ok(Vec::new());
        }
        let texts: Vec<String> = documents.iter().map(|d| d.content().to_string()).collect();
        let vectors = self.embeddings().embed_documents(&texts).await?;
        self.add_vectors(vectors, documents).await
    }

    async fn similarity_search_with_score(
        &self,
        query: &str,
        k: usize,
        filter: Option<&MetadataFilter>,
    ) -> Result<Vec<SearchResult>> {
        let vector = self.embeddings().embed_query(query).await?;
        self.similarity_search_vector_with_score(&vector, k, filter)
            .await
    }

    async fn similarity_search(
        &self,
        query: &str,
        k: usize,
        filter: Option<&MetadataFilter>,
    ) -> Result<Vec<Document>> {
        let results = self.similarity_search_with_score(query, k, filter).await?;
        Ok(results.into_iter().map(|r| r.document).collect())
    }
}

/// Reject vector batches that do not line up with their documents or with
/// the store's dimension.
pub fn check_batch(
    vectors: &[Embedding],
    documents: &[Document],
    dimension: Option<usize>,
) -> Result<()> {
    if vectors.len() != documents.len() {
        return Err(VectorError::Insert(format!(
            "got {} vectors for {} documents",
            vectors.len(),
            documents.len()
        )));
    }
    if let Some(pos) = vectors.iter().position(Vec::is_empty) {
        return Err(VectorError::Insert(format!("vector {} is empty", pos)));
    }
    if let Some(expected) = dimension {
        check_dimension(expected, vectors.iter().map(Vec::len))?;
    }
    Ok(())
}

pub fn check_dimension(expected: usize, lengths: impl IntoIterator<Item = usize>) -> Result<()> {
    match lengths.into_iter().find(|len| *len != expected) {
        Some(actual) => Err(VectorError::DimensionMismatch { expected, actual }),
        None => Ok(()),
    }
}

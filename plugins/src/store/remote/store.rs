//! Adapter from the document/vector model onto a schema-managed vector
//! database.
//!
//! Lifecycle: `Uninitialized -> Ready -> Dropped`. Initialisation is
//! idempotent and is re-attempted by every operation until it succeeds.
//! Inserts are flushed before returning so a search issued right after
//! `add_documents` sees the new rows.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Map, Value};
use tokio::sync::Mutex;
use uuid::Uuid;
use vecdex_core::api::{
    check_batch, check_dimension, Document, Embedding, EmbeddingProvider, IndexSpec, Metadata,
    MetadataFilter, RemoteStoreConfig, Result, SearchHit, SearchRequest, SearchResult,
    VectorDbClient, VectorError, VectorStore,
};

use super::filter::compile_filter;
use super::schema::{
    collection_schema, output_fields, ID_FIELD, METADATA_FIELD, TEXT_FIELD, VECTOR_FIELD,
};

const CONSISTENCY_LEVEL: &str = "Strong";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreState {
    Uninitialized,
    Ready,
    Dropped,
}

/// Remote backend. Scores are whatever the database reports for the
/// configured metric: for `COSINE`/`IP` higher is closer, for `L2` lower is
/// closer. Results keep the database's ranking.
pub struct RemoteVectorStore {
    client: Arc<dyn VectorDbClient>,
    embeddings: Arc<dyn EmbeddingProvider>,
    collection: String,
    dimension: usize,
    index: IndexSpec,
    state: Mutex<StoreState>,
}

impl RemoteVectorStore {
    pub fn new(
        client: Arc<dyn VectorDbClient>,
        embeddings: Arc<dyn EmbeddingProvider>,
        cfg: &RemoteStoreConfig,
    ) -> Result<Self> {
        if cfg.collection.trim().is_empty() {
            return Err(VectorError::config("remote collection name is required"));
        }
        if cfg.dimension == 0 {
            return Err(VectorError::config("remote vector dimension must be > 0"));
        }
        if let Some(provider_dim) = embeddings.dimension() {
            if provider_dim != cfg.dimension {
                return Err(VectorError::config(format!(
                    "embedding dimension {} does not match collection dimension {}",
                    provider_dim, cfg.dimension
                )));
            }
        }
        Ok(Self {
            client,
            embeddings,
            collection: cfg.collection.trim().to_string(),
            dimension: cfg.dimension,
            index: IndexSpec {
                field_name: VECTOR_FIELD.to_string(),
                index_name: VECTOR_FIELD.to_string(),
                index_type: cfg.index_type.clone(),
                metric_type: cfg.metric_type.clone(),
                params: cfg.index_params.clone(),
            },
            state: Mutex::new(StoreState::Uninitialized),
        })
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }

    pub async fn state(&self) -> StoreState {
        *self.state.lock().await
    }

    /// Check-exists, create-if-absent, index-if-absent, load. Safe to call
    /// repeatedly; a failure leaves the store `Uninitialized`.
    pub async fn initialize(&self) -> Result<()> {
        let mut state = self.state.lock().await;
        match *state {
            StoreState::Ready => return Ok(()),
            StoreState::Dropped => {
                return Err(VectorError::Dropped {
                    collection: self.collection.clone(),
                })
            }
            StoreState::Uninitialized => {}
        }

        self.run_initialization().await.inspect_err(|e| {
            tracing::error!(
                target: "vecdex.store",
                stage = "remote.init.failed",
                collection = %self.collection,
                error = %e
            );
        })?;
        *state = StoreState::Ready;
        tracing::info!(
            target: "vecdex.store",
            stage = "remote.init.ready",
            collection = %self.collection,
            dimension = self.dimension
        );
        Ok(())
    }

    async fn run_initialization(&self) -> Result<()> {
        let exists = self
            .client
            .has_collection(&self.collection)
            .await
            .map_err(|e| self.init_error("check collection", e))?;

        if exists {
            let description = self
                .client
                .describe_collection(&self.collection)
                .await
                .map_err(|e| self.init_error("describe collection", e))?;
            match description.vector_dimension(VECTOR_FIELD) {
                Some(dim) if dim == self.dimension => {}
                Some(dim) => {
                    return Err(self.init_message(format!(
                        "existing collection has dimension {}, configured {}",
                        dim, self.dimension
                    )))
                }
                None => {
                    return Err(self.init_message(format!(
                        "existing collection has no '{}' vector field",
                        VECTOR_FIELD
                    )))
                }
            }
            tracing::debug!(
                target: "vecdex.store",
                stage = "remote.init.exists",
                collection = %self.collection
            );
        } else {
            tracing::info!(
                target: "vecdex.store",
                stage = "remote.init.create_collection",
                collection = %self.collection,
                dimension = self.dimension
            );
            self.client
                .create_collection(&self.collection, &collection_schema(self.dimension))
                .await
                .map_err(|e| self.init_error("create collection", e))?;
        }

        let indexes = self
            .client
            .list_indexes(&self.collection)
            .await
            .map_err(|e| self.init_error("list indexes", e))?;
        // Any index on the vector field counts; servers may assign their own name.
        if !indexes.iter().any(|i| i.field_name == self.index.field_name) {
            tracing::info!(
                target: "vecdex.store",
                stage = "remote.init.create_index",
                collection = %self.collection,
                field = %self.index.field_name,
                index_type = %self.index.index_type,
                metric = %self.index.metric_type
            );
            self.client
                .create_index(&self.collection, &self.index)
                .await
                .map_err(|e| self.init_error("create index", e))?;
        }

        self.client
            .load_collection(&self.collection)
            .await
            .map_err(|e| self.init_error("load collection", e))?;
        Ok(())
    }

    fn init_error(&self, step: &str, err: VectorError) -> VectorError {
        match err {
            VectorError::Closed => err,
            other => self.init_message(format!("{}: {}", step, other)),
        }
    }

    fn init_message(&self, message: String) -> VectorError {
        VectorError::BackendInitialization {
            collection: self.collection.clone(),
            message,
        }
    }

    /// Drop the collection. Terminal: every later call fails with `Dropped`.
    pub async fn delete(&self) -> Result<()> {
        let mut state = self.state.lock().await;
        if *state == StoreState::Dropped {
            return Ok(());
        }
        self.client.drop_collection(&self.collection).await?;
        *state = StoreState::Dropped;
        tracing::info!(
            target: "vecdex.store",
            stage = "remote.dropped",
            collection = %self.collection
        );
        Ok(())
    }

    fn to_row(id: &str, vector: Embedding, document: Document) -> Value {
        let (text, metadata) = document.into_parts();
        let mut row = Map::with_capacity(4);
        row.insert(ID_FIELD.to_string(), json!(id));
        row.insert(TEXT_FIELD.to_string(), json!(text));
        row.insert(VECTOR_FIELD.to_string(), json!(vector));
        row.insert(METADATA_FIELD.to_string(), json!(metadata));
        Value::Object(row)
    }

    fn from_hit(mut hit: SearchHit) -> Result<SearchResult> {
        let text = match hit.fields.remove(TEXT_FIELD) {
            Some(Value::String(s)) => s,
            Some(other) => {
                return Err(VectorError::Search(format!(
                    "row {} has non-string text field: {}",
                    hit.id, other
                )))
            }
            None => {
                return Err(VectorError::Search(format!(
                    "row {} is missing the text field",
                    hit.id
                )))
            }
        };
        let metadata = match hit.fields.remove(METADATA_FIELD) {
            Some(Value::Object(map)) => map_to_metadata(map),
            // Some servers hand JSON fields back as encoded strings.
            Some(Value::String(s)) => match serde_json::from_str::<Map<String, Value>>(&s) {
                Ok(map) => map_to_metadata(map),
                Err(e) => {
                    return Err(VectorError::Search(format!(
                        "row {} has undecodable metadata: {}",
                        hit.id, e
                    )))
                }
            },
            Some(Value::Null) | None => Metadata::new(),
            Some(other) => {
                return Err(VectorError::Search(format!(
                    "row {} has non-object metadata: {}",
                    hit.id, other
                )))
            }
        };
        Ok(SearchResult::new(
            Document::with_metadata(text, metadata),
            hit.score,
        ))
    }
}

fn map_to_metadata(map: Map<String, Value>) -> Metadata {
    map.into_iter().collect()
}

fn wrap_insert(err: VectorError) -> VectorError {
    match err {
        VectorError::Timeout { .. } | VectorError::Closed | VectorError::Insert(_) => err,
        other => VectorError::Insert(other.to_string()),
    }
}

fn wrap_search(err: VectorError) -> VectorError {
    match err {
        VectorError::Timeout { .. } | VectorError::Closed | VectorError::Search(_) => err,
        other => VectorError::Search(other.to_string()),
    }
}

#[async_trait]
impl VectorStore for RemoteVectorStore {
    fn name(&self) -> &str {
        "remote"
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
        check_batch(&vectors, &documents, Some(self.dimension))?;
        self.initialize().await?;

        let ids: Vec<String> = documents
            .iter()
            .map(|_| Uuid::new_v4().to_string())
            .collect();
        let rows: Vec<Value> = ids
            .iter()
            .zip(vectors)
            .zip(documents)
            .map(|((id, vector), document)| Self::to_row(id, vector, document))
            .collect();

        tracing::debug!(
            target: "vecdex.store",
            stage = "remote.insert.in",
            collection = %self.collection,
            rows = rows.len()
        );
        let inserted = self
            .client
            .insert(&self.collection, rows)
            .await
            .map_err(wrap_insert)?;
        if inserted != ids.len() {
            return Err(VectorError::Insert(format!(
                "server accepted {} of {} rows",
                inserted,
                ids.len()
            )));
        }
        self.client
            .flush(std::slice::from_ref(&self.collection))
            .await
            .map_err(wrap_insert)?;

        tracing::debug!(
            target: "vecdex.store",
            stage = "remote.insert.out",
            collection = %self.collection,
            inserted = inserted
        );
        Ok(ids)
    }

    async fn similarity_search_vector_with_score(
        &self,
        query: &[f32],
        k: usize,
        filter: Option<&MetadataFilter>,
    ) -> Result<Vec<SearchResult>> {
        check_dimension(self.dimension, [query.len()])?;
        let expr = match filter {
            Some(filter) => compile_filter(filter)?,
            None => None,
        };
        if k == 0 {
            return Ok(Vec::new());
        }
        self.initialize().await?;

        tracing::debug!(
            target: "vecdex.store",
            stage = "remote.search.in",
            collection = %self.collection,
            k = k,
            filter = expr.as_deref().unwrap_or("")
        );
        let hits = self
            .client
            .search(SearchRequest {
                collection: self.collection.clone(),
                vector: query.to_vec(),
                vector_field: VECTOR_FIELD.to_string(),
                output_fields: output_fields(),
                limit: k,
                filter: expr,
                consistency_level: CONSISTENCY_LEVEL.to_string(),
            })
            .await
            .map_err(wrap_search)?;

        let results = hits
            .into_iter()
            .map(Self::from_hit)
            .collect::<Result<Vec<_>>>()?;
        tracing::debug!(
            target: "vecdex.store",
            stage = "remote.search.out",
            collection = %self.collection,
            returned = results.len()
        );
        Ok(results)
    }

    async fn close(&self) -> Result<()> {
        self.client.close().await
    }
}

//! In-process doubles shared by unit tests.

use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::{Map, Value};
use vecdex_core::api::{
    CollectionDescription, CollectionField, Embedding, EmbeddingProvider, IndexInfo, IndexSpec,
    MultiModalInput, Result, SearchHit, SearchRequest, VectorDbClient, VectorError,
};

use crate::store::memory::cosine_similarity;

/// Deterministic embedder: hashed character unigrams and bigrams.
pub struct StaticEmbeddings {
    dimension: usize,
    reported: Option<usize>,
    calls: AtomicUsize,
}

impl StaticEmbeddings {
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension,
            reported: Some(dimension),
            calls: AtomicUsize::new(0),
        }
    }

    /// Same vectors, but `dimension()` reports nothing up front.
    pub fn without_dimension(dimension: usize) -> Self {
        Self {
            reported: None,
            ..Self::new(dimension)
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn embed(&self, text: &str) -> Embedding {
        let mut v = vec![0.0f32; self.dimension];
        let chars: Vec<char> = text.chars().filter(|c| !c.is_whitespace()).collect();
        for c in &chars {
            v[bucket(&c.to_string(), self.dimension)] += 1.0;
        }
        for pair in chars.windows(2) {
            let gram: String = pair.iter().collect();
            v[bucket(&gram, self.dimension)] += 2.0;
        }
        v
    }
}

fn bucket(s: &str, dimension: usize) -> usize {
    // FNV-1a
    let mut hash: u64 = 0xcbf29ce484222325;
    for b in s.as_bytes() {
        hash ^= u64::from(*b);
        hash = hash.wrapping_mul(0x100000001b3);
    }
    (hash % dimension as u64) as usize
}

#[async_trait]
impl EmbeddingProvider for StaticEmbeddings {
    fn name(&self) -> &str {
        "static"
    }

    fn model(&self) -> &str {
        "static-ngram"
    }

    fn dimension(&self) -> Option<usize> {
        self.reported
    }

    async fn embed_documents(&self, texts: &[String]) -> Result<Vec<Embedding>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(texts.iter().map(|t| self.embed(t)).collect())
    }

    async fn embed_multimodal(&self, _inputs: &[MultiModalInput]) -> Result<Vec<Embedding>> {
        Err(VectorError::UnsupportedModel {
            model: self.model().to_string(),
        })
    }
}

#[derive(Default)]
pub struct FakeState {
    pub calls: Vec<String>,
    pub collections: Vec<(String, Vec<CollectionField>)>,
    pub indexes: Vec<IndexInfo>,
    pub rows: Vec<Map<String, Value>>,
    pub pending: Vec<Map<String, Value>>,
    pub last_filter: Option<String>,
    pub fail: HashSet<&'static str>,
    pub closed: bool,
}

/// Recording stand-in for a vector database. Inserted rows only become
/// searchable after `flush`.
#[derive(Default)]
pub struct FakeDbClient {
    pub state: Mutex<FakeState>,
}

impl FakeDbClient {
    pub fn with_collection(name: &str, fields: Vec<CollectionField>, indexed: bool) -> Self {
        let client = Self::default();
        {
            let mut state = client.state.lock().unwrap();
            state.collections.push((name.to_string(), fields));
            if indexed {
                state.indexes.push(IndexInfo::new("vector", "vector"));
            }
        }
        client
    }

    pub fn add_index(&self, index_name: &str, field_name: &str) {
        self.state
            .lock()
            .unwrap()
            .indexes
            .push(IndexInfo::new(index_name, field_name));
    }

    pub fn fail_on(&self, op: &'static str) {
        self.state.lock().unwrap().fail.insert(op);
    }

    pub fn heal(&self, op: &'static str) {
        self.state.lock().unwrap().fail.remove(op);
    }

    pub fn calls(&self) -> Vec<String> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn count(&self, op: &str) -> usize {
        self.calls().iter().filter(|c| c.as_str() == op).count()
    }

    fn record(&self, op: &'static str) -> Result<std::sync::MutexGuard<'_, FakeState>> {
        let mut state = self.state.lock().unwrap();
        if state.closed {
            return Err(VectorError::Closed);
        }
        state.calls.push(op.to_string());
        if state.fail.contains(op) {
            return Err(VectorError::Api {
                status: 500,
                message: format!("{} failed", op),
            });
        }
        Ok(state)
    }
}

#[async_trait]
impl VectorDbClient for FakeDbClient {
    async fn has_collection(&self, name: &str) -> Result<bool> {
        let state = self.record("has_collection")?;
        Ok(state.collections.iter().any(|(n, _)| n == name))
    }

    async fn describe_collection(&self, name: &str) -> Result<CollectionDescription> {
        let state = self.record("describe_collection")?;
        let (name, fields) = state
            .collections
            .iter()
            .find(|(n, _)| n == name)
            .cloned()
            .ok_or_else(|| VectorError::Decode("no such collection".into()))?;
        Ok(CollectionDescription { name, fields })
    }

    async fn create_collection(&self, name: &str, fields: &[CollectionField]) -> Result<()> {
        let mut state = self.record("create_collection")?;
        state.collections.push((name.to_string(), fields.to_vec()));
        Ok(())
    }

    async fn list_indexes(&self, _collection: &str) -> Result<Vec<IndexInfo>> {
        let state = self.record("list_indexes")?;
        Ok(state.indexes.clone())
    }

    async fn create_index(&self, _collection: &str, index: &IndexSpec) -> Result<()> {
        let mut state = self.record("create_index")?;
        state
            .indexes
            .push(IndexInfo::new(&index.index_name, &index.field_name));
        Ok(())
    }

    async fn load_collection(&self, _name: &str) -> Result<()> {
        self.record("load_collection")?;
        Ok(())
    }

    async fn insert(&self, _collection: &str, rows: Vec<Value>) -> Result<usize> {
        let mut state = self.record("insert")?;
        let count = rows.len();
        for row in rows {
            if let Value::Object(map) = row {
                state.pending.push(map);
            }
        }
        Ok(count)
    }

    async fn flush(&self, _collections: &[String]) -> Result<()> {
        let mut state = self.record("flush")?;
        let pending = std::mem::take(&mut state.pending);
        state.rows.extend(pending);
        Ok(())
    }

    async fn search(&self, request: SearchRequest) -> Result<Vec<SearchHit>> {
        let mut state = self.record("search")?;
        state.last_filter = request.filter.clone();
        let mut hits: Vec<SearchHit> = state
            .rows
            .iter()
            .map(|row| {
                let vector: Vec<f32> = serde_json::from_value(row["vector"].clone()).unwrap();
                let mut fields = Map::new();
                for name in &request.output_fields {
                    if let Some(v) = row.get(name) {
                        fields.insert(name.clone(), v.clone());
                    }
                }
                SearchHit {
                    id: row["id"].as_str().unwrap().to_string(),
                    score: cosine_similarity(&request.vector, &vector),
                    fields,
                }
            })
            .collect();
        hits.sort_by(|a, b| b.score.total_cmp(&a.score));
        hits.truncate(request.limit);
        Ok(hits)
    }

    async fn drop_collection(&self, name: &str) -> Result<()> {
        let mut state = self.record("drop_collection")?;
        state.collections.retain(|(n, _)| n != name);
        state.rows.clear();
        Ok(())
    }

    async fn close(&self) -> Result<()> {
        let mut state = self.record("close")?;
        state.closed = true;
        Ok(())
    }
}

//! HTTP client for the Milvus RESTful v2 API.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use tokio::sync::Semaphore;
use vecdex_core::api::{
    CollectionDescription, CollectionField, FieldType, IndexInfo, IndexSpec, RemoteStoreConfig,
    Result, SearchHit, SearchRequest, VectorDbClient, VectorError,
};

use crate::http::{build_client, decode, map_reqwest_error, preview_body, read_success_body};

#[derive(Deserialize)]
struct Envelope<T> {
    #[serde(default)]
    code: i64,
    #[serde(default)]
    message: Option<String>,
    data: Option<T>,
}

pub struct MilvusHttpClient {
    http: reqwest::Client,
    base_url: String,
    token: Option<String>,
    timeout_ms: u64,
    permits: Arc<Semaphore>,
    closed: AtomicBool,
}

impl MilvusHttpClient {
    pub fn new(cfg: &RemoteStoreConfig) -> Result<Self> {
        if cfg.host.trim().is_empty() {
            return Err(VectorError::config("remote vector store host is required"));
        }
        Self::with_endpoint(cfg.endpoint(), cfg)
    }

    /// Build against an explicit endpoint such as `http://127.0.0.1:19530`.
    pub fn with_endpoint(endpoint: String, cfg: &RemoteStoreConfig) -> Result<Self> {
        Ok(Self {
            http: build_client(cfg.timeout_ms)?,
            base_url: format!("{}/v2/vectordb", endpoint.trim_end_matches('/')),
            token: cfg.auth_token(),
            timeout_ms: cfg.timeout_ms,
            permits: Arc::new(Semaphore::new(cfg.max_in_flight.max(1))),
            closed: AtomicBool::new(false),
        })
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    async fn call<B, T>(&self, path: &str, operation: &'static str, body: &B) -> Result<Option<T>>
    where
        B: Serialize + Sync,
        T: DeserializeOwned,
    {
        if self.is_closed() {
            return Err(VectorError::Closed);
        }
        let _permit = self
            .permits
            .acquire()
            .await
            .map_err(|_| VectorError::Closed)?;

        let url = format!("{}/{}", self.base_url, path);
        tracing::debug!(target: "vecdex.store", stage = "milvus.http.in", op = operation, url = %url);

        let mut req = self.http.post(&url).json(body);
        if let Some(token) = &self.token {
            req = req.bearer_auth(token);
        }
        let resp = req
            .send()
            .await
            .map_err(|e| map_reqwest_error(e, operation, self.timeout_ms))?;
        let status = resp.status();
        let text = read_success_body(resp, operation, self.timeout_ms).await?;
        let envelope: Envelope<T> = decode(&text)?;
        if envelope.code != 0 {
            return Err(VectorError::Api {
                status: status.as_u16(),
                message: format!(
                    "{} failed with code {}: {}",
                    operation,
                    envelope.code,
                    envelope
                        .message
                        .unwrap_or_else(|| preview_body(&text))
                ),
            });
        }

        tracing::debug!(target: "vecdex.store", stage = "milvus.http.out", op = operation, status = %status);
        Ok(envelope.data)
    }
}

fn field_to_wire(field: &CollectionField) -> Value {
    let mut out = json!({
        "fieldName": field.name,
        "isPrimary": field.is_primary,
    });
    match field.field_type {
        FieldType::VarChar { max_length } => {
            out["dataType"] = json!("VarChar");
            out["elementTypeParams"] = json!({ "max_length": max_length });
        }
        FieldType::FloatVector { dim } => {
            out["dataType"] = json!("FloatVector");
            out["elementTypeParams"] = json!({ "dim": dim });
        }
        FieldType::Json => {
            out["dataType"] = json!("JSON");
        }
    }
    out
}

#[derive(Deserialize)]
struct WireDescription {
    #[serde(rename = "collectionName", default)]
    collection_name: String,
    #[serde(default)]
    fields: Vec<WireField>,
}

#[derive(Deserialize)]
struct WireField {
    name: String,
    #[serde(rename = "type")]
    data_type: String,
    #[serde(rename = "primaryKey", default)]
    primary_key: bool,
    #[serde(default)]
    params: Vec<WireParam>,
}

#[derive(Deserialize)]
struct WireParam {
    key: String,
    value: Value,
}

impl WireField {
    fn param_usize(&self, key: &str) -> Option<usize> {
        let value = &self.params.iter().find(|p| p.key == key)?.value;
        match value {
            Value::Number(n) => n.as_u64().map(|n| n as usize),
            Value::String(s) => s.parse().ok(),
            _ => None,
        }
    }

    fn into_field(self) -> Option<CollectionField> {
        let field_type = match self.data_type.as_str() {
            "VarChar" => FieldType::VarChar {
                max_length: self.param_usize("max_length").unwrap_or(0),
            },
            "FloatVector" => FieldType::FloatVector {
                dim: self.param_usize("dim")?,
            },
            "JSON" => FieldType::Json,
            _ => return None,
        };
        Some(CollectionField {
            name: self.name,
            field_type,
            is_primary: self.primary_key,
        })
    }
}

#[derive(Deserialize)]
struct WireIndex {
    #[serde(rename = "indexName", default)]
    index_name: Option<String>,
    #[serde(rename = "fieldName")]
    field_name: String,
}

#[derive(Deserialize)]
struct HasData {
    has: bool,
}

#[derive(Deserialize)]
struct InsertData {
    #[serde(rename = "insertCount", default)]
    insert_count: usize,
}

#[derive(Deserialize)]
struct WireHit {
    id: Value,
    distance: f32,
    #[serde(flatten)]
    fields: Map<String, Value>,
}

fn collection_body(name: &str) -> Value {
    json!({ "collectionName": name })
}

#[async_trait]
impl VectorDbClient for MilvusHttpClient {
    async fn has_collection(&self, name: &str) -> Result<bool> {
        let data: Option<HasData> = self
            .call("collections/has", "has_collection", &collection_body(name))
            .await?;
        Ok(data.map(|d| d.has).unwrap_or(false))
    }

    async fn describe_collection(&self, name: &str) -> Result<CollectionDescription> {
        let data: Option<WireDescription> = self
            .call(
                "collections/describe",
                "describe_collection",
                &collection_body(name),
            )
            .await?;
        let data = data.ok_or_else(|| {
            VectorError::Decode(format!("describe_collection returned no data for {}", name))
        })?;
        Ok(CollectionDescription {
            name: if data.collection_name.is_empty() {
                name.to_string()
            } else {
                data.collection_name
            },
            fields: data
                .fields
                .into_iter()
                .filter_map(WireField::into_field)
                .collect(),
        })
    }

    async fn create_collection(&self, name: &str, fields: &[CollectionField]) -> Result<()> {
        let body = json!({
            "collectionName": name,
            "schema": {
                "autoId": false,
                "enableDynamicField": false,
                "fields": fields.iter().map(field_to_wire).collect::<Vec<_>>(),
            },
        });
        self.call::<_, Value>("collections/create", "create_collection", &body)
            .await?;
        Ok(())
    }

    async fn list_indexes(&self, collection: &str) -> Result<Vec<IndexInfo>> {
        let names: Option<Vec<String>> = self
            .call("indexes/list", "list_indexes", &collection_body(collection))
            .await?;
        // The list only carries names; the covered field comes from describe.
        let mut indexes = Vec::new();
        for name in names.unwrap_or_default() {
            let body = json!({ "collectionName": collection, "indexName": name });
            let described: Option<Vec<WireIndex>> = self
                .call("indexes/describe", "describe_index", &body)
                .await?;
            indexes.extend(described.unwrap_or_default().into_iter().map(|w| {
                IndexInfo::new(w.index_name.unwrap_or_else(|| name.clone()), w.field_name)
            }));
        }
        Ok(indexes)
    }

    async fn create_index(&self, collection: &str, index: &IndexSpec) -> Result<()> {
        let mut params = index.params.clone();
        params.insert("index_type".to_string(), json!(index.index_type));
        let body = json!({
            "collectionName": collection,
            "indexParams": [{
                "fieldName": index.field_name,
                "indexName": index.index_name,
                "metricType": index.metric_type,
                "indexType": index.index_type,
                "params": params,
            }],
        });
        self.call::<_, Value>("indexes/create", "create_index", &body)
            .await?;
        Ok(())
    }

    async fn load_collection(&self, name: &str) -> Result<()> {
        self.call::<_, Value>("collections/load", "load_collection", &collection_body(name))
            .await?;
        Ok(())
    }

    async fn insert(&self, collection: &str, rows: Vec<Value>) -> Result<usize> {
        let expected = rows.len();
        let body = json!({ "collectionName": collection, "data": rows });
        let data: Option<InsertData> = self.call("entities/insert", "insert", &body).await?;
        Ok(data.map(|d| d.insert_count).unwrap_or(expected))
    }

    async fn flush(&self, collections: &[String]) -> Result<()> {
        for name in collections {
            self.call::<_, Value>("collections/flush", "flush", &collection_body(name))
                .await?;
        }
        Ok(())
    }

    async fn search(&self, request: SearchRequest) -> Result<Vec<SearchHit>> {
        let mut body = json!({
            "collectionName": request.collection,
            "data": [request.vector],
            "annsField": request.vector_field,
            "limit": request.limit,
            "outputFields": request.output_fields,
            "consistencyLevel": request.consistency_level,
        });
        if let Some(filter) = &request.filter {
            body["filter"] = json!(filter);
        }
        let data: Option<Vec<WireHit>> = self.call("entities/search", "search", &body).await?;
        Ok(data
            .unwrap_or_default()
            .into_iter()
            .map(|hit| SearchHit {
                id: match hit.id {
                    Value::String(s) => s,
                    other => other.to_string(),
                },
                score: hit.distance,
                fields: hit.fields,
            })
            .collect())
    }

    async fn drop_collection(&self, name: &str) -> Result<()> {
        self.call::<_, Value>("collections/drop", "drop_collection", &collection_body(name))
            .await?;
        Ok(())
    }

    async fn close(&self) -> Result<()> {
        self.closed.store(true, Ordering::Release);
        self.permits.close();
        Ok(())
    }
}

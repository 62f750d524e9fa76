//! Operation contract for an external, schema-managed vector database.
//!
//! `RemoteVectorStore` only talks to the database through this trait, so any
//! backend that can provide these operations is usable.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::Result;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FieldType {
    VarChar { max_length: usize },
    FloatVector { dim: usize },
    Json,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollectionField {
    pub name: String,
    pub field_type: FieldType,
    #[serde(default)]
    pub is_primary: bool,
}

impl CollectionField {
    pub fn primary_key(name: &str, max_length: usize) -> Self {
        Self {
            name: name.to_string(),
            field_type: FieldType::VarChar { max_length },
            is_primary: true,
        }
    }

    pub fn varchar(name: &str, max_length: usize) -> Self {
        Self {
            name: name.to_string(),
            field_type: FieldType::VarChar { max_length },
            is_primary: false,
        }
    }

    pub fn float_vector(name: &str, dim: usize) -> Self {
        Self {
            name: name.to_string(),
            field_type: FieldType::FloatVector { dim },
            is_primary: false,
        }
    }

    pub fn json(name: &str) -> Self {
        Self {
            name: name.to_string(),
            field_type: FieldType::Json,
            is_primary: false,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CollectionDescription {
    pub name: String,
    pub fields: Vec<CollectionField>,
}

impl CollectionDescription {
    /// Dimension of the named float-vector field, if present.
    pub fn vector_dimension(&self, field: &str) -> Option<usize> {
        self.fields.iter().find_map(|f| match f.field_type {
            FieldType::FloatVector { dim } if f.name == field => Some(dim),
            _ => None,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct IndexSpec {
    pub field_name: String,
    pub index_name: String,
    pub index_type: String,
    pub metric_type: String,
    pub params: Map<String, Value>,
}

/// An index that already exists on a collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexInfo {
    pub index_name: String,
    pub field_name: String,
}

impl IndexInfo {
    pub fn new(index_name: impl Into<String>, field_name: impl Into<String>) -> Self {
        Self {
            index_name: index_name.into(),
            field_name: field_name.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SearchRequest {
    pub collection: String,
    pub vector: Vec<f32>,
    pub vector_field: String,
    pub output_fields: Vec<String>,
    pub limit: usize,
    /// Server-side boolean expression; `None` searches the whole collection.
    pub filter: Option<String>,
    pub consistency_level: String,
}

/// One row returned by a vector search.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchHit {
    pub id: String,
    pub score: f32,
    pub fields: Map<String, Value>,
}

#[async_trait]
pub trait VectorDbClient: Send + Sync {
    async fn has_collection(&self, name: &str) -> Result<bool>;

    async fn describe_collection(&self, name: &str) -> Result<CollectionDescription>;

    async fn create_collection(&self, name: &str, fields: &[CollectionField]) -> Result<()>;

    /// Indexes defined on a collection, with the field each one covers.
    async fn list_indexes(&self, collection: &str) -> Result<Vec<IndexInfo>>;

    async fn create_index(&self, collection: &str, index: &IndexSpec) -> Result<()>;

    async fn load_collection(&self, name: &str) -> Result<()>;

    /// Insert rows and return how many the server accepted.
    async fn insert(&self, collection: &str, rows: Vec<Value>) -> Result<usize>;

    /// Block until previously inserted rows are visible to searches.
    async fn flush(&self, collections: &[String]) -> Result<()>;

    async fn search(&self, request: SearchRequest) -> Result<Vec<SearchHit>>;

    async fn drop_collection(&self, name: &str) -> Result<()>;

    async fn close(&self) -> Result<()>;
}

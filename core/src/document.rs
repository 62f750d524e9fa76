//! Documents flowing through the embedding and vector store layers.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Opaque, caller-defined document metadata.
pub type Metadata = BTreeMap<String, serde_json::Value>;

/// A unit of text plus metadata.
///
/// Fields are private so a document cannot be mutated after construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    content: String,
    #[serde(default)]
    metadata: Metadata,
}

impl Document {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            metadata: Metadata::new(),
        }
    }

    pub fn with_metadata(content: impl Into<String>, metadata: Metadata) -> Self {
        Self {
            content: content.into(),
            metadata,
        }
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    pub fn into_parts(self) -> (String, Metadata) {
        (self.content, self.metadata)
    }
}

/// A document paired with the backend's similarity score.
///
/// Whether higher or lower is closer depends on the backend; see the
/// documentation of each `VectorStore` implementation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    pub document: Document,
    pub score: f32,
}

impl SearchResult {
    pub fn new(document: Document, score: f32) -> Self {
        Self { document, score }
    }
}

//! Stable re-exports for consumers (`cli`, `plugins`, and external crates).
//!
//! Prefer importing from `vecdex_core::api` instead of reaching into internal modules.

pub use crate::config::{
    apply_env_overrides, load_default, load_from_path, AppConfig, EmbeddingConfig,
    EmbeddingProviderKind, LoggingConfig, RemoteStoreConfig, VectorStoreBackend,
    VectorStoreConfig,
};
pub use crate::document::{Document, Metadata, SearchResult};
pub use crate::embedding::{validate_embeddings, Embedding, EmbeddingProvider, MultiModalInput};
pub use crate::error::{CliError, Result, VectorError};
pub use crate::filter::{FilterValue, MetadataFilter};
pub use crate::vector_store::{
    check_batch, check_dimension, CollectionDescription, CollectionField, FieldType, IndexInfo,
    IndexSpec, SearchHit, SearchRequest, VectorDbClient, VectorStore, DEFAULT_SEARCH_K,
};

use std::sync::Arc;

use vecdex_core::api::{
    AppConfig, EmbeddingConfig, EmbeddingProvider, EmbeddingProviderKind, Result,
    VectorStore, VectorStoreBackend,
};

use crate::embedding::{OllamaEmbeddingProvider, OpenAiEmbeddingProvider};
use crate::store::{InMemoryVectorIndex, MilvusHttpClient, RemoteVectorStore};

pub fn build_embeddings(cfg: &EmbeddingConfig) -> Result<Arc<dyn EmbeddingProvider>> {
    match cfg.provider {
        EmbeddingProviderKind::OpenAi => Ok(Arc::new(OpenAiEmbeddingProvider::new(cfg)?)),
        EmbeddingProviderKind::Ollama => Ok(Arc::new(OllamaEmbeddingProvider::new(cfg)?)),
    }
}

/// Remote store wired to a Milvus HTTP client. Nothing is contacted until
/// the first operation.
pub fn build_remote_store(
    cfg: &AppConfig,
    embeddings: Arc<dyn EmbeddingProvider>,
) -> Result<Arc<RemoteVectorStore>> {
    let remote = &cfg.vector_store.remote;
    let client = Arc::new(MilvusHttpClient::new(remote)?);
    Ok(Arc::new(RemoteVectorStore::new(client, embeddings, remote)?))
}

pub fn build_vector_store(
    cfg: &AppConfig,
    embeddings: Arc<dyn EmbeddingProvider>,
) -> Result<Arc<dyn VectorStore>> {
    tracing::debug!(
        target: "vecdex.store",
        stage = "factory.build",
        backend = ?cfg.vector_store.backend,
        provider = embeddings.name(),
        model = embeddings.model()
    );
    match cfg.vector_store.backend {
        VectorStoreBackend::Memory => Ok(Arc::new(InMemoryVectorIndex::new(embeddings))),
        VectorStoreBackend::Remote => Ok(build_remote_store(cfg, embeddings)?),
    }
}

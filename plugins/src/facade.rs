//! Single entry point for callers: builds the configured backend on first
//! use and routes document/query calls to it.
use std::sync::Arc;

use tokio::sync::OnceCell;
use vecdex_core::api::{
    AppConfig, Document, MetadataFilter, Result, SearchResult, VectorError, VectorStore,
    DEFAULT_SEARCH_K,
};

use crate::factory;

type StoreBuilder = Box<dyn Fn(&AppConfig) -> Result<Arc<dyn VectorStore>> + Send + Sync>;

pub struct VectorStoreFacade {
    config: AppConfig,
    builder: StoreBuilder,
    store: OnceCell<Arc<dyn VectorStore>>,
}

fn build_from_config(config: &AppConfig) -> Result<Arc<dyn VectorStore>> {
    let embeddings = factory::build_embeddings(&config.embedding)?;
    factory::build_vector_store(config, embeddings)
}

impl VectorStoreFacade {
    pub fn new(config: AppConfig) -> Self {
        Self::with_builder(config, build_from_config)
    }

    /// Use a custom backend constructor instead of the factory.
    pub fn with_builder<F>(config: AppConfig, builder: F) -> Self
    where
        F: Fn(&AppConfig) -> Result<Arc<dyn VectorStore>> + Send + Sync + 'static,
    {
        Self {
            config,
            builder: Box::new(builder),
            store: OnceCell::new(),
        }
    }

    /// Wrap an already built store; the configuration is never consulted.
    pub fn from_store(store: Arc<dyn VectorStore>) -> Self {
        Self {
            config: AppConfig::default(),
            builder: Box::new(build_from_config),
            store: OnceCell::from(store),
        }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Build the backend once. Concurrent first callers wait on the same
    /// construction; a failed build is retried by the next caller.
    pub async fn get_or_try_init(&self) -> Result<&Arc<dyn VectorStore>> {
        self.store
            .get_or_try_init(|| async {
                let store = (self.builder)(&self.config)?;
                tracing::info!(
                    target: "vecdex.store",
                    stage = "facade.ready",
                    backend = store.name()
                );
                Ok::<_, VectorError>(store)
            })
            .await
    }

    pub async fn add_documents_to_store(&self, documents: Vec<Document>) -> Result<Vec<String>> {
        let store = self.get_or_try_init().await?;
        store.add_documents(documents).await
    }

    /// `k` defaults to 4.
    pub async fn similarity_search(&self, query: &str, k: Option<usize>) -> Result<Vec<Document>> {
        let store = self.get_or_try_init().await?;
        store
            .similarity_search(query, k.unwrap_or(DEFAULT_SEARCH_K), None)
            .await
    }

    pub async fn similarity_search_with_score(
        &self,
        query: &str,
        k: Option<usize>,
        filter: Option<&MetadataFilter>,
    ) -> Result<Vec<SearchResult>> {
        let store = self.get_or_try_init().await?;
        store
            .similarity_search_with_score(query, k.unwrap_or(DEFAULT_SEARCH_K), filter)
            .await
    }

    /// Close the backend if one was built.
    pub async fn shutdown(&self) -> Result<()> {
        match self.store.get() {
            Some(store) => store.close().await,
            None => Ok(()),
        }
    }
}

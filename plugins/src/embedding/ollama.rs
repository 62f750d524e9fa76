//! Local Ollama embedding provider.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Semaphore;
use vecdex_core::api::{
    validate_embeddings, Embedding, EmbeddingConfig, EmbeddingProvider, MultiModalInput, Result,
    VectorError,
};

use crate::http::{build_client, decode, map_reqwest_error, read_success_body};

/// Ollama needs no credentials; text-only.
pub struct OllamaEmbeddingProvider {
    client: reqwest::Client,
    url: String,
    model: String,
    dimension: Option<usize>,
    timeout_ms: u64,
    permits: Arc<Semaphore>,
}

impl OllamaEmbeddingProvider {
    pub fn new(cfg: &EmbeddingConfig) -> Result<Self> {
        if cfg.model.trim().is_empty() {
            return Err(VectorError::config("embedding model is required"));
        }
        Ok(Self {
            client: build_client(cfg.timeout_ms)?,
            url: format!("{}/api/embed", cfg.effective_base_url()),
            model: cfg.model.trim().to_string(),
            dimension: cfg.dimension,
            timeout_ms: cfg.timeout_ms,
            permits: Arc::new(Semaphore::new(cfg.max_in_flight.max(1))),
        })
    }
}

#[async_trait]
impl EmbeddingProvider for OllamaEmbeddingProvider {
    fn name(&self) -> &str {
        "ollama"
    }

    fn model(&self) -> &str {
        &self.model
    }

    fn dimension(&self) -> Option<usize> {
        self.dimension
    }

    async fn embed_documents(&self, texts: &[String]) -> Result<Vec<Embedding>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        let request = OllamaEmbedRequest {
            model: &self.model,
            input: texts,
        };

        let _permit = self
            .permits
            .acquire()
            .await
            .map_err(|_| VectorError::Closed)?;

        tracing::debug!(
            target: "vecdex.embedding",
            stage = "ollama.http.in",
            url = %self.url,
            model = %self.model,
            inputs = texts.len()
        );

        let resp = self
            .client
            .post(&self.url)
            .json(&request)
            .send()
            .await
            .map_err(|e| map_reqwest_error(e, "ollama embedding request", self.timeout_ms))?;
        let body = read_success_body(resp, "ollama embedding request", self.timeout_ms).await?;
        let result: OllamaEmbedResponse = decode(&body)?;

        validate_embeddings(&result.embeddings, texts.len(), self.dimension)?;
        tracing::debug!(
            target: "vecdex.embedding",
            stage = "ollama.http.out",
            vectors = result.embeddings.len(),
            dimension = result.embeddings.first().map(Vec::len).unwrap_or(0)
        );
        Ok(result.embeddings)
    }

    async fn embed_multimodal(&self, _inputs: &[MultiModalInput]) -> Result<Vec<Embedding>> {
        Err(VectorError::UnsupportedModel {
            model: self.model.clone(),
        })
    }
}

#[derive(serde::Serialize)]
struct OllamaEmbedRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(serde::Deserialize)]
struct OllamaEmbedResponse {
    embeddings: Vec<Vec<f32>>,
}

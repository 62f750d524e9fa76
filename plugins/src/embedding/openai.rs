//! OpenAI-compatible `/embeddings` provider.
//!
//! Works against OpenAI and the many services that mirror its API
//! (DashScope compatible mode, Jina, Volcengine Ark, vLLM, ...).

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::Semaphore;
use vecdex_core::api::{
    validate_embeddings, Embedding, EmbeddingConfig, EmbeddingProvider, MultiModalInput, Result,
    VectorError,
};

use crate::http::{build_client, decode, map_reqwest_error, read_success_body};

/// Models known to accept `MultiModalInput` arrays.
pub const MULTIMODAL_MODELS: &[&str] = &[
    "multimodal-embedding-v1",
    "tongyi-embedding-vision-plus",
    "tongyi-embedding-vision-flash",
    "jina-clip-v2",
    "doubao-embedding-vision-250615",
];

pub fn supports_multimodal(model: &str) -> bool {
    MULTIMODAL_MODELS.contains(&model)
}

pub struct OpenAiEmbeddingProvider {
    client: reqwest::Client,
    url: String,
    api_key: String,
    model: String,
    dimension: Option<usize>,
    timeout_ms: u64,
    permits: Arc<Semaphore>,
}

impl std::fmt::Debug for OpenAiEmbeddingProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiEmbeddingProvider")
            .field("url", &self.url)
            .field("model", &self.model)
            .field("dimension", &self.dimension)
            .field("timeout_ms", &self.timeout_ms)
            .finish_non_exhaustive()
    }
}

impl OpenAiEmbeddingProvider {
    /// Fails with `Configuration` when the API key or model is blank.
    pub fn new(cfg: &EmbeddingConfig) -> Result<Self> {
        if cfg.api_key.trim().is_empty() {
            return Err(VectorError::config(
                "embedding api_key is required (set VECDEX_EMBEDDING_API_KEY)",
            ));
        }
        if cfg.model.trim().is_empty() {
            return Err(VectorError::config("embedding model is required"));
        }
        let client = build_client(cfg.timeout_ms)?;
        Ok(Self {
            client,
            url: format!("{}/embeddings", cfg.effective_base_url()),
            api_key: cfg.api_key.trim().to_string(),
            model: cfg.model.trim().to_string(),
            dimension: cfg.dimension,
            timeout_ms: cfg.timeout_ms,
            permits: Arc::new(Semaphore::new(cfg.max_in_flight.max(1))),
        })
    }

    async fn request<I: Serialize + Sync>(&self, input: &I, count: usize) -> Result<Vec<Embedding>> {
        let request = EmbedRequest {
            input,
            model: &self.model,
            dimensions: self.dimension,
            encoding_format: "float",
        };

        let _permit = self
            .permits
            .acquire()
            .await
            .map_err(|_| VectorError::Closed)?;

        tracing::debug!(
            target: "vecdex.embedding",
            stage = "embedding.http.in",
            url = %self.url,
            model = %self.model,
            inputs = count
        );

        let resp = self
            .client
            .post(&self.url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| map_reqwest_error(e, "embedding request", self.timeout_ms))?;
        let status = resp.status();
        let body = read_success_body(resp, "embedding request", self.timeout_ms)
            .await
            .inspect_err(|e| {
                tracing::warn!(
                    target: "vecdex.embedding",
                    stage = "embedding.http.error",
                    status = %status,
                    error = %e
                );
            })?;

        let parsed: EmbedResponse = decode(&body)?;
        let vectors = into_ordered(parsed.data, count)?;
        validate_embeddings(&vectors, count, self.dimension)?;

        tracing::debug!(
            target: "vecdex.embedding",
            stage = "embedding.http.out",
            status = %status,
            vectors = vectors.len(),
            dimension = vectors.first().map(Vec::len).unwrap_or(0)
        );
        Ok(vectors)
    }
}

/// Place each item at its `index`, rejecting gaps, duplicates and
/// out-of-range positions.
fn into_ordered(mut data: Vec<EmbedData>, count: usize) -> Result<Vec<Embedding>> {
    if data.len() != count {
        return Err(VectorError::Decode(format!(
            "expected {} embeddings, got {}",
            count,
            data.len()
        )));
    }
    data.sort_by_key(|d| d.index);
    for (pos, item) in data.iter().enumerate() {
        if item.index != pos {
            return Err(VectorError::Decode(format!(
                "embedding indices are not a permutation of 0..{}",
                count
            )));
        }
    }
    Ok(data.into_iter().map(|d| d.embedding).collect())
}

#[async_trait]
impl EmbeddingProvider for OpenAiEmbeddingProvider {
    fn name(&self) -> &str {
        "openai"
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
        self.request(&texts, texts.len()).await
    }

    async fn embed_multimodal(&self, inputs: &[MultiModalInput]) -> Result<Vec<Embedding>> {
        if !supports_multimodal(&self.model) {
            return Err(VectorError::UnsupportedModel {
                model: self.model.clone(),
            });
        }
        if inputs.is_empty() {
            return Ok(Vec::new());
        }
        self.request(&inputs, inputs.len()).await
    }
}

#[derive(Serialize)]
struct EmbedRequest<'a, I: Serialize> {
    input: &'a I,
    model: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    dimensions: Option<usize>,
    encoding_format: &'a str,
}

#[derive(Deserialize)]
struct EmbedResponse {
    data: Vec<EmbedData>,
}

#[derive(Deserialize)]
struct EmbedData {
    embedding: Vec<f32>,
    #[serde(default)]
    index: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::{Matcher, Server};
    use serde_json::json;

    fn config(base_url: String) -> EmbeddingConfig {
        EmbeddingConfig {
            api_key: "sk-test".to_string(),
            base_url: Some(base_url),
            timeout_ms: 2_000,
            ..Default::default()
        }
    }

    #[test]
    fn test_missing_api_key_is_configuration_error() {
        let cfg = EmbeddingConfig {
            api_key: "  ".to_string(),
            ..Default::default()
        };
        let err = OpenAiEmbeddingProvider::new(&cfg).unwrap_err();
        assert!(matches!(err, VectorError::Configuration(_)));
    }

    #[tokio::test]
    async fn test_embed_documents_restores_input_order() {
        let mut server = Server::new_async().await;
        let _m = server
            .mock("POST", "/embeddings")
            .match_header("authorization", "Bearer sk-test")
            .match_body(Matcher::PartialJson(json!({
                "input": ["first", "second", "third"],
                "model": "text-embedding-3-small",
                "encoding_format": "float"
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                json!({
                    "object": "list",
                    "data": [
                        {"object": "embedding", "index": 2, "embedding": [0.0, 0.0, 3.0]},
                        {"object": "embedding", "index": 0, "embedding": [1.0, 0.0, 0.0]},
                        {"object": "embedding", "index": 1, "embedding": [0.0, 2.0, 0.0]}
                    ],
                    "model": "text-embedding-3-small"
                })
                .to_string(),
            )
            .create_async()
            .await;

        let provider = OpenAiEmbeddingProvider::new(&config(server.url())).unwrap();
        let texts = vec!["first".to_string(), "second".to_string(), "third".to_string()];
        let vectors = provider.embed_documents(&texts).await.unwrap();
        assert_eq!(
            vectors,
            vec![vec![1.0, 0.0, 0.0], vec![0.0, 2.0, 0.0], vec![0.0, 0.0, 3.0]]
        );
    }

    #[tokio::test]
    async fn test_empty_batch_makes_no_request() {
        let mut server = Server::new_async().await;
        let m = server
            .mock("POST", "/embeddings")
            .expect(0)
            .create_async()
            .await;

        let provider = OpenAiEmbeddingProvider::new(&config(server.url())).unwrap();
        let vectors = provider.embed_documents(&[]).await.unwrap();
        assert!(vectors.is_empty());
        m.assert_async().await;
    }

    #[tokio::test]
    async fn test_embed_query_single_vector() {
        let mut server = Server::new_async().await;
        let _m = server
            .mock("POST", "/embeddings")
            .match_body(Matcher::PartialJson(json!({"input": ["hello"]})))
            .with_status(200)
            .with_body(r#"{"data":[{"index":0,"embedding":[0.5,0.5]}]}"#)
            .create_async()
            .await;

        let provider = OpenAiEmbeddingProvider::new(&config(server.url())).unwrap();
        assert_eq!(provider.embed_query("hello").await.unwrap(), vec![0.5, 0.5]);
    }

    #[tokio::test]
    async fn test_api_error_carries_status_and_message() {
        let mut server = Server::new_async().await;
        let _m = server
            .mock("POST", "/embeddings")
            .with_status(401)
            .with_body(r#"{"error":{"message":"Incorrect API key provided","code":"invalid_api_key"}}"#)
            .create_async()
            .await;

        let provider = OpenAiEmbeddingProvider::new(&config(server.url())).unwrap();
        let err = provider
            .embed_documents(&["x".to_string()])
            .await
            .unwrap_err();
        match err {
            VectorError::Api { status, message } => {
                assert_eq!(status, 401);
                assert_eq!(message, "Incorrect API key provided");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_configured_dimension_is_enforced() {
        let mut server = Server::new_async().await;
        let _m = server
            .mock("POST", "/embeddings")
            .match_body(Matcher::PartialJson(json!({"dimensions": 4})))
            .with_status(200)
            .with_body(r#"{"data":[{"index":0,"embedding":[0.1,0.2,0.3]}]}"#)
            .create_async()
            .await;

        let mut cfg = config(server.url());
        cfg.dimension = Some(4);
        let provider = OpenAiEmbeddingProvider::new(&cfg).unwrap();
        let err = provider.embed_query("x").await.unwrap_err();
        assert!(matches!(
            err,
            VectorError::DimensionMismatch {
                expected: 4,
                actual: 3
            }
        ));
    }

    #[tokio::test]
    async fn test_missing_items_is_decode_error() {
        let mut server = Server::new_async().await;
        let _m = server
            .mock("POST", "/embeddings")
            .with_status(200)
            .with_body(r#"{"data":[{"index":0,"embedding":[0.1]}]}"#)
            .create_async()
            .await;

        let provider = OpenAiEmbeddingProvider::new(&config(server.url())).unwrap();
        let err = provider
            .embed_documents(&["a".to_string(), "b".to_string()])
            .await
            .unwrap_err();
        assert!(matches!(err, VectorError::Decode(_)));
    }

    #[tokio::test]
    async fn test_multimodal_rejected_without_request() {
        let mut server = Server::new_async().await;
        let m = server
            .mock("POST", "/embeddings")
            .expect(0)
            .create_async()
            .await;

        let provider = OpenAiEmbeddingProvider::new(&config(server.url())).unwrap();
        let err = provider
            .embed_multimodal(&[MultiModalInput::image_url("https://example.com/a.png")])
            .await
            .unwrap_err();
        assert!(
            matches!(err, VectorError::UnsupportedModel { ref model } if model == "text-embedding-3-small")
        );
        m.assert_async().await;
    }

    #[tokio::test]
    async fn test_multimodal_request_shape() {
        let mut server = Server::new_async().await;
        let _m = server
            .mock("POST", "/embeddings")
            .match_body(Matcher::PartialJson(json!({
                "model": "jina-clip-v2",
                "input": [
                    {"type": "text", "text": "a cat"},
                    {"type": "image_url", "url": "https://example.com/cat.png"}
                ]
            })))
            .with_status(200)
            .with_body(r#"{"data":[{"index":0,"embedding":[1.0,0.0]},{"index":1,"embedding":[0.9,0.1]}]}"#)
            .create_async()
            .await;

        let mut cfg = config(server.url());
        cfg.model = "jina-clip-v2".to_string();
        let provider = OpenAiEmbeddingProvider::new(&cfg).unwrap();
        let vectors = provider
            .embed_multimodal(&[
                MultiModalInput::text("a cat"),
                MultiModalInput::image_url("https://example.com/cat.png"),
            ])
            .await
            .unwrap();
        assert_eq!(vectors.len(), 2);
    }

    #[tokio::test]
    async fn test_timeout_is_distinct_from_api_error() {
        // Accept connections but never answer.
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let mut held = Vec::new();
            while let Ok((socket, _)) = listener.accept().await {
                held.push(socket);
            }
        });

        let mut cfg = config(format!("http://{}", addr));
        cfg.timeout_ms = 200;
        let provider = OpenAiEmbeddingProvider::new(&cfg).unwrap();
        let err = provider.embed_query("x").await.unwrap_err();
        assert!(
            matches!(err, VectorError::Timeout { timeout_ms: 200, .. }),
            "unexpected error: {err:?}"
        );
    }
}

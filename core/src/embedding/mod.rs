//! Embedding provider abstraction.
//!
//! Providers turn text (and, for some models, images or video) into fixed-size
//! dense vectors. Concrete HTTP-backed providers live in `vecdex-plugins`.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::{Result, VectorError};

/// A dense embedding vector.
pub type Embedding = Vec<f32>;

/// One element of a multimodal embedding request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MultiModalInput {
    Text { text: String },
    ImageUrl { url: String },
    VideoUrl { url: String },
}

impl MultiModalInput {
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text { text: text.into() }
    }

    pub fn image_url(url: impl Into<String>) -> Self {
        Self::ImageUrl { url: url.into() }
    }

    pub fn video_url(url: impl Into<String>) -> Self {
        Self::VideoUrl { url: url.into() }
    }
}

#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    fn name(&self) -> &str;

    fn model(&self) -> &str;

    /// Configured output dimension, if the provider knows it up front.
    fn dimension(&self) -> Option<usize>;

    /// Embed a batch of texts. Output order matches input order; an empty
    /// batch returns an empty result without any network call.
    async fn embed_documents(&self, texts: &[String]) -> Result<Vec<Embedding>>;

    /// Embed a single query text.
    async fn embed_query(&self, text: &str) -> Result<Embedding> {
        let mut vectors = self.embed_documents(&[text.to_string()]).await?;
        vectors
            .pop()
            .ok_or_else(|| VectorError::Decode("provider returned no embedding".to_string()))
    }

    /// Embed mixed text/image/video inputs. Providers whose model is not
    /// multimodal-capable must fail with `UnsupportedModel` before any request.
    async fn embed_multimodal(&self, inputs: &[MultiModalInput]) -> Result<Vec<Embedding>>;
}

/// Check that a provider response has one vector per input and that every
/// vector has the same length, matching `expected` when given.
pub fn validate_embeddings(
    vectors: &[Embedding],
    inputs: usize,
    expected: Option<usize>,
) -> Result<()> {
    if vectors.len() != inputs {
        return Err(VectorError::Decode(format!(
            "expected {} embeddings, got {}",
            inputs,
            vectors.len()
        )));
    }
    if let Some(pos) = vectors.iter().position(Vec::is_empty) {
        return Err(VectorError::Decode(format!("embedding {} is empty", pos)));
    }
    let Some(first) = vectors.first() else {
        return Ok(());
    };
    let dimension = expected.unwrap_or(first.len());
    if let Some(bad) = vectors.iter().find(|v| v.len() != dimension) {
        return Err(VectorError::DimensionMismatch {
            expected: dimension,
            actual: bad.len(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_multimodal_input_wire_shape() {
        let inputs = vec![
            MultiModalInput::text("a cat"),
            MultiModalInput::image_url("https://example.com/cat.png"),
            MultiModalInput::video_url("https://example.com/cat.mp4"),
        ];
        let value = serde_json::to_value(&inputs).unwrap();
        assert_eq!(
            value,
            serde_json::json!([
                {"type": "text", "text": "a cat"},
                {"type": "image_url", "url": "https://example.com/cat.png"},
                {"type": "video_url", "url": "https://example.com/cat.mp4"},
            ])
        );
    }

    #[test]
    fn test_validate_embeddings_counts_and_dimensions() {
        let ok = vec![vec![0.0; 3], vec![1.0; 3]];
        assert!(validate_embeddings(&ok, 2, Some(3)).is_ok());
        assert!(validate_embeddings(&ok, 2, None).is_ok());
        assert!(validate_embeddings(&[], 0, Some(3)).is_ok());

        let err = validate_embeddings(&ok, 3, None).unwrap_err();
        assert!(matches!(err, VectorError::Decode(_)));

        let err = validate_embeddings(&ok, 2, Some(4)).unwrap_err();
        assert!(matches!(
            err,
            VectorError::DimensionMismatch {
                expected: 4,
                actual: 3
            }
        ));

        let err = validate_embeddings(&[vec![]], 1, None).unwrap_err();
        assert!(matches!(err, VectorError::Decode(_)));

        let ragged = vec![vec![0.0; 3], vec![1.0; 2]];
        assert!(matches!(
            validate_embeddings(&ragged, 2, None),
            Err(VectorError::DimensionMismatch { .. })
        ));
    }
}

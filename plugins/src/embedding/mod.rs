//! Embedding providers.
//!
//! Supports remote OpenAI-compatible APIs and a local Ollama daemon.

pub mod ollama;
pub mod openai;

pub use ollama::OllamaEmbeddingProvider;
pub use openai::{supports_multimodal, OpenAiEmbeddingProvider, MULTIMODAL_MODELS};

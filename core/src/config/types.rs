use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub embedding: EmbeddingConfig,

    #[serde(default)]
    pub vector_store: VectorStoreConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_logging_enabled")]
    pub enabled: bool,

    /// If true, log to stderr.
    #[serde(default = "default_logging_console")]
    pub console: bool,

    /// If true, log to a file under `directory` (or OS temp dir if unset).
    #[serde(default)]
    pub file: bool,

    /// EnvFilter string, e.g. "info" or "vecdex_plugins=debug".
    #[serde(default = "default_logging_level")]
    pub level: String,

    #[serde(default)]
    pub directory: Option<String>,
}

fn default_logging_enabled() -> bool {
    true
}

fn default_logging_console() -> bool {
    true
}

fn default_logging_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enabled: default_logging_enabled(),
            console: default_logging_console(),
            file: false,
            level: default_logging_level(),
            directory: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmbeddingProviderKind {
    /// Any OpenAI-compatible `/embeddings` endpoint.
    #[serde(alias = "openai-compatible")]
    OpenAi,
    Ollama,
}

impl EmbeddingProviderKind {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "openai" | "openai-compatible" => Some(Self::OpenAi),
            "ollama" => Some(Self::Ollama),
            _ => None,
        }
    }

    pub fn default_base_url(self) -> &'static str {
        match self {
            Self::OpenAi => "https://api.openai.com/v1",
            Self::Ollama => "http://localhost:11434",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    #[serde(default = "default_embedding_provider")]
    pub provider: EmbeddingProviderKind,

    #[serde(default = "default_embedding_model")]
    pub model: String,

    #[serde(default)]
    pub api_key: String,

    /// Falls back to the provider's public endpoint when unset.
    #[serde(default)]
    pub base_url: Option<String>,

    #[serde(default = "default_embedding_timeout_ms")]
    pub timeout_ms: u64,

    /// Requested output dimension; also used to validate responses.
    #[serde(default)]
    pub dimension: Option<usize>,

    #[serde(default = "default_embedding_max_in_flight")]
    pub max_in_flight: usize,
}

fn default_embedding_provider() -> EmbeddingProviderKind {
    EmbeddingProviderKind::OpenAi
}

fn default_embedding_model() -> String {
    "text-embedding-3-small".to_string()
}

fn default_embedding_timeout_ms() -> u64 {
    30_000
}

fn default_embedding_max_in_flight() -> usize {
    8
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: default_embedding_provider(),
            model: default_embedding_model(),
            api_key: String::new(),
            base_url: None,
            timeout_ms: default_embedding_timeout_ms(),
            dimension: None,
            max_in_flight: default_embedding_max_in_flight(),
        }
    }
}

impl EmbeddingConfig {
    pub fn effective_base_url(&self) -> String {
        self.base_url
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| self.provider.default_base_url())
            .trim_end_matches('/')
            .to_string()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VectorStoreBackend {
    #[default]
    Memory,
    Remote,
}

impl VectorStoreBackend {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "memory" | "in-memory" => Some(Self::Memory),
            "remote" | "milvus" => Some(Self::Remote),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VectorStoreConfig {
    #[serde(default)]
    pub backend: VectorStoreBackend,

    #[serde(default)]
    pub remote: RemoteStoreConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteStoreConfig {
    #[serde(default = "default_remote_host")]
    pub host: String,

    #[serde(default = "default_remote_port")]
    pub port: u16,

    #[serde(default)]
    pub tls: bool,

    #[serde(default)]
    pub username: String,

    #[serde(default)]
    pub password: String,

    /// API token; takes precedence over username/password.
    #[serde(default)]
    pub token: String,

    #[serde(default = "default_remote_collection")]
    pub collection: String,

    #[serde(default = "default_remote_dimension")]
    pub dimension: usize,

    #[serde(default = "default_index_type")]
    pub index_type: String,

    #[serde(default = "default_metric_type")]
    pub metric_type: String,

    #[serde(default = "default_index_params")]
    pub index_params: Map<String, Value>,

    #[serde(default = "default_remote_timeout_ms")]
    pub timeout_ms: u64,

    #[serde(default = "default_remote_max_in_flight")]
    pub max_in_flight: usize,
}

fn default_remote_host() -> String {
    "localhost".to_string()
}

fn default_remote_port() -> u16 {
    19530
}

fn default_remote_collection() -> String {
    "vecdex_documents".to_string()
}

fn default_remote_dimension() -> usize {
    1536
}

fn default_index_type() -> String {
    "HNSW".to_string()
}

fn default_metric_type() -> String {
    "COSINE".to_string()
}

fn default_index_params() -> Map<String, Value> {
    let mut params = Map::new();
    params.insert("M".to_string(), Value::from(16));
    params.insert("efConstruction".to_string(), Value::from(200));
    params
}

fn default_remote_timeout_ms() -> u64 {
    30_000
}

fn default_remote_max_in_flight() -> usize {
    16
}

impl Default for RemoteStoreConfig {
    fn default() -> Self {
        Self {
            host: default_remote_host(),
            port: default_remote_port(),
            tls: false,
            username: String::new(),
            password: String::new(),
            token: String::new(),
            collection: default_remote_collection(),
            dimension: default_remote_dimension(),
            index_type: default_index_type(),
            metric_type: default_metric_type(),
            index_params: default_index_params(),
            timeout_ms: default_remote_timeout_ms(),
            max_in_flight: default_remote_max_in_flight(),
        }
    }
}

impl RemoteStoreConfig {
    pub fn endpoint(&self) -> String {
        let scheme = if self.tls { "https" } else { "http" };
        format!("{}://{}:{}", scheme, self.host.trim(), self.port)
    }

    /// Bearer token sent to the server, if any credentials are configured.
    pub fn auth_token(&self) -> Option<String> {
        if !self.token.trim().is_empty() {
            return Some(self.token.trim().to_string());
        }
        if !self.username.trim().is_empty() {
            return Some(format!("{}:{}", self.username.trim(), self.password));
        }
        None
    }

    /// Whether searches treat a higher score as closer.
    pub fn higher_is_closer(&self) -> bool {
        !self.metric_type.eq_ignore_ascii_case("L2")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_parse_from_empty_toml() {
        let cfg: AppConfig = toml::from_str("").unwrap();
        assert_eq!(cfg.embedding.provider, EmbeddingProviderKind::OpenAi);
        assert_eq!(cfg.vector_store.backend, VectorStoreBackend::Memory);
        assert_eq!(cfg.vector_store.remote.port, 19530);
        assert_eq!(cfg.vector_store.remote.index_params["M"], Value::from(16));
    }

    #[test]
    fn test_remote_section_from_toml() {
        let cfg: AppConfig = toml::from_str(
            r#"
            [embedding]
            provider = "ollama"
            model = "nomic-embed-text"
            dimension = 768

            [vector_store]
            backend = "remote"

            [vector_store.remote]
            host = "milvus.internal"
            tls = true
            collection = "notes"
            dimension = 768
            metric_type = "L2"
            index_type = "IVF_FLAT"
            index_params = { nlist = 128 }
            "#,
        )
        .unwrap();
        assert_eq!(cfg.embedding.provider, EmbeddingProviderKind::Ollama);
        assert_eq!(cfg.embedding.effective_base_url(), "http://localhost:11434");
        assert_eq!(cfg.vector_store.backend, VectorStoreBackend::Remote);
        let remote = &cfg.vector_store.remote;
        assert_eq!(remote.endpoint(), "https://milvus.internal:19530");
        assert_eq!(remote.index_params["nlist"], Value::from(128));
        assert!(!remote.higher_is_closer());
    }

    #[test]
    fn test_auth_token_prefers_token() {
        let mut remote = RemoteStoreConfig {
            username: "root".into(),
            password: "Milvus".into(),
            ..Default::default()
        };
        assert_eq!(remote.auth_token().as_deref(), Some("root:Milvus"));
        remote.token = "tok".into();
        assert_eq!(remote.auth_token().as_deref(), Some("tok"));
        assert_eq!(RemoteStoreConfig::default().auth_token(), None);
    }

    #[test]
    fn test_base_url_trims_trailing_slash() {
        let cfg = EmbeddingConfig {
            base_url: Some("https://dashscope.aliyuncs.com/compatible-mode/v1/".into()),
            ..Default::default()
        };
        assert_eq!(
            cfg.effective_base_url(),
            "https://dashscope.aliyuncs.com/compatible-mode/v1"
        );
    }
}

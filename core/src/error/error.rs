use thiserror::Error;

pub type Result<T, E = VectorError> = std::result::Result<T, E>;

/// Errors surfaced by embedding providers and vector store backends.
///
/// Nothing in the crate converts these into empty results and nothing retries
/// automatically; callers decide retry and alerting policy.
#[derive(Error, Debug)]
pub enum VectorError {
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("{operation} timed out after {timeout_ms}ms")]
    Timeout {
        operation: &'static str,
        timeout_ms: u64,
    },

    #[error("api error status={status}: {message}")]
    Api { status: u16, message: String },

    #[error("model '{model}' does not support multimodal input")]
    UnsupportedModel { model: String },

    #[error("failed to initialize collection '{collection}': {message}")]
    BackendInitialization { collection: String, message: String },

    #[error("insert failed: {0}")]
    Insert(String),

    #[error("search failed: {0}")]
    Search(String),

    #[error("vector dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("invalid filter on key '{key}': {reason}")]
    InvalidFilter { key: String, reason: String },

    #[error("transport error: {0}")]
    Transport(String),

    #[error("failed to decode response: {0}")]
    Decode(String),

    #[error("collection '{collection}' has been dropped")]
    Dropped { collection: String },

    #[error("client connection is closed")]
    Closed,
}

impl VectorError {
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    pub fn invalid_filter(key: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidFilter {
            key: key.into(),
            reason: reason.into(),
        }
    }

    /// Whether a caller may reasonably retry the same call later.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Timeout { .. } | Self::Transport(_) | Self::BackendInitialization { .. }
        )
    }

    /// Stable short label, used in structured log fields.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Configuration(_) => "configuration",
            Self::Timeout { .. } => "timeout",
            Self::Api { .. } => "api",
            Self::UnsupportedModel { .. } => "unsupported_model",
            Self::BackendInitialization { .. } => "backend_initialization",
            Self::Insert(_) => "insert",
            Self::Search(_) => "search",
            Self::DimensionMismatch { .. } => "dimension_mismatch",
            Self::InvalidFilter { .. } => "invalid_filter",
            Self::Transport(_) => "transport",
            Self::Decode(_) => "decode",
            Self::Dropped { .. } => "dropped",
            Self::Closed => "closed",
        }
    }
}

#[derive(Error, Debug)]
pub enum CliError {
    #[error("config error: {0}")]
    Config(String),
    #[error("{0}")]
    Vector(#[from] VectorError),
    #[error("input error: {0}")]
    Input(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("anyhow error: {0}")]
    Anyhow(#[from] anyhow::Error),
}

impl CliError {
    pub fn exit_code(&self) -> i32 {
        // 0: success
        // 11: config error
        // 20: input / IO error
        // 30: backend or network error
        // 50: internal/uncategorized
        match self {
            Self::Config(_) => 11,
            Self::Vector(VectorError::Configuration(_)) => 11,
            Self::Vector(_) => 30,
            Self::Input(_) | Self::Io(_) => 20,
            Self::Anyhow(_) => 50,
        }
    }
}

use std::path::{Path, PathBuf};
use std::str::FromStr;

use anyhow::Context;

use super::types::{AppConfig, EmbeddingProviderKind, VectorStoreBackend};

/// Get the default vecdex data directory: ~/.vecdex
pub fn get_vecdex_data_dir() -> anyhow::Result<PathBuf> {
    let home = std::env::var("HOME")
        .or_else(|_| std::env::var("USERPROFILE"))
        .map_err(|_| anyhow::anyhow!("Cannot determine home directory"))?;
    Ok(PathBuf::from(home).join(".vecdex"))
}

pub fn load_from_path(path: &Path) -> anyhow::Result<AppConfig> {
    let s = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config file {}", path.display()))?;
    toml::from_str::<AppConfig>(&s)
        .with_context(|| format!("failed to parse config file {}", path.display()))
}

pub fn load_default() -> anyhow::Result<AppConfig> {
    // Priority 1: ~/.vecdex/config.toml
    let user_config = get_vecdex_data_dir()?.join("config.toml");

    // Priority 2: ./vecdex.toml (current directory)
    let local_config = Path::new("vecdex.toml");

    let mut cfg = if user_config.exists() {
        load_from_path(&user_config)?
    } else if local_config.exists() {
        load_from_path(local_config)?
    } else {
        AppConfig::default()
    };

    // Environment variable overrides (Priority 0: highest)
    apply_env_overrides(&mut cfg, |name| std::env::var(name).ok())?;

    Ok(cfg)
}

/// Apply `VECDEX_*` overrides. Blank values are ignored; malformed numbers or
/// booleans are errors rather than silently falling back to the file value.
pub fn apply_env_overrides<F>(cfg: &mut AppConfig, lookup: F) -> anyhow::Result<()>
where
    F: Fn(&str) -> Option<String>,
{
    let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

    let embedding = &mut cfg.embedding;
    if let Some(v) = get("VECDEX_EMBEDDING_PROVIDER") {
        embedding.provider = EmbeddingProviderKind::parse(&v)
            .ok_or_else(|| anyhow::anyhow!("unknown embedding provider '{}'", v))?;
    }
    if let Some(v) = get("VECDEX_EMBEDDING_MODEL") {
        embedding.model = v;
    }
    if let Some(v) = get("VECDEX_EMBEDDING_API_KEY").or_else(|| get("OPENAI_API_KEY")) {
        embedding.api_key = v;
    }
    if let Some(v) = get("VECDEX_EMBEDDING_BASE_URL") {
        embedding.base_url = Some(v);
    }
    if let Some(v) = get("VECDEX_EMBEDDING_TIMEOUT_MS") {
        embedding.timeout_ms = parse_var("VECDEX_EMBEDDING_TIMEOUT_MS", &v)?;
    }
    if let Some(v) = get("VECDEX_EMBEDDING_DIMENSION") {
        embedding.dimension = Some(parse_var("VECDEX_EMBEDDING_DIMENSION", &v)?);
    }

    let store = &mut cfg.vector_store;
    if let Some(v) = get("VECDEX_VECTOR_STORE") {
        store.backend = VectorStoreBackend::parse(&v)
            .ok_or_else(|| anyhow::anyhow!("unknown vector store backend '{}'", v))?;
    }

    let remote = &mut store.remote;
    if let Some(v) = get("VECDEX_REMOTE_HOST") {
        remote.host = v;
    }
    if let Some(v) = get("VECDEX_REMOTE_PORT") {
        remote.port = parse_var("VECDEX_REMOTE_PORT", &v)?;
    }
    if let Some(v) = get("VECDEX_REMOTE_TLS") {
        remote.tls = parse_bool("VECDEX_REMOTE_TLS", &v)?;
    }
    if let Some(v) = get("VECDEX_REMOTE_USER") {
        remote.username = v;
    }
    if let Some(v) = get("VECDEX_REMOTE_PASSWORD") {
        remote.password = v;
    }
    if let Some(v) = get("VECDEX_REMOTE_TOKEN") {
        remote.token = v;
    }
    if let Some(v) = get("VECDEX_REMOTE_COLLECTION") {
        remote.collection = v;
    }
    if let Some(v) = get("VECDEX_REMOTE_DIMENSION") {
        remote.dimension = parse_var("VECDEX_REMOTE_DIMENSION", &v)?;
    }

    Ok(())
}

fn parse_var<T>(name: &str, value: &str) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    value
        .trim()
        .parse::<T>()
        .map_err(|e| anyhow::anyhow!("invalid value for {}: '{}' ({})", name, value, e))
}

fn parse_bool(name: &str, value: &str) -> anyhow::Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(anyhow::anyhow!(
            "invalid value for {}: '{}' (expected true/false)",
            name,
            value
        )),
    }
}

use vecdex_core::api::{AppConfig, CliError, VectorError, VectorStore, VectorStoreBackend};
use vecdex_plugins::factory::{build_embeddings, build_remote_store};
use vecdex_plugins::store::RemoteVectorStore;

fn remote_store(cfg: &AppConfig) -> Result<std::sync::Arc<RemoteVectorStore>, CliError> {
    if cfg.vector_store.backend != VectorStoreBackend::Remote {
        return Err(CliError::Config(
            "collection commands need vector_store.backend = \"remote\"".to_string(),
        ));
    }
    let embeddings = build_embeddings(&cfg.embedding)?;
    Ok(build_remote_store(cfg, embeddings)?)
}

/// Closes the store whether or not `result` succeeded, then hands it back.
async fn finish<T>(
    store: &RemoteVectorStore,
    result: Result<T, VectorError>,
) -> Result<T, CliError> {
    if let Err(e) = store.close().await {
        tracing::warn!("closing remote store failed: {}", e);
    }
    Ok(result?)
}

pub async fn init(cfg: &AppConfig) -> Result<i32, CliError> {
    let store = remote_store(cfg)?;
    let result = store.initialize().await;
    finish(&store, result).await?;
    println!(
        "{}",
        serde_json::json!({ "collection": store.collection(), "state": "ready" })
    );
    Ok(0)
}

pub async fn drop_collection(cfg: &AppConfig) -> Result<i32, CliError> {
    let store = remote_store(cfg)?;
    let result = store.delete().await;
    finish(&store, result).await?;
    println!(
        "{}",
        serde_json::json!({ "collection": store.collection(), "state": "dropped" })
    );
    Ok(0)
}

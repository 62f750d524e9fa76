use std::path::Path;

use futures::stream::{self, StreamExt, TryStreamExt};
use serde::Deserialize;
use vecdex_core::api::{CliError, Document, Metadata};
use vecdex_plugins::VectorStoreFacade;

use super::cli::IngestArgs;

#[derive(Deserialize)]
struct Record {
    #[serde(alias = "text", alias = "page_content")]
    content: String,
    #[serde(default)]
    metadata: Metadata,
}

/// Parse a JSONL corpus. Blank lines are skipped; anything else that is not
/// a record is an input error naming the line.
pub fn parse_jsonl(text: &str) -> Result<Vec<Document>, CliError> {
    text.lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(n, line)| {
            serde_json::from_str::<Record>(line)
                .map(|r| Document::with_metadata(r.content, r.metadata))
                .map_err(|e| CliError::Input(format!("line {}: {}", n + 1, e)))
        })
        .collect()
}

pub async fn read_jsonl(path: &Path) -> Result<Vec<Document>, CliError> {
    let text = tokio::fs::read_to_string(path).await.map_err(|e| {
        CliError::Input(format!("failed to read {}: {}", path.display(), e))
    })?;
    parse_jsonl(&text)
}

/// Store documents in batches; ids come back in input order.
pub async fn ingest_documents(
    facade: &VectorStoreFacade,
    documents: Vec<Document>,
    batch_size: usize,
    concurrency: usize,
) -> Result<Vec<String>, CliError> {
    let mut batches = Vec::new();
    let mut iter = documents.into_iter().peekable();
    while iter.peek().is_some() {
        batches.push(iter.by_ref().take(batch_size.max(1)).collect::<Vec<_>>());
    }

    let ids: Vec<Vec<String>> = stream::iter(batches)
        .map(|batch| facade.add_documents_to_store(batch))
        .buffered(concurrency.max(1))
        .try_collect()
        .await?;
    Ok(ids.into_iter().flatten().collect())
}

pub async fn run(args: IngestArgs, facade: &VectorStoreFacade) -> Result<i32, CliError> {
    let documents = read_jsonl(&args.file).await?;
    tracing::info!(
        "Ingesting {} documents from {}",
        documents.len(),
        args.file.display()
    );
    let ids = ingest_documents(facade, documents, args.batch_size, args.concurrency).await?;
    println!(
        "{}",
        serde_json::json!({ "ingested": ids.len(), "ids": ids })
    );
    Ok(0)
}

use vecdex_core::api::{CliError, MetadataFilter, SearchResult};
use vecdex_plugins::VectorStoreFacade;

use super::cli::QueryArgs;
use super::ingest;

pub fn render(results: &[SearchResult]) -> Vec<String> {
    results
        .iter()
        .enumerate()
        .map(|(rank, r)| {
            serde_json::json!({
                "rank": rank + 1,
                "score": r.score,
                "content": r.document.content(),
                "metadata": r.document.metadata(),
            })
            .to_string()
        })
        .collect()
}

pub async fn run(args: QueryArgs, facade: &VectorStoreFacade) -> Result<i32, CliError> {
    let filter = MetadataFilter::from_pairs(&args.filter)
        .map_err(|e| CliError::Input(e.to_string()))?;
    if let Some(corpus) = &args.corpus {
        let documents = ingest::read_jsonl(corpus).await?;
        ingest::ingest_documents(facade, documents, 64, 1).await?;
    }

    let filter = (!filter.is_empty()).then_some(&filter);
    let results = facade
        .similarity_search_with_score(&args.text, args.k, filter)
        .await?;
    tracing::debug!("Query returned {} results", results.len());
    for line in render(&results) {
        println!("{}", line);
    }
    Ok(0)
}

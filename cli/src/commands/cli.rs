use std::path::PathBuf;

use clap::{Args as ClapArgs, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "vecdex", version, about = "Embed documents and run similarity search")]
pub struct Args {
    #[command(subcommand)]
    pub command: Commands,

    /// Config file to use instead of ~/.vecdex/config.toml or ./vecdex.toml.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Embed and store documents from a JSONL file.
    Ingest(IngestArgs),
    /// Search stored documents.
    Query(QueryArgs),
    /// Create, index and load the remote collection.
    Init,
    /// Drop the remote collection.
    Drop,
}

#[derive(ClapArgs, Debug, Clone)]
pub struct IngestArgs {
    /// One JSON object per line: {"content": "...", "metadata": {...}}.
    pub file: PathBuf,

    #[arg(long, default_value_t = 64)]
    pub batch_size: usize,

    /// Batches embedded and stored at the same time.
    #[arg(long, default_value_t = 2)]
    pub concurrency: usize,
}

#[derive(ClapArgs, Debug, Clone)]
pub struct QueryArgs {
    pub text: String,

    #[arg(short, long)]
    pub k: Option<usize>,

    /// Metadata equality filter (KEY=VALUE). Can be specified multiple times.
    #[arg(long = "filter", action = clap::ArgAction::Append)]
    pub filter: Vec<String>,

    /// Ingest this JSONL file first; useful with the in-memory backend.
    #[arg(long)]
    pub corpus: Option<PathBuf>,
}

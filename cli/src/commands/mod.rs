pub mod cli;
pub mod collection;
pub mod ingest;
pub mod query;

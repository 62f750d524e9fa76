//! Milvus-backed vector store.

pub mod client;
pub mod filter;
pub mod schema;
pub mod store;

pub use client::MilvusHttpClient;
pub use filter::compile_filter;
pub use store::{RemoteVectorStore, StoreState};

//! Vector store backends.

pub mod memory;
pub mod remote;

pub use memory::InMemoryVectorIndex;
pub use remote::{MilvusHttpClient, RemoteVectorStore, StoreState};

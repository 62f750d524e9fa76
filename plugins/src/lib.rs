pub mod embedding;
pub mod facade;
pub mod factory;
pub(crate) mod http;
pub mod store;

#[cfg(test)]
pub(crate) mod testing;

pub use facade::VectorStoreFacade;
